use super::{c_wrappers, unixprelude::*};
use std::{
    fmt::{self, Debug, Formatter},
    io::{self, Write},
    os::fd::{AsFd, BorrowedFd},
};

/// A non-owning [`Write`] handle to a relay's write end, for producers living in the same process.
///
/// Dropping it does not close anything: the write end belongs to the relay, which closes it when
/// it finishes. A producer in another process should be given a duplicate of the
/// [descriptor](crate::PipeRelay::write_end) instead.
#[derive(Copy, Clone)]
pub struct WriteEnd<'fd>(BorrowedFd<'fd>);
impl<'fd> WriteEnd<'fd> {
    pub(crate) fn new(fd: BorrowedFd<'fd>) -> Self { Self(fd) }
}
impl Write for &WriteEnd<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        c_wrappers::write_some(self.0.as_raw_fd(), buf)
    }
    // Pipes have nothing to flush, and fsync() on one fails with EINVAL.
    #[inline]
    fn flush(&mut self) -> io::Result<()> { Ok(()) }
}
impl Write for WriteEnd<'_> {
    #[inline]
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> { (&*self).write(buf) }
    #[inline]
    fn flush(&mut self) -> io::Result<()> { (&*self).flush() }
}
impl AsFd for WriteEnd<'_> {
    #[inline]
    fn as_fd(&self) -> BorrowedFd<'_> { self.0 }
}
impl Debug for WriteEnd<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriteEnd").field("fd", &self.0.as_raw_fd()).finish()
    }
}
