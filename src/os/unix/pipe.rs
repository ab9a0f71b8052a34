use super::{c_wrappers, unixprelude::*};
use std::{
    fmt::{self, Debug, Formatter},
    io,
};

/// The value a closed or never-opened pipe end is represented by.
pub(crate) const INVALID_FD: RawFd = -1;

/// Closes `fd` if it is valid and replaces it with [`INVALID_FD`].
///
/// Calling this on an already-invalid descriptor does nothing, which makes it safe to run on the
/// remains of a partially constructed relay.
pub(crate) fn close_end(fd: &mut RawFd) {
    if *fd >= 0 {
        // SAFETY: the caller owns the descriptor, and the sentinel written below keeps it from
        // being closed twice.
        unsafe { c_wrappers::close_fd(*fd) };
        *fd = INVALID_FD;
    }
}

/// Both ends of an unnamed pipe, held as raw descriptors so that either end can be closed on its
/// own schedule.
///
/// The read end is only ever lent to the drain worker by number, never handed over, so nothing
/// here tracks borrows: the relay orders its teardown so that the worker has been joined before
/// [`close_read()`](Self::close_read) runs.
pub(crate) struct RawPipe {
    read_end: RawFd,
    write_end: RawFd,
}
impl RawPipe {
    pub fn new(cloexec: bool) -> io::Result<Self> {
        let [read_end, write_end] = c_wrappers::create_pipe(cloexec)?;
        Ok(Self { read_end, write_end })
    }
    /// A pipe with neither end open.
    pub const fn invalid() -> Self { Self { read_end: INVALID_FD, write_end: INVALID_FD } }

    #[inline]
    pub fn read_end(&self) -> RawFd { self.read_end }
    #[inline]
    pub fn write_end(&self) -> RawFd { self.write_end }

    #[inline]
    pub fn close_read(&mut self) { close_end(&mut self.read_end) }
    #[inline]
    pub fn close_write(&mut self) { close_end(&mut self.write_end) }
}
impl Drop for RawPipe {
    fn drop(&mut self) {
        self.close_write();
        self.close_read();
    }
}
impl Debug for RawPipe {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawPipe")
            .field("read_end", &self.read_end)
            .field("write_end", &self.write_end)
            .finish()
    }
}
