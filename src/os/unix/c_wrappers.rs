use super::unixprelude::*;
use crate::{duration_to_poll_ms, timeout_expiry, DebugExpectExt, OrErrno};
use std::{
    io,
    time::{Duration, Instant},
};

/// Creates an unnamed pipe, returning `[read_end, write_end]`.
pub(crate) fn create_pipe(cloexec: bool) -> io::Result<[RawFd; 2]> {
    let mut fds: [c_int; 2] = [-1; 2];
    #[cfg(any(target_os = "linux", target_os = "android"))]
    {
        let flags = if cloexec { libc::O_CLOEXEC } else { 0 };
        let success = unsafe { libc::pipe2(fds.as_mut_ptr(), flags) == 0 };
        ok_or_errno!(success => fds)
    }
    #[cfg(not(any(target_os = "linux", target_os = "android")))]
    {
        let success = unsafe { libc::pipe(fds.as_mut_ptr()) == 0 };
        ok_or_errno!(success => ())?;
        if cloexec {
            for fd in fds {
                if let Err(e) = set_cloexec(fd) {
                    fds.iter().for_each(|&fd| unsafe { close_fd(fd) });
                    return Err(e);
                }
            }
        }
        Ok(fds)
    }
}

#[cfg(not(any(target_os = "linux", target_os = "android")))]
fn get_fdflags(fd: RawFd) -> io::Result<c_int> {
    use crate::FdOrErrno;
    unsafe { libc::fcntl(fd, libc::F_GETFD, 0) }.fd_or_errno()
}
#[cfg(not(any(target_os = "linux", target_os = "android")))]
fn set_fdflags(fd: RawFd, flags: c_int) -> io::Result<()> {
    let success = unsafe { libc::fcntl(fd, libc::F_SETFD, flags) != -1 };
    ok_or_errno!(success => ())
}
#[cfg(not(any(target_os = "linux", target_os = "android")))]
fn set_cloexec(fd: RawFd) -> io::Result<()> {
    set_fdflags(fd, get_fdflags(fd)? | libc::FD_CLOEXEC)
}

/// Waits for `fd` to become readable for up to `timeout`.
///
/// Returns `Ok(false)` if the timeout elapsed first. Hangup counts as readable, since the read
/// that follows is what observes end-of-file. Interruption by a signal restarts the wait with
/// whatever is left of the original timeout. A timeout too large to be expressed as a deadline
/// is restarted in full instead.
pub(crate) fn wait_readable(fd: RawFd, timeout: Duration) -> io::Result<bool> {
    let mut deadline = None;
    let mut remaining = timeout;
    let start = Instant::now();
    loop {
        let mut pfd = libc::pollfd { fd, events: libc::POLLIN, revents: 0 };
        let ret = unsafe { libc::poll(&mut pfd, 1, duration_to_poll_ms(remaining)) };
        if ret == -1 {
            let e = io::Error::last_os_error();
            if e.kind() != io::ErrorKind::Interrupted {
                return Err(e);
            }
            let deadline = *deadline.get_or_insert_with(|| timeout_expiry(start, timeout));
            remaining = match deadline {
                Some(deadline) => deadline.saturating_duration_since(Instant::now()),
                None => timeout,
            };
            continue;
        }
        if ret == 0 {
            return Ok(false);
        }
        if pfd.revents & libc::POLLNVAL != 0 {
            return Err(io::Error::from_raw_os_error(libc::EBADF));
        }
        return Ok(pfd.revents & (libc::POLLIN | libc::POLLHUP | libc::POLLERR) != 0);
    }
}

/// Performs a single `read(2)`, retrying on `EINTR`.
pub(crate) fn read_some(fd: RawFd, buf: &mut [u8]) -> io::Result<usize> {
    let ret = retry_eintr!(unsafe { libc::read(fd, buf.as_mut_ptr().cast(), buf.len()) });
    let success = ret >= 0;
    ok_or_errno!(success => ret as usize)
}

/// Performs a single `write(2)`, retrying on `EINTR`.
pub(crate) fn write_some(fd: RawFd, buf: &[u8]) -> io::Result<usize> {
    let ret = retry_eintr!(unsafe { libc::write(fd, buf.as_ptr().cast(), buf.len()) });
    let success = ret >= 0;
    ok_or_errno!(success => ret as usize)
}

/// Closes a file descriptor.
///
/// # Safety
/// `fd` must be open and owned by the caller, and must not be used again afterwards.
pub(crate) unsafe fn close_fd(fd: RawFd) {
    // EINTR is not retried: the descriptor is released regardless, and a second close() could
    // hit a descriptor number that another thread has been handed in the meantime.
    let success = unsafe { libc::close(fd) == 0 }
        || io::Error::last_os_error().kind() == io::ErrorKind::Interrupted;
    success.true_val_or_errno(()).debug_expect("close() failed");
}
