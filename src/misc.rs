#![allow(dead_code)]

use std::{
    io,
    os::unix::io::RawFd,
    time::{Duration, Instant},
};

pub(crate) trait DebugExpectExt: Sized {
    fn debug_expect(self, msg: &str);
}

pub(crate) trait OrErrno<T>: Sized {
    fn true_or_errno(self, f: impl FnOnce() -> T) -> io::Result<T>;
    #[inline(always)]
    fn true_val_or_errno(self, value: T) -> io::Result<T> { self.true_or_errno(|| value) }
}
impl<B: ToBool, T> OrErrno<T> for B {
    #[inline]
    fn true_or_errno(self, f: impl FnOnce() -> T) -> io::Result<T> {
        if self.to_bool() {
            Ok(f())
        } else {
            Err(io::Error::last_os_error())
        }
    }
}

pub(crate) trait FdOrErrno: Sized {
    fn fd_or_errno(self) -> io::Result<Self>;
}
impl FdOrErrno for RawFd {
    #[inline]
    fn fd_or_errno(self) -> io::Result<Self> { (self != -1).true_val_or_errno(self) }
}

pub(crate) trait ToBool {
    fn to_bool(self) -> bool;
}
impl ToBool for bool {
    #[inline(always)]
    fn to_bool(self) -> bool { self }
}
impl ToBool for i32 {
    #[inline(always)]
    fn to_bool(self) -> bool { self != 0 }
}

impl<T, E: std::fmt::Debug> DebugExpectExt for Result<T, E> {
    #[inline]
    #[track_caller]
    fn debug_expect(self, msg: &str) {
        if cfg!(debug_assertions) {
            self.expect(msg);
        }
    }
}

/// The point in time `timeout` after `start`, or `None` if that overflows [`Instant`].
pub(crate) fn timeout_expiry(start: Instant, timeout: Duration) -> Option<Instant> {
    start.checked_add(timeout)
}

/// Converts a timeout into the millisecond count expected by `poll(2)`, rounding sub-millisecond
/// remainders up so that a nonzero timeout never degrades into a busy poll.
pub(crate) fn duration_to_poll_ms(timeout: Duration) -> libc::c_int {
    let mut ms = timeout.as_millis();
    if timeout.subsec_nanos() % 1_000_000 != 0 {
        ms = ms.saturating_add(1);
    }
    libc::c_int::try_from(ms).unwrap_or(libc::c_int::MAX)
}
