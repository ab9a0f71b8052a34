//! Unix descriptor plumbing for the relay: pipe creation, bounded readiness waits, and
//! idempotent closing.
//!
//! Everything in here works on raw descriptors rather than `OwnedFd`, because the two ends of a
//! relay's pipe have split ownership: the read end is lent to the drain worker for the worker's
//! whole lifetime, and the write end is lent to the producer, while the relay alone decides when
//! each of them is closed.

mod fdops;
mod pipe;

pub(crate) mod c_wrappers;

pub use fdops::WriteEnd;
pub(crate) use pipe::{close_end, RawPipe, INVALID_FD};

mod unixprelude {
    #[allow(unused_imports)]
    pub(super) use {
        libc::c_int,
        std::os::unix::io::{AsRawFd, RawFd},
    };
}
