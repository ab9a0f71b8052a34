//! Error types for relay construction.
//!
//! Everything that can go wrong after construction is reported through the relay's error sink and
//! [`DrainOutcome`](crate::DrainOutcome) instead.

use std::{
    error::Error,
    fmt::{self, Display, Formatter},
    io,
};

/// The construction step that failed.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum InitStage {
    /// Creating the pipe failed, typically because the process ran out of descriptors.
    Pipe,
    /// The drain worker thread could not be started.
    Spawn,
}
impl InitStage {
    const fn msg(self) -> &'static str {
        match self {
            Self::Pipe => "failed to create pipe",
            Self::Spawn => "failed to start drain worker",
        }
    }
}

/// Why a [`PipeRelay`](crate::PipeRelay) came out broken.
///
/// This is `Copy` so that [`status()`](crate::PipeRelay::status) can be queried any number of
/// times; the OS error it stems from is kept as its kind and raw error code, and can be rebuilt
/// with [`to_io_error()`](Self::to_io_error) or the [`From`] impl.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct InitError {
    stage: InitStage,
    kind: io::ErrorKind,
    code: Option<i32>,
}
impl InitError {
    pub(crate) fn new(stage: InitStage, e: &io::Error) -> Self {
        Self { stage, kind: e.kind(), code: e.raw_os_error() }
    }
    /// Returns the construction step that failed.
    #[inline]
    pub fn stage(&self) -> InitStage { self.stage }
    /// Returns the kind of the underlying OS error.
    #[inline]
    pub fn kind(&self) -> io::ErrorKind { self.kind }
    /// Returns the raw OS error code (`errno`), if there was one.
    #[inline]
    pub fn raw_os_error(&self) -> Option<i32> { self.code }
    /// Reconstructs the underlying OS error.
    pub fn to_io_error(&self) -> io::Error {
        match self.code {
            Some(code) => io::Error::from_raw_os_error(code),
            None => io::Error::from(self.kind),
        }
    }
}
impl Display for InitError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.stage.msg(), self.to_io_error())
    }
}
impl Error for InitError {}
impl From<InitError> for io::Error {
    fn from(e: InitError) -> Self { io::Error::new(e.kind, e) }
}
