use std::{
    fmt::{self, Debug, Formatter},
    io::Write,
};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Severity {
    Warning,
    Error,
}

/// Optional destination for human-readable diagnostic lines.
///
/// Every report also goes out as a `tracing` event, whether or not a sink is attached. Failing to
/// write a diagnostic is not itself reported anywhere.
pub(crate) struct ErrorSink<E>(Option<E>);
impl<E> ErrorSink<E> {
    #[inline]
    pub fn new(inner: Option<E>) -> Self { Self(inner) }
    #[inline]
    pub fn into_inner(self) -> Option<E> { self.0 }
    #[inline]
    pub fn is_attached(&self) -> bool { self.0.is_some() }
}
impl<E: Write> ErrorSink<E> {
    pub fn report(&mut self, severity: Severity, label: &str, msg: fmt::Arguments<'_>) {
        match severity {
            Severity::Warning => tracing::warn!(label, "{msg}"),
            Severity::Error => tracing::error!(label, "{msg}"),
        }
        if let Some(sink) = &mut self.0 {
            let _ = writeln!(sink, "debug {label}: {msg}");
        }
    }
}
impl<E> Debug for ErrorSink<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ErrorSink").field(&self.is_attached()).finish()
    }
}
