//! The pipe relay: a pipe whose read end is drained into an output sink by a background thread
//! while a producer writes into the write end.
//!
//! The typical use is capturing the output of a dump operation that insists on writing into a
//! file descriptor. Create a [`PipeRelay`], check its [status](PipeRelay::status), hand the
//! [write end](PipeRelay::write_end) to the producer, and once the producer has returned, drop the
//! relay or call [`finish()`](PipeRelay::finish) on it.
//!
//! # Shutdown
//! Finishing a relay happens in a fixed order:
//! 1. The relay's write end is closed. Once the producer has closed any copies of its own, the
//!    worker sees end-of-file after reading everything that is still buffered in the pipe.
//! 2. The worker is told that the producer is done. This does not interrupt it; it only means
//!    that the next time a wait for data times out, the worker gives up instead of waiting again.
//! 3. The worker is joined.
//! 4. The read end is closed.
//!
//! Finishing thus takes up to about one [timeout](RelayOptions::timeout) if a producer keeps a
//! copy of the write end open, and no time at all otherwise.

pub(crate) mod diag;
mod options;
pub(crate) mod worker;

pub use {
    options::{RelayOptions, DEFAULT_CHUNK_SIZE, DEFAULT_TIMEOUT, MIN_TIMEOUT},
    worker::{DrainOutcome, DrainStage},
};

use {
    crate::{
        error::{InitError, InitStage},
        os::unix::{RawPipe, WriteEnd, INVALID_FD},
    },
    diag::ErrorSink,
    std::{
        fmt::{self, Debug, Formatter},
        io::{self, Write},
        mem,
        os::{fd::BorrowedFd, unix::io::RawFd},
        panic, thread,
    },
    worker::{DrainJob, DrainParams, DrainReport, DrainWorker},
};

/// A pipe drained into an output sink by a background worker thread.
///
/// See the [module-level documentation](self) for how it is meant to be used and how it shuts
/// down. Dropping a relay finishes it the same way [`finish()`](Self::finish) does, minus getting
/// the sinks back.
///
/// The write end stays owned by the relay. Producers must not close it themselves; a producer that
/// needs a descriptor of its own should be given a duplicate, and close that.
pub struct PipeRelay<O, E = io::Sink> {
    pipe: RawPipe,
    status: Result<(), InitError>,
    label: Box<str>,
    worker: Worker<O, E>,
}

enum Worker<O, E> {
    /// The worker never started; the sinks are still here.
    Idle(DrainJob<O, E>),
    Running(DrainWorker<O, E>),
    Gone,
}

/// What a finished relay hands back.
#[derive(Debug)]
pub struct Drained<O, E> {
    /// The output sink, holding everything that was relayed.
    pub output: O,
    /// The error sink, if one was given.
    pub errors: Option<E>,
    /// The state the worker exited in, or `None` if it never started.
    pub outcome: Option<DrainOutcome>,
}

/// Constructors.
impl<O, E> PipeRelay<O, E>
where
    O: Write + Send + 'static,
    E: Write + Send + 'static,
{
    /// Creates a relay with default [options](RelayOptions), labelling diagnostics with
    /// `<interface>/<instance>`.
    ///
    /// This never fails outright: check [`status()`](Self::status) before handing out the write
    /// end.
    pub fn new(
        output: O,
        errors: Option<E>,
        interface: impl Into<String>,
        instance: impl Into<String>,
    ) -> Self {
        RelayOptions::new().interface(interface).instance(instance).create(output, errors)
    }

    pub(crate) fn from_options(opts: RelayOptions, output: O, errors: Option<E>) -> Self {
        let label: Box<str> = opts.label().into();
        let pipe = match RawPipe::new(opts.cloexec) {
            Ok(pipe) => pipe,
            Err(e) => {
                tracing::error!(label = &*label, error = %e, "pipe creation failed");
                return Self::broken(InitError::new(InitStage::Pipe, &e), label, output, errors);
            }
        };
        let job = DrainJob { output, errors: ErrorSink::new(errors) };

        let params = DrainParams {
            fd: pipe.read_end(),
            label: label.clone().into(),
            timeout: opts.timeout,
            chunk_size: opts.chunk_size,
        };
        let (status, worker) = match DrainWorker::spawn(params, job, opts.resolved_thread_name()) {
            Ok(w) => (Ok(()), Worker::Running(w)),
            Err((e, job)) => {
                tracing::error!(label = &*label, error = %e, "drain worker failed to start");
                (Err(InitError::new(InitStage::Spawn, &e)), Worker::Idle(job))
            }
        };
        Self { pipe, status, label, worker }
    }

    pub(crate) fn broken(err: InitError, label: Box<str>, output: O, errors: Option<E>) -> Self {
        let job = DrainJob { output, errors: ErrorSink::new(errors) };
        Self { pipe: RawPipe::invalid(), status: Err(err), label, worker: Worker::Idle(job) }
    }
}

/// Accessors.
impl<O, E> PipeRelay<O, E> {
    /// Reports whether the pipe was created and the worker started.
    ///
    /// None of the write end accessors may be used if this is an error.
    #[inline]
    pub fn status(&self) -> Result<(), InitError> { self.status }
    /// Returns the raw write end descriptor, or `-1` if the relay is broken.
    ///
    /// The descriptor stays owned by the relay.
    #[inline]
    pub fn fd(&self) -> RawFd { self.pipe.write_end() }
    /// Borrows the write end, or returns `None` if the relay is broken.
    pub fn write_end(&self) -> Option<BorrowedFd<'_>> {
        if self.status.is_err() || self.pipe.write_end() == INVALID_FD {
            return None;
        }
        // SAFETY: the descriptor is open, and stays open for as long as `self` is borrowed since
        // only finishing the relay closes it.
        Some(unsafe { BorrowedFd::borrow_raw(self.pipe.write_end()) })
    }
    /// Returns a [`Write`] handle to the write end for a producer in this process, or `None` if
    /// the relay is broken.
    #[inline]
    pub fn writer(&self) -> Option<WriteEnd<'_>> { self.write_end().map(WriteEnd::new) }
    /// Returns the label diagnostics are tagged with.
    #[inline]
    pub fn label(&self) -> &str { &self.label }
}

/// Shutdown.
impl<O, E> PipeRelay<O, E> {
    /// Finishes the relay and hands back the sinks along with the worker's terminal state.
    ///
    /// Blocks for up to about one [timeout](RelayOptions::timeout) if some copy of the write end
    /// is still open. If the worker panicked, the panic is resumed here.
    pub fn finish(mut self) -> Drained<O, E> {
        let (job, outcome) = match self.shut_down() {
            Shutdown::Joined(Ok(DrainReport { job, outcome })) => (job, Some(outcome)),
            Shutdown::Idle(job) => (job, None),
            Shutdown::Joined(Err(payload)) => panic::resume_unwind(payload),
            // A spawned worker always receives its job, and `finish` consumes the relay, so it
            // can't have been shut down before.
            Shutdown::Lost | Shutdown::Done => unreachable!("relay finished without its sinks"),
        };
        Drained { output: job.output, errors: job.errors.into_inner(), outcome }
    }

    fn shut_down(&mut self) -> Shutdown<O, E> {
        self.pipe.close_write();
        let ret = match mem::replace(&mut self.worker, Worker::Gone) {
            Worker::Running(w) => {
                w.set_finished();
                match w.join() {
                    Ok(Some(report)) => Shutdown::Joined(Ok(report)),
                    Ok(None) => Shutdown::Lost,
                    Err(payload) => Shutdown::Joined(Err(payload)),
                }
            }
            Worker::Idle(job) => Shutdown::Idle(job),
            Worker::Gone => Shutdown::Done,
        };
        self.pipe.close_read();
        ret
    }
}

enum Shutdown<O, E> {
    Joined(thread::Result<DrainReport<O, E>>),
    Idle(DrainJob<O, E>),
    Lost,
    Done,
}

impl<O, E> Drop for PipeRelay<O, E> {
    fn drop(&mut self) {
        match self.shut_down() {
            Shutdown::Joined(Err(_)) => {
                tracing::error!(label = &*self.label, "drain worker panicked");
            }
            Shutdown::Lost => {
                tracing::error!(label = &*self.label, "drain worker exited without its sinks");
            }
            _ => {}
        }
    }
}

impl<O, E> Debug for PipeRelay<O, E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let worker = match &self.worker {
            Worker::Idle(..) => "idle",
            Worker::Running(..) => "running",
            Worker::Gone => "gone",
        };
        f.debug_struct("PipeRelay")
            .field("label", &self.label)
            .field("status", &self.status)
            .field("pipe", &self.pipe)
            .field("worker", &worker)
            .finish()
    }
}
