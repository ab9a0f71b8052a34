use super::diag::{ErrorSink, Severity};
use crate::os::unix::c_wrappers;
use std::{
    io::{self, Write},
    os::unix::io::RawFd,
    sync::{
        atomic::{AtomicBool, Ordering::*},
        mpsc::{sync_channel, Receiver, TrySendError},
        Arc,
    },
    thread::{self, JoinHandle},
    time::Duration,
};

/// Which step of the drain loop a failure happened in.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DrainStage {
    /// Waiting for the read end to become readable.
    Wait,
    /// Reading from the pipe.
    Read,
    /// Appending a chunk to (or flushing) the output sink.
    Output,
}

/// The terminal state the drain worker exited in.
#[derive(Debug)]
pub enum DrainOutcome {
    /// The pipe reported end-of-file: every copy of the write end was closed and everything
    /// written into it has been relayed.
    Eof,
    /// An OS error ended the drain early. A diagnostic has been reported.
    Failed {
        /// Where the error happened.
        stage: DrainStage,
        /// The error itself.
        error: io::Error,
    },
    /// The relay had finished and a whole timeout window then passed without the pipe becoming
    /// readable, so the drain was abandoned. The capture may be truncated; a diagnostic has been
    /// reported.
    TimedOutAfterFinish,
}
impl DrainOutcome {
    /// Returns `true` if the drain ran until end-of-file.
    #[inline]
    pub fn is_eof(&self) -> bool { matches!(self, Self::Eof) }
    /// Returns the stage at which the drain failed, if it did.
    pub fn failed_stage(&self) -> Option<DrainStage> {
        match self {
            Self::Failed { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

/// The sinks the worker writes into. They travel to the worker thread only once the thread is
/// known to have started, and come back with the [`DrainReport`].
#[derive(Debug)]
pub(crate) struct DrainJob<O, E> {
    pub output: O,
    pub errors: ErrorSink<E>,
}

#[derive(Debug)]
pub(crate) struct DrainReport<O, E> {
    pub job: DrainJob<O, E>,
    pub outcome: DrainOutcome,
}

/// Everything the drain loop needs apart from the sinks.
#[derive(Debug)]
pub(crate) struct DrainParams {
    /// Read end of the pipe. Lent by the relay, which joins the worker before closing it.
    pub fd: RawFd,
    pub label: Arc<str>,
    pub timeout: Duration,
    pub chunk_size: usize,
}

/// Handle to a running drain worker thread.
pub(crate) struct DrainWorker<O, E> {
    finished: Arc<AtomicBool>,
    handle: JoinHandle<Option<DrainReport<O, E>>>,
}
impl<O, E> DrainWorker<O, E>
where
    O: Write + Send + 'static,
    E: Write + Send + 'static,
{
    /// Starts the worker thread. On failure, the job is handed back untouched.
    pub fn spawn(
        params: DrainParams,
        job: DrainJob<O, E>,
        thread_name: String,
    ) -> Result<Self, (io::Error, DrainJob<O, E>)> {
        let finished = Arc::new(AtomicBool::new(false));
        let (tx, rx) = sync_channel(1);
        let flag = Arc::clone(&finished);
        let spawned = thread::Builder::new()
            .name(thread_name)
            .spawn(move || worker_main(params, flag, rx));
        let handle = match spawned {
            Ok(h) => h,
            Err(e) => return Err((e, job)),
        };
        match tx.try_send(job) {
            Ok(()) => Ok(Self { finished, handle }),
            Err(TrySendError::Full(job) | TrySendError::Disconnected(job)) => {
                let _ = handle.join();
                let e = io::Error::other("drain worker exited before receiving its sinks");
                Err((e, job))
            }
        }
    }
}
impl<O, E> DrainWorker<O, E> {
    /// Tells the worker that the producer is done. The worker keeps draining; this only makes
    /// its next timeout terminal.
    #[inline]
    pub fn set_finished(&self) { self.finished.store(true, Release) }

    pub fn join(self) -> thread::Result<Option<DrainReport<O, E>>> { self.handle.join() }
}

fn worker_main<O: Write, E: Write>(
    params: DrainParams,
    finished: Arc<AtomicBool>,
    rx: Receiver<DrainJob<O, E>>,
) -> Option<DrainReport<O, E>> {
    let mut job = rx.recv().ok()?;
    drop(rx);
    let outcome = drain(&params, &finished, &mut job);
    Some(DrainReport { job, outcome })
}

/// The drain loop: wait for readability with a bounded timeout, read one chunk, append it to the
/// output, repeat.
///
/// The finish flag is only consulted after a wait has timed out, never before a wait. That gives
/// data written just before the producer returned at least one full window to arrive.
pub(crate) fn drain<O: Write, E: Write>(
    params: &DrainParams,
    finished: &AtomicBool,
    job: &mut DrainJob<O, E>,
) -> DrainOutcome {
    let DrainParams { fd, ref label, timeout, chunk_size } = *params;
    let label = &**label;
    tracing::debug!(label, fd, ?timeout, chunk_size, "drain worker started");

    let mut buf = vec![0_u8; chunk_size.max(1)];
    let mut total = 0_u64;
    let mut outcome = loop {
        match c_wrappers::wait_readable(fd, timeout) {
            Ok(true) => {}
            Ok(false) if finished.load(Acquire) => {
                job.errors.report(
                    Severity::Warning,
                    label,
                    format_args!("timeout reading from pipe, output may be truncated."),
                );
                break DrainOutcome::TimedOutAfterFinish;
            }
            Ok(false) => continue,
            Err(error) => {
                job.errors.report(Severity::Error, label, format_args!("poll() failed: {error}"));
                break DrainOutcome::Failed { stage: DrainStage::Wait, error };
            }
        }

        let n = match c_wrappers::read_some(fd, &mut buf) {
            Ok(0) => break DrainOutcome::Eof,
            Ok(n) => n,
            Err(error) => {
                job.errors.report(Severity::Error, label, format_args!("read() failed: {error}"));
                break DrainOutcome::Failed { stage: DrainStage::Read, error };
            }
        };
        let chunk = buf.get(..n).unwrap_or_default();
        if let Err(error) = job.output.write_all(chunk) {
            job.errors.report(
                Severity::Error,
                label,
                format_args!("write to output failed: {error}"),
            );
            break DrainOutcome::Failed { stage: DrainStage::Output, error };
        }
        total = total.saturating_add(n as u64);
        tracing::trace!(label, n, total, "relayed chunk");
    };

    if outcome.failed_stage() != Some(DrainStage::Output) {
        if let Err(error) = job.output.flush() {
            job.errors.report(
                Severity::Error,
                label,
                format_args!("flushing output failed: {error}"),
            );
            if outcome.is_eof() {
                outcome = DrainOutcome::Failed { stage: DrainStage::Output, error };
            }
        }
    }
    tracing::debug!(label, total, ?outcome, "drain worker exited");
    outcome
}
