use super::*;
use crate::DrainOutcome;
use color_eyre::eyre::ensure;
use std::{
    io::Write,
    panic::{self, AssertUnwindSafe},
    thread,
    time::{Duration, Instant},
};

#[test]
fn finishing_after_the_producer_closed_does_not_wait_out_the_timeout() -> TestResult {
    test_wrapper(|| {
        let timeout = Duration::from_secs(5);
        let relay = checked(
            RelayOptions::new()
                .interface("IFast")
                .timeout(timeout)
                .create(Vec::<u8>::new(), Some(Vec::<u8>::new())),
        )?;
        relay.writer().unwrap().write_all(b"done").opname("write")?;
        // Let the worker settle into a wait.
        thread::sleep(Duration::from_millis(50));

        let start = Instant::now();
        let drained = relay.finish();
        let elapsed = start.elapsed();
        ensure!(elapsed < timeout, "finishing took {elapsed:?}");
        ensure_eq!(drained.output, b"done");
        ensure!(drained.outcome.as_ref().is_some_and(DrainOutcome::is_eof), "drain did not reach EOF");
        Ok(())
    })
}

#[test]
fn finishing_with_a_stray_writer_is_bounded_by_one_window() -> TestResult {
    test_wrapper(|| {
        let timeout = relay_timeout();
        let relay = checked(vec_relay("IStray"))?;
        let dup = relay.write_end().unwrap().try_clone_to_owned()?;
        thread::sleep(timeout / 2);

        let start = Instant::now();
        let drained = relay.finish();
        let elapsed = start.elapsed();
        drop(dup);
        // One window after the finish flag is set, plus whatever was left of the wait in
        // progress, plus scheduling slack.
        ensure!(elapsed < timeout * 2 + Duration::from_secs(1), "finishing took {elapsed:?}");
        ensure!(
            matches!(drained.outcome, Some(DrainOutcome::TimedOutAfterFinish)),
            "expected a timeout after finishing, got {:?}",
            drained.outcome
        );
        Ok(())
    })
}

#[test]
fn dropping_finishes_like_finish() -> TestResult {
    test_wrapper(|| {
        let out = SharedBuf::new();
        let relay = checked(
            RelayOptions::new()
                .interface("IDrop")
                .timeout(relay_timeout())
                .create(out.clone(), None::<io::Sink>),
        )?;
        relay.writer().unwrap().write_all(b"via drop").opname("write")?;
        drop(relay);
        // Dropping joins the worker, so everything must be there already.
        ensure_eq!(out.contents(), b"via drop");
        Ok(())
    })
}

#[test]
fn worker_panic_resurfaces_in_finish_but_not_in_drop() -> TestResult {
    test_wrapper(|| {
        let make = || {
            RelayOptions::new()
                .interface("IPanic")
                .timeout(relay_timeout())
                .create(PanickingSink, None::<io::Sink>)
        };

        let relay = checked(make())?;
        relay.writer().unwrap().write_all(b"boom").opname("write")?;
        let finished = panic::catch_unwind(AssertUnwindSafe(|| relay.finish()));
        ensure!(finished.is_err(), "worker panic was swallowed by finish()");

        let relay = checked(make())?;
        relay.writer().unwrap().write_all(b"boom").opname("write")?;
        let dropped = panic::catch_unwind(AssertUnwindSafe(|| drop(relay)));
        ensure!(dropped.is_ok(), "worker panic escaped drop()");
        Ok(())
    })
}
