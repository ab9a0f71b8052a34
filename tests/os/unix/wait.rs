use crate::{
    duration_to_poll_ms,
    os::unix::{c_wrappers, RawPipe},
    tests::util::{install_wakeup_handler, wakeups, SignalTarget},
};
use std::{
    sync::mpsc,
    thread,
    time::{Duration, Instant},
};

#[test]
fn poll_timeout_rounds_up() {
    assert_eq!(duration_to_poll_ms(Duration::ZERO), 0);
    assert_eq!(duration_to_poll_ms(Duration::from_millis(7)), 7);
    assert_eq!(duration_to_poll_ms(Duration::from_micros(1500)), 2);
    assert_eq!(duration_to_poll_ms(Duration::from_nanos(1)), 1);
    assert_eq!(duration_to_poll_ms(Duration::from_secs(u64::MAX)), libc::c_int::MAX);
}

#[test]
fn empty_pipe_times_out() {
    let pipe = RawPipe::new(true).unwrap();
    let timeout = Duration::from_millis(50);
    let start = Instant::now();
    assert!(!c_wrappers::wait_readable(pipe.read_end(), timeout).unwrap());
    assert!(start.elapsed() >= timeout / 2, "wait returned early: {:?}", start.elapsed());
}

#[test]
fn buffered_data_is_ready_immediately() {
    let pipe = RawPipe::new(true).unwrap();
    c_wrappers::write_some(pipe.write_end(), b"ready").unwrap();
    let start = Instant::now();
    assert!(c_wrappers::wait_readable(pipe.read_end(), Duration::from_secs(5)).unwrap());
    assert!(start.elapsed() < Duration::from_secs(5), "wait ran into its timeout");
}

#[test]
fn hangup_counts_as_readable() {
    let mut pipe = RawPipe::new(true).unwrap();
    pipe.close_write();
    assert!(c_wrappers::wait_readable(pipe.read_end(), Duration::from_secs(5)).unwrap());
    let mut buf = [0; 4];
    assert_eq!(c_wrappers::read_some(pipe.read_end(), &mut buf).unwrap(), 0);
}

#[test]
fn waiting_on_a_bogus_descriptor_fails() {
    // Far above any descriptor a test process will have open.
    let err = c_wrappers::wait_readable(1 << 20, Duration::from_millis(10)).unwrap_err();
    assert_eq!(err.raw_os_error(), Some(libc::EBADF));
}

#[test]
fn interrupted_wait_runs_out_the_full_window() {
    install_wakeup_handler().unwrap();
    let pipe = RawPipe::new(true).unwrap();
    let fd = pipe.read_end();
    let timeout = Duration::from_millis(200);

    let (tx, rx) = mpsc::channel();
    let waiter = thread::spawn(move || {
        tx.send(SignalTarget::current()).unwrap();
        let start = Instant::now();
        let ready = c_wrappers::wait_readable(fd, timeout);
        (ready, start.elapsed())
    });
    let target = rx.recv().unwrap();
    let before = wakeups();
    for _ in 0..3 {
        thread::sleep(timeout / 5);
        target.interrupt().unwrap();
    }
    let (ready, elapsed) = waiter.join().unwrap();

    assert!(!ready.unwrap(), "empty pipe reported readable");
    assert!(wakeups() > before, "no signal was handled");
    assert!(elapsed >= timeout * 19 / 20, "interrupted wait returned early: {elapsed:?}");
    assert!(elapsed < timeout * 5, "interruptions extended the wait: {elapsed:?}");
}

#[test]
fn interrupted_unbounded_wait_keeps_waiting() {
    install_wakeup_handler().unwrap();
    let pipe = RawPipe::new(true).unwrap();
    let fd = pipe.read_end();

    let (tx, rx) = mpsc::channel();
    let waiter = thread::spawn(move || {
        tx.send(SignalTarget::current()).unwrap();
        c_wrappers::wait_readable(fd, Duration::MAX)
    });
    let target = rx.recv().unwrap();
    for _ in 0..2 {
        thread::sleep(Duration::from_millis(50));
        target.interrupt().unwrap();
    }
    thread::sleep(Duration::from_millis(50));
    assert!(!waiter.is_finished(), "wait gave up after being interrupted");
    c_wrappers::write_some(pipe.write_end(), b"x").unwrap();
    assert!(waiter.join().unwrap().unwrap(), "wait ended without data");
}
