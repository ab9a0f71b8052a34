//! Relays the output of a shell command that writes into an inherited descriptor.
//!
//! Run with `cargo run --example relay -- 'echo hello from $$ >&3'`.

use pipe_relay::RelayOptions;
use std::{
    io::{self, Write},
    os::fd::{AsRawFd, OwnedFd},
    os::unix::process::CommandExt,
    process::Command,
    time::Duration,
};

fn main() -> io::Result<()> {
    tracing_subscriber::fmt().with_env_filter("pipe_relay=debug").init();
    let script = std::env::args().nth(1).unwrap_or_else(|| "echo hello >&3".to_owned());

    let relay = RelayOptions::new()
        .interface("demo.shell.ISh")
        .instance("default")
        .timeout(Duration::from_millis(500))
        .create(Vec::<u8>::new(), Some(io::stderr()));
    relay.status()?;

    let child_end: OwnedFd = relay.write_end().unwrap().try_clone_to_owned()?;
    let raw = child_end.as_raw_fd();
    let mut cmd = Command::new("/bin/sh");
    cmd.arg("-c").arg(&script);
    // SAFETY: dup2() and fcntl() are async-signal-safe.
    unsafe {
        cmd.pre_exec(move || {
            // dup2() onto itself leaves close-on-exec set.
            let ret = if raw == 3 { libc::fcntl(3, libc::F_SETFD, 0) } else { libc::dup2(raw, 3) };
            match ret {
                -1 => Err(io::Error::last_os_error()),
                _ => Ok(()),
            }
        });
    }
    let status = cmd.status()?;
    drop(child_end);

    let drained = relay.finish();
    io::stdout().write_all(&drained.output)?;
    eprintln!("{script:?} exited with {status}, relay outcome: {:?}", drained.outcome);
    Ok(())
}
