#[cfg(not(unix))]
compile_error!(
    "pipe-relay drains POSIX pipes with poll(2) and read(2) and only supports Unix-like targets"
);
