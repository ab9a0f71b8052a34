#![allow(unused_macros)]

macro_rules! ok_or_errno {
    ($success:expr => $($scb:tt)+) => {
        if $success {
            Ok($($scb)+)
        } else {
            Err(::std::io::Error::last_os_error())
        }
    };
}

/// Retries a libc call for as long as it fails with `EINTR`, evaluating to the first return value
/// that isn't an interrupted failure.
macro_rules! retry_eintr {
    ($call:expr) => {
        loop {
            let ret = $call;
            if ret == -1
                && ::std::io::Error::last_os_error().kind() == ::std::io::ErrorKind::Interrupted
            {
                continue;
            }
            break ret;
        }
    };
}

macro_rules! builder_setters {
    ($($(#[$attr:meta])* $name:ident : $ty:ty),+ $(,)?) => {$(
        $(#[$attr])*
        #[must_use = "builder setters take the entire structure and return the result"]
        #[inline(always)]
        pub fn $name(mut self, $name: $ty) -> Self {
            self.$name = $name;
            self
        }
    )+};
}

