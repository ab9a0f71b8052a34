use super::PipeRelay;
use std::{io::Write, time::Duration};

/// How long the drain worker waits for the pipe to become readable before checking whether the
/// relay has finished.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);
/// The shortest readiness wait timeout a relay accepts. Shorter ones are rounded up to it.
pub const MIN_TIMEOUT: Duration = Duration::from_millis(1);
/// Upper bound on the number of bytes moved by a single read.
pub const DEFAULT_CHUNK_SIZE: usize = 1024;

/// A builder for [`PipeRelay`]s.
///
/// ```
/// use pipe_relay::RelayOptions;
/// use std::{io::Write, time::Duration};
///
/// let relay = RelayOptions::new()
///     .interface("android.hardware.foo@1.0::IFoo")
///     .instance("default")
///     .timeout(Duration::from_millis(200))
///     .create(Vec::<u8>::new(), None::<std::io::Sink>);
/// relay.status()?;
/// relay.writer().unwrap().write_all(b"dump")?;
/// assert_eq!(relay.finish().output, b"dump");
/// # std::io::Result::Ok(())
/// ```
#[derive(Clone, Debug)]
pub struct RelayOptions {
    pub(crate) interface: String,
    pub(crate) instance: String,
    pub(crate) timeout: Duration,
    pub(crate) chunk_size: usize,
    pub(crate) cloexec: bool,
    pub(crate) thread_name: Option<String>,
}

/// Creation.
impl RelayOptions {
    /// Creates an options table with default values.
    #[inline]
    pub fn new() -> Self {
        Self {
            interface: String::new(),
            instance: String::new(),
            timeout: DEFAULT_TIMEOUT,
            chunk_size: DEFAULT_CHUNK_SIZE,
            cloexec: true,
            thread_name: None,
        }
    }
}

/// Option setters.
impl RelayOptions {
    /// Sets the readiness wait timeout.
    ///
    /// This is also how long the relay keeps draining after it has been told to finish, if no
    /// end-of-file comes first. The default is one second. Timeouts below [`MIN_TIMEOUT`] are
    /// rounded up to it, since a zero timeout would have the worker spin instead of wait.
    /// [`Duration::MAX`] and other timeouts that cannot be represented as a deadline are
    /// accepted; finishing a relay with a lingering writer then never completes.
    #[must_use = "builder setters take the entire structure and return the result"]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout.max(MIN_TIMEOUT);
        self
    }
    builder_setters! {
        /// Sets the maximum number of bytes read from the pipe at once. Zero is treated as one.
        ///
        /// The default is 1024.
        chunk_size: usize,
        /// Sets whether both pipe ends are created close-on-exec.
        ///
        /// This is enabled by default. Turn it off to let a child process spawned while the relay
        /// is alive inherit the write end.
        cloexec: bool,
    }
    /// Sets the name of the interface being dumped, used in diagnostics and the default thread
    /// name.
    #[must_use = "builder setters take the entire structure and return the result"]
    pub fn interface(mut self, interface: impl Into<String>) -> Self {
        self.interface = interface.into();
        self
    }
    /// Sets the name of the instance being dumped, used in diagnostics and the default thread name.
    #[must_use = "builder setters take the entire structure and return the result"]
    pub fn instance(mut self, instance: impl Into<String>) -> Self {
        self.instance = instance.into();
        self
    }
    /// Overrides the name given to the drain worker thread.
    #[must_use = "builder setters take the entire structure and return the result"]
    pub fn thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = Some(name.into());
        self
    }
}

/// Derived values.
impl RelayOptions {
    /// The label diagnostics are tagged with: `<interface>/<instance>`, or just whichever of the
    /// two is set, or `relay` if neither is.
    pub fn label(&self) -> String {
        match (self.interface.is_empty(), self.instance.is_empty()) {
            (false, false) => format!("{}/{}", self.interface, self.instance),
            (false, true) => self.interface.clone(),
            (true, false) => self.instance.clone(),
            (true, true) => "relay".to_owned(),
        }
    }
    /// The name the drain worker thread will be given.
    ///
    /// Unless overridden, this is `RelayThread_<interface>_<instance>` with the interface name
    /// cut down to whatever follows its last `.`, so that the distinguishing part survives the
    /// kernel's short thread name limit. Parts that are empty are left out along with their
    /// separator.
    pub fn resolved_thread_name(&self) -> String {
        let mut name = match &self.thread_name {
            Some(name) => name.clone(),
            None => {
                let short = self.interface.rsplit('.').next().unwrap_or_default();
                ["RelayThread", short, &self.instance]
                    .into_iter()
                    .filter(|part| !part.is_empty())
                    .collect::<Vec<_>>()
                    .join("_")
            }
        };
        // Thread names are C strings.
        name.retain(|c| c != '\0');
        name
    }
}

/// Relay constructor.
impl RelayOptions {
    /// Creates the pipe and starts draining it into `output`, reporting diagnostics to `errors`
    /// if one is given.
    ///
    /// This never fails outright: check [`status()`](PipeRelay::status) before handing out the
    /// write end.
    pub fn create<O, E>(self, output: O, errors: Option<E>) -> PipeRelay<O, E>
    where
        O: Write + Send + 'static,
        E: Write + Send + 'static,
    {
        PipeRelay::from_options(self, output, errors)
    }
}

impl Default for RelayOptions {
    #[inline]
    fn default() -> Self { Self::new() }
}
