//! Monitoring session: one serial line, one background poller.
//!
//! A [`Session`] owns the serial handle behind a single connection lock and
//! drives the poller thread through `Stopped -> Running -> Stopping -> Stopped`.
//! Text commands are dispatched against the same lock.

mod poller;

use std::io;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::dispatch;
use crate::host::{state_variable_name, Context};
use crate::serial::{LineOpener, ModemStatus, SerialLineHandle, SystemOpener};

pub const POLL_SLICE_MS: u64 = 100;
pub const POLL_SLICES: u32 = 10;
pub const DEFAULT_STOP_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Poller already running")]
    AlreadyRunning,

    #[error("Failed to create worker thread: {0}")]
    ThreadStartFailure(#[source] io::Error),

    #[error("Poller did not stop within {0:?}")]
    StopTimeout(Duration),
}

pub type Result<T> = std::result::Result<T, SessionError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerState {
    Stopped,
    Running,
    Stopping,
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub port_id: String,
    /// Names the state variable and prefixes log lines.
    pub device_name: String,
    pub poll_interval: Duration,
    /// `None` waits for the poller indefinitely.
    pub stop_timeout: Option<Duration>,
}

impl SessionConfig {
    pub fn new(port_id: impl Into<String>, device_name: impl Into<String>) -> Self {
        Self {
            port_id: port_id.into(),
            device_name: device_name.into(),
            poll_interval: Duration::from_millis(POLL_SLICE_MS) * POLL_SLICES,
            stop_timeout: Some(Duration::from_secs(DEFAULT_STOP_TIMEOUT_SECS)),
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_stop_timeout(mut self, stop_timeout: Option<Duration>) -> Self {
        self.stop_timeout = stop_timeout;
        self
    }
}

/// State guarded by the connection lock.
pub(crate) struct Connection {
    pub(crate) handle: SerialLineHandle,
    /// Last snapshot sent to the sink; `None` while the variable is cleared.
    pub(crate) last_reported: Option<ModemStatus>,
}

pub(crate) struct Shared {
    pub(crate) connection: Mutex<Connection>,
    lifecycle: Mutex<PollerState>,
    lifecycle_changed: Condvar,
    pub(crate) context: Context,
    pub(crate) device_name: String,
    pub(crate) variable: String,
    poll_interval: Duration,
}

impl Shared {
    fn state(&self) -> PollerState {
        *lock(&self.lifecycle)
    }

    fn set_state(&self, state: PollerState) {
        *lock(&self.lifecycle) = state;
        self.lifecycle_changed.notify_all();
    }
}

/// Lock a mutex, recovering the data if a holder panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct Session {
    shared: Arc<Shared>,
    worker: Mutex<Option<JoinHandle<()>>>,
    stop_timeout: Option<Duration>,
}

impl Session {
    pub fn new(config: SessionConfig, context: Context, opener: Arc<dyn LineOpener>) -> Self {
        let handle = SerialLineHandle::new(config.port_id, opener);
        let shared = Shared {
            connection: Mutex::new(Connection {
                handle,
                last_reported: None,
            }),
            lifecycle: Mutex::new(PollerState::Stopped),
            lifecycle_changed: Condvar::new(),
            context,
            variable: state_variable_name(&config.device_name),
            device_name: config.device_name,
            poll_interval: config.poll_interval,
        };

        Self {
            shared: Arc::new(shared),
            worker: Mutex::new(None),
            stop_timeout: config.stop_timeout,
        }
    }

    /// Session on a real serial port.
    pub fn system(config: SessionConfig, context: Context) -> Self {
        Self::new(config, context, Arc::new(SystemOpener::new()))
    }

    pub fn state(&self) -> PollerState {
        self.shared.state()
    }

    pub fn is_running(&self) -> bool {
        self.state() == PollerState::Running
    }

    pub fn is_open(&self) -> bool {
        lock(&self.shared.connection).handle.is_open()
    }

    pub fn port_id(&self) -> String {
        lock(&self.shared.connection).handle.port_id().to_string()
    }

    /// Change the port. Only allowed while the poller is stopped.
    pub fn set_port_id(&self, port_id: impl Into<String>) -> Result<()> {
        let _worker = lock(&self.worker);
        if self.state() != PollerState::Stopped {
            return Err(SessionError::AlreadyRunning);
        }
        let mut connection = lock(&self.shared.connection);
        connection.handle.set_port_id(port_id);
        connection.last_reported = None;
        Ok(())
    }

    /// Name of the variable the poller reports into.
    pub fn variable_name(&self) -> &str {
        &self.shared.variable
    }

    /// Spawn the poller thread.
    pub fn start(&self) -> Result<()> {
        let mut worker = lock(&self.worker);
        {
            let mut state = lock(&self.shared.lifecycle);
            if *state != PollerState::Stopped {
                log::warn!("Poller for {} already running", self.shared.device_name);
                return Err(SessionError::AlreadyRunning);
            }
            *state = PollerState::Running;
        }

        // A worker left behind by a timed-out stop has finished by now.
        if let Some(previous) = worker.take() {
            let _ = previous.join();
        }

        let shared = Arc::clone(&self.shared);
        let spawned = thread::Builder::new()
            .name(format!("{}-poller", self.shared.device_name.replace('\0', "")))
            .spawn(move || poller::run(shared));

        match spawned {
            Ok(handle) => {
                *worker = Some(handle);
                self.shared.context.log("Worker thread created.\n");
                Ok(())
            }
            Err(e) => Err(self.spawn_failed(e)),
        }
    }

    fn spawn_failed(&self, e: io::Error) -> SessionError {
        self.shared.set_state(PollerState::Stopped);
        self.shared.context.log("Failed to create worker thread.");
        log::error!("Failed to spawn poller for {}: {}", self.shared.device_name, e);
        SessionError::ThreadStartFailure(e)
    }

    /// Stop the poller using the configured timeout.
    pub fn stop(&self) -> Result<()> {
        self.stop_within(self.stop_timeout)
    }

    /// Request the poller to stop and wait until it has exited.
    ///
    /// Returns [`SessionError::StopTimeout`] if the poller is still inside a
    /// device call when `timeout` expires; it keeps winding down on its own and
    /// the session stays in `Stopping` until it does.
    pub fn stop_within(&self, timeout: Option<Duration>) -> Result<()> {
        let mut worker = lock(&self.worker);
        {
            let mut state = lock(&self.shared.lifecycle);
            if *state == PollerState::Running {
                *state = PollerState::Stopping;
                self.shared.lifecycle_changed.notify_all();
            }

            let not_stopped = |s: &mut PollerState| *s != PollerState::Stopped;
            match timeout {
                Some(limit) => {
                    let (_state, wait) = self
                        .shared
                        .lifecycle_changed
                        .wait_timeout_while(state, limit, not_stopped)
                        .unwrap_or_else(PoisonError::into_inner);
                    if wait.timed_out() {
                        log::warn!("Poller for {} did not stop within {:?}", self.shared.device_name, limit);
                        return Err(SessionError::StopTimeout(limit));
                    }
                }
                None => {
                    let _state = self
                        .shared
                        .lifecycle_changed
                        .wait_while(state, not_stopped)
                        .unwrap_or_else(PoisonError::into_inner);
                }
            }
        }

        if let Some(handle) = worker.take() {
            if handle.join().is_err() {
                log::error!("Poller thread for {} panicked", self.shared.device_name);
            }
        }
        Ok(())
    }

    /// Run one poll cycle on the calling thread.
    pub fn poll_once(&self) {
        poller::poll_once(&self.shared);
    }

    /// Parse and execute a text command against the serial line.
    pub fn dispatch(&self, text: &str) -> dispatch::Result<()> {
        dispatch::execute(&self.shared, text)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.state() != PollerState::Stopped {
            let _ = self.stop();
        }
    }
}
