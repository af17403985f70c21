//! Host-facing plugin surface.
//!
//! Thin layer that maps host calls onto a [`Session`] and the persisted
//! [`Settings`], reporting integer result codes the way the host expects.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::config::{self, Settings};
use crate::dispatch;
use crate::host::Context;
use crate::monitor::{lock, Session, SessionConfig, SessionError};
use crate::serial::{LineOpener, SystemOpener};

pub const INTERFACE_MAJOR_VERSION: u16 = 1;
pub const INTERFACE_MINOR_VERSION: u16 = 0;

pub const SETTINGS_DIALOG_TEXT: &str = "No additional settings.";

/// Plugin interface version exchanged with the host on load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterfaceVersion {
    pub major: u16,
    pub minor: u16,
}

pub fn interface_version() -> InterfaceVersion {
    InterfaceVersion {
        major: INTERFACE_MAJOR_VERSION,
        minor: INTERFACE_MINOR_VERSION,
    }
}

pub struct Plugin {
    session: Session,
    settings: Mutex<Settings>,
    settings_path: PathBuf,
    /// Port loaded while connected, applied once the poller has stopped.
    pending_port: Mutex<Option<String>>,
    context: Context,
}

impl Plugin {
    /// Plugin on the system serial driver, named after the running module.
    pub fn new(context: Context, settings_path: impl Into<PathBuf>) -> Self {
        let config = SessionConfig::new(config::DEFAULT_PORT, config::default_device_name());
        Self::with_opener(config, context, settings_path, Arc::new(SystemOpener::new()))
    }

    /// Settings are loaded from `settings_path`; their port overrides
    /// `config.port_id`.
    pub fn with_opener(
        mut config: SessionConfig,
        context: Context,
        settings_path: impl Into<PathBuf>,
        opener: Arc<dyn LineOpener>,
    ) -> Self {
        let settings_path = settings_path.into();
        let settings = Settings::load(&settings_path);
        config.port_id = settings.com_port.clone();
        context.log(&format!("{} loaded\n", config.device_name));

        Self {
            session: Session::new(config, context.clone(), opener),
            settings: Mutex::new(settings),
            settings_path,
            pending_port: Mutex::new(None),
            context,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn settings_path(&self) -> &Path {
        &self.settings_path
    }

    /// Start polling. Returns 0, also when already connected.
    pub fn connect(&self) -> i32 {
        self.context.log("Connect\n");
        self.apply_pending_port();
        match self.session.start() {
            Ok(()) | Err(SessionError::AlreadyRunning) => 0,
            Err(e) => {
                log::error!("Connect failed: {}", e);
                -1
            }
        }
    }

    /// Stop polling and release the port.
    pub fn disconnect(&self) -> i32 {
        self.context.log("Disconnect\n");
        match self.session.stop() {
            Ok(()) => {
                self.apply_pending_port();
                0
            }
            Err(e) => {
                log::error!("Disconnect failed: {}", e);
                -1
            }
        }
    }

    fn apply_pending_port(&self) {
        let mut pending = lock(&self.pending_port);
        if let Some(port) = pending.take() {
            match self.session.set_port_id(port.as_str()) {
                Ok(()) => log::info!("Switched to port {}", port),
                Err(_) => *pending = Some(port),
            }
        }
    }

    pub fn send_message_text(&self, text: &str) -> i32 {
        dispatch::result_code(&self.session.dispatch(text))
    }

    pub fn port(&self) -> String {
        lock(&self.settings).com_port.clone()
    }

    /// Change the configured port. Takes effect only while disconnected.
    pub fn set_port(&self, port: &str) -> Result<(), SessionError> {
        self.session.set_port_id(port)?;
        lock(&self.pending_port).take();
        lock(&self.settings).com_port = port.to_string();
        Ok(())
    }

    /// Reread settings from disk. While connected the new port is applied
    /// at the next disconnect.
    pub fn load_settings(&self) -> Settings {
        let settings = Settings::load(&self.settings_path);
        let mut pending = lock(&self.pending_port);
        match self.session.set_port_id(settings.com_port.as_str()) {
            Ok(()) => *pending = None,
            Err(e) => {
                log::info!("Port change to {} deferred: {}", settings.com_port, e);
                *pending = Some(settings.com_port.clone());
            }
        }
        drop(pending);
        *lock(&self.settings) = settings.clone();
        settings
    }

    pub fn save_settings(&self) -> config::Result<()> {
        let settings = lock(&self.settings).clone();
        settings.save(&self.settings_path)
    }

    pub fn settings_dialog_text(&self) -> &'static str {
        SETTINGS_DIALOG_TEXT
    }

    /// Registration state notification; not used by this plugin.
    pub fn set_registration_state(&self, _state: i32) -> i32 {
        0
    }

    /// Call state notification; not used by this plugin.
    pub fn set_call_state(&self, _state: i32, _display: &str) -> i32 {
        0
    }

    /// Ring notification; not used by this plugin.
    pub fn ring(&self, _state: i32) -> i32 {
        0
    }
}
