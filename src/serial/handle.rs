use std::sync::Arc;

use super::{LineOpener, Result, SerialLine};

/// The single connection to a named serial device.
///
/// The handle is either closed or holds an open line. Opening happens lazily
/// through [`SerialLineHandle::ensure_open`] and closing is idempotent. The
/// handle never retries on its own; the poller's cadence does that.
pub struct SerialLineHandle {
    port_id: String,
    opener: Arc<dyn LineOpener>,
    line: Option<Box<dyn SerialLine>>,
}

impl SerialLineHandle {
    pub fn new(port_id: impl Into<String>, opener: Arc<dyn LineOpener>) -> Self {
        Self {
            port_id: port_id.into(),
            opener,
            line: None,
        }
    }

    pub fn port_id(&self) -> &str {
        &self.port_id
    }

    /// Point the handle at another device. An open line is closed first.
    pub fn set_port_id(&mut self, port_id: impl Into<String>) {
        self.close();
        self.port_id = port_id.into();
    }

    pub fn is_open(&self) -> bool {
        self.line.is_some()
    }

    /// Return the open line, opening the port first if needed.
    ///
    /// On failure the handle stays closed.
    pub fn ensure_open(&mut self) -> Result<&mut (dyn SerialLine + 'static)> {
        let line = match self.line.take() {
            Some(line) => line,
            None => {
                let line = self.opener.open(&self.port_id)?;
                log::info!("Opened serial line {}", self.port_id);
                line
            }
        };
        Ok(self.line.insert(line).as_mut())
    }

    /// The open line, if any. Never opens the port.
    pub(crate) fn line_mut(&mut self) -> Option<&mut (dyn SerialLine + 'static)> {
        self.line.as_deref_mut()
    }

    /// Release the OS resource. Safe to call when already closed.
    pub fn close(&mut self) {
        if self.line.take().is_some() {
            log::info!("Closed serial line {}", self.port_id);
        }
    }
}

impl Drop for SerialLineHandle {
    fn drop(&mut self) {
        self.close();
    }
}
