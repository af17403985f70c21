pub mod parser;

pub use parser::{parse_command, Command};

use crate::monitor::{lock, Shared};
use crate::serial::{ControlLine, LineError, SerialError};

/// Result code for a successfully executed command.
pub const RESULT_OK: i32 = 0;
pub const RESULT_NOT_CONNECTED: i32 = -1;
pub const RESULT_UNRECOGNIZED: i32 = -2;
pub const RESULT_DEVICE_ERROR: i32 = -3;

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Serial line is not open")]
    NotConnected,

    #[error("Unrecognized command: {0:?}")]
    UnrecognizedCommand(String),

    #[error("Line control failed: {0}")]
    DeviceError(#[source] SerialError),
}

impl DispatchError {
    /// Integer result code reported to the host.
    pub fn code(&self) -> i32 {
        match self {
            DispatchError::NotConnected => RESULT_NOT_CONNECTED,
            DispatchError::UnrecognizedCommand(_) => RESULT_UNRECOGNIZED,
            DispatchError::DeviceError(_) => RESULT_DEVICE_ERROR,
        }
    }
}

pub type Result<T> = std::result::Result<T, DispatchError>;

/// Collapse a dispatch result into the host's integer result code.
pub fn result_code(result: &Result<()>) -> i32 {
    match result {
        Ok(()) => RESULT_OK,
        Err(e) => e.code(),
    }
}

pub(crate) fn execute(shared: &Shared, text: &str) -> Result<()> {
    let (line, level) = match parse_command(text) {
        Command::SetRts(level) => (ControlLine::Rts, level),
        Command::SetDtr(level) => (ControlLine::Dtr, level),
        Command::Unrecognized => {
            log::debug!("{}: unrecognized command {:?}", shared.device_name, text);
            return Err(DispatchError::UnrecognizedCommand(text.trim_end().to_string()));
        }
    };

    let mut connection = lock(&shared.connection);
    match connection.handle.set_line(line, level) {
        Ok(()) => {
            log::debug!(
                "{}: {} {} on {}",
                shared.device_name,
                if level { "asserted" } else { "cleared" },
                line.as_str(),
                connection.handle.port_id()
            );
            Ok(())
        }
        Err(LineError::NotConnected) => {
            shared.context.log(&format!("{}: COM is not opened\n", shared.device_name));
            Err(DispatchError::NotConnected)
        }
        Err(LineError::DeviceError(e)) => {
            shared.context.log(&format!(
                "{}: {} control error on {}: {}\n",
                shared.device_name,
                line.as_str(),
                connection.handle.port_id(),
                e
            ));
            Err(DispatchError::DeviceError(e))
        }
    }
}
