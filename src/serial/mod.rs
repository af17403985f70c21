pub mod control;
pub mod handle;
pub mod interface;
pub mod status;

pub use control::{ControlLine, LineError};
pub use handle::SerialLineHandle;
pub use interface::{LineOpener, SerialLine, SystemLine, SystemOpener};
pub use status::ModemStatus;

#[derive(Debug, thiserror::Error)]
pub enum SerialError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Serialport error: {0}")]
    SerialportError(#[from] serialport::Error),
}

pub type Result<T> = std::result::Result<T, SerialError>;
