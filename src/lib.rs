pub mod serial;
pub mod host;
pub mod monitor;
pub mod dispatch;
pub mod config;
pub mod plugin;

pub use host::{Context, HostLog, StateSink};
pub use monitor::{Session, SessionConfig, SessionError};
pub use plugin::Plugin;
