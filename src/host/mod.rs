//! Capabilities the embedding host hands to a session.

use std::sync::Arc;

/// Name/value store the poller reports device state into.
pub trait StateSink: Send + Sync {
    fn set_variable(&self, name: &str, value: &str);

    /// Mark the variable as unknown.
    fn clear_variable(&self, name: &str);
}

/// Free-text log line sink owned by the host.
pub trait HostLog: Send + Sync {
    fn log(&self, line: &str);
}

/// Forwards host log lines to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogFacade;

impl HostLog for LogFacade {
    fn log(&self, line: &str) {
        log::info!("{}", line.trim_end());
    }
}

/// Sink that drops every update, for hosts without a variable store.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl StateSink for NullSink {
    fn set_variable(&self, _name: &str, _value: &str) {}
    fn clear_variable(&self, _name: &str) {}
}

/// Injected host capabilities shared by the poller and the dispatcher.
#[derive(Clone)]
pub struct Context {
    pub sink: Arc<dyn StateSink>,
    pub log: Arc<dyn HostLog>,
}

impl Context {
    pub fn new(sink: Arc<dyn StateSink>, log: Arc<dyn HostLog>) -> Self {
        Self { sink, log }
    }

    /// Context whose log lines go to the `log` facade.
    pub fn with_sink(sink: Arc<dyn StateSink>) -> Self {
        Self::new(sink, Arc::new(LogFacade))
    }

    pub(crate) fn log(&self, line: &str) {
        self.log.log(line);
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::with_sink(Arc::new(NullSink))
    }
}

/// Variable name the poller reports under: the lowercased device name
/// followed by `State`.
pub fn state_variable_name(device_name: &str) -> String {
    format!("{}State", device_name.to_lowercase())
}
