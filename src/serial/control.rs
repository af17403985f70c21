//! RTS/DTR line control on top of [`SerialLineHandle`].
//!
//! A failed line-control call tears the handle down so the next poll cycle or
//! command reopens the port. Nothing here logs; callers decide what to report.

use super::{SerialError, SerialLineHandle};

/// Output control lines that can be driven by software.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlLine {
    Rts,
    Dtr,
}

impl ControlLine {
    pub fn as_str(&self) -> &'static str {
        match self {
            ControlLine::Rts => "RTS",
            ControlLine::Dtr => "DTR",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LineError {
    #[error("Serial line is not open")]
    NotConnected,

    #[error("Line control failed: {0}")]
    DeviceError(#[source] SerialError),
}

impl SerialLineHandle {
    /// Assert or clear `line`. Requires an open handle and never opens one.
    pub fn set_line(&mut self, line: ControlLine, level: bool) -> Result<(), LineError> {
        let port = self.line_mut().ok_or(LineError::NotConnected)?;
        let result = match line {
            ControlLine::Rts => port.write_rts(level),
            ControlLine::Dtr => port.write_dtr(level),
        };

        result.map_err(|e| {
            self.close();
            LineError::DeviceError(e)
        })
    }

    pub fn assert_rts(&mut self) -> Result<(), LineError> {
        self.set_line(ControlLine::Rts, true)
    }

    pub fn clear_rts(&mut self) -> Result<(), LineError> {
        self.set_line(ControlLine::Rts, false)
    }

    pub fn assert_dtr(&mut self) -> Result<(), LineError> {
        self.set_line(ControlLine::Dtr, true)
    }

    pub fn clear_dtr(&mut self) -> Result<(), LineError> {
        self.set_line(ControlLine::Dtr, false)
    }
}
