use std::time::Duration;
use serialport::SerialPort;

use super::{ModemStatus, Result, SerialError};

pub const BAUD_RATE: u32 = 9600;
pub const OPEN_TIMEOUT_MS: u64 = 100;

/// Line-level operations on an open serial connection.
pub trait SerialLine: Send {
    /// Read the current modem status lines.
    fn modem_status(&mut self) -> Result<ModemStatus>;

    /// Drive the request-to-send output.
    fn write_rts(&mut self, level: bool) -> Result<()>;

    /// Drive the data-terminal-ready output.
    fn write_dtr(&mut self, level: bool) -> Result<()>;
}

/// Opens serial lines by port identifier.
pub trait LineOpener: Send + Sync {
    fn open(&self, port_id: &str) -> Result<Box<dyn SerialLine>>;
}

/// A serial line backed by the operating system driver.
pub struct SystemLine {
    port: Box<dyn SerialPort>,
}

impl SystemLine {
    pub fn new(port: Box<dyn SerialPort>) -> Self {
        Self { port }
    }
}

impl SerialLine for SystemLine {
    fn modem_status(&mut self) -> Result<ModemStatus> {
        let cts = self.port.read_clear_to_send()?;
        let dsr = self.port.read_data_set_ready()?;
        let ring = self.port.read_ring_indicator()?;
        let carrier = self.port.read_carrier_detect()?;
        Ok(ModemStatus::from_lines(cts, dsr, ring, carrier))
    }

    fn write_rts(&mut self, level: bool) -> Result<()> {
        self.port.write_request_to_send(level)?;
        Ok(())
    }

    fn write_dtr(&mut self, level: bool) -> Result<()> {
        self.port.write_data_terminal_ready(level)?;
        Ok(())
    }
}

/// Opens ports through the `serialport` crate.
#[derive(Debug, Clone)]
pub struct SystemOpener {
    baud_rate: u32,
    timeout: Duration,
}

impl SystemOpener {
    pub fn new() -> Self {
        Self {
            baud_rate: BAUD_RATE,
            timeout: Duration::from_millis(OPEN_TIMEOUT_MS),
        }
    }

    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    /// List the serial ports the system currently knows about
    pub fn available_ports() -> Result<Vec<String>> {
        let ports = serialport::available_ports()?;
        Ok(ports.into_iter().map(|p| p.port_name).collect())
    }
}

impl Default for SystemOpener {
    fn default() -> Self {
        Self::new()
    }
}

impl LineOpener for SystemOpener {
    fn open(&self, port_id: &str) -> Result<Box<dyn SerialLine>> {
        let port = serialport::new(port_id, self.baud_rate)
            .timeout(self.timeout)
            .open()
            .map_err(|e| SerialError::ConnectionFailed(format!("{}: {}", port_id, e)))?;

        Ok(Box::new(SystemLine::new(port)))
    }
}
