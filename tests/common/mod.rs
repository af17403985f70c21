// Scripted serial device and recording host capabilities shared by the integration tests.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use commstate_lib::host::{Context, HostLog, StateSink};
use commstate_lib::serial::{LineOpener, ModemStatus, SerialError, SerialLine};
use commstate_lib::{Session, SessionConfig};

pub const DEVICE_NAME: &str = "CommState";
pub const VARIABLE: &str = "commstateState";

#[derive(Default)]
struct DeviceState {
    present: bool,
    statuses: VecDeque<Option<u32>>,
    last_status: u32,
    read_delay: Option<Duration>,
    fail_control: bool,
    rts: bool,
    dtr: bool,
    opens: usize,
    reads: usize,
    control_calls: usize,
}

/// In-memory serial device. Status reads pop scripted values and repeat the
/// last one once the script runs out; `None` entries make the read fail.
#[derive(Clone, Default)]
pub struct FakeDevice(Arc<Mutex<DeviceState>>);

impl FakeDevice {
    pub fn present() -> Self {
        let device = Self::default();
        device.set_present(true);
        device
    }

    pub fn absent() -> Self {
        Self::default()
    }

    pub fn set_present(&self, present: bool) {
        self.0.lock().unwrap().present = present;
    }

    pub fn push_status(&self, bits: u32) {
        self.0.lock().unwrap().statuses.push_back(Some(bits));
    }

    pub fn push_read_failure(&self) {
        self.0.lock().unwrap().statuses.push_back(None);
    }

    pub fn set_read_delay(&self, delay: Duration) {
        self.0.lock().unwrap().read_delay = Some(delay);
    }

    pub fn set_control_failure(&self, fail: bool) {
        self.0.lock().unwrap().fail_control = fail;
    }

    pub fn rts(&self) -> bool {
        self.0.lock().unwrap().rts
    }

    pub fn dtr(&self) -> bool {
        self.0.lock().unwrap().dtr
    }

    pub fn opens(&self) -> usize {
        self.0.lock().unwrap().opens
    }

    pub fn reads(&self) -> usize {
        self.0.lock().unwrap().reads
    }

    pub fn control_calls(&self) -> usize {
        self.0.lock().unwrap().control_calls
    }

    fn control(&self, apply: impl FnOnce(&mut DeviceState)) -> Result<(), SerialError> {
        let mut state = self.0.lock().unwrap();
        state.control_calls += 1;
        if state.fail_control || !state.present {
            return Err(SerialError::SerialportError(serialport::Error::new(serialport::ErrorKind::NoDevice, "line control rejected")));
        }
        apply(&mut state);
        Ok(())
    }
}

struct FakeLine(FakeDevice);

impl SerialLine for FakeLine {
    fn modem_status(&mut self) -> Result<ModemStatus, SerialError> {
        let delay = self.0 .0.lock().unwrap().read_delay;
        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }

        let mut state = self.0 .0.lock().unwrap();
        state.reads += 1;
        if !state.present {
            return Err(SerialError::SerialportError(serialport::Error::new(serialport::ErrorKind::NoDevice, "device removed")));
        }
        match state.statuses.pop_front() {
            Some(Some(bits)) => {
                state.last_status = bits;
                Ok(ModemStatus::from_bits(bits))
            }
            Some(None) => Err(SerialError::SerialportError(serialport::Error::new(serialport::ErrorKind::NoDevice, "status read failed"))),
            None => Ok(ModemStatus::from_bits(state.last_status)),
        }
    }

    fn write_rts(&mut self, level: bool) -> Result<(), SerialError> {
        self.0.control(|state| state.rts = level)
    }

    fn write_dtr(&mut self, level: bool) -> Result<(), SerialError> {
        self.0.control(|state| state.dtr = level)
    }
}

impl LineOpener for FakeDevice {
    fn open(&self, port_id: &str) -> Result<Box<dyn SerialLine>, SerialError> {
        let mut state = self.0.lock().unwrap();
        if !state.present {
            return Err(SerialError::ConnectionFailed(format!("{}: not found", port_id)));
        }
        state.opens += 1;
        Ok(Box::new(FakeLine(self.clone())))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkEvent {
    Set(String, String),
    Cleared(String),
}

#[derive(Default)]
pub struct RecordingSink(Mutex<Vec<SinkEvent>>);

impl RecordingSink {
    pub fn events(&self) -> Vec<SinkEvent> {
        self.0.lock().unwrap().clone()
    }

    pub fn sets(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                SinkEvent::Set(_, value) => Some(value),
                SinkEvent::Cleared(_) => None,
            })
            .collect()
    }
}

impl StateSink for RecordingSink {
    fn set_variable(&self, name: &str, value: &str) {
        self.0.lock().unwrap().push(SinkEvent::Set(name.to_string(), value.to_string()));
    }

    fn clear_variable(&self, name: &str) {
        self.0.lock().unwrap().push(SinkEvent::Cleared(name.to_string()));
    }
}

#[derive(Default)]
pub struct RecordingLog(Mutex<Vec<String>>);

impl RecordingLog {
    pub fn lines(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn lines_containing(&self, needle: &str) -> Vec<String> {
        self.lines().into_iter().filter(|l| l.contains(needle)).collect()
    }
}

impl HostLog for RecordingLog {
    fn log(&self, line: &str) {
        self.0.lock().unwrap().push(line.to_string());
    }
}

pub struct Harness {
    pub session: Session,
    pub device: FakeDevice,
    pub sink: Arc<RecordingSink>,
    pub log: Arc<RecordingLog>,
}

pub fn harness(device: FakeDevice, poll_interval: Duration) -> Harness {
    let sink = Arc::new(RecordingSink::default());
    let log = Arc::new(RecordingLog::default());
    let context = Context::new(sink.clone(), log.clone());
    let config = SessionConfig::new(r"\\.\COM5", DEVICE_NAME).with_poll_interval(poll_interval);
    let session = Session::new(config, context, Arc::new(device.clone()));

    Harness { session, device, sink, log }
}

/// Poll `condition` until it holds or `timeout` expires.
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    condition()
}
