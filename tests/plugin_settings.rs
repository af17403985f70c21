mod common;

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use commstate_lib::config::Settings;
use commstate_lib::host::Context;
use commstate_lib::{Plugin, SessionConfig};
use common::{FakeDevice, RecordingLog, RecordingSink, DEVICE_NAME};

fn plugin(device: &FakeDevice, path: &std::path::Path) -> (Plugin, Arc<RecordingSink>, Arc<RecordingLog>) {
    let sink = Arc::new(RecordingSink::default());
    let log = Arc::new(RecordingLog::default());
    let config = SessionConfig::new("unused", DEVICE_NAME).with_poll_interval(Duration::from_millis(10));
    let plugin = Plugin::with_opener(config, Context::new(sink.clone(), log.clone()), path, Arc::new(device.clone()));
    (plugin, sink, log)
}

#[test]
fn test_port_comes_from_settings_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("commstate.cfg");
    fs::write(&path, r#"{ "ComPort": "\\\\.\\COM5" }"#).unwrap();

    let (plugin, _, _) = plugin(&FakeDevice::absent(), &path);

    assert_eq!(plugin.port(), r"\\.\COM5");
    assert_eq!(plugin.session().port_id(), r"\\.\COM5");
}

#[test]
fn test_set_port_and_save() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("commstate.cfg");
    let (plugin, _, _) = plugin(&FakeDevice::absent(), &path);

    plugin.set_port("/dev/ttyUSB1").unwrap();
    plugin.save_settings().unwrap();

    assert_eq!(Settings::load(&path).com_port, "/dev/ttyUSB1");
    assert_eq!(plugin.session().port_id(), "/dev/ttyUSB1");
}

#[test]
fn test_port_is_fixed_while_connected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("commstate.cfg");
    let (plugin, _, _) = plugin(&FakeDevice::absent(), &path);

    assert_eq!(plugin.connect(), 0);
    assert!(plugin.set_port("/dev/ttyUSB2").is_err());
    assert_eq!(plugin.disconnect(), 0);
    assert!(plugin.set_port("/dev/ttyUSB2").is_ok());
}

#[test]
fn test_load_settings_rereads_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("commstate.cfg");
    let (plugin, _, _) = plugin(&FakeDevice::absent(), &path);

    fs::write(&path, r#"{ "ComPort": "/dev/ttyACM0" }"#).unwrap();
    let settings = plugin.load_settings();

    assert_eq!(settings.com_port, "/dev/ttyACM0");
    assert_eq!(plugin.port(), "/dev/ttyACM0");
    assert_eq!(plugin.session().port_id(), "/dev/ttyACM0");
}

#[test]
fn test_connect_twice_and_send_commands() {
    let dir = tempfile::tempdir().unwrap();
    let device = FakeDevice::present();
    device.push_status(0x20);
    let (plugin, sink, log) = plugin(&device, &dir.path().join("commstate.cfg"));

    assert_eq!(plugin.connect(), 0);
    assert_eq!(plugin.connect(), 0);
    assert!(common::wait_until(Duration::from_secs(2), || plugin.session().is_open()));

    assert_eq!(plugin.send_message_text("SET RTS 1"), 0);
    assert_eq!(plugin.send_message_text("NOPE"), -2);
    assert!(device.rts());

    assert_eq!(plugin.disconnect(), 0);
    assert_eq!(plugin.send_message_text("SET RTS 0"), -1);
    assert_eq!(sink.sets(), vec!["32".to_string()]);
    assert_eq!(log.lines_containing("Worker thread created.").len(), 1);
    assert!(log.lines().iter().any(|l| l.starts_with("Connect")));
    assert!(log.lines().iter().any(|l| l.starts_with("Disconnect")));
}

#[test]
fn test_port_loaded_while_connected_applies_after_disconnect() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("commstate.cfg");
    fs::write(&path, r#"{ "ComPort": "/dev/ttyS0" }"#).unwrap();
    let (plugin, _, _) = plugin(&FakeDevice::absent(), &path);

    assert_eq!(plugin.connect(), 0);
    fs::write(&path, r#"{ "ComPort": "/dev/ttyUSB3" }"#).unwrap();
    assert_eq!(plugin.load_settings().com_port, "/dev/ttyUSB3");
    assert_eq!(plugin.session().port_id(), "/dev/ttyS0");

    assert_eq!(plugin.disconnect(), 0);
    assert_eq!(plugin.session().port_id(), "/dev/ttyUSB3");

    assert_eq!(plugin.connect(), 0);
    assert_eq!(plugin.session().port_id(), plugin.port());
    assert_eq!(plugin.disconnect(), 0);
}
