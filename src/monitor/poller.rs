use std::sync::{Arc, PoisonError};

use super::{lock, PollerState, Shared};

/// Poller thread body.
pub(super) fn run(shared: Arc<Shared>) {
    let port_id = lock(&shared.connection).handle.port_id().to_string();
    log::info!("Status poller started for {} on {}", shared.device_name, port_id);

    while shared.state() == PollerState::Running {
        poll_once(&shared);
        if !wait_for_next_poll(&shared) {
            break;
        }
    }

    {
        let mut connection = lock(&shared.connection);
        if connection.handle.is_open() {
            connection.handle.close();
            shared.context.log(&format!("{}: {} closed\n", shared.device_name, connection.handle.port_id()));
        }
    }
    shared.set_state(PollerState::Stopped);
    log::info!("Status poller stopped for {}", shared.device_name);
}

/// Sleep one poll interval. Returns early, with `false`, once a stop is requested.
fn wait_for_next_poll(shared: &Shared) -> bool {
    let state = lock(&shared.lifecycle);
    let (state, _) = shared
        .lifecycle_changed
        .wait_timeout_while(state, shared.poll_interval, |s| *s == PollerState::Running)
        .unwrap_or_else(PoisonError::into_inner);
    *state == PollerState::Running
}

/// Open the line if needed, read the modem status and report changes.
///
/// A missing device or a failed read clears the state variable. A failed read
/// does not close the handle.
pub(super) fn poll_once(shared: &Shared) {
    let mut guard = lock(&shared.connection);
    let connection = &mut *guard;

    let was_open = connection.handle.is_open();
    let reading = connection
        .handle
        .ensure_open()
        .and_then(|line| line.modem_status());

    if !was_open && connection.handle.is_open() {
        shared.context.log(&format!("{}: {} opened\n", shared.device_name, connection.handle.port_id()));
    }

    match reading {
        Ok(status) => {
            if connection.last_reported != Some(status) {
                connection.last_reported = Some(status);
                shared.context.log(&format!(
                    "{}: {} state = {}\n",
                    shared.device_name,
                    connection.handle.port_id(),
                    status
                ));
                shared.context.sink.set_variable(&shared.variable, &status.to_string());
            }
        }
        Err(e) => {
            log::debug!("{}: no modem status from {}: {}", shared.device_name, connection.handle.port_id(), e);
            connection.last_reported = None;
            shared.context.sink.clear_variable(&shared.variable);
        }
    }
}
