//! Integration tests for DomeController: actuator commands, request
//! priority, failure retry and shutter classification.

use crate::mock_hw::{RecordingActuator, ScriptedBoundary};

use skywatch::app::ports::ShutterPort;
use skywatch::dome::DomeController;
use skywatch::dome::shared::{DomeHandle, DomeShared};
use skywatch::dome::state::{ShutterCommand, ShutterState};
use skywatch::error::ActuatorError;

fn controller(
    shared: &DomeShared,
    open: bool,
    closed: bool,
) -> (DomeController<'_, RecordingActuator, ScriptedBoundary>, RecordingActuator, ScriptedBoundary) {
    let actuator = RecordingActuator::new();
    let boundary = ScriptedBoundary::new(open, closed);
    let dome = DomeController::new(actuator.clone(), boundary.clone(), shared);
    (dome, actuator, boundary)
}

// ── Initial classification ────────────────────────────────────

#[test]
fn initial_state_follows_sensors() {
    let shared = DomeShared::new();
    let (dome, _, _) = controller(&shared, false, true);
    assert_eq!(dome.state(), ShutterState::Closed);

    let shared = DomeShared::new();
    let (dome, _, _) = controller(&shared, true, false);
    assert_eq!(dome.state(), ShutterState::Open);

    // Nothing asserted at power-up: assumed closing.
    let shared = DomeShared::new();
    let (dome, _, _) = controller(&shared, false, false);
    assert_eq!(dome.state(), ShutterState::Closing);
}

#[test]
fn both_sensors_asserted_reads_as_closed() {
    let shared = DomeShared::new();
    let (dome, _, _) = controller(&shared, true, true);
    assert_eq!(dome.state(), ShutterState::Closed);
}

// ── Commands ──────────────────────────────────────────────────

#[test]
fn open_and_close_drive_the_actuator() {
    let shared = DomeShared::new();
    let (mut dome, actuator, _) = controller(&shared, false, true);

    dome.open().unwrap();
    assert!(!shared.status().close_command);
    dome.close().unwrap();
    assert!(shared.status().close_command);
    assert_eq!(actuator.levels(), vec![true, false]);
    assert!(!shared.status().actuator_fault);
}

#[test]
fn failed_close_stays_pending_and_is_retried_by_poll() {
    let shared = DomeShared::new();
    let (mut dome, actuator, _) = controller(&shared, true, false);
    actuator.fail_with(Some(ActuatorError::BusBusy));

    assert_eq!(dome.close(), Err(ActuatorError::BusBusy));
    assert!(shared.has_pending_request());
    assert!(shared.status().actuator_fault);

    let report = dome.poll();
    assert_eq!(report.failed, Some((ShutterCommand::Close, ActuatorError::BusBusy)));
    assert!(shared.has_pending_request(), "still pending after a second failure");

    actuator.fail_with(None);
    let report = dome.poll();
    assert_eq!(report.failed, None);
    assert!(!shared.has_pending_request());
    assert!(!shared.status().actuator_fault);
    assert_eq!(actuator.levels(), vec![false, false, false]);
}

#[test]
fn close_request_wins_over_open_request() {
    let shared = DomeShared::new();
    let (mut dome, actuator, _) = controller(&shared, false, true);

    let mut handle = DomeHandle::new(&shared);
    handle.open().unwrap();
    handle.close().unwrap();
    dome.poll();

    assert_eq!(actuator.levels(), vec![false]);
    assert!(!shared.has_pending_request(), "close also drops the pending open");
}

#[test]
fn close_cancels_a_failed_open() {
    let shared = DomeShared::new();
    let (mut dome, actuator, _) = controller(&shared, false, true);
    actuator.fail_with(Some(ActuatorError::PinWrite));
    assert!(dome.open().is_err());
    assert!(shared.has_pending_request());

    actuator.fail_with(None);
    dome.close().unwrap();
    assert!(!shared.has_pending_request());
    dome.poll();
    assert_eq!(actuator.levels(), vec![true, false]);
}

#[test]
fn handle_queues_until_the_dome_polls() {
    let shared = DomeShared::new();
    let (mut dome, actuator, _) = controller(&shared, false, true);
    let mut handle = DomeHandle::new(&shared);

    handle.open().unwrap();
    assert!(actuator.levels().is_empty());
    dome.poll();
    assert_eq!(actuator.levels(), vec![true]);
    assert_eq!(handle.state(), ShutterState::Closed);
}

// ── Shutter state tracking ────────────────────────────────────

#[test]
fn full_open_close_cycle() {
    let shared = DomeShared::new();
    let (mut dome, _, boundary) = controller(&shared, false, true);

    dome.open().unwrap();
    boundary.set(false, false);
    assert_eq!(dome.poll().changed, Some((ShutterState::Closed, ShutterState::Opening)));
    boundary.set(true, false);
    assert_eq!(dome.poll().changed, Some((ShutterState::Opening, ShutterState::Open)));
    assert_eq!(dome.poll().changed, None);

    dome.close().unwrap();
    boundary.set(false, false);
    assert_eq!(dome.poll().changed, Some((ShutterState::Open, ShutterState::Closing)));
    boundary.set(false, true);
    assert_eq!(dome.poll().changed, Some((ShutterState::Closing, ShutterState::Closed)));

    let status = shared.status();
    assert!(status.shutter_closed);
    assert!(!status.shutter_open);
    assert_eq!(status.shutter_status, ShutterState::Closed);
}

#[test]
fn edges_trigger_reclassification_between_polls() {
    let shared = DomeShared::new();
    let (mut dome, _, boundary) = controller(&shared, false, true);

    boundary.set(false, false);
    assert_eq!(dome.service_edges(), None, "no edge flagged yet");
    assert_eq!(dome.state(), ShutterState::Closed);

    shared.notify_closed_edge();
    assert_eq!(dome.service_edges(), Some((ShutterState::Closed, ShutterState::Opening)));
    assert_eq!(dome.service_edges(), None, "edge consumed");
}
