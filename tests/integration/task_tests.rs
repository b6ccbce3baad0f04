//! Loop bodies of the two tasks, wired together the way `main` wires
//! them: the lookout talks to the dome only through a `DomeHandle`.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;

use crate::mock_hw::{FixedSensors, MockNvs, RecordingActuator, RecordingSink, ScriptedBoundary, calm};

use skywatch::app::commands::AppCommand;
use skywatch::app::events::AppEvent;
use skywatch::app::service::LookoutService;
use skywatch::app::tasks::{StatusTimer, dome_step, drain_commands, lookout_cycle};
use skywatch::config::SystemConfig;
use skywatch::dome::DomeController;
use skywatch::dome::shared::{DomeHandle, DomeShared};
use skywatch::dome::state::{ShutterCommand, ShutterState};
use skywatch::error::{ActuatorError, SafetyAlarm};
use skywatch::lookout::Decision;
use skywatch::lookout::latch::RainEventLatch;
use skywatch::lookout::status::SafetyMonitor;

type Commands = Channel<CriticalSectionRawMutex, AppCommand, 4>;

#[test]
fn dome_step_reports_shutter_change_and_keeps_close_failure_for_the_lookout() {
    let shared = DomeShared::new();
    let actuator = RecordingActuator::new();
    let boundary = ScriptedBoundary::new(true, false);
    let mut dome = DomeController::new(actuator.clone(), boundary.clone(), &shared);
    let mut sink = RecordingSink::new();

    actuator.fail_with(Some(ActuatorError::NotConnected));
    shared.request_close();
    boundary.set(false, false);
    let report = dome_step(&mut dome, true, &mut sink);

    assert_eq!(report.changed, Some((ShutterState::Open, ShutterState::Closing)));
    assert_eq!(report.failed, Some((ShutterCommand::Close, ActuatorError::NotConnected)));
    assert!(sink.alarms().is_empty(), "the lookout task raises the alarm");
    assert_eq!(
        sink.count(|e| matches!(
            e,
            AppEvent::ShutterChanged {
                to: ShutterState::Closing,
                ..
            }
        )),
        1
    );
    assert_eq!(shared.take_close_failure(), Some(ActuatorError::NotConnected));
}

#[test]
fn failed_open_from_queue_is_not_an_alarm() {
    let shared = DomeShared::new();
    let actuator = RecordingActuator::new();
    let mut dome = DomeController::new(actuator.clone(), ScriptedBoundary::new(false, true), &shared);
    let mut sink = RecordingSink::new();

    actuator.fail_with(Some(ActuatorError::PinWrite));
    shared.request_open();
    let report = dome_step(&mut dome, true, &mut sink);
    assert!(report.failed.is_some());
    assert!(sink.alarms().is_empty());
    assert_eq!(shared.take_close_failure(), None);
}

#[test]
fn edge_only_step_leaves_requests_queued() {
    let shared = DomeShared::new();
    let actuator = RecordingActuator::new();
    let mut dome = DomeController::new(actuator.clone(), ScriptedBoundary::new(false, true), &shared);
    let mut sink = RecordingSink::new();

    shared.request_open();
    dome_step(&mut dome, false, &mut sink);
    assert!(actuator.levels().is_empty());
    assert!(shared.has_pending_request());
}

#[test]
fn lookout_and_dome_cooperate_through_the_handle() {
    let shared = DomeShared::new();
    let latch = RainEventLatch::new();
    let monitor = SafetyMonitor::new();
    let commands = Commands::new();
    let nvs = MockNvs::new();

    let mut cfg = SystemConfig::default();
    cfg.lookout.safe_wind_speed[0].delay_secs = 10;
    cfg.lookout.safe_cloud_coverage[0].delay_secs = 10;
    cfg.lookout.safe_rain_intensity[0].delay_secs = 10;

    let mut svc = LookoutService::new(cfg, &latch, &monitor);
    let actuator = RecordingActuator::new();
    let mut dome = DomeController::new(actuator.clone(), ScriptedBoundary::new(false, true), &shared);
    let mut handle = DomeHandle::new(&shared);
    let mut sensors = FixedSensors::new(calm());
    let mut sink = RecordingSink::new();
    let mut status = StatusTimer::new(60);

    svc.start(&mut handle, &mut sink);

    let d = lookout_cycle(&mut svc, &commands, 0, &mut sensors, &mut handle, &mut sink, &nvs, &mut status);
    assert_eq!(d, Decision::Unsafe);
    dome_step(&mut dome, true, &mut sink);
    assert_eq!(actuator.levels(), vec![false]);

    let d = lookout_cycle(&mut svc, &commands, 10, &mut sensors, &mut handle, &mut sink, &nvs, &mut status);
    assert_eq!(d, Decision::Safe);
    dome_step(&mut dome, true, &mut sink);
    assert_eq!(actuator.levels(), vec![false, true]);

    // A client closes by hand: the lookout stops reopening it.
    assert!(commands.try_send(AppCommand::CloseShutter).is_ok());
    lookout_cycle(&mut svc, &commands, 11, &mut sensors, &mut handle, &mut sink, &nvs, &mut status);
    dome_step(&mut dome, true, &mut sink);
    assert!(svc.is_suspended());
    assert_eq!(actuator.levels(), vec![false, true, false]);

    lookout_cycle(&mut svc, &commands, 12, &mut sensors, &mut handle, &mut sink, &nvs, &mut status);
    dome_step(&mut dome, true, &mut sink);
    assert_eq!(actuator.levels(), vec![false, true, false]);
}

#[test]
fn status_event_carries_dome_block_once_per_interval() {
    let shared = DomeShared::new();
    let latch = RainEventLatch::new();
    let monitor = SafetyMonitor::new();
    let commands = Commands::new();
    let nvs = MockNvs::new();
    let mut svc = LookoutService::new(SystemConfig::default(), &latch, &monitor);
    let mut handle = DomeHandle::new(&shared);
    let mut sensors = FixedSensors::new(calm());
    let mut sink = RecordingSink::new();
    let mut status = StatusTimer::new(60);

    for t in 0..61 {
        lookout_cycle(&mut svc, &commands, t, &mut sensors, &mut handle, &mut sink, &nvs, &mut status);
    }
    let reports: Vec<_> = sink
        .events
        .iter()
        .filter_map(|e| match e {
            AppEvent::Status(s) => Some(s.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[1].uptime_secs, 60);
    let dome = reports[0].dome.expect("dome fitted by default");
    assert_eq!(dome.shutter_status, ShutterState::Closing);
}

#[test]
fn drained_config_update_is_saved_by_the_cycle() {
    let shared = DomeShared::new();
    let latch = RainEventLatch::new();
    let monitor = SafetyMonitor::new();
    let commands = Commands::new();
    let nvs = MockNvs::new();
    let mut svc = LookoutService::new(SystemConfig::default(), &latch, &monitor);
    let mut handle = DomeHandle::new(&shared);
    let mut sink = RecordingSink::new();

    let mut cfg = SystemConfig::default();
    cfg.status_interval_secs = 30;
    assert!(commands.try_send(AppCommand::UpdateConfig(cfg.clone())).is_ok());
    assert!(commands.try_send(AppCommand::SaveConfig).is_ok());
    assert_eq!(drain_commands(&commands, &mut svc, &mut handle, &mut sink), 2);
    assert_eq!(svc.config(), &cfg);

    let mut sensors = FixedSensors::new(calm());
    let mut status = StatusTimer::new(60);
    lookout_cycle(&mut svc, &commands, 0, &mut sensors, &mut handle, &mut sink, &nvs, &mut status);
    assert_eq!(nvs.saves.get(), 1);
    assert_eq!(nvs.stored.borrow().as_ref(), Some(&cfg));
}

#[test]
fn queued_close_failures_reach_the_alarm_log() {
    let shared = DomeShared::new();
    let latch = RainEventLatch::new();
    let monitor = SafetyMonitor::new();
    let commands = Commands::new();
    let nvs = MockNvs::new();
    let mut svc = LookoutService::new(SystemConfig::default(), &latch, &monitor);
    let actuator = RecordingActuator::new();
    let mut dome = DomeController::new(actuator.clone(), ScriptedBoundary::new(true, false), &shared);
    let mut handle = DomeHandle::new(&shared);
    let mut sensors = FixedSensors::new(calm());
    let mut lookout_sink = RecordingSink::new();
    let mut dome_sink = RecordingSink::new();
    let mut status = StatusTimer::new(60);

    svc.start(&mut handle, &mut lookout_sink);
    actuator.fail_with(Some(ActuatorError::BusBusy));
    for t in 0..3 {
        lookout_cycle(&mut svc, &commands, t, &mut sensors, &mut handle, &mut lookout_sink, &nvs, &mut status);
        dome_step(&mut dome, true, &mut dome_sink);
    }
    actuator.fail_with(None);
    for t in 3..5 {
        lookout_cycle(&mut svc, &commands, t, &mut sensors, &mut handle, &mut lookout_sink, &nvs, &mut status);
        dome_step(&mut dome, true, &mut dome_sink);
    }

    // One alarm per failed attempt, each collected on the following cycle.
    assert_eq!(
        lookout_sink.alarms(),
        vec![SafetyAlarm::InterlockCloseFailed(ActuatorError::BusBusy); 3]
    );
    assert!(dome_sink.alarms().is_empty());

    let report = svc.status_report(5, Some(handle.status()));
    assert_eq!(report.alarm_count, 3);
    assert_eq!(report.recent_alarms.len(), 3);
    assert_eq!(report.recent_alarms[0].uptime_secs, 1);
    let dome_status = report.dome.expect("dome fitted by default");
    assert!(!dome_status.actuator_fault);
    assert!(dome_status.close_command);
}
