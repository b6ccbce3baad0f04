//! The two long-lived loops: dome reconciliation and lookout evaluation.
//!
//! ```text
//!   core 1, pri 22   run_dome_task     edges every dome_edge_poll_ms,
//!                                      requests + full refresh every
//!                                      dome_poll_interval_ms
//!   core 1, pri 5    run_lookout_task  commands → tick → status → save
//! ```
//!
//! Each loop subscribes to the task watchdog from its own thread.  The
//! per-iteration bodies ([`dome_step`], [`lookout_cycle`]) are plain
//! functions so they can be driven from tests without threads.

use std::time::{Duration, Instant};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::info;

use crate::config::SystemConfig;
use crate::dome::shared::DomeHandle;
use crate::dome::{DomeController, DomeReport};
use crate::drivers::watchdog::TaskWatchdog;
use crate::lookout::Decision;

use super::commands::AppCommand;
use super::events::AppEvent;
use super::ports::{BoundarySensors, Clock, ConfigPort, EventSink, SensorPort, ShutterActuator};
use super::service::LookoutService;

// ───────────────────────────────────────────────────────────────
// Dome task
// ───────────────────────────────────────────────────────────────

/// One pass of the dome loop.  `full_poll` applies queued requests and
/// re-reads both sensors; otherwise only ISR-flagged edges are serviced.
pub fn dome_step<A: ShutterActuator, B: BoundarySensors>(
    dome: &mut DomeController<'_, A, B>,
    full_poll: bool,
    sink: &mut impl EventSink,
) -> DomeReport {
    let report = if full_poll {
        dome.poll()
    } else {
        DomeReport {
            changed: dome.service_edges(),
            failed: None,
        }
    };

    // Failed closes are alarmed by the lookout task, which collects them
    // from the shared state on its next cycle.
    if let Some((from, to)) = report.changed {
        sink.emit(&AppEvent::ShutterChanged { from, to });
    }
    report
}

/// Dome reconciliation loop.  Never returns.
pub fn run_dome_task<A: ShutterActuator, B: BoundarySensors>(
    mut dome: DomeController<'static, A, B>,
    config: &SystemConfig,
    mut sink: impl EventSink,
) -> ! {
    let watchdog = TaskWatchdog::subscribe("dome", config.watchdog_timeout_ms);
    let edge_period = Duration::from_millis(u64::from(config.dome_edge_poll_ms));
    let poll_period = Duration::from_millis(u64::from(config.dome_poll_interval_ms));
    let mut last_poll = Instant::now();

    info!(
        "{} task running (edges every {}ms, full poll every {}ms)",
        watchdog.name(),
        config.dome_edge_poll_ms,
        config.dome_poll_interval_ms
    );

    loop {
        // A queued request is applied on the next short pass rather than
        // waiting out the full poll interval.
        let full = last_poll.elapsed() >= poll_period || dome.shared().has_pending_request();
        dome_step(&mut dome, full, &mut sink);
        if full {
            last_poll = Instant::now();
        }
        watchdog.feed();
        std::thread::sleep(edge_period);
    }
}

// ───────────────────────────────────────────────────────────────
// Lookout task
// ───────────────────────────────────────────────────────────────

/// Hand every queued command to the service.  Returns how many ran.
pub fn drain_commands<const N: usize>(
    commands: &Channel<CriticalSectionRawMutex, AppCommand, N>,
    service: &mut LookoutService<'_>,
    dome: &mut DomeHandle<'_>,
    sink: &mut impl EventSink,
) -> usize {
    let mut handled = 0;
    while let Ok(cmd) = commands.try_receive() {
        service.handle_command(cmd, dome, sink);
        handled += 1;
    }
    handled
}

/// Emits a [`AppEvent::Status`] every `interval_secs`.
pub struct StatusTimer {
    interval_secs: u64,
    last: Option<u64>,
}

impl StatusTimer {
    pub fn new(interval_secs: u32) -> Self {
        Self {
            interval_secs: u64::from(interval_secs),
            last: None,
        }
    }

    /// True on the first call and then once per interval.
    pub fn due(&mut self, now_secs: u64) -> bool {
        match self.last {
            Some(last) if now_secs.saturating_sub(last) < self.interval_secs => false,
            _ => {
                self.last = Some(now_secs);
                true
            }
        }
    }
}

/// One lookout iteration minus the sleep: commands, evaluation, status
/// report, deferred config save.
#[allow(clippy::too_many_arguments)]
pub fn lookout_cycle<const N: usize>(
    service: &mut LookoutService<'_>,
    commands: &Channel<CriticalSectionRawMutex, AppCommand, N>,
    now_secs: u64,
    sensors: &mut impl SensorPort,
    dome: &mut DomeHandle<'_>,
    sink: &mut impl EventSink,
    storage: &impl ConfigPort,
    status: &mut StatusTimer,
) -> Decision {
    drain_commands(commands, service, dome, sink);
    let decision = service.tick(now_secs, sensors, dome, sink);

    if status.due(now_secs) {
        let dome_status = service.config().has_dome.then(|| dome.status());
        sink.emit(&AppEvent::Status(service.status_report(now_secs, dome_status)));
    }

    service.auto_save_if_needed(storage);
    decision
}

/// Lookout loop.  Never returns.
pub fn run_lookout_task(
    mut service: LookoutService<'static>,
    mut sensors: impl SensorPort,
    mut dome: DomeHandle<'static>,
    mut sink: impl EventSink,
    storage: impl ConfigPort,
    clock: impl Clock,
) -> ! {
    let watchdog = TaskWatchdog::subscribe("lookout", service.config().watchdog_timeout_ms);
    let mut status = StatusTimer::new(service.config().status_interval_secs);

    service.start(&mut dome, &mut sink);

    loop {
        lookout_cycle(
            &mut service,
            &super::commands::COMMANDS,
            clock.now_secs(),
            &mut sensors,
            &mut dome,
            &mut sink,
            &storage,
            &mut status,
        );
        watchdog.feed();
        // Re-read every pass so an UpdateConfig takes effect immediately.
        std::thread::sleep(Duration::from_millis(u64::from(service.config().lookout_interval_ms)));
    }
}
