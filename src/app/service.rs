//! Lookout service — the hexagonal core of the safety interlock.
//!
//! [`LookoutService`] owns the [`Lookout`] rule engine, the suspend flag,
//! the alarm history and the live configuration.  All I/O flows through
//! port traits injected at call sites, so the whole service is testable
//! with mock adapters.
//!
//! ```text
//!  SensorPort ──▶ ┌────────────────────────┐ ──▶ EventSink
//!  rain latch ──▶ │     LookoutService      │ ──▶ SafetyMonitor
//!                 │  Lookout · suspend · cfg│
//! ShutterPort ◀── └────────────────────────┘
//! ```

use log::{error, info, warn};

use crate::config::SystemConfig;
use crate::diagnostics::{AlarmLog, StationStatus};
use crate::dome::shared::DomeStatus;
use crate::dome::state::ShutterCommand;
use crate::error::SafetyAlarm;
use crate::lookout::latch::RainEventLatch;
use crate::lookout::status::SafetyMonitor;
use crate::lookout::{Decision, Lookout};
use crate::sensors::SensorSnapshot;

use super::commands::AppCommand;
use super::events::AppEvent;
use super::ports::{ConfigPort, EventSink, SensorPort, ShutterPort};

/// Seconds a config change must settle before it is written to flash.
const AUTO_SAVE_DELAY_SECS: f32 = 5.0;

// ───────────────────────────────────────────────────────────────
// LookoutService
// ───────────────────────────────────────────────────────────────

pub struct LookoutService<'a> {
    config: SystemConfig,
    lookout: Lookout,
    latch: &'a RainEventLatch,
    monitor: &'a SafetyMonitor,
    alarms: AlarmLog,
    suspended: bool,
    last_decision: Decision,
    last_now: u64,
    /// Seconds per lookout tick (derived from config).
    tick_secs: f32,
    tick_count: u64,
    snapshot_missing: bool,
    config_dirty: bool,
    dirty_since_tick: u64,
    save_requested: bool,
}

impl<'a> LookoutService<'a> {
    /// Build the rule engine from configuration.  Call [`start`] next.
    ///
    /// [`start`]: Self::start
    pub fn new(config: SystemConfig, latch: &'a RainEventLatch, monitor: &'a SafetyMonitor) -> Self {
        let lookout = Lookout::new(&config.lookout);
        let last_decision = lookout.decision();
        Self {
            tick_secs: config.lookout_interval_ms as f32 / 1000.0,
            config,
            lookout,
            latch,
            monitor,
            alarms: AlarmLog::new(),
            suspended: false,
            last_decision,
            last_now: 0,
            tick_count: 0,
            snapshot_missing: false,
            config_dirty: false,
            dirty_since_tick: 0,
            save_requested: false,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Announce startup.  With the lookout disabled, a fitted dome is
    /// closed once since nothing else will ever close it.
    pub fn start(&mut self, dome: &mut impl ShutterPort, sink: &mut impl EventSink) {
        sink.emit(&AppEvent::Started {
            lookout_enabled: self.config.lookout.enabled,
            has_dome: self.config.has_dome,
        });
        info!(
            "LookoutService started (lookout={}, dome={})",
            if self.config.lookout.enabled { "enabled" } else { "disabled" },
            self.config.has_dome
        );

        if !self.config.lookout.enabled {
            self.close_unattended_dome(dome, sink);
        }
        self.publish(false, self.is_lookout_active());
    }

    /// With the lookout disabled nothing will close the dome later, so
    /// close it now.
    fn close_unattended_dome(&mut self, dome: &mut impl ShutterPort, sink: &mut impl EventSink) {
        if !self.config.has_dome {
            return;
        }
        info!("Lookout disabled: closing dome shutter");
        if let Err(e) = dome.close() {
            self.raise_alarm(SafetyAlarm::InterlockCloseFailed(e), sink);
        }
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one lookout cycle: snapshot → rules → decision → dome command.
    pub fn tick(
        &mut self,
        now_secs: u64,
        sensors: &mut impl SensorPort,
        dome: &mut impl ShutterPort,
        sink: &mut impl EventSink,
    ) -> Decision {
        self.tick_count += 1;
        self.last_now = now_secs;

        // 1. Latest snapshot; nothing published counts as every sensor missing.
        let snapshot = match sensors.read_snapshot() {
            Ok(s) => {
                self.snapshot_missing = false;
                s
            }
            Err(e) => {
                if !self.snapshot_missing {
                    warn!("Lookout: {}, treating all sensors as unavailable", e);
                    self.snapshot_missing = true;
                }
                SensorSnapshot::unavailable()
            }
        };

        // 2. Close failures the dome task hit since the last cycle.
        if let Some(e) = dome.take_close_failure() {
            self.raise_alarm(SafetyAlarm::InterlockCloseFailed(e), sink);
        }

        // 3. Consume the rain latch exactly once per cycle.
        let rain_event = self.latch.take();
        if rain_event {
            sink.emit(&AppEvent::RainEvent);
        }

        // 4. Evaluate.
        let decision = self.lookout.evaluate(&snapshot, rain_event, now_secs);
        if let Some(alarm) = self.lookout.take_alarm() {
            self.raise_alarm(alarm, sink);
        }
        if decision != self.last_decision {
            sink.emit(&AppEvent::DecisionChanged {
                from: self.last_decision,
                to: decision,
            });
            self.last_decision = decision;
        }

        // 5. Drive the dome, unless a client has taken manual control.
        if self.is_lookout_active() && self.config.has_dome {
            self.command_dome(decision.command(), dome, sink);
        }

        // 6. Publish for protocol-server queries.
        let is_safe = if self.config.lookout.enabled {
            decision.is_safe()
        } else {
            self.config.has_rain_sensor && snapshot.rain_intensity.available && !rain_event
        };
        self.publish(is_safe, self.is_lookout_active());

        decision
    }

    fn command_dome(&mut self, command: ShutterCommand, dome: &mut impl ShutterPort, sink: &mut impl EventSink) {
        match command {
            ShutterCommand::Close => {
                if let Err(e) = dome.close() {
                    self.raise_alarm(SafetyAlarm::InterlockCloseFailed(e), sink);
                }
            }
            ShutterCommand::Open => {
                if let Err(e) = dome.open() {
                    warn!("Lookout: dome open failed ({}), retrying next cycle", e);
                }
            }
        }
    }

    fn publish(&self, is_safe: bool, active: bool) {
        self.monitor.publish(is_safe, active, self.lookout.rules_state());
    }

    fn raise_alarm(&mut self, alarm: SafetyAlarm, sink: &mut impl EventSink) {
        error!("ALARM: {}", alarm);
        self.alarms.record(self.last_now, alarm);
        sink.emit(&AppEvent::Alarm(alarm));
    }

    // ── Command handling ──────────────────────────────────────

    /// Process an external command (protocol server, config server, console).
    pub fn handle_command(&mut self, cmd: AppCommand, dome: &mut impl ShutterPort, sink: &mut impl EventSink) {
        match cmd {
            AppCommand::OpenShutter => {
                self.suspend(sink);
                if let Err(e) = dome.open() {
                    warn!("Manual open failed: {}", e);
                }
            }
            AppCommand::CloseShutter => {
                self.suspend(sink);
                if let Err(e) = dome.close() {
                    self.raise_alarm(SafetyAlarm::InterlockCloseFailed(e), sink);
                }
            }
            AppCommand::SuspendLookout => self.suspend(sink),
            AppCommand::ResumeLookout => self.resume(sink),
            AppCommand::UpdateConfig(new_config) => {
                if let Err(msg) = new_config.validate() {
                    warn!("Configuration update rejected: {}", msg);
                    return;
                }
                if self.config.needs_reboot_for(&new_config) {
                    warn!("Dome wiring or timing changed: takes effect after reboot");
                }
                let was_enabled = self.config.lookout.enabled;
                self.lookout.reconfigure(&new_config.lookout);
                self.last_decision = self.lookout.decision();
                self.tick_secs = new_config.lookout_interval_ms as f32 / 1000.0;
                self.config = new_config;
                self.mark_config_dirty();
                info!("Configuration updated at runtime");
                if was_enabled && !self.config.lookout.enabled {
                    self.close_unattended_dome(dome, sink);
                }
            }
            AppCommand::SaveConfig => {
                self.mark_config_dirty();
                self.save_requested = true;
                info!("Explicit config save requested (will flush on next auto-save check)");
            }
        }
        self.publish(self.monitor.is_safe(), self.is_lookout_active());
    }

    fn suspend(&mut self, sink: &mut impl EventSink) {
        if !self.suspended {
            self.suspended = true;
            info!("Lookout suspended");
            sink.emit(&AppEvent::LookoutSuspended);
        }
    }

    fn resume(&mut self, sink: &mut impl EventSink) {
        if !self.config.lookout.enabled {
            warn!("Lookout resume ignored: lookout disabled in configuration");
            return;
        }
        if self.suspended {
            self.suspended = false;
            info!("Lookout resumed");
            sink.emit(&AppEvent::LookoutResumed);
        }
    }

    // ── Queries ───────────────────────────────────────────────

    /// Build a station status report.  `dome` is `None` without a dome.
    pub fn status_report(&self, uptime_secs: u64, dome: Option<DomeStatus>) -> StationStatus {
        StationStatus {
            uptime_secs,
            lookout_enabled: self.config.lookout.enabled,
            lookout_active: self.is_lookout_active(),
            is_safe: self.monitor.is_safe(),
            decision: self.lookout.decision(),
            rules: self.lookout.rules_state(),
            dome: if self.config.has_dome { dome } else { None },
            alarm_count: self.alarms.total(),
            recent_alarms: self.alarms.recent(),
        }
    }

    pub fn decision(&self) -> Decision {
        self.lookout.decision()
    }

    /// Enabled in configuration and not suspended by a client.
    pub fn is_lookout_active(&self) -> bool {
        self.config.lookout.enabled && !self.suspended
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    pub fn lookout(&self) -> &Lookout {
        &self.lookout
    }

    /// Total lookout cycles executed since startup.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    /// Clone of the live configuration (for read-back or delta updates).
    pub fn current_config(&self) -> SystemConfig {
        self.config.clone()
    }

    // ── Config dirty-flag management ──────────────────────────

    fn mark_config_dirty(&mut self) {
        if !self.config_dirty {
            self.config_dirty = true;
            self.dirty_since_tick = self.tick_count;
        }
    }

    /// Save once the config has been stable for a few seconds, or right
    /// away after [`AppCommand::SaveConfig`].  Returns `true` if saved.
    pub fn auto_save_if_needed(&mut self, storage: &impl ConfigPort) -> bool {
        if !self.config_dirty {
            return false;
        }
        let ticks_since_dirty = self.tick_count.saturating_sub(self.dirty_since_tick);
        let secs_since_dirty = ticks_since_dirty as f32 * self.tick_secs;
        if !self.save_requested && secs_since_dirty < AUTO_SAVE_DELAY_SECS {
            return false;
        }
        match storage.save(&self.config) {
            Ok(()) => {
                self.config_dirty = false;
                self.save_requested = false;
                info!("Config auto-saved to NVS");
                true
            }
            Err(e) => {
                warn!("Config auto-save failed: {}", e);
                false
            }
        }
    }

    /// Whether the config has unsaved changes.
    pub fn is_config_dirty(&self) -> bool {
        self.config_dirty
    }
}
