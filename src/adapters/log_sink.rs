//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (which goes to UART / USB-CDC in production).
//! An alert-channel adapter would implement the same trait.

use log::{error, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
pub struct LogEventSink;

impl Default for LogEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Status(s) => {
                let dome = s
                    .dome
                    .map_or_else(|| "none".into(), |d| format!("{:?}/{}", d.shutter_status, if d.actuator_fault { "FAULT" } else { "ok" }));
                info!(
                    "STATUS | up={}s | lookout={}{} | safe={} | decision={:?} | dome={} | alarms={}",
                    s.uptime_secs,
                    if s.lookout_enabled { "on" } else { "off" },
                    if s.lookout_active { "" } else { " (suspended)" },
                    s.is_safe,
                    s.decision,
                    dome,
                    s.alarm_count,
                );
            }
            AppEvent::DecisionChanged { from, to } => {
                info!("DECISION | {:?} -> {:?}", from, to);
            }
            AppEvent::ShutterChanged { from, to } => {
                info!("SHUTTER | {:?} -> {:?}", from, to);
            }
            AppEvent::Alarm(alarm) => {
                error!("ALARM | {}", alarm);
            }
            AppEvent::RainEvent => {
                warn!("RAIN | rain event interrupt");
            }
            AppEvent::LookoutSuspended => {
                info!("LOOKOUT | suspended, dome under manual control");
            }
            AppEvent::LookoutResumed => {
                info!("LOOKOUT | resumed");
            }
            AppEvent::Started {
                lookout_enabled,
                has_dome,
            } => {
                info!("START | lookout_enabled={} has_dome={}", lookout_enabled, has_dome);
            }
        }
    }
}
