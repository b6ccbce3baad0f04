//! Station status report and alarm history.
//!
//! [`StationStatus`] is the machine-readable answer to "what is the station
//! doing": lookout flags, every rule's `satisfied` flag, and the dome block.
//! It is emitted periodically as [`AppEvent::Status`] and rendered as JSON
//! for the protocol server.
//!
//! [`AlarmLog`] keeps the most recent alarms so an operator polling the
//! status can see a failed close even if they missed the log line.
//!
//! [`AppEvent::Status`]: crate::app::events::AppEvent::Status

use core::fmt::Write;

use heapless::{Deque, String, Vec};
use serde::Serialize;

use crate::dome::shared::DomeStatus;
use crate::error::SafetyAlarm;
use crate::lookout::Decision;
use crate::lookout::status::RulesState;

const ALARM_SLOTS: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlarmRecord {
    pub uptime_secs: u64,
    pub reason: String<64>,
}

impl AlarmRecord {
    pub fn new(uptime_secs: u64, alarm: SafetyAlarm) -> Self {
        let mut reason = String::new();
        // Truncated on overflow.
        let _ = write!(reason, "{alarm}");
        Self { uptime_secs, reason }
    }
}

/// Ring of the last few alarms, oldest dropped first.
#[derive(Debug, Default)]
pub struct AlarmLog {
    entries: Deque<AlarmRecord, ALARM_SLOTS>,
    total: u32,
}

impl AlarmLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, uptime_secs: u64, alarm: SafetyAlarm) {
        if self.entries.is_full() {
            self.entries.pop_front();
        }
        let _ = self.entries.push_back(AlarmRecord::new(uptime_secs, alarm));
        self.total = self.total.saturating_add(1);
    }

    pub fn recent(&self) -> Vec<AlarmRecord, ALARM_SLOTS> {
        self.entries.iter().cloned().collect()
    }

    /// Alarms raised since boot, including ones rotated out.
    pub fn total(&self) -> u32 {
        self.total
    }
}

/// Point-in-time station report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationStatus {
    pub uptime_secs: u64,
    pub lookout_enabled: bool,
    /// Enabled and not suspended.
    pub lookout_active: bool,
    /// Answer given to external safety-monitor queries.
    pub is_safe: bool,
    pub decision: Decision,
    pub rules: RulesState,
    /// `None` on stations without a dome.
    pub dome: Option<DomeStatus>,
    pub alarm_count: u32,
    pub recent_alarms: Vec<AlarmRecord, ALARM_SLOTS>,
}

impl StationStatus {
    pub fn to_json(&self) -> Result<std::string::String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
