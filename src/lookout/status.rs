//! Lookout state published for the protocol server and diagnostics.
//!
//! The lookout task writes after every cycle; any other task may read.
//! `is_safe` and `active` are plain atomics, the per-rule flags live in a
//! critical-section `Cell` so readers always see one coherent cycle.

use core::cell::Cell;
use core::sync::atomic::{AtomicBool, Ordering};

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use serde::Serialize;

/// `satisfied` flag of every rule instance, in configuration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RulesState {
    pub unsafe_wind_speed: [bool; 2],
    pub safe_wind_speed: [bool; 1],
    pub unsafe_cloud_coverage: [bool; 2],
    pub safe_cloud_coverage: [bool; 2],
    pub unsafe_rain_intensity: [bool; 1],
    pub safe_rain_intensity: [bool; 1],
    pub unsafe_rain_event: bool,
}

/// Shared answer to "is it safe?" queries.
pub struct SafetyMonitor {
    is_safe: AtomicBool,
    active: AtomicBool,
    rules: Mutex<CriticalSectionRawMutex, Cell<RulesState>>,
}

impl Default for SafetyMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl SafetyMonitor {
    /// Starts out unsafe until the first cycle publishes.
    pub const fn new() -> Self {
        Self {
            is_safe: AtomicBool::new(false),
            active: AtomicBool::new(false),
            rules: Mutex::new(Cell::new(RulesState {
                unsafe_wind_speed: [false; 2],
                safe_wind_speed: [false; 1],
                unsafe_cloud_coverage: [false; 2],
                safe_cloud_coverage: [false; 2],
                unsafe_rain_intensity: [false; 1],
                safe_rain_intensity: [false; 1],
                unsafe_rain_event: false,
            })),
        }
    }

    pub fn publish(&self, is_safe: bool, active: bool, rules: RulesState) {
        self.rules.lock(|c| c.set(rules));
        self.active.store(active, Ordering::Release);
        self.is_safe.store(is_safe, Ordering::Release);
    }

    pub fn is_safe(&self) -> bool {
        self.is_safe.load(Ordering::Acquire)
    }

    /// Lookout enabled and not suspended.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    pub fn rules_state(&self) -> RulesState {
        self.rules.lock(Cell::get)
    }

    /// Rules state as a JSON object, for the protocol server.
    pub fn rules_state_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.rules_state())
    }
}
