//! System configuration parameters
//!
//! All tunable parameters for the station: lookout rule instances, task
//! timing and dome wiring.  Values are persisted in NVS (postcard blob) and
//! can be replaced at runtime with [`AppCommand::UpdateConfig`].
//!
//! [`AppCommand::UpdateConfig`]: crate::app::commands::AppCommand::UpdateConfig

use serde::{Deserialize, Serialize};

/// Highest rain intensity level reported by the rain sensor (torrential).
pub const RAIN_INTENSITY_MAX: u8 = 7;

/// Configuration of one threshold rule.
///
/// Unsafe rules trip when the reading is at or above `threshold`; safe rules
/// hold while the reading stays below it.  `missing_is_unsafe` decides what
/// an unavailable reading means: an unsafe rule trips at once, a safe rule
/// stays unsatisfied.  With the flag cleared an unsafe rule ignores the
/// missing reading and a safe rule counts as satisfied, so an absent sensor
/// neither closes nor blocks opening.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RuleConfig<T> {
    pub active: bool,
    pub threshold: T,
    /// Confirm delay (seconds) the condition must hold before the rule fires.
    pub delay_secs: u32,
    pub missing_is_unsafe: bool,
}

impl<T> RuleConfig<T> {
    pub const fn new(active: bool, threshold: T, delay_secs: u32, missing_is_unsafe: bool) -> Self {
        Self {
            active,
            threshold,
            delay_secs,
            missing_is_unsafe,
        }
    }
}

/// The rain-event rule has no threshold and no delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RainEventRuleConfig {
    pub active: bool,
    pub missing_is_unsafe: bool,
}

/// Every rule instance evaluated by the lookout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookoutConfig {
    /// When false the lookout never drives the dome.
    pub enabled: bool,

    // --- Wind speed (m/s) ---
    pub unsafe_wind_speed: [RuleConfig<f32>; 2],
    pub safe_wind_speed: [RuleConfig<f32>; 1],

    // --- Cloud coverage (%) ---
    pub unsafe_cloud_coverage: [RuleConfig<f32>; 2],
    pub safe_cloud_coverage: [RuleConfig<f32>; 2],

    // --- Rain intensity (0..=7) ---
    pub unsafe_rain_intensity: [RuleConfig<u8>; 1],
    pub safe_rain_intensity: [RuleConfig<u8>; 1],

    // --- Rain event (interrupt) ---
    pub unsafe_rain_event: RainEventRuleConfig,
}

impl Default for LookoutConfig {
    fn default() -> Self {
        Self {
            enabled: true,

            // Sustained breeze closes after a minute, gusts almost at once.
            unsafe_wind_speed: [
                RuleConfig::new(true, 20.0, 60, true),
                RuleConfig::new(true, 30.0, 5, true),
            ],
            safe_wind_speed: [RuleConfig::new(true, 8.0, 600, true)],

            unsafe_cloud_coverage: [
                RuleConfig::new(true, 70.0, 300, false),
                RuleConfig::new(true, 90.0, 60, false),
            ],
            safe_cloud_coverage: [
                RuleConfig::new(true, 50.0, 900, true),
                RuleConfig::new(false, 30.0, 900, true),
            ],

            unsafe_rain_intensity: [RuleConfig::new(true, 1, 0, true)],
            safe_rain_intensity: [RuleConfig::new(true, 1, 1800, true)],

            unsafe_rain_event: RainEventRuleConfig {
                active: true,
                missing_is_unsafe: true,
            },
        }
    }
}

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemConfig {
    pub lookout: LookoutConfig,

    // --- Station hardware (read at boot) ---
    /// A dome/roof shutter is wired to this station.
    pub has_dome: bool,
    /// Dome relays sit on the I2C GPIO expander instead of direct GPIOs.
    pub dome_via_expander: bool,
    /// Rain sensor (intensity + event line) fitted.
    pub has_rain_sensor: bool,

    // --- Timing ---
    // The dome intervals, bus timeout and watchdog timeout are read when the
    // tasks are spawned; see [`SystemConfig::needs_reboot_for`].
    /// Lookout evaluation cycle (milliseconds)
    pub lookout_interval_ms: u32,
    /// Dome reconciliation cycle (milliseconds)
    pub dome_poll_interval_ms: u32,
    /// How often the dome task checks for boundary-sensor edges (milliseconds)
    pub dome_edge_poll_ms: u32,
    /// Bounded wait for the shared expander bus (milliseconds)
    pub bus_lock_timeout_ms: u32,
    /// Station status report interval (seconds)
    pub status_interval_secs: u32,
    /// Task watchdog timeout (milliseconds)
    pub watchdog_timeout_ms: u32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            lookout: LookoutConfig::default(),

            has_dome: true,
            dome_via_expander: true,
            has_rain_sensor: true,

            lookout_interval_ms: 1000,  // 1 Hz
            dome_poll_interval_ms: 1000, // 1 Hz
            dome_edge_poll_ms: 50,
            bus_lock_timeout_ms: 50,
            status_interval_secs: 60,
            watchdog_timeout_ms: 10_000,
        }
    }
}

// ── Validation ────────────────────────────────────────────────

fn check_pairs<T: PartialOrd + Copy>(
    unsafe_rules: &[RuleConfig<T>],
    safe_rules: &[RuleConfig<T>],
    msg: &'static str,
) -> Result<(), &'static str> {
    // Unsafe rule i pairs with safe rule min(i, S-1), same as the engine.
    for (i, u) in unsafe_rules.iter().enumerate() {
        let Some(s) = safe_rules.get(i.min(safe_rules.len().saturating_sub(1))) else {
            continue;
        };
        if u.active && s.active && s.threshold > u.threshold {
            return Err(msg);
        }
    }
    Ok(())
}

fn check_range<T: PartialOrd + Copy>(
    rules: &[RuleConfig<T>],
    lo: T,
    hi: T,
    msg: &'static str,
) -> Result<(), &'static str> {
    if rules.iter().all(|r| r.threshold >= lo && r.threshold <= hi) {
        Ok(())
    } else {
        Err(msg)
    }
}

impl LookoutConfig {
    /// Reject thresholds outside the physical range of each quantity and
    /// safe limits above their paired unsafe threshold (would oscillate).
    pub fn validate(&self) -> Result<(), &'static str> {
        check_range(&self.unsafe_wind_speed, 0.0, 100.0, "wind speed thresholds must be 0–100 m/s")?;
        check_range(&self.safe_wind_speed, 0.0, 100.0, "wind speed thresholds must be 0–100 m/s")?;
        check_range(&self.unsafe_cloud_coverage, 0.0, 100.0, "cloud coverage thresholds must be 0–100 %")?;
        check_range(&self.safe_cloud_coverage, 0.0, 100.0, "cloud coverage thresholds must be 0–100 %")?;
        check_range(&self.unsafe_rain_intensity, 0, RAIN_INTENSITY_MAX, "rain intensity thresholds must be 0–7")?;
        check_range(&self.safe_rain_intensity, 0, RAIN_INTENSITY_MAX, "rain intensity thresholds must be 0–7")?;

        check_pairs(
            &self.unsafe_wind_speed,
            &self.safe_wind_speed,
            "safe wind speed must not exceed its unsafe threshold",
        )?;
        check_pairs(
            &self.unsafe_cloud_coverage,
            &self.safe_cloud_coverage,
            "safe cloud coverage must not exceed its unsafe threshold",
        )?;
        check_pairs(
            &self.unsafe_rain_intensity,
            &self.safe_rain_intensity,
            "safe rain intensity must not exceed its unsafe threshold",
        )?;
        Ok(())
    }
}

impl SystemConfig {
    /// Range-check every field.  Invalid values are rejected, never clamped.
    pub fn validate(&self) -> Result<(), &'static str> {
        self.lookout.validate()?;
        if !(100..=10_000).contains(&self.lookout_interval_ms) {
            return Err("lookout_interval_ms must be 100–10000");
        }
        if !(100..=10_000).contains(&self.dome_poll_interval_ms) {
            return Err("dome_poll_interval_ms must be 100–10000");
        }
        if !(10..=1000).contains(&self.dome_edge_poll_ms) || self.dome_edge_poll_ms > self.dome_poll_interval_ms {
            return Err("dome_edge_poll_ms must be 10–1000 and not exceed dome_poll_interval_ms");
        }
        if !(1..=1000).contains(&self.bus_lock_timeout_ms) {
            return Err("bus_lock_timeout_ms must be 1–1000");
        }
        if !(5..=3600).contains(&self.status_interval_secs) {
            return Err("status_interval_secs must be 5–3600");
        }
        if self.watchdog_timeout_ms <= self.lookout_interval_ms.max(self.dome_poll_interval_ms) {
            return Err("watchdog_timeout_ms must exceed both task intervals");
        }
        Ok(())
    }

    /// Whether `other` changes settings the dome task and the drivers read
    /// once at boot.  Those only apply after a restart.
    pub fn needs_reboot_for(&self, other: &SystemConfig) -> bool {
        self.has_dome != other.has_dome
            || self.dome_via_expander != other.dome_via_expander
            || self.dome_poll_interval_ms != other.dome_poll_interval_ms
            || self.dome_edge_poll_ms != other.dome_edge_poll_ms
            || self.bus_lock_timeout_ms != other.bus_lock_timeout_ms
            || self.watchdog_timeout_ms != other.watchdog_timeout_ms
    }
}
