//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ LookoutService / DomeController (domain)
//! ```
//!
//! Driven adapters (snapshot board, relays, boundary switches, event sinks,
//! storage, clock) implement these traits.  The domain consumes them via
//! generics, so it never touches hardware directly.
//!
//! ## Safety notes
//!
//! - **ConfigPort** implementations MUST validate before persisting.
//! - **ShutterActuator** failures must be reported, never swallowed: a
//!   silent failed close leaves the enclosure open in the rain.

use crate::config::SystemConfig;
use crate::dome::state::ShutterState;
use crate::error::{ActuatorError, SensorError};
use crate::sensors::SensorSnapshot;

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: acquisition → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: the lookout calls this once per cycle.
pub trait SensorPort {
    /// Latest published snapshot.
    fn read_snapshot(&mut self) -> Result<SensorSnapshot, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Dome ports (driven adapters: domain ↔ shutter hardware)
// ───────────────────────────────────────────────────────────────

/// The shutter's drive signal.  `true` asserts it (open), `false`
/// de-asserts it (close, also the power-loss state).
pub trait ShutterActuator {
    fn set_open(&mut self, open: bool) -> Result<(), ActuatorError>;
}

/// The two limit switches.
pub trait BoundarySensors {
    fn open_asserted(&mut self) -> bool;
    fn closed_asserted(&mut self) -> bool;
}

/// What the lookout and the external shutter handler need from the dome.
pub trait ShutterPort {
    fn open(&mut self) -> Result<(), ActuatorError>;
    fn close(&mut self) -> Result<(), ActuatorError>;
    fn state(&self) -> ShutterState;

    /// A close that failed after `close()` had already returned, e.g. a
    /// queued request the dome task could not apply.  Reported once.
    fn take_close_failure(&mut self) -> Option<ActuatorError> {
        None
    }
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Monotonic seconds since boot.  Rule confirm delays are measured on it.
pub trait Clock {
    fn now_secs(&self) -> u64;
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists system configuration.
///
/// Implementations MUST run [`SystemConfig::validate`] before persisting.
/// Invalid values are rejected with [`ConfigError::ValidationFailed`], not
/// clamped: a bad remote write must not be able to disable a rule by
/// pushing its threshold out of reach.
pub trait ConfigPort {
    /// Load configuration from persistent storage.
    /// Returns [`SystemConfig::default()`] if no stored config exists.
    fn load(&self) -> Result<SystemConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Stored config failed integrity / deserialization check.
    Corrupted,
    /// A config field failed range validation.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}
