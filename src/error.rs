//! Unified error types for the Skywatch firmware.
//!
//! A single `Error` enum that every subsystem converts into, so the task
//! loops can handle failures uniformly.  All variants are `Copy` so they can
//! be carried inside [`AppEvent`](crate::app::events::AppEvent)s and dome
//! reports without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A boundary or rain sensor input could not be read.
    Sensor(SensorError),
    /// The shutter actuator could not be driven.
    Actuator(ActuatorError),
    /// The safety interlock itself misbehaved.
    Safety(SafetyAlarm),
    /// Peripheral initialisation failed.
    Init(&'static str),
    /// Configuration is invalid or could not be loaded.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Actuator(e) => write!(f, "actuator: {e}"),
            Self::Safety(e) => write!(f, "safety: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// The acquisition collaborator has not published a snapshot yet.
    NoSnapshot,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoSnapshot => write!(f, "no sensor snapshot published"),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Actuator errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorError {
    /// The shared bus mutex could not be acquired within the bounded wait.
    BusBusy,
    /// The relay or expander pin write failed.
    PinWrite,
    /// The expander did not acknowledge on the bus.
    NotConnected,
}

impl fmt::Display for ActuatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BusBusy => write!(f, "shared bus busy"),
            Self::PinWrite => write!(f, "pin write failed"),
            Self::NotConnected => write!(f, "actuator device not connected"),
        }
    }
}

impl From<ActuatorError> for Error {
    fn from(e: ActuatorError) -> Self {
        Self::Actuator(e)
    }
}

// ---------------------------------------------------------------------------
// Safety alarms
// ---------------------------------------------------------------------------

/// Operator-visible alarms.  Both mean the interlock could not guarantee
/// protection of the enclosure on this cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SafetyAlarm {
    /// A close was commanded but the actuator could not be driven.
    InterlockCloseFailed(ActuatorError),
    /// The decision fold reached the branch that should be unreachable.
    InconsistentDecision,
}

impl fmt::Display for SafetyAlarm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InterlockCloseFailed(e) => write!(f, "commanded close failed ({e})"),
            Self::InconsistentDecision => write!(f, "inconsistent lookout decision, forced unsafe"),
        }
    }
}

impl From<SafetyAlarm> for Error {
    fn from(e: SafetyAlarm) -> Self {
        Self::Safety(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
