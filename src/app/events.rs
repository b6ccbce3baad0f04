//! Outbound application events.
//!
//! The services emit these through the [`EventSink`](super::ports::EventSink)
//! port.  Adapters on the other side decide what to do with them: log to
//! serial, forward to the alert channel, etc.

use crate::diagnostics::StationStatus;
use crate::dome::state::ShutterState;
use crate::error::SafetyAlarm;
use crate::lookout::Decision;

/// Structured events emitted by the application core.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// The lookout service has started.
    Started {
        lookout_enabled: bool,
        has_dome: bool,
    },

    /// The safety decision flipped.
    DecisionChanged { from: Decision, to: Decision },

    /// Operator-visible alarm.
    Alarm(SafetyAlarm),

    /// The rain sensor's interrupt line fired.
    RainEvent,

    /// Observed shutter state changed.
    ShutterChanged { from: ShutterState, to: ShutterState },

    /// The lookout stopped driving the dome (manual command or request).
    LookoutSuspended,

    /// The lookout drives the dome again.
    LookoutResumed,

    /// Periodic station status report.
    Status(StationStatus),
}
