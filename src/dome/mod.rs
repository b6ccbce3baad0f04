//! Dome controller — commanded actuator level and observed shutter state.
//!
//! ```text
//!   requests ──▶ close() / open() ──▶ ShutterActuator (relays / expander)
//!   edges    ──▶ refresh_state()  ◀── BoundarySensors (open, closed)
//!                     │
//!                     ▼
//!                DomeShared.state
//! ```
//!
//! The actuator is wired so that de-asserting it closes the shutter.  A
//! close that fails stays pending and is retried on the next poll.  Every
//! failure is returned to the caller and also left in [`DomeShared`] for
//! callers that only queued the request.

pub mod shared;
pub mod state;

use log::{error, info, warn};

use crate::app::ports::{BoundarySensors, ShutterActuator, ShutterPort};
use crate::error::ActuatorError;
use shared::DomeShared;
use state::{ShutterCommand, ShutterState};

/// What one [`DomeController::poll`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DomeReport {
    /// `(from, to)` if the shutter state changed.
    pub changed: Option<(ShutterState, ShutterState)>,
    /// A queued command that could not be applied.
    pub failed: Option<(ShutterCommand, ActuatorError)>,
}

pub struct DomeController<'a, A, B> {
    actuator: A,
    sensors: B,
    shared: &'a DomeShared,
}

impl<'a, A: ShutterActuator, B: BoundarySensors> DomeController<'a, A, B> {
    /// Take ownership of the hardware and classify the initial position.
    pub fn new(actuator: A, sensors: B, shared: &'a DomeShared) -> Self {
        let mut dome = Self {
            actuator,
            sensors,
            shared,
        };
        dome.refresh_state();
        info!("dome: initial state {:?}", dome.state());
        dome
    }

    /// De-assert the actuator.  Clears any pending open request.
    pub fn close(&mut self) -> Result<(), ActuatorError> {
        self.shared.set_open_pending(false);
        match self.actuator.set_open(false) {
            Ok(()) => {
                self.shared.set_close_pending(false);
                self.shared.record_command(false);
                self.shared.record_fault(false);
                Ok(())
            }
            Err(e) => {
                self.shared.set_close_pending(true);
                self.shared.record_fault(true);
                self.shared.record_close_failure(e);
                error!("dome: CLOSE FAILED ({}), will retry", e);
                Err(e)
            }
        }
    }

    /// Assert the actuator.  Clears any pending close request.
    pub fn open(&mut self) -> Result<(), ActuatorError> {
        self.shared.set_close_pending(false);
        match self.actuator.set_open(true) {
            Ok(()) => {
                self.shared.set_open_pending(false);
                self.shared.record_command(true);
                self.shared.record_fault(false);
                Ok(())
            }
            Err(e) => {
                self.shared.set_open_pending(true);
                self.shared.record_fault(true);
                warn!("dome: open failed ({}), will retry", e);
                Err(e)
            }
        }
    }

    /// Re-read both boundary sensors and reclassify.
    pub fn refresh_state(&mut self) -> Option<(ShutterState, ShutterState)> {
        let open = self.sensors.open_asserted();
        let closed = self.sensors.closed_asserted();
        self.shared.record_sensors(open, closed);

        let prev = self.shared.state();
        let next = ShutterState::classify(prev, open, closed);
        if next == prev {
            return None;
        }
        self.shared.store_state(next);
        info!("dome: shutter {:?} -> {:?}", prev, next);
        Some((prev, next))
    }

    /// Reclassify only if an ISR flagged a boundary edge.
    pub fn service_edges(&mut self) -> Option<(ShutterState, ShutterState)> {
        if self.shared.take_edges() {
            self.refresh_state()
        } else {
            None
        }
    }

    /// One reconciliation cycle: apply queued requests (close first), then
    /// refresh the state.
    pub fn poll(&mut self) -> DomeReport {
        let mut report = DomeReport::default();
        if self.shared.take_close_request() {
            if let Err(e) = self.close() {
                report.failed = Some((ShutterCommand::Close, e));
            }
        } else if self.shared.take_open_request() {
            if let Err(e) = self.open() {
                report.failed = Some((ShutterCommand::Open, e));
            }
        }
        self.shared.take_edges();
        report.changed = self.refresh_state();
        report
    }

    pub fn state(&self) -> ShutterState {
        self.shared.state()
    }

    pub fn shared(&self) -> &'a DomeShared {
        self.shared
    }
}

impl<A: ShutterActuator, B: BoundarySensors> ShutterPort for DomeController<'_, A, B> {
    fn open(&mut self) -> Result<(), ActuatorError> {
        DomeController::open(self)
    }

    fn close(&mut self) -> Result<(), ActuatorError> {
        DomeController::close(self)
    }

    fn state(&self) -> ShutterState {
        DomeController::state(self)
    }
}
