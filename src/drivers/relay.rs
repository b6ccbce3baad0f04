//! Dome relays wired straight to GPIO outputs.
//!
//! Both relays follow the actuator level: HIGH holds the shutter open,
//! LOW (or no power) lets it close.

use embedded_hal::digital::OutputPin;
use log::warn;

use crate::app::ports::ShutterActuator;
use crate::error::ActuatorError;

pub struct RelayActuator<P1, P2> {
    relay_1: P1,
    relay_2: P2,
}

impl<P1: OutputPin, P2: OutputPin> RelayActuator<P1, P2> {
    /// Takes the pins and drives them LOW straight away.
    pub fn new(relay_1: P1, relay_2: P2) -> Result<Self, ActuatorError> {
        let mut relays = Self { relay_1, relay_2 };
        relays.set_open(false)?;
        Ok(relays)
    }
}

impl<P1: OutputPin, P2: OutputPin> ShutterActuator for RelayActuator<P1, P2> {
    fn set_open(&mut self, open: bool) -> Result<(), ActuatorError> {
        // Both writes are attempted even if the first fails.
        let r1 = if open { self.relay_1.set_high() } else { self.relay_1.set_low() };
        let r2 = if open { self.relay_2.set_high() } else { self.relay_2.set_low() };
        if r1.is_err() || r2.is_err() {
            warn!("relay: pin write failed (relay1 ok={}, relay2 ok={})", r1.is_ok(), r2.is_ok());
            return Err(ActuatorError::PinWrite);
        }
        Ok(())
    }
}
