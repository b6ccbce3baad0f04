//! Dome limit switches on two GPIO inputs (active LOW).

use embedded_hal::digital::InputPin;
use log::warn;

use crate::app::ports::BoundarySensors;

pub struct GpioBoundarySensors<O, C> {
    open_pin: O,
    closed_pin: C,
}

impl<O: InputPin, C: InputPin> GpioBoundarySensors<O, C> {
    pub fn new(open_pin: O, closed_pin: C) -> Self {
        Self { open_pin, closed_pin }
    }
}

// A failed read counts as de-asserted: the shutter is then reported in
// transit rather than at a position nobody has confirmed.
fn asserted(pin: &mut impl InputPin, which: &str) -> bool {
    match pin.is_low() {
        Ok(low) => low,
        Err(_) => {
            warn!("boundary: {} sensor read failed", which);
            false
        }
    }
}

impl<O: InputPin, C: InputPin> BoundarySensors for GpioBoundarySensors<O, C> {
    fn open_asserted(&mut self) -> bool {
        asserted(&mut self.open_pin, "open")
    }

    fn closed_asserted(&mut self) -> bool {
        asserted(&mut self.closed_pin, "closed")
    }
}
