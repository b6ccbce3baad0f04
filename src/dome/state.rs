//! Shutter state, derived from the two boundary sensors.

use core::sync::atomic::{AtomicU8, Ordering};

use serde::Serialize;

/// Observed shutter position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[repr(u8)]
pub enum ShutterState {
    Open = 0,
    Closed = 1,
    Opening = 2,
    Closing = 3,
}

impl ShutterState {
    const fn from_u8(v: u8) -> Self {
        match v {
            0 => Self::Open,
            1 => Self::Closed,
            2 => Self::Opening,
            _ => Self::Closing,
        }
    }

    /// Classify from the boundary sensors and the previous state.
    ///
    /// Closed wins if both sensors assert.  With neither asserted the
    /// shutter is in transit: away from whichever end it was last seen at.
    /// Already in transit, it keeps its direction.
    pub const fn classify(prev: Self, open_sensor: bool, closed_sensor: bool) -> Self {
        if closed_sensor {
            Self::Closed
        } else if open_sensor {
            Self::Open
        } else {
            match prev {
                Self::Closed | Self::Opening => Self::Opening,
                Self::Open | Self::Closing => Self::Closing,
            }
        }
    }
}

/// What the dome is being asked to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ShutterCommand {
    Open,
    Close,
}

/// Lock-free shutter state cell.  Torn reads are impossible: the whole
/// state is one byte.
pub struct AtomicShutterState(AtomicU8);

impl AtomicShutterState {
    pub const fn new(state: ShutterState) -> Self {
        Self(AtomicU8::new(state as u8))
    }

    pub fn load(&self) -> ShutterState {
        ShutterState::from_u8(self.0.load(Ordering::Acquire))
    }

    pub fn store(&self, state: ShutterState) {
        self.0.store(state as u8, Ordering::Release);
    }
}
