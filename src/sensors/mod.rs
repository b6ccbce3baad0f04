//! Sensor snapshot and the board the acquisition side publishes into.
//!
//! Sensor acquisition (bus protocols, signal conditioning) runs outside the
//! safety core.  It publishes a [`SensorSnapshot`] into a [`SnapshotBoard`];
//! the lookout task reads the latest copy once per cycle through
//! [`SensorPort`].

use core::cell::Cell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use serde::Serialize;

use crate::app::ports::SensorPort;
use crate::error::SensorError;

/// One measurement plus whether its sensor produced it.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Reading<T> {
    pub value: T,
    pub available: bool,
}

impl<T> Reading<T> {
    pub const fn present(value: T) -> Self {
        Self {
            value,
            available: true,
        }
    }
}

impl<T: Default> Reading<T> {
    pub fn missing() -> Self {
        Self {
            value: T::default(),
            available: false,
        }
    }
}

/// Latest measurement per quantity watched by the lookout.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct SensorSnapshot {
    /// Wind speed (m/s).
    pub wind_speed: Reading<f32>,
    /// Cloud coverage (%), or the sky-temperature proxy mapped onto 0–100.
    pub cloud_coverage: Reading<f32>,
    /// Rain intensity level, 0 (dry) to 7.
    pub rain_intensity: Reading<u8>,
}

impl SensorSnapshot {
    /// Snapshot with every sensor reported missing.
    pub fn unavailable() -> Self {
        Self::default()
    }
}

// ---------------------------------------------------------------------------
// SnapshotBoard
// ---------------------------------------------------------------------------

/// Single-slot mailbox between acquisition and the lookout.
///
/// Writers overwrite, readers copy.  The critical section only spans a
/// `Cell` copy, so it is safe to share as a `&'static`.
pub struct SnapshotBoard {
    slot: Mutex<CriticalSectionRawMutex, Cell<Option<SensorSnapshot>>>,
}

impl Default for SnapshotBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotBoard {
    pub const fn new() -> Self {
        Self {
            slot: Mutex::new(Cell::new(None)),
        }
    }

    /// Replace the published snapshot.
    pub fn publish(&self, snapshot: SensorSnapshot) {
        self.slot.lock(|c| c.set(Some(snapshot)));
    }

    /// Latest snapshot, if acquisition has published one.
    pub fn latest(&self) -> Option<SensorSnapshot> {
        self.slot.lock(Cell::get)
    }
}

impl SensorPort for &SnapshotBoard {
    fn read_snapshot(&mut self) -> Result<SensorSnapshot, SensorError> {
        self.latest().ok_or(SensorError::NoSnapshot)
    }
}
