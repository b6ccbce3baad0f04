//! State shared between the dome task, the lookout task and GPIO ISRs.
//!
//! ```text
//!   boundary ISRs ──▶ open_edge / closed_edge ─┐
//!   DomeHandle    ──▶ open/close requests ─────┼──▶ dome task (DomeController)
//!                                              │         │
//!   DomeHandle    ◀── state, sensor bits ◀─────┴─────────┘
//! ```
//!
//! Every flag is an independent atomic.  ISRs only ever set a flag; the
//! reclassification runs in the dome task.  The last close failure sits in
//! a critical-section cell until the lookout task collects it.

use core::cell::Cell;
use core::sync::atomic::{AtomicBool, Ordering};

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use serde::Serialize;

use super::state::{AtomicShutterState, ShutterState};
use crate::app::ports::ShutterPort;
use crate::error::ActuatorError;

pub struct DomeShared {
    state: AtomicShutterState,
    open_sensor: AtomicBool,
    closed_sensor: AtomicBool,
    commanded_open: AtomicBool,
    actuator_fault: AtomicBool,
    open_requested: AtomicBool,
    close_requested: AtomicBool,
    open_edge: AtomicBool,
    closed_edge: AtomicBool,
    close_failure: Mutex<CriticalSectionRawMutex, Cell<Option<ActuatorError>>>,
}

impl Default for DomeShared {
    fn default() -> Self {
        Self::new()
    }
}

impl DomeShared {
    /// The actuator is de-asserted at power-up, so an unsensed shutter is
    /// assumed to be closing.
    pub const fn new() -> Self {
        Self {
            state: AtomicShutterState::new(ShutterState::Closing),
            open_sensor: AtomicBool::new(false),
            closed_sensor: AtomicBool::new(false),
            commanded_open: AtomicBool::new(false),
            actuator_fault: AtomicBool::new(false),
            open_requested: AtomicBool::new(false),
            close_requested: AtomicBool::new(false),
            open_edge: AtomicBool::new(false),
            closed_edge: AtomicBool::new(false),
            close_failure: Mutex::new(Cell::new(None)),
        }
    }

    // ── ISR side ──────────────────────────────────────────────

    /// Open-position sensor changed.  ISR-safe.
    pub fn notify_open_edge(&self) {
        self.open_edge.store(true, Ordering::Release);
    }

    /// Closed-position sensor changed.  ISR-safe.
    pub fn notify_closed_edge(&self) {
        self.closed_edge.store(true, Ordering::Release);
    }

    /// Consume both edge flags; true if either was set.
    pub fn take_edges(&self) -> bool {
        let open = self.open_edge.swap(false, Ordering::AcqRel);
        let closed = self.closed_edge.swap(false, Ordering::AcqRel);
        open | closed
    }

    // ── Requests ──────────────────────────────────────────────

    pub fn request_open(&self) {
        self.open_requested.store(true, Ordering::Release);
    }

    pub fn request_close(&self) {
        self.close_requested.store(true, Ordering::Release);
    }

    pub(super) fn take_close_request(&self) -> bool {
        self.close_requested.swap(false, Ordering::AcqRel)
    }

    pub(super) fn take_open_request(&self) -> bool {
        self.open_requested.swap(false, Ordering::AcqRel)
    }

    pub(super) fn set_close_pending(&self, pending: bool) {
        self.close_requested.store(pending, Ordering::Release);
    }

    pub(super) fn set_open_pending(&self, pending: bool) {
        self.open_requested.store(pending, Ordering::Release);
    }

    pub fn has_pending_request(&self) -> bool {
        self.close_requested.load(Ordering::Acquire) || self.open_requested.load(Ordering::Acquire)
    }

    // ── Dome task side ────────────────────────────────────────

    pub(super) fn record_sensors(&self, open: bool, closed: bool) {
        self.open_sensor.store(open, Ordering::Release);
        self.closed_sensor.store(closed, Ordering::Release);
    }

    pub(super) fn record_command(&self, open: bool) {
        self.commanded_open.store(open, Ordering::Release);
    }

    pub(super) fn record_fault(&self, fault: bool) {
        self.actuator_fault.store(fault, Ordering::Release);
    }

    pub(super) fn store_state(&self, state: ShutterState) {
        self.state.store(state);
    }

    pub(super) fn record_close_failure(&self, e: ActuatorError) {
        self.close_failure.lock(|c| c.set(Some(e)));
    }

    /// Most recent failed close since the last call, if any.
    pub fn take_close_failure(&self) -> Option<ActuatorError> {
        self.close_failure.lock(Cell::take)
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn state(&self) -> ShutterState {
        self.state.load()
    }

    pub fn status(&self) -> DomeStatus {
        DomeStatus {
            shutter_status: self.state(),
            shutter_open: self.open_sensor.load(Ordering::Acquire),
            shutter_closed: self.closed_sensor.load(Ordering::Acquire),
            close_command: !self.commanded_open.load(Ordering::Acquire),
            actuator_fault: self.actuator_fault.load(Ordering::Acquire),
        }
    }
}

/// Dome telemetry block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DomeStatus {
    pub shutter_status: ShutterState,
    /// Open-position sensor asserted.
    pub shutter_open: bool,
    /// Closed-position sensor asserted.
    pub shutter_closed: bool,
    /// Actuator de-asserted (shutter commanded closed).
    pub close_command: bool,
    /// The last actuator command failed.
    pub actuator_fault: bool,
}

// ───────────────────────────────────────────────────────────────
// DomeHandle
// ───────────────────────────────────────────────────────────────

/// Cross-task view of the dome.  Commands are queued for the dome task;
/// a close it fails to apply comes back through `take_close_failure`.
#[derive(Clone, Copy)]
pub struct DomeHandle<'a> {
    shared: &'a DomeShared,
}

impl<'a> DomeHandle<'a> {
    pub fn new(shared: &'a DomeShared) -> Self {
        Self { shared }
    }

    pub fn status(&self) -> DomeStatus {
        self.shared.status()
    }
}

impl ShutterPort for DomeHandle<'_> {
    fn open(&mut self) -> Result<(), ActuatorError> {
        self.shared.request_open();
        Ok(())
    }

    fn close(&mut self) -> Result<(), ActuatorError> {
        self.shared.request_close();
        Ok(())
    }

    fn state(&self) -> ShutterState {
        self.shared.state()
    }

    fn take_close_failure(&mut self) -> Option<ActuatorError> {
        self.shared.take_close_failure()
    }
}
