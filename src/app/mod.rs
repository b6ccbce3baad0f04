//! Application core — orchestration of the lookout and the dome.
//!
//! The business rules (rule evaluation, shutter state machine) live in
//! [`crate::lookout`] and [`crate::dome`].  This module wires them to the
//! outside world through the **port traits** defined in [`ports`], keeping
//! everything testable without real peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
pub mod tasks;
