//! Skywatch firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod diagnostics;
pub mod dome;
pub mod error;
pub mod lookout;
pub mod sensors;

pub mod adapters;
pub mod drivers;
pub mod pins;
