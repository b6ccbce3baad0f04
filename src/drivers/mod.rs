//! Shutter drivers, interrupt setup and task plumbing.

pub mod boundary;
pub mod expander;
pub mod hw_init;
pub mod relay;
pub mod task_pin;
pub mod watchdog;
