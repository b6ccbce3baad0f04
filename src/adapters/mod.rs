//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements  | Connects to           |
//! |------------|-------------|-----------------------|
//! | `log_sink` | EventSink   | Serial log output     |
//! | `nvs`      | ConfigPort  | NVS / in-memory store |
//! | `time`     | Clock       | ESP32 system timer    |
//!
//! The sensor side is [`SnapshotBoard`](crate::sensors::SnapshotBoard);
//! the shutter side lives in [`crate::drivers`].

pub mod log_sink;
pub mod nvs;
pub mod time;
