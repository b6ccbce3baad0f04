//! Inbound commands to the lookout service.
//!
//! These represent actions requested by the outside world (protocol server,
//! config server, serial console).  They travel over [`COMMANDS`], a bounded
//! channel drained by the lookout task once per cycle.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;

use crate::config::SystemConfig;

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone)]
pub enum AppCommand {
    /// Open the shutter on a client's request.  Suspends the lookout.
    OpenShutter,

    /// Close the shutter on a client's request.  Suspends the lookout.
    CloseShutter,

    /// Stop the lookout from driving the dome; evaluation continues.
    SuspendLookout,

    /// Hand dome control back to the lookout.
    ResumeLookout,

    /// Hot-reload configuration.  Rebuilds every rule.
    UpdateConfig(SystemConfig),

    /// Explicitly persist the current config to NVS immediately.
    SaveConfig,
}

/// Capacity of the inbound command channel.
pub const COMMAND_QUEUE_DEPTH: usize = 8;

/// Command channel: adapters `try_send`, the lookout task `try_receive`s.
pub static COMMANDS: Channel<CriticalSectionRawMutex, AppCommand, COMMAND_QUEUE_DEPTH> = Channel::new();

/// Queue a command without blocking.  Returns `false` if the queue is full.
pub fn submit(cmd: AppCommand) -> bool {
    COMMANDS.try_send(cmd).is_ok()
}
