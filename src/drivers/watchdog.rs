//! Task Watchdog Timer (TWDT) subscription, one per safety loop.
//!
//! Each loop subscribes *from its own thread* and feeds every iteration.
//! A loop that stalls past the timeout panics the board into a reset,
//! which de-asserts the dome actuator.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

use log::{info, warn};

pub struct TaskWatchdog {
    name: &'static str,
    #[cfg(target_os = "espidf")]
    subscribed: bool,
}

impl TaskWatchdog {
    /// Configure the TWDT timeout and subscribe the calling task.
    pub fn subscribe(name: &'static str, timeout_ms: u32) -> Self {
        #[cfg(target_os = "espidf")]
        {
            // SAFETY: plain FFI calls; a null task handle means "current task".
            unsafe {
                let cfg = esp_task_wdt_config_t {
                    timeout_ms,
                    idle_core_mask: 0,
                    trigger_panic: true,
                };
                let ret = esp_task_wdt_reconfigure(&cfg);
                if ret != ESP_OK {
                    warn!("TWDT reconfigure returned {} (may already be configured)", ret);
                }

                let ret = esp_task_wdt_add(core::ptr::null_mut());
                let subscribed = ret == ESP_OK;
                if subscribed {
                    info!("Watchdog[{}]: subscribed ({}ms timeout, panic on trigger)", name, timeout_ms);
                } else {
                    warn!("Watchdog[{}]: failed to subscribe ({})", name, ret);
                }
                Self { name, subscribed }
            }
        }

        #[cfg(not(target_os = "espidf"))]
        {
            info!("Watchdog[{}](sim): no-op, timeout {}ms", name, timeout_ms);
            if timeout_ms == 0 {
                warn!("Watchdog[{}](sim): zero timeout", name);
            }
            Self { name }
        }
    }

    /// Feed the watchdog.  Must be called more often than the timeout.
    pub fn feed(&self) {
        #[cfg(target_os = "espidf")]
        {
            if self.subscribed {
                // SAFETY: resets the calling task's TWDT entry.
                unsafe {
                    esp_task_wdt_reset();
                }
            }
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}
