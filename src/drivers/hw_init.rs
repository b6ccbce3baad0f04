//! One-shot GPIO interrupt setup for the boundary sensors and rain line.
//!
//! Handlers run in ISR context and only set a flag: a boundary edge marks
//! [`DomeShared`] for reclassification, a rain edge sets the
//! [`RainEventLatch`].  The shared state is passed to each handler as its
//! `arg` pointer, which is why both must be `'static`.

use crate::dome::shared::DomeShared;
use crate::lookout::latch::RainEventLatch;

#[cfg(target_os = "espidf")]
use crate::pins;
#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;
#[cfg(target_os = "espidf")]
use log::info;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot interrupt setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    GpioConfigFailed(i32),
    IsrInstallFailed(i32),
    HandlerAddFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
            Self::IsrInstallFailed(rc) => write!(f, "GPIO ISR service install failed (rc={})", rc),
            Self::HandlerAddFailed(rc) => write!(f, "GPIO ISR handler add failed (rc={})", rc),
        }
    }
}

impl From<HwInitError> for crate::error::Error {
    fn from(_: HwInitError) -> Self {
        Self::Init("GPIO interrupt setup")
    }
}

// ── ISR handlers ──────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe extern "C" fn dome_open_edge_isr(arg: *mut core::ffi::c_void) {
    // SAFETY: `arg` is the `&'static DomeShared` registered below.
    let shared = unsafe { &*(arg as *const DomeShared) };
    shared.notify_open_edge();
}

#[cfg(target_os = "espidf")]
unsafe extern "C" fn dome_closed_edge_isr(arg: *mut core::ffi::c_void) {
    // SAFETY: `arg` is the `&'static DomeShared` registered below.
    let shared = unsafe { &*(arg as *const DomeShared) };
    shared.notify_closed_edge();
}

#[cfg(target_os = "espidf")]
unsafe extern "C" fn rain_event_isr(arg: *mut core::ffi::c_void) {
    // SAFETY: `arg` is the `&'static RainEventLatch` registered below.
    let latch = unsafe { &*(arg as *const RainEventLatch) };
    latch.signal();
}

#[cfg(target_os = "espidf")]
fn check(ret: esp_err_t, err: fn(i32) -> HwInitError) -> Result<(), HwInitError> {
    if ret == ESP_OK { Ok(()) } else { Err(err(ret)) }
}

/// Attach `handler` to `pin` on `intr` edges, with `arg` as its context.
#[cfg(target_os = "espidf")]
unsafe fn attach(
    pin: i32,
    intr: gpio_int_type_t,
    handler: unsafe extern "C" fn(*mut core::ffi::c_void),
    arg: *const core::ffi::c_void,
) -> Result<(), HwInitError> {
    // SAFETY: caller guarantees `arg` outlives the handler registration.
    unsafe {
        check(gpio_set_intr_type(pin, intr), HwInitError::GpioConfigFailed)?;
        check(gpio_isr_handler_add(pin, Some(handler), arg.cast_mut()), HwInitError::HandlerAddFailed)?;
        check(gpio_intr_enable(pin), HwInitError::GpioConfigFailed)
    }
}

/// Install the per-pin ISR service and register the dome and rain
/// handlers.  The boundary pins must already be configured as inputs.
#[cfg(target_os = "espidf")]
pub fn install_edge_isrs(
    dome: Option<&'static DomeShared>,
    rain: Option<&'static RainEventLatch>,
) -> Result<(), HwInitError> {
    // SAFETY: called once from main before the task loops start; the
    // registered contexts are 'static.
    unsafe {
        let ret = gpio_install_isr_service(0);
        if ret != ESP_OK && ret != ESP_ERR_INVALID_STATE {
            return Err(HwInitError::IsrInstallFailed(ret));
        }

        if let Some(shared) = dome {
            let arg = (shared as *const DomeShared).cast();
            attach(pins::DOME_OPEN_SENSOR_GPIO, gpio_int_type_t_GPIO_INTR_ANYEDGE, dome_open_edge_isr, arg)?;
            attach(pins::DOME_CLOSED_SENSOR_GPIO, gpio_int_type_t_GPIO_INTR_ANYEDGE, dome_closed_edge_isr, arg)?;
            info!("hw_init: dome boundary ISRs installed");
        }

        if let Some(latch) = rain {
            // Input-only pin with an external pull-up on the sensor board.
            let cfg = gpio_config_t {
                pin_bit_mask: 1u64 << pins::RAIN_EVENT_GPIO,
                mode: gpio_mode_t_GPIO_MODE_INPUT,
                pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
                pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
                intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
            };
            check(gpio_config(&cfg), HwInitError::GpioConfigFailed)?;
            let arg = (latch as *const RainEventLatch).cast();
            attach(pins::RAIN_EVENT_GPIO, gpio_int_type_t_GPIO_INTR_NEGEDGE, rain_event_isr, arg)?;
            info!("hw_init: rain event ISR installed");
        }
    }
    Ok(())
}

/// Simulation fallback: nothing raises edges, tests call the notify
/// methods directly.
#[cfg(not(target_os = "espidf"))]
pub fn install_edge_isrs(
    dome: Option<&'static DomeShared>,
    rain: Option<&'static RainEventLatch>,
) -> Result<(), HwInitError> {
    log::info!(
        "hw_init(sim): ISR service skipped (dome={}, rain={})",
        dome.is_some(),
        rain.is_some()
    );
    Ok(())
}
