//! Dome relays behind the SC16IS750 I²C UART/GPIO expander.
//!
//! The expander sits on a bus shared with sensor acquisition, so every
//! access goes through [`SharedBus`]: one mutex, acquired right before the
//! pin writes and released right after, with a bounded wait.  A timed-out
//! acquire is reported as [`ActuatorError::BusBusy`] and retried by the
//! caller on its next cycle.

use std::time::{Duration, Instant};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::Mutex;
use embedded_hal::i2c::{ErrorKind, I2c};
use log::{info, warn};

use crate::app::ports::ShutterActuator;
use crate::error::ActuatorError;

// ── Shared bus ────────────────────────────────────────────────

pub struct SharedBus<T> {
    inner: Mutex<CriticalSectionRawMutex, T>,
}

impl<T> SharedBus<T> {
    pub const fn new(device: T) -> Self {
        Self {
            inner: Mutex::new(device),
        }
    }

    /// Run `f` with exclusive access, waiting at most `timeout`.
    pub fn with_bounded<R>(&self, timeout: Duration, f: impl FnOnce(&mut T) -> R) -> Result<R, ActuatorError> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Ok(mut guard) = self.inner.try_lock() {
                return Ok(f(&mut guard));
            }
            if Instant::now() >= deadline {
                return Err(ActuatorError::BusBusy);
            }
            std::thread::sleep(Duration::from_millis(1));
        }
    }
}

// ── SC16IS750 GPIO ────────────────────────────────────────────

const REG_SPR: u8 = 0x07;
const REG_IODIR: u8 = 0x0A;
const REG_IOSTATE: u8 = 0x0B;
/// Register address goes in bits 6..3 of the sub-address byte.
const REG_ADDR_SHIFT: u8 = 3;
const PROBE_PATTERN: u8 = 0x41;

pub struct Sc16is750<I2C> {
    i2c: I2C,
    address: u8,
    /// Shadow copies; the chip is write-mostly from our side.
    iodir: u8,
    iostate: u8,
}

fn map_i2c_err(e: impl embedded_hal::i2c::Error) -> ActuatorError {
    match e.kind() {
        ErrorKind::NoAcknowledge(_) => ActuatorError::NotConnected,
        _ => ActuatorError::PinWrite,
    }
}

impl<I2C: I2c> Sc16is750<I2C> {
    pub fn new(i2c: I2C, address: u8) -> Self {
        Self {
            i2c,
            address,
            iodir: 0,
            iostate: 0,
        }
    }

    fn write_reg(&mut self, reg: u8, value: u8) -> Result<(), ActuatorError> {
        self.i2c
            .write(self.address, &[reg << REG_ADDR_SHIFT, value])
            .map_err(map_i2c_err)
    }

    fn read_reg(&mut self, reg: u8) -> Result<u8, ActuatorError> {
        let mut buf = [0u8; 1];
        self.i2c
            .write_read(self.address, &[reg << REG_ADDR_SHIFT], &mut buf)
            .map_err(map_i2c_err)?;
        Ok(buf[0])
    }

    /// Scratch-pad write/read-back.  True if the chip answers.
    pub fn probe(&mut self) -> bool {
        let ok = self.write_reg(REG_SPR, PROBE_PATTERN).is_ok()
            && self.read_reg(REG_SPR).is_ok_and(|v| v == PROBE_PATTERN);
        if ok {
            info!("SC16IS750: found at 0x{:02x}", self.address);
        } else {
            warn!("SC16IS750: no answer at 0x{:02x}", self.address);
        }
        ok
    }

    /// Configure `pin` as an output (if not already) and drive it.
    pub fn set_output(&mut self, pin: u8, high: bool) -> Result<(), ActuatorError> {
        let mask = 1u8 << pin;
        let state = if high { self.iostate | mask } else { self.iostate & !mask };
        // Level first so the pin never glitches high when switched to output.
        self.write_reg(REG_IOSTATE, state)?;
        self.iostate = state;
        if self.iodir & mask == 0 {
            self.write_reg(REG_IODIR, self.iodir | mask)?;
            self.iodir |= mask;
        }
        Ok(())
    }
}

// ── Actuator ──────────────────────────────────────────────────

pub struct ExpanderActuator<'a, I2C> {
    bus: &'a SharedBus<Sc16is750<I2C>>,
    pins: [u8; 2],
    lock_timeout: Duration,
}

impl<'a, I2C: I2c> ExpanderActuator<'a, I2C> {
    pub fn new(bus: &'a SharedBus<Sc16is750<I2C>>, pins: [u8; 2], lock_timeout: Duration) -> Self {
        Self {
            bus,
            pins,
            lock_timeout,
        }
    }
}

impl<I2C: I2c> ShutterActuator for ExpanderActuator<'_, I2C> {
    fn set_open(&mut self, open: bool) -> Result<(), ActuatorError> {
        let pins = self.pins;
        self.bus.with_bounded(self.lock_timeout, |dev| {
            let first = dev.set_output(pins[0], open);
            let second = dev.set_output(pins[1], open);
            first.and(second)
        })?
    }
}
