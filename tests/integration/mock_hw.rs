//! Mock hardware adapters for integration tests.
//!
//! Each mock records what the code under test did to it so tests can
//! assert on the full history without touching real GPIO or I²C.  Mocks
//! that get moved into a controller share their state through `Rc` so the
//! test keeps a handle.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use embedded_hal::digital::{self, ErrorType as DigitalErrorType, InputPin, OutputPin};
use embedded_hal::i2c::{self, ErrorType as I2cErrorType, I2c, NoAcknowledgeSource, Operation};

use skywatch::app::events::AppEvent;
use skywatch::app::ports::{BoundarySensors, ConfigError, ConfigPort, EventSink, SensorPort, ShutterActuator, ShutterPort};
use skywatch::config::SystemConfig;
use skywatch::dome::state::ShutterState;
use skywatch::error::{ActuatorError, SafetyAlarm, SensorError};
use skywatch::sensors::{Reading, SensorSnapshot};

// ── Sensors ───────────────────────────────────────────────────

/// Serves whatever snapshot the test last set.  `None` = nothing published.
pub struct FixedSensors {
    pub snapshot: Option<SensorSnapshot>,
}

impl FixedSensors {
    pub fn new(snapshot: SensorSnapshot) -> Self {
        Self {
            snapshot: Some(snapshot),
        }
    }

    pub fn empty() -> Self {
        Self { snapshot: None }
    }
}

impl SensorPort for FixedSensors {
    fn read_snapshot(&mut self) -> Result<SensorSnapshot, SensorError> {
        self.snapshot.ok_or(SensorError::NoSnapshot)
    }
}

/// Calm, clear and dry.
pub fn calm() -> SensorSnapshot {
    SensorSnapshot {
        wind_speed: Reading::present(2.0),
        cloud_coverage: Reading::present(10.0),
        rain_intensity: Reading::present(0),
    }
}

pub fn with_wind(mut s: SensorSnapshot, wind: f32) -> SensorSnapshot {
    s.wind_speed = Reading::present(wind);
    s
}

// ── Shutter port (service-level tests) ────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutterCall {
    Open,
    Close,
}

/// Stands in for the whole dome behind [`ShutterPort`].
pub struct MockShutter {
    pub calls: Vec<ShutterCall>,
    pub fail_close: Option<ActuatorError>,
    pub fail_open: Option<ActuatorError>,
    pub state: ShutterState,
}

impl MockShutter {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            fail_close: None,
            fail_open: None,
            state: ShutterState::Closed,
        }
    }

    pub fn last(&self) -> Option<ShutterCall> {
        self.calls.last().copied()
    }

    pub fn count(&self, call: ShutterCall) -> usize {
        self.calls.iter().filter(|c| **c == call).count()
    }
}

impl Default for MockShutter {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutterPort for MockShutter {
    fn open(&mut self) -> Result<(), ActuatorError> {
        self.calls.push(ShutterCall::Open);
        match self.fail_open {
            Some(e) => Err(e),
            None => {
                self.state = ShutterState::Opening;
                Ok(())
            }
        }
    }

    fn close(&mut self) -> Result<(), ActuatorError> {
        self.calls.push(ShutterCall::Close);
        match self.fail_close {
            Some(e) => Err(e),
            None => {
                self.state = ShutterState::Closing;
                Ok(())
            }
        }
    }

    fn state(&self) -> ShutterState {
        self.state
    }
}

// ── Actuator + boundary (controller-level tests) ──────────────

#[derive(Default)]
struct ActuatorLog {
    levels: Vec<bool>,
    fail_with: Option<ActuatorError>,
}

/// Records every actuator level written; can be told to fail.
#[derive(Clone, Default)]
pub struct RecordingActuator {
    log: Rc<RefCell<ActuatorLog>>,
}

impl RecordingActuator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn levels(&self) -> Vec<bool> {
        self.log.borrow().levels.clone()
    }

    pub fn fail_with(&self, e: Option<ActuatorError>) {
        self.log.borrow_mut().fail_with = e;
    }
}

impl ShutterActuator for RecordingActuator {
    fn set_open(&mut self, open: bool) -> Result<(), ActuatorError> {
        let mut log = self.log.borrow_mut();
        log.levels.push(open);
        match log.fail_with {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// Limit switches the test moves by hand.
#[derive(Clone, Default)]
pub struct ScriptedBoundary {
    open: Rc<Cell<bool>>,
    closed: Rc<Cell<bool>>,
}

impl ScriptedBoundary {
    pub fn new(open: bool, closed: bool) -> Self {
        let b = Self::default();
        b.set(open, closed);
        b
    }

    pub fn set(&self, open: bool, closed: bool) {
        self.open.set(open);
        self.closed.set(closed);
    }
}

impl BoundarySensors for ScriptedBoundary {
    fn open_asserted(&mut self) -> bool {
        self.open.get()
    }

    fn closed_asserted(&mut self) -> bool {
        self.closed.get()
    }
}

// ── Event sink ────────────────────────────────────────────────

pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn alarms(&self) -> Vec<SafetyAlarm> {
        self.events
            .iter()
            .filter_map(|e| match e {
                AppEvent::Alarm(a) => Some(*a),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl Default for RecordingSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Config storage ────────────────────────────────────────────

pub struct MockNvs {
    pub stored: RefCell<Option<SystemConfig>>,
    pub saves: Cell<usize>,
}

impl MockNvs {
    pub fn new() -> Self {
        Self {
            stored: RefCell::new(None),
            saves: Cell::new(0),
        }
    }
}

impl Default for MockNvs {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigPort for MockNvs {
    fn load(&self) -> Result<SystemConfig, ConfigError> {
        Ok(self.stored.borrow().clone().unwrap_or_default())
    }

    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError> {
        config.validate().map_err(ConfigError::ValidationFailed)?;
        *self.stored.borrow_mut() = Some(config.clone());
        self.saves.set(self.saves.get() + 1);
        Ok(())
    }
}

// ── embedded-hal pins ─────────────────────────────────────────

#[derive(Debug)]
pub struct MockPinError;

impl digital::Error for MockPinError {
    fn kind(&self) -> digital::ErrorKind {
        digital::ErrorKind::Other
    }
}

/// GPIO that remembers its level.  `broken` makes every access fail.
#[derive(Clone, Default)]
pub struct MockPin {
    high: Rc<Cell<bool>>,
    broken: Rc<Cell<bool>>,
}

impl MockPin {
    pub fn new(high: bool) -> Self {
        let p = Self::default();
        p.high.set(high);
        p
    }

    pub fn is_high_now(&self) -> bool {
        self.high.get()
    }

    pub fn drive(&self, high: bool) {
        self.high.set(high);
    }

    pub fn break_pin(&self) {
        self.broken.set(true);
    }
}

impl DigitalErrorType for MockPin {
    type Error = MockPinError;
}

impl OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), MockPinError> {
        if self.broken.get() {
            return Err(MockPinError);
        }
        self.high.set(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), MockPinError> {
        if self.broken.get() {
            return Err(MockPinError);
        }
        self.high.set(true);
        Ok(())
    }
}

impl InputPin for MockPin {
    fn is_high(&mut self) -> Result<bool, MockPinError> {
        if self.broken.get() {
            return Err(MockPinError);
        }
        Ok(self.high.get())
    }

    fn is_low(&mut self) -> Result<bool, MockPinError> {
        self.is_high().map(|h| !h)
    }
}

// ── embedded-hal I²C (SC16IS750 register model) ───────────────

#[derive(Debug)]
pub enum MockI2cError {
    Nack,
    Bus,
}

impl i2c::Error for MockI2cError {
    fn kind(&self) -> i2c::ErrorKind {
        match self {
            Self::Nack => i2c::ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address),
            Self::Bus => i2c::ErrorKind::Bus,
        }
    }
}

#[derive(Default)]
pub struct I2cState {
    /// Register number (already shifted back) → last written value.
    pub regs: HashMap<u8, u8>,
    /// Raw write payloads in order.
    pub writes: Vec<Vec<u8>>,
    pub fail: Option<fn() -> MockI2cError>,
}

/// An I²C device that acts as a register file at one address.
#[derive(Clone)]
pub struct MockI2c {
    pub address: u8,
    pub state: Rc<RefCell<I2cState>>,
}

impl MockI2c {
    pub fn new(address: u8) -> Self {
        Self {
            address,
            state: Rc::new(RefCell::new(I2cState::default())),
        }
    }

    pub fn reg(&self, reg: u8) -> u8 {
        self.state.borrow().regs.get(&reg).copied().unwrap_or(0)
    }

    pub fn set_fail(&self, fail: Option<fn() -> MockI2cError>) {
        self.state.borrow_mut().fail = fail;
    }
}

impl I2cErrorType for MockI2c {
    type Error = MockI2cError;
}

impl I2c for MockI2c {
    fn transaction(&mut self, address: u8, operations: &mut [Operation<'_>]) -> Result<(), MockI2cError> {
        let mut st = self.state.borrow_mut();
        if let Some(fail) = st.fail {
            return Err(fail());
        }
        if address != self.address {
            return Err(MockI2cError::Nack);
        }
        let mut pointer = 0u8;
        for op in operations.iter_mut() {
            match op {
                Operation::Write(bytes) => {
                    st.writes.push(bytes.to_vec());
                    if let Some(sub) = bytes.first() {
                        pointer = sub >> 3;
                    }
                    if let Some(value) = bytes.get(1) {
                        st.regs.insert(pointer, *value);
                    }
                }
                Operation::Read(buf) => {
                    let value = st.regs.get(&pointer).copied().unwrap_or(0);
                    buf.fill(value);
                }
            }
        }
        Ok(())
    }
}
