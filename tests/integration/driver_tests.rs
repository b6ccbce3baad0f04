//! Driver tests against embedded-hal mocks: direct relays, limit switches
//! and the SC16IS750 expander behind the shared bus.

use std::time::Duration;

use crate::mock_hw::{MockI2c, MockI2cError, MockPin};

use skywatch::app::ports::{BoundarySensors, ShutterActuator};
use skywatch::drivers::boundary::GpioBoundarySensors;
use skywatch::drivers::expander::{ExpanderActuator, Sc16is750, SharedBus};
use skywatch::drivers::relay::RelayActuator;
use skywatch::error::ActuatorError;
use skywatch::pins;

const REG_IODIR: u8 = 0x0A;
const REG_IOSTATE: u8 = 0x0B;
const TIMEOUT: Duration = Duration::from_millis(5);

// ── Relays ────────────────────────────────────────────────────

#[test]
fn relays_start_low_and_follow_the_actuator_level() {
    let (r1, r2) = (MockPin::new(true), MockPin::new(true));
    let mut relays = RelayActuator::new(r1.clone(), r2.clone()).unwrap();
    assert!(!r1.is_high_now() && !r2.is_high_now());

    relays.set_open(true).unwrap();
    assert!(r1.is_high_now() && r2.is_high_now());
    relays.set_open(false).unwrap();
    assert!(!r1.is_high_now() && !r2.is_high_now());
}

#[test]
fn one_broken_relay_still_drives_the_other() {
    let (r1, r2) = (MockPin::new(false), MockPin::new(false));
    let mut relays = RelayActuator::new(r1.clone(), r2.clone()).unwrap();
    relays.set_open(true).unwrap();

    r1.break_pin();
    assert_eq!(relays.set_open(false), Err(ActuatorError::PinWrite));
    assert!(!r2.is_high_now());
}

// ── Boundary sensors ──────────────────────────────────────────

#[test]
fn boundary_inputs_are_active_low() {
    let (open, closed) = (MockPin::new(true), MockPin::new(false));
    let mut sensors = GpioBoundarySensors::new(open.clone(), closed.clone());
    assert!(!sensors.open_asserted());
    assert!(sensors.closed_asserted());

    open.drive(false);
    closed.drive(true);
    assert!(sensors.open_asserted());
    assert!(!sensors.closed_asserted());
}

#[test]
fn unreadable_boundary_input_counts_as_not_asserted() {
    let (open, closed) = (MockPin::new(false), MockPin::new(false));
    let mut sensors = GpioBoundarySensors::new(open, closed.clone());
    closed.break_pin();
    assert!(!sensors.closed_asserted());
}

// ── Expander ──────────────────────────────────────────────────

#[test]
fn expander_probe_checks_scratch_register() {
    let i2c = MockI2c::new(pins::EXPANDER_I2C_ADDR);
    assert!(Sc16is750::new(i2c, pins::EXPANDER_I2C_ADDR).probe());

    let i2c = MockI2c::new(0x4D);
    assert!(!Sc16is750::new(i2c, pins::EXPANDER_I2C_ADDR).probe());
}

#[test]
fn expander_actuator_drives_both_relay_pins() {
    let i2c = MockI2c::new(pins::EXPANDER_I2C_ADDR);
    let bus = SharedBus::new(Sc16is750::new(i2c.clone(), pins::EXPANDER_I2C_ADDR));
    let mut act = ExpanderActuator::new(
        &bus,
        [pins::DOME_RELAY_1_EXPANDER_PIN, pins::DOME_RELAY_2_EXPANDER_PIN],
        TIMEOUT,
    );

    act.set_open(true).unwrap();
    assert_eq!(i2c.reg(REG_IOSTATE), 0b11);
    assert_eq!(i2c.reg(REG_IODIR), 0b11);

    act.set_open(false).unwrap();
    assert_eq!(i2c.reg(REG_IOSTATE), 0);
    assert_eq!(i2c.reg(REG_IODIR), 0b11, "pins stay outputs");

    // Level is written before direction on the first access.
    let writes = i2c.state.borrow().writes.clone();
    assert_eq!(writes[0], vec![REG_IOSTATE << 3, 0b01]);
    assert_eq!(writes[1], vec![REG_IODIR << 3, 0b01]);
}

#[test]
fn expander_errors_map_to_actuator_errors() {
    let i2c = MockI2c::new(pins::EXPANDER_I2C_ADDR);
    let bus = SharedBus::new(Sc16is750::new(i2c.clone(), pins::EXPANDER_I2C_ADDR));
    let mut act = ExpanderActuator::new(&bus, [0, 1], TIMEOUT);

    i2c.set_fail(Some(|| MockI2cError::Nack));
    assert_eq!(act.set_open(false), Err(ActuatorError::NotConnected));

    i2c.set_fail(Some(|| MockI2cError::Bus));
    assert_eq!(act.set_open(false), Err(ActuatorError::PinWrite));
}

#[test]
fn held_bus_reports_busy_instead_of_blocking() {
    let i2c = MockI2c::new(pins::EXPANDER_I2C_ADDR);
    let bus = SharedBus::new(Sc16is750::new(i2c.clone(), pins::EXPANDER_I2C_ADDR));
    let mut act = ExpanderActuator::new(&bus, [0, 1], TIMEOUT);

    // Another user (sensor acquisition) holds the bus.
    let inner = bus.with_bounded(TIMEOUT, |_| act.set_open(false)).unwrap();
    assert_eq!(inner, Err(ActuatorError::BusBusy));
    assert!(i2c.state.borrow().writes.is_empty());
}
