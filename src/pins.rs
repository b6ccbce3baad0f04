//! GPIO / peripheral pin assignments for the station main board.
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Dome shutter actuator
// ---------------------------------------------------------------------------

/// Expander pins driving the two dome relays (when `dome_via_expander`).
pub const DOME_RELAY_1_EXPANDER_PIN: u8 = 0;
pub const DOME_RELAY_2_EXPANDER_PIN: u8 = 1;

/// Direct GPIO relays (when the expander is not fitted).
pub const DOME_RELAY_1_GPIO: i32 = 26;
pub const DOME_RELAY_2_GPIO: i32 = 27;

// ---------------------------------------------------------------------------
// Dome boundary sensors (input-only pins, external pull-ups)
// ---------------------------------------------------------------------------

/// LOW = shutter fully closed.
pub const DOME_CLOSED_SENSOR_GPIO: i32 = 39;
/// LOW = shutter fully open.
pub const DOME_OPEN_SENSOR_GPIO: i32 = 36;

// ---------------------------------------------------------------------------
// Rain sensor event line
// ---------------------------------------------------------------------------

/// Falling edge when the rain sensor detects drops.
pub const RAIN_EVENT_GPIO: i32 = 35;

// ---------------------------------------------------------------------------
// I²C bus shared with the SC16IS750 UART/GPIO expander
// ---------------------------------------------------------------------------

pub const I2C_SDA_GPIO: i32 = 21;
pub const I2C_SCL_GPIO: i32 = 22;
pub const I2C_BAUDRATE_HZ: u32 = 100_000;
/// 7-bit address (0x90 in 8-bit notation).
pub const EXPANDER_I2C_ADDR: u8 = 0x48;
