//! Skywatch Firmware — Main Entry Point
//!
//! Weather station safety interlock: the lookout rule engine decides
//! whether conditions are safe, the dome controller keeps the shutter in
//! line with that decision.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  SnapshotBoard   RelayActuator /      GpioBoundary   NvsAdapter│
//! │  (SensorPort)    ExpanderActuator     (Boundary)     (Config)  │
//! │  LogEventSink    Esp32TimeAdapter     GPIO ISRs (edges, rain)  │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌───────────────────────────┐  ┌──────────────────────────┐   │
//! │  │ LookoutService (core 1,5) │─▶│ DomeController (core 1,22)│  │
//! │  │ rules · suspend · config  │  │ close-first · classify   │   │
//! │  └───────────────────────────┘  └──────────────────────────┘   │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::time::Duration;

use anyhow::Result;
use esp_idf_svc::hal::gpio::{AnyIOPin, AnyInputPin, AnyOutputPin, PinDriver};
use esp_idf_svc::hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::hal::units::Hertz;
use log::{error, info, warn};

use skywatch::adapters::log_sink::LogEventSink;
use skywatch::adapters::nvs::NvsAdapter;
use skywatch::adapters::time::Esp32TimeAdapter;
use skywatch::app::ports::{ConfigPort, ShutterActuator};
use skywatch::app::service::LookoutService;
use skywatch::app::tasks::{run_dome_task, run_lookout_task};
use skywatch::config::SystemConfig;
use skywatch::dome::DomeController;
use skywatch::dome::shared::{DomeHandle, DomeShared};
use skywatch::drivers::boundary::GpioBoundarySensors;
use skywatch::drivers::expander::{ExpanderActuator, Sc16is750, SharedBus};
use skywatch::drivers::hw_init::install_edge_isrs;
use skywatch::drivers::relay::RelayActuator;
use skywatch::drivers::task_pin::{TaskSpec, spawn_task};
use skywatch::error::Error;
use skywatch::lookout::latch::RainEventLatch;
use skywatch::lookout::status::SafetyMonitor;
use skywatch::pins;
use skywatch::sensors::SnapshotBoard;

// ── Shared state ──────────────────────────────────────────────
//
// Everything crossing a task or ISR boundary lives here.  The sensor
// acquisition side publishes into SNAPSHOTS; the lookout only reads.

static DOME: DomeShared = DomeShared::new();
static RAIN_LATCH: RainEventLatch = RainEventLatch::new();
static MONITOR: SafetyMonitor = SafetyMonitor::new();
static SNAPSHOTS: SnapshotBoard = SnapshotBoard::new();

type ExpanderBus = SharedBus<Sc16is750<I2cDriver<'static>>>;

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Skywatch v{}                        ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Load config from NVS (or defaults) ─────────────────
    let nvs = match NvsAdapter::new() {
        Ok(n) => n,
        Err(e) => {
            warn!("NVS init failed ({}), running with defaults and no persistence", e);
            NvsAdapter::default()
        }
    };
    let config = match nvs.load() {
        Ok(cfg) => {
            info!("Config loaded from NVS");
            cfg
        }
        Err(e) => {
            warn!("NVS config load failed ({}), using defaults", e);
            SystemConfig::default()
        }
    };

    let peripherals = Peripherals::take()?;

    // ── 3. Dome hardware + dome task ──────────────────────────
    if config.has_dome {
        let lock_timeout = Duration::from_millis(u64::from(config.bus_lock_timeout_ms));
        if config.dome_via_expander {
            let bus = expander_bus(peripherals.i2c0)?;
            let actuator = ExpanderActuator::new(
                bus,
                [pins::DOME_RELAY_1_EXPANDER_PIN, pins::DOME_RELAY_2_EXPANDER_PIN],
                lock_timeout,
            );
            start_dome(actuator, &config)?;
        } else {
            // SAFETY: each GPIO number is claimed exactly once, here.
            let relay_1 = PinDriver::output(unsafe { AnyOutputPin::new(pins::DOME_RELAY_1_GPIO) })?;
            let relay_2 = PinDriver::output(unsafe { AnyOutputPin::new(pins::DOME_RELAY_2_GPIO) })?;
            let actuator = RelayActuator::new(relay_1, relay_2).map_err(Error::from)?;
            start_dome(actuator, &config)?;
        }
    } else {
        info!("No dome fitted, shutter control disabled");
    }

    let rain = config.has_rain_sensor.then_some(&RAIN_LATCH);
    let dome = config.has_dome.then_some(&DOME);
    install_edge_isrs(dome, rain).map_err(Error::from)?;

    // ── 4. Lookout task ───────────────────────────────────────
    let service = LookoutService::new(config.clone(), &RAIN_LATCH, &MONITOR);
    spawn_task(TaskSpec::LOOKOUT, move || {
        run_lookout_task(
            service,
            &SNAPSHOTS,
            DomeHandle::new(&DOME),
            LogEventSink::new(),
            nvs,
            Esp32TimeAdapter::new(),
        );
    })?;

    info!("System ready.");

    // ── 5. Park ───────────────────────────────────────────────
    loop {
        std::thread::sleep(Duration::from_secs(60));
        if !MONITOR.is_safe() && MONITOR.is_active() {
            info!("Conditions unsafe, shutter {:?}", DOME.state());
        }
    }
}

/// Bring up I²C and the expander, then leak the shared bus so both the
/// dome task and any acquisition code can hold a `&'static` to it.
fn expander_bus(i2c: esp_idf_svc::hal::i2c::I2C0) -> Result<&'static ExpanderBus> {
    let cfg = I2cConfig::new().baudrate(Hertz(pins::I2C_BAUDRATE_HZ));
    // SAFETY: SDA/SCL are claimed exactly once, here.
    let (sda, scl) = unsafe { (AnyIOPin::new(pins::I2C_SDA_GPIO), AnyIOPin::new(pins::I2C_SCL_GPIO)) };
    let driver = I2cDriver::new(i2c, sda, scl, &cfg)?;

    let mut expander = Sc16is750::new(driver, pins::EXPANDER_I2C_ADDR);
    if !expander.probe() {
        // Keep going: every close attempt will fail loudly and raise the
        // alarm, which is what the operator needs to see.
        error!("GPIO expander not responding, dome commands will fail");
    }
    Ok(Box::leak(Box::new(SharedBus::new(expander))))
}

/// Pair `actuator` with the boundary inputs and spawn the dome task.
fn start_dome<A>(actuator: A, config: &SystemConfig) -> Result<()>
where
    A: ShutterActuator + Send + 'static,
{
    // SAFETY: the boundary GPIOs are claimed exactly once, here.
    let open_pin = PinDriver::input(unsafe { AnyInputPin::new(pins::DOME_OPEN_SENSOR_GPIO) })?;
    let closed_pin = PinDriver::input(unsafe { AnyInputPin::new(pins::DOME_CLOSED_SENSOR_GPIO) })?;
    let sensors = GpioBoundarySensors::new(open_pin, closed_pin);

    let controller = DomeController::new(actuator, sensors, &DOME);
    let cfg = config.clone();
    spawn_task(TaskSpec::DOME, move || {
        run_dome_task(controller, &cfg, LogEventSink::new());
    })?;
    Ok(())
}
