//! Fuzz target: lookout evaluation cycle
//!
//! Decodes the input into a sequence of (time step, snapshot, rain edge)
//! cycles and runs them through a default-configured `Lookout`, checking:
//! - No panics, whatever the readings (NaN and infinities included)
//! - A safe decision never coexists with a satisfied unsafe rule
//! - The inconsistent-decision alarm is never raised
//!
//! cargo fuzz run fuzz_lookout_cycle

#![no_main]

use libfuzzer_sys::fuzz_target;
use skywatch::config::LookoutConfig;
use skywatch::lookout::{Decision, Lookout};
use skywatch::sensors::{Reading, SensorSnapshot};

const CYCLE_BYTES: usize = 12;

fn reading_f32(flag: u8, bytes: [u8; 4]) -> Reading<f32> {
    if flag & 1 == 0 {
        Reading::missing()
    } else {
        Reading::present(f32::from_le_bytes(bytes))
    }
}

fuzz_target!(|data: &[u8]| {
    let mut lookout = Lookout::new(&LookoutConfig::default());
    let mut now = 0u64;

    for chunk in data.chunks_exact(CYCLE_BYTES) {
        let flags = chunk[0];
        now += u64::from(chunk[1]) * 8;
        let snapshot = SensorSnapshot {
            wind_speed: reading_f32(flags, [chunk[2], chunk[3], chunk[4], chunk[5]]),
            cloud_coverage: reading_f32(flags >> 1, [chunk[6], chunk[7], chunk[8], chunk[9]]),
            rain_intensity: if flags & 0b100 == 0 {
                Reading::missing()
            } else {
                Reading::present(chunk[10] & 0x07)
            },
        };
        let rain_event = chunk[11] == 0xFF;

        if lookout.evaluate(&snapshot, rain_event, now) == Decision::Safe {
            let r = lookout.rules_state();
            assert!(!r.unsafe_wind_speed.iter().any(|f| *f));
            assert!(!r.unsafe_cloud_coverage.iter().any(|f| *f));
            assert!(!r.unsafe_rain_intensity.iter().any(|f| *f));
            assert!(!r.unsafe_rain_event);
        }
        assert!(lookout.take_alarm().is_none());
    }
});
