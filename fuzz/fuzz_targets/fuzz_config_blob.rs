//! Fuzz target: stored configuration blob
//!
//! Feeds arbitrary bytes to the NVS adapter as if they were the stored
//! config and verifies:
//! - `load()` never panics
//! - Anything `load()` accepts passes validation and can be saved back
//!
//! cargo fuzz run fuzz_config_blob

#![no_main]

use libfuzzer_sys::fuzz_target;
use skywatch::adapters::nvs::NvsAdapter;
use skywatch::app::ports::ConfigPort;

fuzz_target!(|data: &[u8]| {
    let Ok(nvs) = NvsAdapter::new() else {
        return;
    };
    nvs.inject_raw(data);
    if let Ok(cfg) = nvs.load() {
        assert!(cfg.validate().is_ok());
        assert!(nvs.save(&cfg).is_ok());
    }
});
