#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Parse, validate and resolve presets; errors are fine, panics are not.
    let Ok(cfg) = steady_config::load_toml(data) else {
        return;
    };
    if cfg.validate().is_ok() {
        // A validated config must always resolve.
        let eff = cfg.effective().unwrap();
        assert!(eff.threshold_px >= 1);
        assert!(eff.time_threshold_s > 0.0);
    }
});
