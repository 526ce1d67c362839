#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(samples) = steady_config::read_trace(data) {
        assert!(samples.windows(2).all(|w| w[0].t_ms <= w[1].t_ms));
    }
});
