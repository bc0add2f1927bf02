#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Arbitrary TOML must either fail to parse or validate without panicking,
    // and anything that validates must also build an engine config.
    if let Ok(cfg) = sampler_config::load_toml(data)
        && cfg.validate().is_ok()
    {
        let _ = sampler_core::EngineCfg::from(&cfg);
    }
});
