//! Runtime configuration of the acquisition engine.
//!
//! Separate from the TOML schema in `sampler_config`; see `conversions` for
//! the bridge.
use std::time::Duration;

pub use crate::axis::{AxisCfg, AxisLimits, AxisPolicy};
pub use crate::filter::{NoiseBand, NoiseCfg};

/// Timer intervals and countdown length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingCfg {
    /// Poll interval of a manual sweep (ms).
    pub sweep_interval_ms: u64,
    /// Poll interval while stepping automatically (ms).
    pub period_interval_ms: u64,
    /// Countdown tick interval (ms).
    pub countdown_interval_ms: u64,
    /// Countdown ticks before stepping begins.
    pub countdown: u32,
}

impl Default for TimingCfg {
    fn default() -> Self {
        Self {
            sweep_interval_ms: 10,
            period_interval_ms: 10,
            countdown_interval_ms: 1000,
            countdown: 5,
        }
    }
}

impl TimingCfg {
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }

    pub fn period_interval(&self) -> Duration {
        Duration::from_millis(self.period_interval_ms)
    }

    pub fn countdown_interval(&self) -> Duration {
        Duration::from_millis(self.countdown_interval_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EngineCfg {
    pub timing: TimingCfg,
    pub noise: NoiseCfg,
    pub axes: AxisCfg,
}
