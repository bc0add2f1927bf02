//! `From` implementations bridging `sampler_config` types to `sampler_core` types.

use crate::axis::{AxisCfg, AxisLimits, AxisPolicy};
use crate::config::{EngineCfg, TimingCfg};
use crate::filter::{NoiseBand, NoiseCfg};

// ── TimingCfg ────────────────────────────────────────────────────────────────

impl From<&sampler_config::SamplingCfg> for TimingCfg {
    fn from(c: &sampler_config::SamplingCfg) -> Self {
        Self {
            sweep_interval_ms: c.sweep_interval_ms,
            period_interval_ms: c.period_interval_ms,
            countdown_interval_ms: c.countdown_interval_ms,
            countdown: c.countdown_s,
        }
    }
}

// ── NoiseCfg ─────────────────────────────────────────────────────────────────

impl From<&sampler_config::NoiseCfg> for NoiseCfg {
    fn from(c: &sampler_config::NoiseCfg) -> Self {
        Self {
            thrust: NoiseBand {
                min_abs: c.thrust_min_abs,
                max_abs: c.thrust_max_abs,
            },
            torque: NoiseBand {
                min_abs: c.torque_min_abs,
                max_abs: c.torque_max_abs,
            },
        }
    }
}

// ── AxisCfg ──────────────────────────────────────────────────────────────────

impl From<&sampler_config::AxesCfg> for AxisCfg {
    fn from(c: &sampler_config::AxesCfg) -> Self {
        Self {
            defaults: AxisLimits::new(c.time_ms, c.thrust, c.torque, c.speed),
            policy: AxisPolicy {
                time_step_ms: c.time_step_ms,
                headroom: c.headroom,
            },
        }
    }
}

// ── EngineCfg ────────────────────────────────────────────────────────────────

impl From<&sampler_config::Config> for EngineCfg {
    fn from(c: &sampler_config::Config) -> Self {
        Self {
            timing: (&c.sampling).into(),
            noise: (&c.filter).into(),
            axes: (&c.axes).into(),
        }
    }
}
