//! Type-state builder for `Engine`.
//!
//! `build()` only exists once a device has been supplied; `try_build()` is
//! always available and reports what is missing at runtime.

use std::marker::PhantomData;

use sampler_traits::{Channel, Device, TranscriptSink, Visualizer};

use crate::axis::AxisLimits;
use crate::config::{EngineCfg, TimingCfg};
use crate::engine::Engine;
use crate::error::{BuildError, Result};
use crate::mocks::NullVisualizer;
use crate::transcript::NullTranscript;

pub struct Missing;
pub struct Set;

pub struct EngineBuilder<D, S = Missing> {
    device: Option<D>,
    transcript: Option<Box<dyn TranscriptSink>>,
    visualizer: Option<Box<dyn Visualizer>>,
    cfg: Option<EngineCfg>,
    timing: Option<TimingCfg>,
    axis_limits: Option<AxisLimits>,
    _s: PhantomData<S>,
}

impl<D> Default for EngineBuilder<D, Missing> {
    fn default() -> Self {
        Self {
            device: None,
            transcript: None,
            visualizer: None,
            cfg: None,
            timing: None,
            axis_limits: None,
            _s: PhantomData,
        }
    }
}

fn validate(cfg: &EngineCfg) -> std::result::Result<(), BuildError> {
    let t = &cfg.timing;
    if t.sweep_interval_ms == 0 || t.period_interval_ms == 0 || t.countdown_interval_ms == 0 {
        return Err(BuildError::InvalidConfig("timer intervals must be >= 1 ms"));
    }
    for band in [cfg.noise.thrust, cfg.noise.torque] {
        if !(band.min_abs.is_finite() && band.max_abs.is_finite()) {
            return Err(BuildError::InvalidConfig("noise bounds must be finite"));
        }
        if band.min_abs > band.max_abs {
            return Err(BuildError::InvalidConfig(
                "noise lower bound exceeds upper bound",
            ));
        }
    }
    let axes = &cfg.axes;
    if axes.defaults.time_limit_ms == 0 || axes.policy.time_step_ms == 0 {
        return Err(BuildError::InvalidConfig("time axis must be >= 1 ms"));
    }
    if Channel::ALL.iter().any(|c| {
        let v = axes.defaults.value_limit(*c);
        !(v.is_finite() && v > 0.0)
    }) {
        return Err(BuildError::InvalidConfig("axis limits must be positive"));
    }
    if !(axes.policy.headroom.is_finite() && axes.policy.headroom >= 1.0) {
        return Err(BuildError::InvalidConfig("axis headroom must be >= 1.0"));
    }
    Ok(())
}

impl<D: Device, S> EngineBuilder<D, S> {
    /// Fallible build available in any type-state.
    pub fn try_build(self) -> Result<Engine<D>> {
        let device = self
            .device
            .ok_or_else(|| eyre::Report::new(BuildError::MissingDevice))?;

        let mut cfg = self.cfg.unwrap_or_default();
        if let Some(t) = self.timing {
            cfg.timing = t;
        }
        if let Some(l) = self.axis_limits {
            cfg.axes.defaults = l;
        }
        validate(&cfg).map_err(eyre::Report::new)?;

        Ok(Engine::from_parts(
            device,
            self.transcript
                .unwrap_or_else(|| Box::new(NullTranscript)),
            self.visualizer
                .unwrap_or_else(|| Box::new(NullVisualizer)),
            cfg,
        ))
    }
}

impl<D: Device> EngineBuilder<D, Set> {
    pub fn build(self) -> Result<Engine<D>> {
        self.try_build()
    }
}

/// Chainable setters that do not affect type-state.
impl<D, S> EngineBuilder<D, S> {
    pub fn with_transcript(mut self, sink: impl TranscriptSink + 'static) -> Self {
        self.transcript = Some(Box::new(sink));
        self
    }
    pub fn with_visualizer(mut self, vis: impl Visualizer + 'static) -> Self {
        self.visualizer = Some(Box::new(vis));
        self
    }
    pub fn with_config(mut self, cfg: EngineCfg) -> Self {
        self.cfg = Some(cfg);
        self
    }
    /// Override only the timer settings of the config.
    pub fn with_timing(mut self, timing: TimingCfg) -> Self {
        self.timing = Some(timing);
        self
    }
    /// Override the axis limits used at start and after reset.
    pub fn with_axis_limits(mut self, limits: AxisLimits) -> Self {
        self.axis_limits = Some(limits);
        self
    }
}

// Setter that advances type-state
impl<D> EngineBuilder<D, Missing> {
    pub fn with_device(self, device: D) -> EngineBuilder<D, Set> {
        EngineBuilder {
            device: Some(device),
            transcript: self.transcript,
            visualizer: self.visualizer,
            cfg: self.cfg,
            timing: self.timing,
            axis_limits: self.axis_limits,
            _s: PhantomData,
        }
    }
}
