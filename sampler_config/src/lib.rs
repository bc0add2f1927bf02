#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema for the test-bench sampler.
//!
//! - `Config` and its sections are deserialized from TOML; every section is
//!   optional and falls back to the bench defaults.
//! - `validate()` rejects values the engine cannot run with.
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SerialCfg {
    /// Device path, e.g. "/dev/ttyACM0". Only used by the hardware backend.
    pub port: Option<String>,
    pub baud_rate: u32,
    /// Read timeout for one line (ms)
    pub timeout_ms: u64,
}

impl Default for SerialCfg {
    fn default() -> Self {
        Self {
            port: None,
            baud_rate: 57_600,
            timeout_ms: 1000,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SamplingCfg {
    /// Poll interval while sweeping manually (ms)
    pub sweep_interval_ms: u64,
    /// Poll interval while stepping automatically (ms)
    pub period_interval_ms: u64,
    /// Countdown tick interval (ms)
    pub countdown_interval_ms: u64,
    /// Countdown length in ticks before an automatic sequence starts stepping
    pub countdown_s: u32,
}

impl Default for SamplingCfg {
    fn default() -> Self {
        Self {
            sweep_interval_ms: 10,
            period_interval_ms: 10,
            countdown_interval_ms: 1000,
            countdown_s: 5,
        }
    }
}

/// Tolerance bands for the noise filter. A reading is kept when
/// `min_abs <= |x| <= max_abs`; the negative lower bounds are deliberate.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct NoiseCfg {
    pub thrust_min_abs: f64,
    pub thrust_max_abs: f64,
    pub torque_min_abs: f64,
    pub torque_max_abs: f64,
}

impl Default for NoiseCfg {
    fn default() -> Self {
        Self {
            thrust_min_abs: -1.0,
            thrust_max_abs: 2.0,
            torque_min_abs: -0.1,
            torque_max_abs: 0.1,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AxesCfg {
    /// Initial time-axis span (ms)
    pub time_ms: u64,
    pub thrust: f64,
    pub torque: f64,
    pub speed: f64,
    /// Time-axis growth step (ms)
    pub time_step_ms: u64,
    /// Value-axis growth factor applied to a new extreme
    pub headroom: f64,
}

impl Default for AxesCfg {
    fn default() -> Self {
        Self {
            time_ms: 5000,
            thrust: 3.0,
            torque: 1.0,
            speed: 10_000.0,
            time_step_ms: 10_000,
            headroom: 1.1,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct TranscriptCfg {
    /// Append every raw line and status message to this file
    pub file: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub serial: SerialCfg,
    pub sampling: SamplingCfg,
    pub filter: NoiseCfg,
    pub axes: AxesCfg,
    pub logging: Logging,
    pub transcript: TranscriptCfg,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Serial
        if self.serial.baud_rate == 0 {
            eyre::bail!("serial.baud_rate must be > 0");
        }
        if self.serial.timeout_ms == 0 {
            eyre::bail!("serial.timeout_ms must be >= 1");
        }
        if let Some(port) = &self.serial.port
            && port.trim().is_empty()
        {
            eyre::bail!("serial.port must not be empty when set");
        }

        // Sampling
        if self.sampling.sweep_interval_ms == 0 {
            eyre::bail!("sampling.sweep_interval_ms must be >= 1");
        }
        if self.sampling.period_interval_ms == 0 {
            eyre::bail!("sampling.period_interval_ms must be >= 1");
        }
        if self.sampling.countdown_interval_ms == 0 {
            eyre::bail!("sampling.countdown_interval_ms must be >= 1");
        }
        if self.sampling.countdown_s > 3600 {
            eyre::bail!("sampling.countdown_s is unreasonably large (>1h)");
        }

        // Filter: only the upper bounds are meaningful
        for (name, v) in [
            ("filter.thrust_max_abs", self.filter.thrust_max_abs),
            ("filter.torque_max_abs", self.filter.torque_max_abs),
        ] {
            if !(v.is_finite() && v > 0.0) {
                eyre::bail!("{name} must be a positive number");
            }
        }
        if !self.filter.thrust_min_abs.is_finite() || !self.filter.torque_min_abs.is_finite() {
            eyre::bail!("filter lower bounds must be finite");
        }
        if self.filter.thrust_min_abs > self.filter.thrust_max_abs
            || self.filter.torque_min_abs > self.filter.torque_max_abs
        {
            eyre::bail!("filter lower bounds must not exceed the upper bounds");
        }

        // Axes
        if self.axes.time_ms == 0 {
            eyre::bail!("axes.time_ms must be >= 1");
        }
        if self.axes.time_step_ms == 0 {
            eyre::bail!("axes.time_step_ms must be >= 1");
        }
        for (name, v) in [
            ("axes.thrust", self.axes.thrust),
            ("axes.torque", self.axes.torque),
            ("axes.speed", self.axes.speed),
        ] {
            if !(v.is_finite() && v > 0.0) {
                eyre::bail!("{name} must be a positive number");
            }
        }
        if !(self.axes.headroom.is_finite() && self.axes.headroom >= 1.0) {
            eyre::bail!("axes.headroom must be >= 1.0");
        }

        // Logging
        if let Some(rot) = self.logging.rotation.as_deref()
            && !matches!(rot, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly, got {rot:?}");
        }

        Ok(())
    }
}
