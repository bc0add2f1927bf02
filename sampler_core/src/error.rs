use thiserror::Error;

/// A raw line that carried a channel marker but could not be turned into a sample.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DecodeError {
    #[error("malformed line {line:?}: {reason}")]
    Malformed { line: String, reason: String },
}

impl DecodeError {
    pub(crate) fn malformed(line: &str, reason: impl Into<String>) -> Self {
        DecodeError::Malformed {
            line: line.trim_end().to_string(),
            reason: reason.into(),
        }
    }
}

/// User-supplied run parameters that cannot be used.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("invalid values entered for step configuration (period={period:?}, steps={steps:?})")]
    InvalidStepParameters { period: String, steps: String },
    #[error("throttle level {0} outside 0..=65")]
    ThrottleOutOfRange(f64),
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SamplerError {
    #[error("connection error: {0}")]
    Connectivity(String),
    #[error("busy: {0}")]
    Busy(&'static str),
    #[error("no sampling mode selected")]
    NoMode,
    #[error("{action} is not available in {mode} mode")]
    WrongMode {
        action: &'static str,
        mode: &'static str,
    },
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("device error: {0}")]
    Device(String),
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("missing device")]
    MissingDevice,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
