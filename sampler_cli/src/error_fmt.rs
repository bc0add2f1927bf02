//! Human-readable error descriptions, exit codes and structured JSON errors.

use sampler_core::error::{BuildError, ConfigError, SamplerError};
use serde_json::json;
use thiserror::Error;

/// Failures that happen in the CLI before the engine runs.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("cannot read {path}: {source}")]
    Input {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    if let Some(ce) = err.downcast_ref::<CliError>() {
        return match ce {
            CliError::Config(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun."
            ),
            CliError::Input { path, source } => format!(
                "What happened: Could not read {path} ({source}).\nHow to fix: Check the path and permissions."
            ),
        };
    }

    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingDevice => {
                "What happened: No device was provided to the engine.\nLikely causes: The serial port failed to open.\nHow to fix: Check [serial].port and the cable.".to_string()
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun."
            ),
        };
    }

    if let Some(se) = err.downcast_ref::<SamplerError>() {
        return match se {
            SamplerError::Connectivity(msg) => format!(
                "What happened: Connection error ({msg}).\nLikely causes: Bench unplugged, wrong port, or the firmware stopped answering.\nHow to fix: Reconnect the device, check [serial].port and baud_rate, then run `sampler self-check`."
            ),
            SamplerError::Config(ConfigError::InvalidStepParameters { period, steps }) => format!(
                "What happened: Invalid values entered for step configuration (period={period}, steps={steps}).\nHow to fix: Both --period-ms and --steps must be positive whole numbers."
            ),
            SamplerError::Config(ConfigError::ThrottleOutOfRange(level)) => format!(
                "What happened: Throttle level {level} is out of range.\nHow to fix: Use a level between 0 and 65."
            ),
            SamplerError::Device(msg) => format!(
                "What happened: The device rejected a request ({msg}).\nLikely causes: Firmware and host disagree on the protocol.\nHow to fix: Re-run with --log-level=debug and check the firmware version."
            ),
            other => format!(
                "What happened: {other}.\nHow to fix: Re-run with --log-level=debug for more detail."
            ),
        };
    }

    // Generic fallback
    let msg = err.to_string();
    let cause = err
        .chain()
        .nth(1)
        .map(|src| format!(" Cause: {src}"))
        .unwrap_or_default();
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit codes: 2 configuration, 3 connectivity, 1 anything else.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if matches!(err.downcast_ref::<CliError>(), Some(CliError::Config(_)))
        || err.downcast_ref::<BuildError>().is_some()
    {
        return 2;
    }
    match err.downcast_ref::<SamplerError>() {
        Some(SamplerError::Config(_)) => 2,
        Some(SamplerError::Connectivity(_)) => 3,
        _ => 1,
    }
}

fn reason_name(err: &eyre::Report) -> &'static str {
    if let Some(se) = err.downcast_ref::<SamplerError>() {
        return match se {
            SamplerError::Connectivity(_) => "Connectivity",
            SamplerError::Busy(_) => "Busy",
            SamplerError::NoMode => "NoMode",
            SamplerError::WrongMode { .. } => "WrongMode",
            SamplerError::Decode(_) => "Decode",
            SamplerError::Config(_) => "Config",
            SamplerError::Device(_) => "Device",
        };
    }
    match err.downcast_ref::<CliError>() {
        Some(CliError::Config(_)) => "Config",
        Some(CliError::Input { .. }) => "Input",
        None if err.downcast_ref::<BuildError>().is_some() => "Config",
        None => "Error",
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    json!({
        "reason": reason_name(err),
        "exit_code": exit_code_for_error(err),
        "message": humanize(err),
    })
    .to_string()
}
