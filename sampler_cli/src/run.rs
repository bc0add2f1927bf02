//! Command implementations.

use std::io::Read;
use std::path::Path;
use std::time::Duration;

use eyre::{Result, WrapErr};
use sampler_config::Config;
use sampler_core::error::SamplerError;
use sampler_core::protocol::decode_transcript;
use sampler_core::transcript::{FileTranscript, TeeTranscript};
use sampler_core::{Channel, Engine, EngineCfg, RunSummary, Runner, SamplingMode, StopReason};
use sampler_traits::{Device, MonotonicClock};
use serde_json::json;
use tracing::{info, warn};

use crate::error_fmt::CliError;
use crate::sinks::{StdoutTranscript, TracingVisualizer};

/// Output switches shared by every command.
#[derive(Debug, Clone, Copy)]
pub struct Output {
    pub json: bool,
    pub quiet: bool,
}

#[cfg(feature = "hardware")]
pub fn open_device(cfg: &Config) -> Result<Box<dyn Device>> {
    let port = cfg
        .serial
        .port
        .as_deref()
        .ok_or_else(|| CliError::Config("serial.port is required with the hardware backend".into()))?;
    let dev = sampler_hardware::serial::SerialDevice::open(
        port,
        cfg.serial.baud_rate,
        Duration::from_millis(cfg.serial.timeout_ms),
    )
    .map_err(|e| eyre::Report::new(SamplerError::Connectivity(e.to_string())))?;
    Ok(Box::new(dev))
}

/// Simulated bench. `SAMPLER_SIM_GLITCH_EVERY=N` garbles every N-th line and
/// `SAMPLER_SIM_UNPLUGGED=1` starts with the link down.
#[cfg(not(feature = "hardware"))]
pub fn open_device(_cfg: &Config) -> Result<Box<dyn Device>> {
    let mut dev = sampler_hardware::SimulatedDevice::new();
    if let Some(n) = std::env::var("SAMPLER_SIM_GLITCH_EVERY")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
    {
        dev = dev.with_glitch_every(n);
    }
    if std::env::var("SAMPLER_SIM_UNPLUGGED").is_ok_and(|v| v == "1") {
        dev.link().disconnect();
    }
    Ok(Box::new(dev))
}

fn build_engine(
    cfg: &Config,
    engine_cfg: EngineCfg,
    out: Output,
) -> Result<Engine<Box<dyn Device>>> {
    let device = open_device(cfg)?;
    let mut tee = TeeTranscript::new();
    if !out.quiet {
        tee = tee.with(StdoutTranscript::new(out.json));
    }
    if let Some(path) = cfg.transcript.file.as_deref() {
        let file = FileTranscript::open(path).map_err(|source| CliError::Input {
            path: path.to_string(),
            source,
        })?;
        tee = tee.with(file);
    }
    Engine::builder()
        .with_device(device)
        .with_transcript(tee)
        .with_visualizer(TracingVisualizer)
        .with_config(engine_cfg)
        .build()
}

/// Ctrl-C becomes a stop request for the runner.
fn stop_channel() -> crossbeam_channel::Receiver<()> {
    let (tx, rx) = crossbeam_channel::bounded(1);
    if let Err(e) = ctrlc::set_handler(move || {
        let _ = tx.try_send(());
    }) {
        warn!(error = %e, "Ctrl-C handler not installed");
    }
    rx
}

fn print_summary<D: Device>(engine: &Engine<D>, summary: &RunSummary, out: Output) {
    let active = engine.sessions().active();
    let count = |c: Channel| active.map_or(0, |s| s.channel(c).len());
    let max_abs = |c: Channel| active.map_or(0.0, |s| s.channel(c).running_max_abs());

    if out.json {
        let channels: serde_json::Map<String, serde_json::Value> = Channel::ALL
            .iter()
            .map(|&c| {
                (
                    c.name().to_string(),
                    json!({ "samples": count(c), "max_abs": max_abs(c) }),
                )
            })
            .collect();
        println!(
            "{}",
            json!({
                "summary": summary,
                "channels": channels,
                "sessions": engine.sessions().len(),
            })
        );
        return;
    }

    println!(
        "Run finished ({:?}) after {} ms: {} ticks, {} samples, {} skipped",
        summary.reason, summary.elapsed_ms, summary.ticks, summary.samples, summary.skipped_ticks
    );
    for c in Channel::ALL {
        println!(
            "  {:<6} {:>6} samples, max |x| = {:.4}",
            c.name(),
            count(c),
            max_abs(c)
        );
    }
    if !summary.steps.is_empty() {
        let steps: Vec<String> = summary.steps.iter().map(|l| l.to_string()).collect();
        println!("  throttle steps: {}", steps.join(", "));
    }
}

fn link_lost() -> eyre::Report {
    eyre::Report::new(SamplerError::Connectivity(
        "device link lost during the run".into(),
    ))
}

pub fn run_sweep(cfg: &Config, duration_ms: u64, throttle: Option<f64>, out: Output) -> Result<()> {
    let mut engine = build_engine(cfg, EngineCfg::from(cfg), out)?;
    engine.select_mode(SamplingMode::Manual)?;
    if let Some(level) = throttle {
        engine.set_throttle(level)?;
    }
    engine.run_sweep()?;
    info!(duration_ms, "sweeping");

    let mut runner = Runner::new(MonotonicClock::new())
        .with_stop_signal(stop_channel())
        .with_budget(Duration::from_millis(duration_ms));
    let summary = runner.run(&mut engine);

    let summary = match summary {
        Ok(s) => s,
        Err(e) => {
            engine.shutdown();
            return Err(e);
        }
    };
    if summary.reason == StopReason::LinkLost {
        return Err(link_lost());
    }
    engine.stop_sweep()?;
    print_summary(&engine, &summary, out);
    engine.shutdown();
    Ok(())
}

pub fn run_period(
    cfg: &Config,
    period_ms: i64,
    steps: i64,
    countdown: Option<u32>,
    out: Output,
) -> Result<()> {
    let mut engine_cfg = EngineCfg::from(cfg);
    if let Some(n) = countdown {
        engine_cfg.timing.countdown = n;
    }
    let mut engine = build_engine(cfg, engine_cfg, out)?;
    engine.select_mode(SamplingMode::AutoPeriod)?;
    engine.run_period(period_ms, steps)?;

    let mut runner = Runner::new(MonotonicClock::new()).with_stop_signal(stop_channel());
    let summary = runner.run(&mut engine);
    engine.shutdown();
    let summary = summary?;
    if summary.reason == StopReason::LinkLost {
        return Err(link_lost());
    }
    print_summary(&engine, &summary, out);
    Ok(())
}

/// Decode a recorded transcript from `file`, or stdin.
pub fn run_decode(file: Option<&Path>, out: Output) -> Result<()> {
    let text = match file {
        Some(path) => std::fs::read_to_string(path).map_err(|source| CliError::Input {
            path: path.display().to_string(),
            source,
        })?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .lock()
                .read_to_string(&mut buf)
                .wrap_err("reading transcript from stdin")?;
            buf
        }
    };

    let mut ok = 0usize;
    let mut bad = 0usize;
    for result in decode_transcript(text.lines()) {
        match result {
            Ok(sample) => {
                ok += 1;
                if out.json {
                    println!("{}", serde_json::to_string(&sample)?);
                } else if !out.quiet {
                    println!(
                        "{:<6} t={:>8} ms  {:.6}",
                        sample.channel.name(),
                        sample.timestamp_ms,
                        sample.value
                    );
                }
            }
            Err(e) => {
                bad += 1;
                eprintln!("skipped: {e}");
            }
        }
    }

    if out.json {
        println!("{}", json!({ "decoded": ok, "malformed": bad }));
    } else {
        println!("Decoded {ok} samples, {bad} malformed");
    }
    Ok(())
}

pub fn run_self_check(cfg: &Config, out: Output) -> Result<()> {
    let mut engine = build_engine(cfg, EngineCfg::from(cfg), Output { quiet: true, ..out })?;
    engine.check_link()?;
    if out.json {
        println!("{}", json!({ "link": "ok" }));
    } else {
        println!("Link ok");
    }
    Ok(())
}
