#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Acquisition engine of the propulsion test bench (hardware-agnostic).
//!
//! Everything the engine touches goes through `sampler_traits`: the bench
//! firmware behind `Device`, the operator log behind `TranscriptSink`, the
//! live plot behind `Visualizer`.
//!
//! ## Architecture
//!
//! - **Protocol**: raw lines to typed samples (`protocol`)
//! - **Filtering**: noise bands for thrust and torque (`filter`)
//! - **Storage**: per-session, per-channel growable buffers (`session`, `buffer`)
//! - **Axes**: monotone axis growth (`axis`)
//! - **Orchestration**: modes, sweeps, stepped sequences (`engine`, `state`)
//! - **Timing**: fixed-interval pacing and the run loop (`pacer`, `runner`)
//!
//! The engine is single-threaded: actions and ticks take `&mut self`, so a
//! tick can never overlap an action or another tick.

pub mod axis;
pub mod buffer;
pub mod builder;
pub mod config;
pub mod conversions;
pub mod engine;
pub mod error;
pub mod filter;
pub mod hw_error;
pub mod mocks;
pub mod pacer;
pub mod protocol;
pub mod runner;
pub mod session;
pub mod state;
pub mod status;
pub mod transcript;
pub mod util;

pub use axis::{AxisLimits, Rescale, ValueBounds, check_and_rescale};
pub use builder::EngineBuilder;
pub use config::{EngineCfg, TimingCfg};
pub use engine::Engine;
pub use error::{BuildError, ConfigError, DecodeError, SamplerError};
pub use protocol::{Sample, decode};
pub use runner::{RunSummary, Runner, StopReason};
pub use sampler_traits::Channel;
pub use state::{MAX_THROTTLE, OrchestratorState, SamplingMode, StepPlan, ThrottleLevels};
pub use status::TickStatus;
