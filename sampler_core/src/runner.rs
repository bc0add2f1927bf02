//! Drives an `Engine` from its armed timer until it goes quiet.
//!
//! The runner is the only thing that sleeps. It stops when the engine disarms
//! (idle or paused), when the optional wall budget runs out, or when a stop
//! signal arrives on the channel.
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError};
use sampler_traits::{Clock, Device};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::engine::Engine;
use crate::error::Result;
use crate::pacer::Pacer;
use crate::status::TickStatus;

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// No timer left armed: the sweep paused or the sequence finished.
    Disarmed,
    /// The wall budget ran out.
    Budget,
    /// A stop signal arrived.
    Signal,
    /// The device link failed.
    LinkLost,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub ticks: u64,
    pub samples: u64,
    pub skipped_ticks: u64,
    /// Throttle levels applied by the sequence, in order.
    pub steps: Vec<f64>,
    pub elapsed_ms: u64,
    pub reason: StopReason,
}

pub struct Runner<C: Clock> {
    pacer: Pacer<C>,
    stop_rx: Option<Receiver<()>>,
    budget: Option<Duration>,
}

impl<C: Clock> Runner<C> {
    pub fn new(clock: C) -> Self {
        Self {
            pacer: Pacer::new(clock),
            stop_rx: None,
            budget: None,
        }
    }

    /// Stop as soon as anything arrives on `rx`. Waits then block on the
    /// channel with a real-time timeout instead of on the clock.
    pub fn with_stop_signal(mut self, rx: Receiver<()>) -> Self {
        self.stop_rx = Some(rx);
        self
    }

    /// Stop after `budget` of clock time even if a timer is still armed.
    pub fn with_budget(mut self, budget: Duration) -> Self {
        self.budget = Some(budget);
        self
    }

    pub fn run<D: Device>(&mut self, engine: &mut Engine<D>) -> Result<RunSummary> {
        let epoch = self.pacer.clock().now();
        let mut summary = RunSummary {
            ticks: 0,
            samples: 0,
            skipped_ticks: 0,
            steps: Vec::new(),
            elapsed_ms: 0,
            reason: StopReason::Disarmed,
        };
        self.pacer.disarm();

        loop {
            let Some(timer) = engine.armed_timer() else {
                break;
            };
            if let Some(budget) = self.budget
                && self.pacer.clock().now().saturating_duration_since(epoch) >= budget
            {
                summary.reason = StopReason::Budget;
                break;
            }

            let (pause, missed) = self.pacer.schedule(timer.interval);
            summary.skipped_ticks += missed;
            if missed > 0 {
                debug!(missed, kind = ?timer.kind, "ticks skipped after overrun");
            }
            if self.sleep_or_stop(pause) {
                summary.reason = StopReason::Signal;
                break;
            }

            summary.ticks += 1;
            let status = engine.tick()?;
            match status {
                TickStatus::Polled { sample: Some(_) } => summary.samples += 1,
                TickStatus::SteppingStarted { level } | TickStatus::StepChanged { level } => {
                    summary.steps.push(level);
                }
                TickStatus::LinkLost => {
                    warn!("run ended: device link lost");
                    summary.reason = StopReason::LinkLost;
                }
                TickStatus::SequenceComplete
                | TickStatus::Polled { sample: None }
                | TickStatus::Countdown { .. }
                | TickStatus::Inactive => {}
            }
            if status.is_terminal() {
                break;
            }
        }

        summary.elapsed_ms = self.pacer.clock().ms_since(epoch);
        info!(
            ticks = summary.ticks,
            samples = summary.samples,
            skipped = summary.skipped_ticks,
            reason = ?summary.reason,
            "run finished"
        );
        Ok(summary)
    }

    /// Returns true when a stop signal arrived during the pause.
    fn sleep_or_stop(&self, pause: Duration) -> bool {
        match &self.stop_rx {
            Some(rx) => match rx.recv_timeout(pause) {
                Ok(()) => true,
                Err(RecvTimeoutError::Timeout) => false,
                Err(RecvTimeoutError::Disconnected) => {
                    self.pacer.clock().sleep(pause);
                    false
                }
            },
            None => {
                self.pacer.clock().sleep(pause);
                false
            }
        }
    }
}
