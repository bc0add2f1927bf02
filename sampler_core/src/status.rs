//! Outcome of a single engine tick.

use crate::protocol::Sample;

#[derive(Debug, Clone, PartialEq)]
pub enum TickStatus {
    /// No timer armed; nothing was done.
    Inactive,
    /// A poll ran. `sample` is what was stored, if the line was a reading.
    Polled { sample: Option<Sample> },
    /// Countdown advanced; `remaining` ticks left before stepping.
    Countdown { remaining: u32 },
    /// Countdown finished and stepping began at the first level.
    SteppingStarted { level: f64 },
    /// A period elapsed and the throttle moved to `level`.
    StepChanged { level: f64 },
    /// Every step ran; the sequence is over and the engine is idle.
    SequenceComplete,
    /// The device link failed during the tick; the timer is disarmed.
    LinkLost,
}

impl TickStatus {
    /// True when no timer is left armed after this tick.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TickStatus::Inactive | TickStatus::SequenceComplete | TickStatus::LinkLost
        )
    }
}
