//! Sampling modes, orchestrator states and step plans.
use std::time::Duration;

use crate::error::ConfigError;
use crate::util::linspace_at;

/// Highest throttle level the bench accepts.
pub const MAX_THROTTLE: f64 = 65.0;

/// Operator-selected way of driving the bench.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplingMode {
    /// Operator starts/stops a sweep and sets the throttle by hand.
    Manual,
    /// Countdown, then a fixed number of equal-length throttle steps.
    AutoPeriod,
}

impl SamplingMode {
    pub const fn label(self) -> &'static str {
        match self {
            SamplingMode::Manual => "manual",
            SamplingMode::AutoPeriod => "auto period",
        }
    }
}

/// Where the engine is. At most one of the three timers is armed, and it is
/// the one matching the state (see [`OrchestratorState::timer_kind`]).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OrchestratorState {
    Idle,
    ManualRunning,
    ManualPaused,
    AutoCountdown {
        remaining: u32,
    },
    AutoStepping {
        step_index: u64,
        remaining_period_ms: i64,
        remaining_steps: i64,
        throttle_levels: ThrottleLevels,
    },
}

impl OrchestratorState {
    pub fn timer_kind(&self) -> Option<TimerKind> {
        match self {
            OrchestratorState::Idle | OrchestratorState::ManualPaused => None,
            OrchestratorState::ManualRunning => Some(TimerKind::Sweep),
            OrchestratorState::AutoCountdown { .. } => Some(TimerKind::Countdown),
            OrchestratorState::AutoStepping { .. } => Some(TimerKind::Period),
        }
    }

    pub fn is_auto(&self) -> bool {
        matches!(
            self,
            OrchestratorState::AutoCountdown { .. } | OrchestratorState::AutoStepping { .. }
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            OrchestratorState::Idle => "idle",
            OrchestratorState::ManualRunning => "manual running",
            OrchestratorState::ManualPaused => "manual paused",
            OrchestratorState::AutoCountdown { .. } => "countdown",
            OrchestratorState::AutoStepping { .. } => "stepping",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    Sweep,
    Countdown,
    Period,
}

/// The armed timer: which one and how often it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timer {
    pub kind: TimerKind,
    pub interval: Duration,
}

/// Validated parameters of an automatic sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepPlan {
    pub period_ms: i64,
    pub steps: i64,
}

impl StepPlan {
    pub fn new(period_ms: i64, steps: i64) -> Result<Self, ConfigError> {
        if period_ms <= 0 || steps <= 0 {
            return Err(ConfigError::InvalidStepParameters {
                period: period_ms.to_string(),
                steps: steps.to_string(),
            });
        }
        Ok(Self { period_ms, steps })
    }

    /// Parse operator-entered text. Anything that is not a positive integer
    /// is rejected.
    pub fn parse(period: &str, steps: &str) -> Result<Self, ConfigError> {
        let invalid = || ConfigError::InvalidStepParameters {
            period: period.to_string(),
            steps: steps.to_string(),
        };
        let p: i64 = period.trim().parse().map_err(|_| invalid())?;
        let s: i64 = steps.trim().parse().map_err(|_| invalid())?;
        Self::new(p, s).map_err(|_| invalid())
    }

    /// `steps` levels evenly spaced from 0 to [`MAX_THROTTLE`].
    pub fn throttle_levels(&self) -> ThrottleLevels {
        ThrottleLevels {
            count: u64::try_from(self.steps).unwrap_or(0),
        }
    }
}

/// Evenly spaced throttle levels from 0 to [`MAX_THROTTLE`], computed on
/// demand so any step count costs constant memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrottleLevels {
    count: u64,
}

impl ThrottleLevels {
    pub fn get(&self, index: u64) -> Option<f64> {
        linspace_at(0.0, MAX_THROTTLE, self.count, index)
    }

    pub fn first(&self) -> Option<f64> {
        self.get(0)
    }

    pub fn len(&self) -> u64 {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        (0..self.count).filter_map(move |i| self.get(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, 3)]
    #[case(-5, 3)]
    #[case(1000, 0)]
    #[case(1000, -1)]
    fn non_positive_plans_are_rejected(#[case] period: i64, #[case] steps: i64) {
        assert!(matches!(
            StepPlan::new(period, steps),
            Err(ConfigError::InvalidStepParameters { .. })
        ));
    }

    #[rstest]
    #[case("abc", "3")]
    #[case("1000", "")]
    #[case("10.5", "3")]
    #[case("1000", "0")]
    fn bad_text_is_rejected_verbatim(#[case] period: &str, #[case] steps: &str) {
        let err = StepPlan::parse(period, steps).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidStepParameters {
                period: period.into(),
                steps: steps.into()
            }
        );
    }

    #[test]
    fn parsed_plan_has_linspace_levels() {
        let plan = StepPlan::parse(" 1000 ", "3").unwrap();
        assert_eq!(plan.period_ms, 1000);
        let levels: Vec<f64> = plan.throttle_levels().iter().collect();
        assert_eq!(levels, vec![0.0, 32.5, 65.0]);
        assert_eq!(plan.throttle_levels().get(3), None);
    }

    #[test]
    fn single_step_plan_stays_at_zero() {
        let levels = StepPlan::new(500, 1).unwrap().throttle_levels();
        assert_eq!(levels.len(), 1);
        assert_eq!(levels.first(), Some(0.0));
        assert_eq!(levels.get(1), None);
    }

    #[test]
    fn huge_plans_do_not_allocate_a_table() {
        let levels = StepPlan::new(1000, 1_000_000_000_000)
            .unwrap()
            .throttle_levels();
        assert_eq!(levels.len(), 1_000_000_000_000);
        assert_eq!(levels.first(), Some(0.0));
        assert_eq!(levels.get(999_999_999_999), Some(MAX_THROTTLE));
    }

    #[test]
    fn timers_follow_state() {
        assert_eq!(OrchestratorState::Idle.timer_kind(), None);
        assert_eq!(OrchestratorState::ManualPaused.timer_kind(), None);
        assert_eq!(
            OrchestratorState::ManualRunning.timer_kind(),
            Some(TimerKind::Sweep)
        );
        assert_eq!(
            OrchestratorState::AutoCountdown { remaining: 2 }.timer_kind(),
            Some(TimerKind::Countdown)
        );
    }
}
