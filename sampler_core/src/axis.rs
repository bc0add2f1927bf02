//! Plot axis bookkeeping.
//!
//! Axes only ever widen: the time axis grows by one step whenever a sample
//! lands past it, and a value axis jumps to `headroom * extreme` whenever the
//! session extreme exceeds it. Reset is the only way back to the defaults.

use sampler_traits::Channel;

/// Current axis limits. Value limits are indexed by [`Channel::index`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisLimits {
    pub time_limit_ms: u64,
    values: [f64; 3],
}

impl Default for AxisLimits {
    fn default() -> Self {
        Self::new(5000, 3.0, 1.0, 10_000.0)
    }
}

impl AxisLimits {
    pub const fn new(time_limit_ms: u64, thrust: f64, torque: f64, speed: f64) -> Self {
        Self {
            time_limit_ms,
            values: [thrust, torque, speed],
        }
    }

    pub fn value_limit(&self, channel: Channel) -> f64 {
        self.values[channel.index()]
    }

    pub fn with_value_limit(mut self, channel: Channel, limit: f64) -> Self {
        self.values[channel.index()] = limit;
        self
    }

    pub fn with_time_limit(mut self, limit_ms: u64) -> Self {
        self.time_limit_ms = limit_ms;
        self
    }
}

/// Displayed range of a value axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueBounds {
    pub lower: f64,
    pub upper: f64,
}

impl ValueBounds {
    /// Thrust and torque are shown symmetric around zero, speed from zero up.
    pub fn for_limit(channel: Channel, limit: f64) -> Self {
        match channel {
            Channel::Thrust | Channel::Torque => Self {
                lower: -limit,
                upper: limit,
            },
            Channel::Speed => Self {
                lower: 0.0,
                upper: limit,
            },
        }
    }
}

/// Outcome of one axis check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rescale {
    pub limits: AxisLimits,
    /// New time-axis span, when it grew.
    pub time: Option<u64>,
    /// New value-axis range for the checked channel, when it grew.
    pub value: Option<ValueBounds>,
}

impl Rescale {
    pub fn is_noop(&self) -> bool {
        self.time.is_none() && self.value.is_none()
    }
}

/// How far the axes grow once exceeded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisPolicy {
    pub time_step_ms: u64,
    pub headroom: f64,
}

impl Default for AxisPolicy {
    fn default() -> Self {
        Self {
            time_step_ms: 10_000,
            headroom: 1.1,
        }
    }
}

impl AxisPolicy {
    /// Check a new sample against `limits`.
    ///
    /// `new_value` is expected to be the session's running `max |value|` for
    /// `kind`; passing the raw sample works too but lets the axis lag behind
    /// older extremes.
    pub fn check_and_rescale(
        &self,
        kind: Channel,
        new_time: u64,
        new_value: f64,
        limits: &AxisLimits,
    ) -> Rescale {
        let mut next = *limits;
        let mut time = None;
        let mut value = None;

        if new_time > next.time_limit_ms {
            next.time_limit_ms = next.time_limit_ms.saturating_add(self.time_step_ms);
            time = Some(next.time_limit_ms);
        }

        let extreme = new_value.abs();
        if extreme > next.value_limit(kind) {
            let limit = extreme * self.headroom;
            next = next.with_value_limit(kind, limit);
            value = Some(ValueBounds::for_limit(kind, limit));
        }

        Rescale {
            limits: next,
            time,
            value,
        }
    }
}

/// [`AxisPolicy::check_and_rescale`] with the bench defaults.
pub fn check_and_rescale(
    kind: Channel,
    new_time: u64,
    new_value: f64,
    limits: &AxisLimits,
) -> Rescale {
    AxisPolicy::default().check_and_rescale(kind, new_time, new_value, limits)
}

/// Axis defaults and growth policy.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AxisCfg {
    pub defaults: AxisLimits,
    pub policy: AxisPolicy,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thrust_above_limit_widens_with_headroom() {
        let limits = AxisLimits::default().with_value_limit(Channel::Thrust, 0.4);
        let r = check_and_rescale(Channel::Thrust, 1200, 0.5, &limits);
        assert_eq!(r.time, None);
        let b = r.value.unwrap();
        assert!((b.upper - 0.55).abs() < 1e-12);
        assert!((b.lower + 0.55).abs() < 1e-12);
        assert!((r.limits.value_limit(Channel::Thrust) - 0.55).abs() < 1e-12);
    }

    #[test]
    fn time_grows_one_step_per_check() {
        let limits = AxisLimits::default();
        let r = check_and_rescale(Channel::Speed, 40_000, 10.0, &limits);
        assert_eq!(r.time, Some(15_000));
        let r = check_and_rescale(Channel::Speed, 40_000, 10.0, &r.limits);
        assert_eq!(r.time, Some(25_000));
    }

    #[test]
    fn speed_axis_starts_at_zero() {
        let limits = AxisLimits::default();
        let r = check_and_rescale(Channel::Speed, 0, 20_000.0, &limits);
        let b = r.value.unwrap();
        assert_eq!(b.lower, 0.0);
        assert!((b.upper - 22_000.0).abs() < 1e-6);
    }

    #[test]
    fn within_limits_is_a_noop() {
        let limits = AxisLimits::default();
        let r = check_and_rescale(Channel::Torque, 5000, 1.0, &limits);
        assert!(r.is_noop());
        assert_eq!(r.limits, limits);
    }
}
