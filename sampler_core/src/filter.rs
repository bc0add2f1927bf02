//! Noise rejection for thrust and torque readings.
//!
//! A reading is kept when `min_abs <= |x| <= max_abs`, otherwise the last
//! accepted value of the same channel is repeated. Speed is never filtered.
//! The default lower bounds are negative, so in practice only the upper bound
//! rejects anything.

use sampler_traits::Channel;

/// Tolerance band for one channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseBand {
    pub min_abs: f64,
    pub max_abs: f64,
}

impl NoiseBand {
    pub const THRUST: NoiseBand = NoiseBand {
        min_abs: -1.0,
        max_abs: 2.0,
    };
    pub const TORQUE: NoiseBand = NoiseBand {
        min_abs: -0.1,
        max_abs: 0.1,
    };

    pub fn accepts(&self, candidate: f64) -> bool {
        let m = candidate.abs();
        self.min_abs <= m && m <= self.max_abs
    }

    pub fn apply(&self, candidate: f64, last_accepted: f64) -> f64 {
        filter(candidate, last_accepted, self.min_abs, self.max_abs)
    }
}

/// Keep `candidate` if its magnitude lies within `[min_abs, max_abs]`,
/// otherwise return `last_accepted`. NaN is never accepted.
#[inline]
pub fn filter(candidate: f64, last_accepted: f64, min_abs: f64, max_abs: f64) -> f64 {
    let m = candidate.abs();
    if min_abs <= m && m <= max_abs {
        candidate
    } else {
        last_accepted
    }
}

/// Bands for the filtered channels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseCfg {
    pub thrust: NoiseBand,
    pub torque: NoiseBand,
}

impl Default for NoiseCfg {
    fn default() -> Self {
        Self {
            thrust: NoiseBand::THRUST,
            torque: NoiseBand::TORQUE,
        }
    }
}

impl NoiseCfg {
    /// Band for `channel`; `None` means the channel is passed through.
    pub fn band(&self, channel: Channel) -> Option<NoiseBand> {
        match channel {
            Channel::Thrust => Some(self.thrust),
            Channel::Torque => Some(self.torque),
            Channel::Speed => None,
        }
    }

    /// Value to store for `candidate` given the channel's last stored value.
    pub fn apply(&self, channel: Channel, candidate: f64, last_accepted: f64) -> f64 {
        match self.band(channel) {
            Some(band) => band.apply(candidate, last_accepted),
            None => candidate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0.5, 0.1, 0.5)]
    #[case(-1.9, 0.1, -1.9)]
    #[case(2.0, 0.1, 2.0)]
    #[case(2.5, 0.1, 0.1)]
    #[case(-7.0, 0.3, 0.3)]
    #[case(f64::NAN, 0.3, 0.3)]
    fn thrust_band(#[case] candidate: f64, #[case] last: f64, #[case] expected: f64) {
        assert_eq!(NoiseBand::THRUST.apply(candidate, last), expected);
    }

    #[test]
    fn torque_rejects_spikes() {
        assert_eq!(NoiseBand::TORQUE.apply(0.05, 0.0), 0.05);
        assert_eq!(NoiseBand::TORQUE.apply(0.2, 0.04), 0.04);
    }

    #[test]
    fn speed_passes_through() {
        let cfg = NoiseCfg::default();
        assert_eq!(cfg.band(Channel::Speed), None);
        assert_eq!(cfg.apply(Channel::Speed, 9000.0, 0.0), 9000.0);
        assert_eq!(cfg.apply(Channel::Thrust, 9000.0, 1.0), 1.0);
    }

    #[test]
    fn first_reading_rejection_falls_back_to_zero() {
        assert_eq!(filter(5.0, 0.0, -1.0, 2.0), 0.0);
    }
}
