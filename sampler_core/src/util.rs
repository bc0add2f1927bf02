//! Small numeric helpers for sampler_core.

/// Floor of the mean of two `u64` values; cannot overflow.
#[inline]
pub fn midpoint_u64(a: u64, b: u64) -> u64 {
    a / 2 + b / 2 + (a % 2 + b % 2) / 2
}

/// Element `i` of `n` evenly spaced values from `start` to `end` inclusive,
/// without materializing the sequence. `None` when `i >= n`.
/// - `n == 1` yields `start`.
/// - The last element is exactly `end`.
pub fn linspace_at(start: f64, end: f64, n: u64, i: u64) -> Option<f64> {
    if i >= n {
        return None;
    }
    if n == 1 {
        return Some(start);
    }
    if i == n - 1 {
        return Some(end);
    }
    Some(start + (end - start) * (i as f64) / ((n - 1) as f64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn midpoint_handles_extremes() {
        assert_eq!(midpoint_u64(100, 111), 105);
        assert_eq!(midpoint_u64(u64::MAX, u64::MAX), u64::MAX);
        assert_eq!(midpoint_u64(u64::MAX, u64::MAX - 1), u64::MAX - 1);
        assert_eq!(midpoint_u64(0, 1), 0);
    }

    #[test]
    fn linspace_matches_bench_throttle_table() {
        let three: Vec<f64> = (0..3).filter_map(|i| linspace_at(0.0, 65.0, 3, i)).collect();
        assert_eq!(three, vec![0.0, 32.5, 65.0]);
        assert_eq!(linspace_at(0.0, 65.0, 1, 0), Some(0.0));
        assert_eq!(linspace_at(0.0, 65.0, 0, 0), None);
        assert_eq!(linspace_at(0.0, 65.0, 6, 5), Some(65.0));
        assert_eq!(linspace_at(0.0, 65.0, 6, 6), None);
        assert!((linspace_at(0.0, 65.0, 6, 1).unwrap() - 13.0).abs() < 1e-12);
    }

    #[test]
    fn huge_counts_are_computed_lazily() {
        let n = 1_000_000_000_000;
        assert_eq!(linspace_at(0.0, 65.0, n, 0), Some(0.0));
        assert_eq!(linspace_at(0.0, 65.0, n, n - 1), Some(65.0));
        let mid = linspace_at(0.0, 65.0, n, (n - 1) / 2).unwrap();
        assert!((mid - 32.5).abs() < 1e-6);
    }
}
