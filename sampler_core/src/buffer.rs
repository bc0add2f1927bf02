//! Growable per-channel storage for one session.

/// Initial capacity and growth step, in samples.
pub const GROWTH: usize = 100;
/// The buffer grows once fewer than this many free slots remain.
const MARGIN: usize = 3;

/// Timestamps and values of one channel in one session.
///
/// Backing vectors are zero-filled up to `capacity()`; only the first `len()`
/// entries are live. Capacity only ever grows, in steps of [`GROWTH`].
#[derive(Debug, Clone)]
pub struct ChannelBuffer {
    timestamps: Vec<u64>,
    values: Vec<f64>,
    count: usize,
    max_abs: f64,
}

impl Default for ChannelBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl ChannelBuffer {
    pub fn new() -> Self {
        Self {
            timestamps: vec![0; GROWTH],
            values: vec![0.0; GROWTH],
            count: 0,
            max_abs: 0.0,
        }
    }

    pub fn append(&mut self, timestamp_ms: u64, value: f64) {
        if self.count + MARGIN > self.capacity() {
            let cap = self.capacity() + GROWTH;
            self.timestamps.resize(cap, 0);
            self.values.resize(cap, 0.0);
        }
        self.timestamps[self.count] = timestamp_ms;
        self.values[self.count] = value;
        self.count += 1;
        self.max_abs = self.max_abs.max(value.abs());
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn capacity(&self) -> usize {
        self.values.len()
    }

    /// Live timestamps, oldest first.
    pub fn timestamps(&self) -> &[u64] {
        &self.timestamps[..self.count]
    }

    /// Live values, oldest first.
    pub fn values(&self) -> &[f64] {
        &self.values[..self.count]
    }

    /// Last stored value; 0.0 while empty.
    pub fn last_value(&self) -> f64 {
        self.values().last().copied().unwrap_or(0.0)
    }

    pub fn last_timestamp(&self) -> Option<u64> {
        self.timestamps().last().copied()
    }

    /// Largest `|value|` stored so far, 0.0 while empty.
    pub fn running_max_abs(&self) -> f64 {
        self.max_abs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_empty_with_initial_capacity() {
        let b = ChannelBuffer::new();
        assert!(b.is_empty());
        assert_eq!(b.capacity(), GROWTH);
        assert_eq!(b.last_value(), 0.0);
        assert_eq!(b.last_timestamp(), None);
    }

    #[test]
    fn grows_before_running_out() {
        let mut b = ChannelBuffer::new();
        for i in 0..98 {
            b.append(i, 1.0);
        }
        assert_eq!(b.capacity(), 100);
        b.append(98, 1.0);
        assert_eq!(b.capacity(), 200);
        assert_eq!(b.len(), 99);
    }

    #[test]
    fn max_abs_tracks_magnitude() {
        let mut b = ChannelBuffer::new();
        b.append(1, 0.2);
        b.append(2, -0.9);
        b.append(3, 0.5);
        assert_eq!(b.running_max_abs(), 0.9);
        assert_eq!(b.values(), &[0.2, -0.9, 0.5]);
        assert_eq!(b.timestamps(), &[1, 2, 3]);
    }
}
