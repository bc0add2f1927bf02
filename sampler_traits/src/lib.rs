//! Collaborator interfaces for the test-bench sampler.
//!
//! The acquisition engine never talks to a serial port, a log widget or a plot
//! directly; it goes through the traits defined here.
pub mod clock;

pub use clock::{Clock, ManualClock, MonotonicClock};

/// Boxed error used at every collaborator boundary.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// One physical measurement stream of the bench.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Channel {
    Thrust,
    Torque,
    Speed,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Channel::Thrust, Channel::Torque, Channel::Speed];

    /// Line marker the measurement device prefixes this channel's readings with.
    pub const fn marker(self) -> &'static str {
        match self {
            Channel::Thrust => "HX7T",
            Channel::Torque => "HX7M",
            Channel::Speed => "RPMp",
        }
    }

    /// Dense index, stable across releases (Thrust=0, Torque=1, Speed=2).
    pub const fn index(self) -> usize {
        match self {
            Channel::Thrust => 0,
            Channel::Torque => 1,
            Channel::Speed => 2,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Channel::Thrust => "thrust",
            Channel::Torque => "torque",
            Channel::Speed => "speed",
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Single-byte commands understood by the measurement device.
pub mod cmd {
    /// Switch the device into read mode.
    pub const READ_MODE: u8 = b'X';
    /// Resume exporting readings.
    pub const RESUME_EXPORT: u8 = b'r';
    /// Pause exporting readings.
    pub const PAUSE_EXPORT: u8 = b's';
    /// Reset device-side timestamps.
    pub const RESET_TIMESTAMPS: u8 = b't';
    /// Set throttle; must be followed by the 4 little-endian throttle bytes.
    pub const SET_THROTTLE: u8 = b'n';
}

/// The measurement/actuation unit on the other end of the serial link.
///
/// Calls are synchronous: a write has completed (or failed) when the method
/// returns, so commands are strictly ordered relative to reads.
pub trait Device {
    fn write_command(&mut self, command: u8) -> Result<(), BoxError>;

    /// Write a throttle level as 4 little-endian bytes.
    fn write_throttle(&mut self, level: u32) -> Result<(), BoxError>;

    /// Read one raw line. An empty vector means nothing arrived before the
    /// link timeout.
    fn read_line(&mut self) -> Result<Vec<u8>, BoxError>;

    fn reset_input_buffer(&mut self) -> Result<(), BoxError>;

    /// Check that the link is still usable.
    fn probe(&mut self) -> Result<(), BoxError> {
        Ok(())
    }
}

impl<T: Device + ?Sized> Device for Box<T> {
    fn write_command(&mut self, command: u8) -> Result<(), BoxError> {
        (**self).write_command(command)
    }
    fn write_throttle(&mut self, level: u32) -> Result<(), BoxError> {
        (**self).write_throttle(level)
    }
    fn read_line(&mut self) -> Result<Vec<u8>, BoxError> {
        (**self).read_line()
    }
    fn reset_input_buffer(&mut self) -> Result<(), BoxError> {
        (**self).reset_input_buffer()
    }
    fn probe(&mut self) -> Result<(), BoxError> {
        (**self).probe()
    }
}

/// Operator-facing transcript: every raw line and status message, in order.
pub trait TranscriptSink {
    fn append_line(&mut self, text: &str);

    fn clear(&mut self) {}
}

/// Live plot of the active session. The engine only ever writes to it.
pub trait Visualizer {
    fn update_series(&mut self, kind: Channel, xs: &[u64], ys: &[f64], session_index: usize);

    /// Widen every time axis to `[0, limit_ms]`.
    fn rescale_time(&mut self, limit_ms: u64);

    fn rescale_value(&mut self, kind: Channel, lower: f64, upper: f64);

    fn redraw(&mut self);

    fn clear(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markers_and_indices_are_distinct() {
        let markers: Vec<_> = Channel::ALL.iter().map(|c| c.marker()).collect();
        assert_eq!(markers, ["HX7T", "HX7M", "RPMp"]);
        let idx: Vec<_> = Channel::ALL.iter().map(|c| c.index()).collect();
        assert_eq!(idx, [0, 1, 2]);
    }
}
