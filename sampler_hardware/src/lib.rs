//! Device backends for the test-bench sampler.
//!
//! - `SimulatedDevice`: in-process stand-in for the bench firmware (default).
//! - `serial::SerialDevice`: the real link over a serial port (`hardware` feature).
pub mod error;
pub mod util;

#[cfg(feature = "hardware")]
pub mod serial;

use std::cell::Cell;
use std::rc::Rc;

use sampler_traits::{BoxError, Device, cmd};
use tracing::{debug, trace};

use crate::error::HwError;

/// What the simulated firmware has been told, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimCommand {
    Byte(u8),
    Throttle(u32),
    ResetInput,
}

/// Shared handle that plugs/unplugs a `SimulatedDevice`.
#[derive(Debug, Clone)]
pub struct LinkSwitch(Rc<Cell<bool>>);

impl LinkSwitch {
    pub fn connect(&self) {
        self.0.set(true);
    }
    pub fn disconnect(&self) {
        self.0.set(false);
    }
    pub fn is_connected(&self) -> bool {
        self.0.get()
    }
}

/// Simulated bench firmware.
///
/// While exporting it emits a repeating frame of four lines: one thrust line,
/// two torque lines (one per load cell) and one speed line. Readings scale
/// with the last throttle level; timestamps advance by `line_period_ms` per
/// emitted line and restart at 0 on `'t'`.
pub struct SimulatedDevice {
    link: LinkSwitch,
    exporting: bool,
    read_mode: bool,
    awaiting_throttle: bool,
    throttle: u32,
    clock_ms: u64,
    line_period_ms: u64,
    emitted: u64,
    glitch_every: Option<u64>,
    history: Vec<SimCommand>,
}

impl SimulatedDevice {
    pub fn new() -> Self {
        Self {
            link: LinkSwitch(Rc::new(Cell::new(true))),
            exporting: false,
            read_mode: false,
            awaiting_throttle: false,
            throttle: 0,
            clock_ms: 0,
            line_period_ms: 10,
            emitted: 0,
            glitch_every: None,
            history: Vec::new(),
        }
    }

    pub fn with_line_period_ms(mut self, ms: u64) -> Self {
        self.line_period_ms = ms.max(1);
        self
    }

    /// Replace every `n`-th emitted line with garbage.
    pub fn with_glitch_every(mut self, n: u64) -> Self {
        self.glitch_every = (n > 0).then_some(n);
        self
    }

    pub fn link(&self) -> LinkSwitch {
        self.link.clone()
    }

    pub fn throttle(&self) -> u32 {
        self.throttle
    }

    pub fn is_exporting(&self) -> bool {
        self.exporting
    }

    pub fn in_read_mode(&self) -> bool {
        self.read_mode
    }

    pub fn history(&self) -> &[SimCommand] {
        &self.history
    }

    fn ensure_link(&self) -> Result<(), HwError> {
        if self.link.is_connected() {
            Ok(())
        } else {
            Err(HwError::Disconnected)
        }
    }

    fn next_line(&mut self) -> String {
        let n = self.emitted;
        self.emitted += 1;
        self.clock_ms += self.line_period_ms;
        let ts = self.clock_ms;

        if let Some(every) = self.glitch_every
            && (n + 1) % every == 0
        {
            return "HX7T 0 ?? 0 garbled\n".to_string();
        }

        let level = f64::from(self.throttle);
        // small deterministic ripple so traces are not flat
        let ripple = ((n % 7) as f64 - 3.0) * 0.001;
        match n % 4 {
            0 => format!("HX7T 0 {:.6} 0 {ts} 0\n", level * 0.02 + ripple),
            1 => format!("HX7M 1 {:.6} 0 {ts} 0\n", level * 0.001 + ripple * 0.1),
            2 => format!("HX7M 2 {:.6} 0 {ts} 0\n", level * 0.001 - ripple * 0.1),
            _ => format!("RPMp 0 {:.1} 0 {ts} 0\n", level * 120.0),
        }
    }
}

impl Default for SimulatedDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl Device for SimulatedDevice {
    fn write_command(&mut self, command: u8) -> Result<(), BoxError> {
        self.ensure_link()?;
        if self.awaiting_throttle {
            return Err(Box::new(HwError::Protocol(format!(
                "command {:?} while throttle bytes are pending",
                command as char
            ))));
        }
        match command {
            cmd::READ_MODE => self.read_mode = true,
            cmd::RESUME_EXPORT => self.exporting = true,
            cmd::PAUSE_EXPORT => self.exporting = false,
            cmd::RESET_TIMESTAMPS => self.clock_ms = 0,
            cmd::SET_THROTTLE => self.awaiting_throttle = true,
            other => {
                return Err(Box::new(HwError::Protocol(format!(
                    "unknown command {:?}",
                    other as char
                ))));
            }
        }
        self.history.push(SimCommand::Byte(command));
        trace!(command = %(command as char), "sim command");
        Ok(())
    }

    fn write_throttle(&mut self, level: u32) -> Result<(), BoxError> {
        self.ensure_link()?;
        if !self.awaiting_throttle {
            return Err(Box::new(HwError::Protocol(
                "throttle bytes without a preceding 'n'".into(),
            )));
        }
        let bytes = util::encode_throttle(level);
        self.throttle = u32::from_le_bytes(bytes);
        self.awaiting_throttle = false;
        self.history.push(SimCommand::Throttle(self.throttle));
        debug!(throttle = self.throttle, "sim throttle set");
        Ok(())
    }

    fn read_line(&mut self) -> Result<Vec<u8>, BoxError> {
        self.ensure_link()?;
        if !self.exporting {
            return Ok(Vec::new());
        }
        Ok(self.next_line().into_bytes())
    }

    fn reset_input_buffer(&mut self) -> Result<(), BoxError> {
        self.ensure_link()?;
        self.history.push(SimCommand::ResetInput);
        self.emitted = 0;
        Ok(())
    }

    fn probe(&mut self) -> Result<(), BoxError> {
        Ok(self.ensure_link()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silent_until_export_resumed() {
        let mut dev = SimulatedDevice::new();
        assert!(dev.read_line().unwrap().is_empty());
        dev.write_command(cmd::RESUME_EXPORT).unwrap();
        let line = String::from_utf8(dev.read_line().unwrap()).unwrap();
        assert!(line.starts_with("HX7T"));
    }

    #[test]
    fn throttle_requires_prefix() {
        let mut dev = SimulatedDevice::new();
        assert!(dev.write_throttle(10).is_err());
        dev.write_command(cmd::SET_THROTTLE).unwrap();
        dev.write_throttle(10).unwrap();
        assert_eq!(dev.throttle(), 10);
    }
}
