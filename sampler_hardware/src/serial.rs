use std::io::{ErrorKind, Read, Write};
use std::time::Duration;

use sampler_traits::{BoxError, Device};
use tracing::{debug, trace, warn};

use crate::error::{HwError, Result};
use crate::util::{encode_throttle, take_line};

/// Bench firmware reached over a serial port.
pub struct SerialDevice {
    port: Box<dyn serialport::SerialPort>,
    path: String,
    pending: Vec<u8>,
}

impl SerialDevice {
    pub fn open(path: &str, baud_rate: u32, timeout: Duration) -> Result<Self> {
        let port = serialport::new(path, baud_rate)
            .timeout(timeout)
            .open()
            .map_err(|e| HwError::Serial(format!("open {path}: {e}")))?;
        debug!(path, baud_rate, ?timeout, "serial port opened");
        Ok(Self {
            port,
            path: path.to_string(),
            pending: Vec::new(),
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.port.write_all(bytes)?;
        self.port.flush()?;
        Ok(())
    }
}

impl Device for SerialDevice {
    fn write_command(&mut self, command: u8) -> std::result::Result<(), BoxError> {
        trace!(command = %(command as char), "serial command");
        Ok(self.write_bytes(&[command])?)
    }

    fn write_throttle(&mut self, level: u32) -> std::result::Result<(), BoxError> {
        Ok(self.write_bytes(&encode_throttle(level))?)
    }

    /// Returns whatever arrived before the timeout when no terminator shows
    /// up, mirroring a line-buffered serial reader.
    fn read_line(&mut self) -> std::result::Result<Vec<u8>, BoxError> {
        let mut chunk = [0u8; 256];
        loop {
            if let Some(line) = take_line(&mut self.pending) {
                return Ok(line);
            }
            match self.port.read(&mut chunk) {
                Ok(0) => return Ok(std::mem::take(&mut self.pending)),
                Ok(n) => self.pending.extend_from_slice(&chunk[..n]),
                Err(e) if e.kind() == ErrorKind::TimedOut => {
                    return Ok(std::mem::take(&mut self.pending));
                }
                Err(e) => {
                    warn!(path = %self.path, error = %e, "serial read failed");
                    return Err(Box::new(HwError::Io(e)));
                }
            }
        }
    }

    fn reset_input_buffer(&mut self) -> std::result::Result<(), BoxError> {
        self.pending.clear();
        self.port
            .clear(serialport::ClearBuffer::Input)
            .map_err(|e| Box::new(HwError::Serial(e.to_string())) as BoxError)
    }

    fn probe(&mut self) -> std::result::Result<(), BoxError> {
        self.port
            .bytes_to_read()
            .map(|_| ())
            .map_err(|e| Box::new(HwError::Serial(format!("{}: {e}", self.path))) as BoxError)
    }
}

impl std::fmt::Debug for SerialDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialDevice")
            .field("path", &self.path)
            .field("pending", &self.pending.len())
            .finish()
    }
}
