use std::fmt::{self, Display, Formatter};

use crate::serial::SerialDevice;

/// Serial device that accumulates every received byte into
/// an in memory buffer, useful for test assertions over the
/// output of serial driven test ROMs.
pub struct BufferDevice {
    buffer: Vec<u8>,
}

impl BufferDevice {
    pub fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    pub fn buffer(&self) -> &Vec<u8> {
        &self.buffer
    }
}

impl SerialDevice for BufferDevice {
    fn send(&mut self) -> u8 {
        0xff
    }

    fn receive(&mut self, byte: u8) {
        self.buffer.push(byte);
    }

    fn description(&self) -> String {
        String::from("Buffer")
    }

    fn state(&self) -> String {
        String::from_utf8(self.buffer.clone()).unwrap_or_default()
    }
}

impl Default for BufferDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for BufferDevice {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Buffer")
    }
}
