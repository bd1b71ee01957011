//! Scripted I2C bus for driver tests.
//!
//! Models register-pointer devices: the first byte of a write sets the
//! device's pointer, and a read returns whatever was scripted for
//! `(address, pointer)`, zero-padded.

use std::collections::{HashMap, HashSet};

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{ErrorKind, ErrorType, I2c, NoAcknowledgeSource, Operation};

#[derive(Default)]
pub struct FakeBus {
    responses: HashMap<(u8, u8), Vec<u8>>,
    pointers: HashMap<u8, u8>,
    writes: Vec<(u8, Vec<u8>)>,
    failing: HashSet<u8>,
}

impl FakeBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&mut self, address: u8, pointer: u8, bytes: &[u8]) {
        self.responses.insert((address, pointer), bytes.to_vec());
    }

    pub fn fail_address(&mut self, address: u8) {
        self.failing.insert(address);
    }

    pub fn writes(&self) -> Vec<(u8, Vec<u8>)> {
        self.writes.clone()
    }
}

impl ErrorType for FakeBus {
    type Error = ErrorKind;
}

impl I2c for FakeBus {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        if self.failing.contains(&address) {
            return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
        }
        for op in operations {
            match op {
                Operation::Write(bytes) => {
                    self.writes.push((address, bytes.to_vec()));
                    if let Some(first) = bytes.first() {
                        self.pointers.insert(address, *first);
                    }
                }
                Operation::Read(buf) => {
                    let pointer = self.pointers.get(&address).copied().unwrap_or(0);
                    buf.fill(0);
                    if let Some(data) = self.responses.get(&(address, pointer)) {
                        let n = data.len().min(buf.len());
                        buf[..n].copy_from_slice(&data[..n]);
                    }
                }
            }
        }
        Ok(())
    }
}

/// Delay that returns immediately.
pub struct NoDelay;

impl DelayNs for NoDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}
