//! Register transport seam
//!
//! The engine never talks to a bus directly. Everything goes through a
//! [`RegisterPort`], which a platform backs with I2C/SMBus byte transfers and
//! tests back with a simulated register file.

use tracing::warn;

use crate::error::TransportError;
use crate::Register;

/// Synchronous byte-register access to the chip
pub trait RegisterPort: Send {
    /// Read one register
    fn read(&mut self, register: Register) -> Result<u8, TransportError>;

    /// Write one register
    fn write(&mut self, register: Register, value: u8) -> Result<(), TransportError>;

    /// Read a register, logging a failure and yielding zero instead
    fn read_or_zero(&mut self, register: Register) -> u8 {
        match self.read(register) {
            Ok(value) => value,
            Err(e) => {
                warn!("read {} failed, using 0x00: {}", register, e);
                0
            }
        }
    }

    /// Write a register, logging a failure. Returns whether the write landed.
    fn write_logged(&mut self, register: Register, value: u8) -> bool {
        match self.write(register, value) {
            Ok(()) => true,
            Err(e) => {
                warn!("write {} <- 0x{:02X} failed: {}", register, value, e);
                false
            }
        }
    }

    /// Read-modify-write a register. The write is skipped if the read fails.
    fn modify(
        &mut self,
        register: Register,
        f: impl FnOnce(u8) -> u8,
    ) -> Result<u8, TransportError>
    where
        Self: Sized,
    {
        let value = f(self.read(register)?);
        self.write(register, value)?;
        Ok(value)
    }
}

impl<P: RegisterPort + ?Sized> RegisterPort for Box<P> {
    fn read(&mut self, register: Register) -> Result<u8, TransportError> {
        (**self).read(register)
    }

    fn write(&mut self, register: Register, value: u8) -> Result<(), TransportError> {
        (**self).write(register, value)
    }
}

impl<P: RegisterPort + ?Sized> RegisterPort for &mut P {
    fn read(&mut self, register: Register) -> Result<u8, TransportError> {
        (**self).read(register)
    }

    fn write(&mut self, register: Register, value: u8) -> Result<(), TransportError> {
        (**self).write(register, value)
    }
}
