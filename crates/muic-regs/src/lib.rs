//! SM5502 Register Library
//!
//! This crate describes the register interface of the SM5502 micro-USB
//! interface controller (MUIC): register addresses, bit layouts, ADC
//! resistor-ladder codes and analog switch paths.
//!
//! # Architecture
//!
//! - [`Register`] names every byte register the engine touches
//! - [`regs`] holds `bitflags` types for each bitmask register
//! - [`RegisterSnapshot`] is one best-effort read of the classification inputs
//! - [`RegisterPort`] is the synchronous transport seam (I2C/SMBus in practice)
//!
//! Nothing here holds state between reads. Classification and bookkeeping
//! live in the engine crate.
//!
//! # Example
//!
//! ```rust
//! use muic_regs::{AdcCode, DeviceType1, RegisterSnapshot};
//!
//! let snapshot = RegisterSnapshot {
//!     device_type_1: DeviceType1::USB_OTG,
//!     adc: AdcCode::OTG,
//!     ..RegisterSnapshot::EMPTY
//! };
//! assert!(!snapshot.is_empty());
//! ```

pub mod adc;
pub mod error;
pub mod port;
pub mod regs;
pub mod snapshot;
pub mod switch;

pub use adc::AdcCode;
pub use error::TransportError;
pub use port::RegisterPort;
pub use regs::{
    CarkitStatus, Control, DeviceType1, DeviceType2, DeviceType3, Interrupt1, Interrupt2,
    InterruptStatus, VbusStatus,
};
pub use snapshot::RegisterSnapshot;
pub use switch::{ParsePathError, SwitchPath};

/// Expected value of the device ID register
pub const DEVICE_ID: u8 = 0x0A;

/// Device ID reported by the later silicon revision
pub const DEVICE_ID_REV: u8 = 0x12;

/// Manual switch 1 pattern left by the bootloader when UART must stay closed
pub const MANSW1_OPEN_RUSTPROOF: u8 = (0x3 << 2) | 0x1;

/// Interrupt mask 1 programmed at initialization
pub const INT_MASK1_DEFAULT: u8 = 0x5C;

/// Interrupt mask 2 programmed at initialization
pub const INT_MASK2_DEFAULT: u8 = 0x20;

/// Timing set 1 value programmed at initialization (300ms debounce)
pub const TIMING_SET1_DEFAULT: u8 = 0x04;

/// Manual switch 2 value programmed at initialization (JIG line on)
pub const MANSW2_JIG_ON: u8 = 0x04;

/// Value written to the reset register to soft-reset the chip
pub const RESET_VALUE: u8 = 0x01;

/// Byte registers of the SM5502
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Register {
    DeviceId,
    Control,
    Interrupt1,
    Interrupt2,
    InterruptMask1,
    InterruptMask2,
    Adc,
    TimingSet1,
    TimingSet2,
    DeviceType1,
    DeviceType2,
    Button1,
    Button2,
    CarkitStatus,
    ManualSwitch1,
    ManualSwitch2,
    DeviceType3,
    Reset,
    VbusValid,
    TimerSet,
    OcpSet,
    ChargePumpSet,
}

impl Register {
    /// Every register, in address order
    pub const ALL: [Register; 22] = [
        Register::DeviceId,
        Register::Control,
        Register::Interrupt1,
        Register::Interrupt2,
        Register::InterruptMask1,
        Register::InterruptMask2,
        Register::Adc,
        Register::TimingSet1,
        Register::TimingSet2,
        Register::DeviceType1,
        Register::DeviceType2,
        Register::Button1,
        Register::Button2,
        Register::CarkitStatus,
        Register::ManualSwitch1,
        Register::ManualSwitch2,
        Register::DeviceType3,
        Register::Reset,
        Register::VbusValid,
        Register::TimerSet,
        Register::OcpSet,
        Register::ChargePumpSet,
    ];

    /// Bus address of the register
    pub fn address(self) -> u8 {
        match self {
            Register::DeviceId => 0x01,
            Register::Control => 0x02,
            Register::Interrupt1 => 0x03,
            Register::Interrupt2 => 0x04,
            Register::InterruptMask1 => 0x05,
            Register::InterruptMask2 => 0x06,
            Register::Adc => 0x07,
            Register::TimingSet1 => 0x08,
            Register::TimingSet2 => 0x09,
            Register::DeviceType1 => 0x0A,
            Register::DeviceType2 => 0x0B,
            Register::Button1 => 0x0C,
            Register::Button2 => 0x0D,
            Register::CarkitStatus => 0x0E,
            Register::ManualSwitch1 => 0x13,
            Register::ManualSwitch2 => 0x14,
            Register::DeviceType3 => 0x15,
            Register::Reset => 0x1B,
            Register::VbusValid => 0x1D,
            Register::TimerSet => 0x20,
            Register::OcpSet => 0x22,
            Register::ChargePumpSet => 0x3A,
        }
    }

    /// Look up a register by bus address
    pub fn from_address(address: u8) -> Option<Register> {
        Register::ALL.into_iter().find(|r| r.address() == address)
    }

    /// Short datasheet-style name, used in log output
    pub fn name(self) -> &'static str {
        match self {
            Register::DeviceId => "DEVICE_ID",
            Register::Control => "CONTROL",
            Register::Interrupt1 => "INT1",
            Register::Interrupt2 => "INT2",
            Register::InterruptMask1 => "INT_MASK1",
            Register::InterruptMask2 => "INT_MASK2",
            Register::Adc => "ADC",
            Register::TimingSet1 => "TIMING_SET1",
            Register::TimingSet2 => "TIMING_SET2",
            Register::DeviceType1 => "DEVICE_TYPE1",
            Register::DeviceType2 => "DEVICE_TYPE2",
            Register::Button1 => "BUTTON1",
            Register::Button2 => "BUTTON2",
            Register::CarkitStatus => "CARKIT_STATUS",
            Register::ManualSwitch1 => "MANUAL_SW1",
            Register::ManualSwitch2 => "MANUAL_SW2",
            Register::DeviceType3 => "DEVICE_TYPE3",
            Register::Reset => "RESET",
            Register::VbusValid => "VBUS_VALID",
            Register::TimerSet => "TIMER_SET",
            Register::OcpSet => "OCP_SET",
            Register::ChargePumpSet => "CHGPUMP_SET",
        }
    }
}

impl std::fmt::Display for Register {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}(0x{:02X})", self.name(), self.address())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_lookup_roundtrips() {
        for reg in Register::ALL {
            assert_eq!(Register::from_address(reg.address()), Some(reg));
        }
        assert_eq!(Register::from_address(0x10), None);
    }

    #[test]
    fn test_rustproof_sentinel() {
        assert_eq!(MANSW1_OPEN_RUSTPROOF, 0x0D);
    }

    #[test]
    fn test_register_display() {
        assert_eq!(Register::ManualSwitch1.to_string(), "MANUAL_SW1(0x13)");
    }
}
