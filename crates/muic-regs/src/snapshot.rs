//! Register snapshot
//!
//! One read of every register the classifier looks at. A snapshot is only
//! self-consistent at the instant it was read; callers never merge fields
//! from two snapshots.

use crate::adc::AdcCode;
use crate::port::RegisterPort;
use crate::regs::{CarkitStatus, DeviceType1, DeviceType2, DeviceType3, VbusStatus};
use crate::Register;

/// Classification inputs read at one point in time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RegisterSnapshot {
    pub device_type_1: DeviceType1,
    pub device_type_2: DeviceType2,
    pub device_type_3: DeviceType3,
    pub carkit_status: CarkitStatus,
    pub vbus: VbusStatus,
    pub adc: AdcCode,
}

impl RegisterSnapshot {
    /// The all-zero snapshot held while nothing is attached
    pub const EMPTY: RegisterSnapshot = RegisterSnapshot {
        device_type_1: DeviceType1::empty(),
        device_type_2: DeviceType2::empty(),
        device_type_3: DeviceType3::empty(),
        carkit_status: CarkitStatus::empty(),
        vbus: VbusStatus::empty(),
        adc: AdcCode(0),
    };

    /// Read a snapshot from the chip
    ///
    /// Best effort: a register that fails to read is logged and taken as
    /// zero so that the remaining fields still classify.
    pub fn read<P: RegisterPort + ?Sized>(port: &mut P) -> Self {
        Self {
            device_type_1: DeviceType1::from_register(port.read_or_zero(Register::DeviceType1)),
            device_type_2: DeviceType2::from_register(port.read_or_zero(Register::DeviceType2)),
            device_type_3: DeviceType3::from_register(port.read_or_zero(Register::DeviceType3)),
            carkit_status: CarkitStatus::from_register(
                port.read_or_zero(Register::CarkitStatus),
            ),
            vbus: VbusStatus::from_register(port.read_or_zero(Register::VbusValid)),
            adc: AdcCode::from_register(port.read_or_zero(Register::Adc)),
        }
    }

    /// Build from raw register bytes, in datasheet order
    pub fn from_registers(dev1: u8, dev2: u8, dev3: u8, carkit: u8, vbus: u8, adc: u8) -> Self {
        Self {
            device_type_1: DeviceType1::from_register(dev1),
            device_type_2: DeviceType2::from_register(dev2),
            device_type_3: DeviceType3::from_register(dev3),
            carkit_status: CarkitStatus::from_register(carkit),
            vbus: VbusStatus::from_register(vbus),
            adc: AdcCode::from_register(adc),
        }
    }

    /// True for the all-zero snapshot
    pub fn is_empty(&self) -> bool {
        *self == Self::EMPTY
    }

    /// Bus voltage present
    pub fn vbus_valid(&self) -> bool {
        self.vbus.contains(VbusStatus::VALID)
    }

    /// A factory JIG of any kind is attached
    pub fn jig_present(&self) -> bool {
        self.device_type_2.intersects(DeviceType2::JIG_ALL_MASK)
    }

    /// The three device type register bytes as the chip reports them
    pub fn device_types(&self) -> (u8, u8, u8) {
        (
            self.device_type_1.bits(),
            self.device_type_2.register_bits(),
            self.device_type_3.bits(),
        )
    }
}

impl std::fmt::Display for RegisterSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "dev1: 0x{:02X}, dev2: 0x{:03X}, dev3: 0x{:02X}, carkit: 0x{:02X}, vbus: 0x{:02X}, adc: {}",
            self.device_type_1.bits(),
            self.device_type_2.bits(),
            self.device_type_3.bits(),
            self.carkit_status.bits(),
            self.vbus.bits(),
            self.adc
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;

    /// Port backed by a flat 256-byte register file, failing on one register
    struct FlatPort {
        regs: [u8; 256],
        broken: Option<Register>,
    }

    impl RegisterPort for FlatPort {
        fn read(&mut self, register: Register) -> Result<u8, TransportError> {
            if self.broken == Some(register) {
                return Err(TransportError::Nack { register });
            }
            Ok(self.regs[register.address() as usize])
        }

        fn write(&mut self, register: Register, value: u8) -> Result<(), TransportError> {
            self.regs[register.address() as usize] = value;
            Ok(())
        }
    }

    #[test]
    fn test_read_snapshot() {
        let mut port = FlatPort {
            regs: [0; 256],
            broken: None,
        };
        port.regs[Register::DeviceType1.address() as usize] = 0x04;
        port.regs[Register::VbusValid.address() as usize] = 0x02;
        port.regs[Register::Adc.address() as usize] = 0x1F;

        let snapshot = RegisterSnapshot::read(&mut port);
        assert_eq!(snapshot.device_type_1, DeviceType1::USB);
        assert!(snapshot.vbus_valid());
        assert!(snapshot.adc.is_open());
        assert!(!snapshot.jig_present());
    }

    #[test]
    fn test_failed_field_reads_as_zero() {
        let mut port = FlatPort {
            regs: [0xFF; 256],
            broken: Some(Register::DeviceType2),
        };

        let snapshot = RegisterSnapshot::read(&mut port);
        assert!(snapshot.device_type_2.is_empty());
        assert_eq!(snapshot.device_type_1.bits(), 0xFF);
    }

    #[test]
    fn test_empty_snapshot() {
        assert!(RegisterSnapshot::default().is_empty());
        assert!(!RegisterSnapshot::from_registers(0, 0x08, 0, 0, 0, 0x1C).is_empty());
        assert_eq!(
            RegisterSnapshot::from_registers(0x01, 0x02, 0x03, 0, 0, 0).device_types(),
            (0x01, 0x02, 0x03)
        );
    }
}
