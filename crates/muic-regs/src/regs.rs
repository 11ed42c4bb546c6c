//! Bit layouts of the SM5502 bitmask registers
//!
//! Every type here wraps the raw register byte with `from_bits_retain`, so
//! bits the datasheet leaves undocumented survive a read unchanged.

use bitflags::bitflags;

bitflags! {
    /// Control register (0x02)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Control: u8 {
        /// Analog switch open
        const SWITCH_OPEN = 1 << 4;
        /// Report raw ADC data instead of debounced data
        const RAW_DATA    = 1 << 3;
        /// Automatic switching (cleared = manual switch registers drive the path)
        const MANUAL_SW   = 1 << 2;
        /// Wait for host before switching
        const WAIT        = 1 << 1;
        /// Interrupt output masked
        const INT_MASK    = 1 << 0;
    }
}

impl Control {
    /// Control value restored after every detach and at initialization
    pub const DEFAULT: Control = Control::SWITCH_OPEN
        .union(Control::RAW_DATA)
        .union(Control::MANUAL_SW)
        .union(Control::WAIT);

    /// Wrap a raw register value
    pub fn from_register(value: u8) -> Self {
        Self::from_bits_retain(value)
    }
}

bitflags! {
    /// Device type 1 register (0x0A)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct DeviceType1: u8 {
        const USB_OTG       = 1 << 7;
        const DEDICATED_CHG = 1 << 6;
        /// Charging downstream port
        const USB_CHG       = 1 << 5;
        const CAR_KIT       = 1 << 4;
        const UART          = 1 << 3;
        const USB           = 1 << 2;
        const AUDIO_2       = 1 << 1;
        const AUDIO_1       = 1 << 0;
    }
}

impl DeviceType1 {
    /// Bits that mean a USB data connection is up
    pub const USB_MASK: DeviceType1 = DeviceType1::USB_OTG
        .union(DeviceType1::USB_CHG)
        .union(DeviceType1::USB);

    /// Bits that identify a charger
    pub const CHARGER_MASK: DeviceType1 = DeviceType1::DEDICATED_CHG.union(DeviceType1::CAR_KIT);

    /// Wrap a raw register value
    pub fn from_register(value: u8) -> Self {
        Self::from_bits_retain(value)
    }
}

bitflags! {
    /// Device type 2 register (0x0B), widened to 16 bits
    ///
    /// The chip only reports the low byte. The high byte carries flags the
    /// engine synthesizes from the ADC code.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct DeviceType2: u16 {
        /// Synthesized: LAN hub ADC code
        const LANHUB       = 1 << 9;
        /// Synthesized: audio dock ADC code
        const AUDIO_DOCK   = 1 << 8;
        const SMARTDOCK    = 1 << 7;
        const AV           = 1 << 6;
        const TTY          = 1 << 5;
        const PPD          = 1 << 4;
        const JIG_UART_OFF = 1 << 3;
        const JIG_UART_ON  = 1 << 2;
        const JIG_USB_OFF  = 1 << 1;
        const JIG_USB_ON   = 1 << 0;
    }
}

impl DeviceType2 {
    /// JIG USB variants
    pub const USB_MASK: DeviceType2 = DeviceType2::JIG_USB_OFF.union(DeviceType2::JIG_USB_ON);

    /// JIG UART variant routed like a plain UART cable
    pub const UART_MASK: DeviceType2 = DeviceType2::JIG_UART_OFF;

    /// Any factory JIG
    pub const JIG_ALL_MASK: DeviceType2 = DeviceType2::JIG_USB_OFF
        .union(DeviceType2::JIG_USB_ON)
        .union(DeviceType2::JIG_UART_OFF)
        .union(DeviceType2::JIG_UART_ON);

    /// Wrap a raw register value
    pub fn from_register(value: u8) -> Self {
        Self::from_bits_retain(u16::from(value))
    }

    /// The byte the chip would report, without synthesized flags
    pub fn register_bits(&self) -> u8 {
        (self.bits() & 0x00FF) as u8
    }
}

bitflags! {
    /// Device type 3 register (0x15)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct DeviceType3: u8 {
        const U200_CHARGER = 1 << 6;
        const AV_VBUS      = 1 << 4;
        /// D+/D- shorted or open in a non-standard way
        const NON_STANDARD = 1 << 2;
        const VBUSIN_VALID = 1 << 1;
        const MHL          = 1 << 0;
    }
}

impl DeviceType3 {
    pub const CHARGER_MASK: DeviceType3 = DeviceType3::U200_CHARGER;

    /// Wrap a raw register value
    pub fn from_register(value: u8) -> Self {
        Self::from_bits_retain(value)
    }
}

bitflags! {
    /// Carkit status register (0x0E)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CarkitStatus: u8 {
        /// Carkit-style charger presenting as USB
        const CHARGER1 = 1 << 1;
    }
}

impl CarkitStatus {
    /// Wrap a raw register value
    pub fn from_register(value: u8) -> Self {
        Self::from_bits_retain(value)
    }
}

bitflags! {
    /// VBUS valid register (0x1D)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct VbusStatus: u8 {
        const VALID = 1 << 1;
    }
}

impl VbusStatus {
    /// Wrap a raw register value
    pub fn from_register(value: u8) -> Self {
        Self::from_bits_retain(value)
    }
}

bitflags! {
    /// Interrupt 1 register (0x03), read-to-clear
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Interrupt1: u8 {
        const OXP_DISABLE       = 1 << 7;
        const OCP_ENABLE        = 1 << 6;
        const OVP_ENABLE        = 1 << 5;
        const LONG_KEY_RELEASE  = 1 << 4;
        const LONG_KEY_PRESS    = 1 << 3;
        const KEY_PRESS         = 1 << 2;
        const DETACH            = 1 << 1;
        const ATTACH            = 1 << 0;
    }
}

bitflags! {
    /// Interrupt 2 register (0x04), read-to-clear
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Interrupt2: u8 {
        const VBUSOUT_ON      = 1 << 7;
        const OTP_ENABLE      = 1 << 6;
        const CONNECT         = 1 << 5;
        const STUCK_KEY_RCV   = 1 << 4;
        const STUCK_KEY       = 1 << 3;
        const ADC_CHANGE      = 1 << 2;
        const RESERVED_ATTACH = 1 << 1;
        const VBUSOUT_OFF     = 1 << 0;
    }
}

/// Both interrupt status words from one interrupt service pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InterruptStatus {
    pub int1: Interrupt1,
    pub int2: Interrupt2,
}

impl InterruptStatus {
    /// Build from raw register values
    pub fn from_registers(int1: u8, int2: u8) -> Self {
        Self {
            int1: Interrupt1::from_bits_retain(int1),
            int2: Interrupt2::from_bits_retain(int2),
        }
    }

    /// True when neither word has any bit set
    pub fn is_empty(&self) -> bool {
        self.int1.is_empty() && self.int2.is_empty()
    }
}

impl std::fmt::Display for InterruptStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "intr1: 0x{:02X}, intr2: 0x{:02X}",
            self.int1.bits(),
            self.int2.bits()
        )
    }
}
