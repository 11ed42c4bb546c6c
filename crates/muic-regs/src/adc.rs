//! ADC resistor-ladder codes
//!
//! The ID pin resistance is digitized into a 5-bit code that names the
//! accessory sub-type.

/// 5-bit ADC code read from the ADC register
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AdcCode(pub u8);

impl AdcCode {
    pub const OTG: AdcCode = AdcCode(0x00);
    pub const MHL: AdcCode = AdcCode(0x01);
    pub const SMART_DOCK: AdcCode = AdcCode(0x10);
    pub const AUDIO_DOCK: AdcCode = AdcCode(0x12);
    pub const LANHUB: AdcCode = AdcCode(0x13);
    pub const JIG_USB_OFF: AdcCode = AdcCode(0x18);
    pub const JIG_USB_ON: AdcCode = AdcCode(0x19);
    pub const DESKDOCK: AdcCode = AdcCode(0x1A);
    pub const JIG_UART_OFF: AdcCode = AdcCode(0x1C);
    pub const JIG_UART_ON: AdcCode = AdcCode(0x1D);
    /// Car dock shares its resistor with JIG UART on
    pub const CARDOCK: AdcCode = AdcCode(0x1D);
    /// Nothing on the ID pin
    pub const OPEN: AdcCode = AdcCode(0x1F);

    /// Decode the ADC register, keeping the five code bits
    pub fn from_register(value: u8) -> Self {
        AdcCode(value & 0x1F)
    }

    /// Raw code value
    pub fn value(&self) -> u8 {
        self.0
    }

    /// True when no accessory resistor is present
    pub fn is_open(&self) -> bool {
        *self == AdcCode::OPEN
    }

    /// Accessory name for the code, if it is one the driver recognizes
    pub fn name(&self) -> Option<&'static str> {
        match self.0 {
            0x00 => Some("OTG"),
            0x01 => Some("MHL"),
            0x10 => Some("Smart Dock"),
            0x12 => Some("Audio Dock"),
            0x13 => Some("LAN Hub"),
            0x18 => Some("JIG USB Off"),
            0x19 => Some("JIG USB On"),
            0x1A => Some("Desk Dock"),
            0x1C => Some("JIG UART Off"),
            0x1D => Some("JIG UART On / Car Dock"),
            0x1F => Some("Open"),
            _ => None,
        }
    }
}

impl std::fmt::Display for AdcCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.name() {
            Some(name) => write!(f, "0x{:02X} ({})", self.0, name),
            None => write!(f, "0x{:02X}", self.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_register_masks_code_bits() {
        assert_eq!(AdcCode::from_register(0xFF), AdcCode::OPEN);
        assert_eq!(AdcCode::from_register(0x3C), AdcCode::JIG_UART_OFF);
    }

    #[test]
    fn test_display() {
        assert_eq!(AdcCode::OPEN.to_string(), "0x1F (Open)");
        assert_eq!(AdcCode(0x05).to_string(), "0x05");
    }

    #[test]
    fn test_cardock_aliases_jig_uart_on() {
        assert_eq!(AdcCode::CARDOCK, AdcCode::JIG_UART_ON);
    }
}
