//! Accessory presets
//!
//! Register patterns the chip reports for each accessory, as observed on
//! hardware. Some presets carry stale bits on purpose (the audio dock
//! reports a USB bit next to its ADC code).

use muic_regs::AdcCode;
use serde::{Deserialize, Serialize};

/// Something that can be plugged into the simulated receptacle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Accessory {
    Usb,
    /// Charging downstream port
    Cdp,
    /// Travel adapter
    DedicatedCharger,
    U200Charger,
    /// USB with D+/D- in a non-standard state
    NonStandard,
    /// Carkit-style charger reporting through the carkit status register
    CarkitCharger,
    JigUsbOn,
    JigUartOff,
    JigUartOffVbus,
    JigUartOn,
    /// Plain UART cable (device type 1 UART bit)
    UartCable,
    /// OTG adapter (ID grounded)
    OtgHost,
    DeskDock,
    DeskDockVbus,
    AudioDock,
    Mhl,
    /// Bus power with nothing recognizable on the data lines
    Incompatible,
}

/// Register values an accessory produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AccessoryRegisters {
    pub device_type_1: u8,
    pub device_type_2: u8,
    pub device_type_3: u8,
    pub carkit_status: u8,
    pub vbus: u8,
    pub adc: u8,
}

const VBUS: u8 = 0x02;

impl Accessory {
    /// Every preset
    pub const ALL: [Accessory; 17] = [
        Accessory::Usb,
        Accessory::Cdp,
        Accessory::DedicatedCharger,
        Accessory::U200Charger,
        Accessory::NonStandard,
        Accessory::CarkitCharger,
        Accessory::JigUsbOn,
        Accessory::JigUartOff,
        Accessory::JigUartOffVbus,
        Accessory::JigUartOn,
        Accessory::UartCable,
        Accessory::OtgHost,
        Accessory::DeskDock,
        Accessory::DeskDockVbus,
        Accessory::AudioDock,
        Accessory::Mhl,
        Accessory::Incompatible,
    ];

    /// Register pattern reported while this accessory is attached
    pub fn registers(&self) -> AccessoryRegisters {
        let open = AdcCode::OPEN.value();
        let (device_type_1, device_type_2, device_type_3, carkit_status, vbus, adc) = match self {
            Accessory::Usb => (0x04, 0x00, 0x00, 0x00, VBUS, open),
            Accessory::Cdp => (0x20, 0x00, 0x00, 0x00, VBUS, open),
            Accessory::DedicatedCharger => (0x40, 0x00, 0x00, 0x00, VBUS, open),
            Accessory::U200Charger => (0x00, 0x00, 0x40, 0x00, VBUS, open),
            Accessory::NonStandard => (0x00, 0x00, 0x04, 0x00, VBUS, open),
            Accessory::CarkitCharger => (0x00, 0x00, 0x00, 0x02, VBUS, open),
            Accessory::JigUsbOn => (0x00, 0x01, 0x00, 0x00, VBUS, AdcCode::JIG_USB_ON.value()),
            Accessory::JigUartOff => (0x00, 0x08, 0x00, 0x00, 0x00, AdcCode::JIG_UART_OFF.value()),
            Accessory::JigUartOffVbus => {
                (0x00, 0x08, 0x00, 0x00, VBUS, AdcCode::JIG_UART_OFF.value())
            }
            Accessory::JigUartOn => (0x00, 0x04, 0x00, 0x00, 0x00, AdcCode::JIG_UART_ON.value()),
            Accessory::UartCable => (0x08, 0x00, 0x00, 0x00, 0x00, AdcCode::JIG_UART_OFF.value()),
            Accessory::OtgHost => (0x80, 0x00, 0x00, 0x00, 0x00, AdcCode::OTG.value()),
            Accessory::DeskDock => (0x00, 0x40, 0x00, 0x00, 0x00, AdcCode::DESKDOCK.value()),
            Accessory::DeskDockVbus => (0x00, 0x40, 0x00, 0x00, VBUS, AdcCode::DESKDOCK.value()),
            Accessory::AudioDock => (0x04, 0x00, 0x00, 0x00, VBUS, AdcCode::AUDIO_DOCK.value()),
            Accessory::Mhl => (0x00, 0x00, 0x01, 0x00, VBUS, AdcCode::MHL.value()),
            Accessory::Incompatible => (0x00, 0x00, 0x00, 0x00, VBUS, open),
        };
        AccessoryRegisters {
            device_type_1,
            device_type_2,
            device_type_3,
            carkit_status,
            vbus,
            adc,
        }
    }
}

impl std::fmt::Display for Accessory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_preset_leaves_adc_in_range() {
        for accessory in Accessory::ALL {
            assert!(accessory.registers().adc <= 0x1F, "{}", accessory);
        }
    }

    #[test]
    fn test_vbus_variants_differ_only_in_vbus() {
        let plain = Accessory::JigUartOff.registers();
        let powered = Accessory::JigUartOffVbus.registers();
        assert_eq!(AccessoryRegisters { vbus: VBUS, ..plain }, powered);
    }
}
