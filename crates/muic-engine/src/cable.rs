//! Cable identities announced to the cable sink

use serde::{Deserialize, Serialize};

/// What is plugged into the receptacle, as announced downstream
///
/// The receptacle holds one accessory at a time, so at most one identity is
/// current. "Nothing" is `Option::<Cable>::None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cable {
    /// USB host (data + power)
    Usb,
    /// Charging downstream port
    ChargeDownstream,
    /// JIG UART with the boot line off, no bus power
    JigUartOff,
    /// JIG UART with the boot line off, bus power present
    JigUartOffVbus,
    /// JIG UART with the boot line on
    JigUartOn,
    /// Dedicated charger (travel adapter)
    Charger,
    /// OTG host mode (we supply power)
    UsbHost,
    DeskDock,
    DeskDockVbus,
    CarDock,
    AudioDock,
    Mhl,
    /// Power present but nothing recognized
    Incompatible,
}

impl Cable {
    /// Every identity the engine can announce
    pub const ALL: [Cable; 13] = [
        Cable::Usb,
        Cable::ChargeDownstream,
        Cable::JigUartOff,
        Cable::JigUartOffVbus,
        Cable::JigUartOn,
        Cable::Charger,
        Cable::UsbHost,
        Cable::DeskDock,
        Cable::DeskDockVbus,
        Cable::CarDock,
        Cable::AudioDock,
        Cable::Mhl,
        Cable::Incompatible,
    ];

    /// Cable name as published to subscribers
    pub fn name(&self) -> &'static str {
        match self {
            Cable::Usb => "USB",
            Cable::ChargeDownstream => "Charge-downstream",
            Cable::JigUartOff => "JIG-UART-OFF",
            Cable::JigUartOffVbus => "JIG-UART-OFF-VB",
            Cable::JigUartOn => "JIG-UART-ON",
            Cable::Charger => "TA",
            Cable::UsbHost => "USB-Host",
            Cable::DeskDock => "Desk-dock",
            Cable::DeskDockVbus => "Desk-dock-VB",
            Cable::CarDock => "Car-dock",
            Cable::AudioDock => "Audio-dock",
            Cable::Mhl => "MHL",
            Cable::Incompatible => "Incompatible-TA",
        }
    }
}

impl std::fmt::Display for Cable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// USB data state as seen from the device type registers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UsbState {
    Configured,
    NotConfigured,
}

impl UsbState {
    pub fn name(&self) -> &'static str {
        match self {
            UsbState::Configured => "USB_STATE_CONFIGURED",
            UsbState::NotConfigured => "USB_STATE_NOTCONFIGURED",
        }
    }
}
