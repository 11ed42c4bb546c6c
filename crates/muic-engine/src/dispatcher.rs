//! Interrupt dispatch
//!
//! Turns the two interrupt status words into one action for the engine:
//! an attach pass, a detach pass, a direct charger update for a desk dock
//! whose VBUS changed, or nothing.
//!
//! When ATTACH and DETACH are latched together (a fast unplug and replug),
//! live registers decide which way to go. This is a best-effort heuristic
//! for contact bounce; it can misjudge a replug that lands mid-debounce.

use muic_regs::{
    AdcCode, Control, DeviceType1, DeviceType3, Interrupt1, Interrupt2, InterruptStatus, Register,
    RegisterPort, TransportError, VbusStatus,
};
use tracing::error;

/// What the interrupt status words mean, before any live register reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptKind {
    /// ATTACH and DETACH latched together, nothing else in INT1
    Bounce,
    Attach,
    Detach,
    /// INT2 is exactly VBUSOUT_ON
    VbusOn,
    /// INT2 is exactly VBUSOUT_OFF
    VbusOff,
    None,
}

/// Decode the interrupt status words
///
/// Checked in priority order. The bounce and VBUS cases compare the whole
/// register, so any extra latched bit demotes them.
pub fn decode_interrupt(status: InterruptStatus) -> InterruptKind {
    let bounce = Interrupt1::ATTACH | Interrupt1::DETACH;
    if status.int1 == bounce {
        InterruptKind::Bounce
    } else if status.int1.contains(Interrupt1::ATTACH)
        || status.int2.contains(Interrupt2::RESERVED_ATTACH)
    {
        InterruptKind::Attach
    } else if status.int1.contains(Interrupt1::DETACH) {
        InterruptKind::Detach
    } else if status.int2 == Interrupt2::VBUSOUT_ON {
        InterruptKind::VbusOn
    } else if status.int2 == Interrupt2::VBUSOUT_OFF {
        InterruptKind::VbusOff
    } else {
        InterruptKind::None
    }
}

/// Registers read live to settle a bounce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LiveRegisters {
    pub device_type_1: DeviceType1,
    pub device_type_3: DeviceType3,
    pub vbus: VbusStatus,
}

impl LiveRegisters {
    /// Best-effort read, failures read as zero
    pub fn read<P: RegisterPort + ?Sized>(port: &mut P) -> Self {
        Self {
            device_type_1: DeviceType1::from_register(port.read_or_zero(Register::DeviceType1)),
            device_type_3: DeviceType3::from_register(port.read_or_zero(Register::DeviceType3)),
            vbus: VbusStatus::from_register(port.read_or_zero(Register::VbusValid)),
        }
    }
}

/// Whether a bounce looks like the accessory is gone
///
/// Detach when the ID line is open, device type 1 is empty, and either
/// device type 3 is empty or the whole VBUS register reads zero.
pub fn bounce_is_detach(adc: AdcCode, live: &LiveRegisters) -> bool {
    adc.is_open()
        && live.device_type_1.is_empty()
        && (live.device_type_3.is_empty() || live.vbus.bits() == 0)
}

/// Action the engine takes for one interrupt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchAction {
    Attach,
    Detach,
    /// Announce or retract the charger behind a desk dock
    DockCharger { attached: bool },
    Idle,
}

/// Decide the action for one interrupt
///
/// `read_live` is only called for a bounce.
pub fn decide(
    status: InterruptStatus,
    adc: AdcCode,
    read_live: impl FnOnce() -> LiveRegisters,
) -> DispatchAction {
    match decode_interrupt(status) {
        InterruptKind::Bounce => {
            if bounce_is_detach(adc, &read_live()) {
                DispatchAction::Detach
            } else {
                DispatchAction::Attach
            }
        }
        InterruptKind::Attach => DispatchAction::Attach,
        InterruptKind::Detach => DispatchAction::Detach,
        InterruptKind::VbusOn => vbus_change(adc, true),
        InterruptKind::VbusOff => vbus_change(adc, false),
        InterruptKind::None => DispatchAction::Idle,
    }
}

fn vbus_change(adc: AdcCode, on: bool) -> DispatchAction {
    match adc {
        AdcCode::JIG_UART_OFF if on => DispatchAction::Attach,
        AdcCode::JIG_UART_OFF => DispatchAction::Detach,
        AdcCode::DESKDOCK => DispatchAction::DockCharger { attached: on },
        _ => DispatchAction::Idle,
    }
}

/// VBUS-out transition to forward to the host notifier, if any
pub fn vbus_notification(status: InterruptStatus) -> Option<bool> {
    match decode_interrupt(status) {
        InterruptKind::VbusOn => Some(true),
        InterruptKind::VbusOff => Some(false),
        _ => None,
    }
}

/// Read (and so clear) both interrupt status registers, failures read as zero
pub fn read_status<P: RegisterPort + ?Sized>(port: &mut P) -> InterruptStatus {
    let int1 = port.read_or_zero(Register::Interrupt1);
    let int2 = port.read_or_zero(Register::Interrupt2);
    InterruptStatus::from_registers(int1, int2)
}

/// Interrupt output masked for as long as the guard lives
///
/// Used to read the read-to-clear status registers without a new edge
/// arriving halfway through.
pub struct InterruptMask<'a, P: RegisterPort> {
    port: &'a mut P,
}

impl<'a, P: RegisterPort> InterruptMask<'a, P> {
    /// Set the mask bit
    pub fn engage(port: &'a mut P) -> Result<Self, TransportError> {
        port.modify(Register::Control, |v| v | Control::INT_MASK.bits())?;
        Ok(Self { port })
    }

    /// Read (and so clear) both interrupt status registers
    pub fn read_status(&mut self) -> InterruptStatus {
        read_status(&mut *self.port)
    }
}

impl<P: RegisterPort> Drop for InterruptMask<'_, P> {
    fn drop(&mut self) {
        if let Err(e) = self
            .port
            .modify(Register::Control, |v| v & !Control::INT_MASK.bits())
        {
            error!("Failed to unmask interrupts: {}", e);
        }
    }
}
