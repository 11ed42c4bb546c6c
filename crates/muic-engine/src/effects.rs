//! Side effects of a classification
//!
//! The classifier only describes register writes and platform calls; the
//! engine executes them against the port. A failed write is logged and the
//! rest of the list still runs.

use muic_regs::{Control, Register, RegisterPort, SwitchPath};
use tracing::{debug, warn};

/// Platform collaborators outside the chip
///
/// Defaults do nothing, for boards without the hardware.
pub trait PlatformHooks: Send {
    /// Power the MHL bridge on or off (runs the bridge negotiation when on)
    fn mhl_power(&mut self, on: bool) {
        let _ = on;
    }

    /// Notify the host stack that VBUS output was switched on or off
    fn otg_power(&mut self, on: bool) {
        let _ = on;
    }
}

/// Hooks for boards with neither MHL nor a host notifier
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHooks;

impl PlatformHooks for NoHooks {}

/// One requested action, executed in list order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SideEffect {
    /// Write manual switch 1
    SetSwitchPath(SwitchPath),
    /// Write manual switch 2
    SetManualSwitch2(u8),
    /// Read-modify-write the control register
    UpdateControl { set: Control, clear: Control },
    /// Overwrite the control register
    WriteControl(Control),
    /// Set the interrupt mask bit
    MaskInterrupts,
    /// Clear the interrupt mask bit
    UnmaskInterrupts,
    MhlPower(bool),
    OtgPower(bool),
}

impl SideEffect {
    /// Hand the switch path to the manual switch registers
    pub fn manual_switching() -> SideEffect {
        SideEffect::UpdateControl {
            set: Control::empty(),
            clear: Control::MANUAL_SW,
        }
    }

    /// Return switching to the chip
    pub fn automatic_switching() -> SideEffect {
        SideEffect::UpdateControl {
            set: Control::MANUAL_SW,
            clear: Control::empty(),
        }
    }

    /// Execute against the chip and platform
    pub fn apply<P: RegisterPort>(&self, port: &mut P, hooks: &mut dyn PlatformHooks) {
        debug!("Applying {:?}", self);
        match *self {
            SideEffect::SetSwitchPath(path) => {
                port.write_logged(Register::ManualSwitch1, path.bits());
            }
            SideEffect::SetManualSwitch2(value) => {
                port.write_logged(Register::ManualSwitch2, value);
            }
            SideEffect::UpdateControl { set, clear } => {
                update_control(port, set, clear);
            }
            SideEffect::WriteControl(control) => {
                port.write_logged(Register::Control, control.bits());
            }
            SideEffect::MaskInterrupts => update_control(port, Control::INT_MASK, Control::empty()),
            SideEffect::UnmaskInterrupts => {
                update_control(port, Control::empty(), Control::INT_MASK)
            }
            SideEffect::MhlPower(on) => hooks.mhl_power(on),
            SideEffect::OtgPower(on) => hooks.otg_power(on),
        }
    }
}

/// Execute a list of side effects in order
pub fn apply_all<P: RegisterPort>(
    effects: &[SideEffect],
    port: &mut P,
    hooks: &mut dyn PlatformHooks,
) {
    for effect in effects {
        effect.apply(port, hooks);
    }
}

fn update_control<P: RegisterPort>(port: &mut P, set: Control, clear: Control) {
    if let Err(e) = port.modify(Register::Control, |v| (v | set.bits()) & !clear.bits()) {
        warn!(
            "control update (set 0x{:02X}, clear 0x{:02X}) failed: {}",
            set.bits(),
            clear.bits(),
            e
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use muic_regs::TransportError;

    #[derive(Default)]
    struct LogPort {
        control: u8,
        writes: Vec<(Register, u8)>,
        fail_writes: bool,
    }

    impl RegisterPort for LogPort {
        fn read(&mut self, register: Register) -> Result<u8, TransportError> {
            match register {
                Register::Control => Ok(self.control),
                _ => Ok(0),
            }
        }

        fn write(&mut self, register: Register, value: u8) -> Result<(), TransportError> {
            if self.fail_writes {
                return Err(TransportError::Busy);
            }
            if register == Register::Control {
                self.control = value;
            }
            self.writes.push((register, value));
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingHooks {
        mhl: Vec<bool>,
    }

    impl PlatformHooks for RecordingHooks {
        fn mhl_power(&mut self, on: bool) {
            self.mhl.push(on);
        }
    }

    #[test]
    fn test_update_control_read_modify_write() {
        let mut port = LogPort {
            control: Control::DEFAULT.bits(),
            ..Default::default()
        };
        SideEffect::manual_switching().apply(&mut port, &mut NoHooks);
        assert_eq!(port.control, 0x1A);

        SideEffect::MaskInterrupts.apply(&mut port, &mut NoHooks);
        assert_eq!(port.control, 0x1B);
    }

    #[test]
    fn test_failed_write_does_not_stop_list() {
        let mut port = LogPort {
            fail_writes: true,
            ..Default::default()
        };
        let mut hooks = RecordingHooks::default();
        apply_all(
            &[
                SideEffect::MaskInterrupts,
                SideEffect::MhlPower(true),
                SideEffect::UnmaskInterrupts,
            ],
            &mut port,
            &mut hooks,
        );
        assert_eq!(hooks.mhl, vec![true]);
        assert!(port.writes.is_empty());
    }
}
