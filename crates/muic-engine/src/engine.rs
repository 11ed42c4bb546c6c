//! MUIC engine
//!
//! Owns the chip port, the cable sink and the session state behind one lock.
//! Every pass (interrupt, startup, resume, mode change) takes the lock for
//! its whole duration, so register I/O, classification, side effects and
//! session updates of two passes never interleave.
//!
//! Passes never fail. A register that cannot be read is taken as zero and a
//! write that fails is logged; repeated transport failure degrades to
//! classifying nothing, which subscribers see as detaches only.

use std::sync::{Mutex, MutexGuard, PoisonError};

use muic_regs::{
    AdcCode, Control, DeviceType1, DeviceType2, Register, RegisterPort, RegisterSnapshot,
    SwitchPath, TransportError, DEVICE_ID, DEVICE_ID_REV, INT_MASK1_DEFAULT, INT_MASK2_DEFAULT,
    MANSW1_OPEN_RUSTPROOF, MANSW2_JIG_ON, RESET_VALUE, TIMING_SET1_DEFAULT,
};
use tracing::{debug, info, warn};

use crate::cable::{Cable, UsbState};
use crate::classifier::{classify_attach, classify_detach, normalize_for_attach, rustproof_release};
use crate::config::{Capabilities, EngineConfig};
use crate::dispatcher::{decide, read_status, vbus_notification, DispatchAction, InterruptMask, LiveRegisters};
use crate::effects::{apply_all, NoHooks, PlatformHooks, SideEffect};
use crate::error::MuicError;
use crate::events::{PassAction, PassReport, PassTrigger};
use crate::session::{ModeOverrides, SessionState};
use crate::sink::CableSink;

/// Manual switch 1 as read back from the chip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManualSwitchReading {
    pub raw: u8,
    /// Named path, if the raw value is one of the selectable ones
    pub path: Option<SwitchPath>,
}

impl std::fmt::Display for ManualSwitchReading {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.path {
            Some(path) => write!(f, "{}", path),
            None => write!(f, "{:x}", self.raw),
        }
    }
}

/// Point-in-time view of the engine for observers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MuicStatus {
    pub session: SessionState,
    pub overrides: ModeOverrides,
    /// Last path selected through [`Muic::set_manual_switch`]
    pub manual_path: Option<SwitchPath>,
}

impl MuicStatus {
    pub fn cable(&self) -> Option<Cable> {
        self.session.cable
    }

    pub fn uart_enabled(&self) -> bool {
        !self.overrides.uart_disabled
    }
}

/// Everything guarded by the engine lock
struct Device<P, S> {
    port: P,
    sink: S,
    hooks: Box<dyn PlatformHooks>,
    session: SessionState,
    overrides: ModeOverrides,
    manual_path: Option<SwitchPath>,
}

impl<P: RegisterPort, S: CableSink> Device<P, S> {
    fn report(&mut self, cable: Cable, attached: bool, report: &mut PassReport) {
        info!(
            "{} {}",
            cable,
            if attached { "attached" } else { "detached" }
        );
        self.sink.report(cable, attached);
        if attached {
            report.announced.push(cable);
        } else {
            report.retracted.push(cable);
        }
    }

    fn attach_pass(&mut self, caps: &Capabilities, report: &mut PassReport) {
        let raw = RegisterSnapshot::read(&mut self.port);
        let snapshot = normalize_for_attach(raw, caps);
        let jig_present = raw.jig_present();
        let decision = classify_attach(&snapshot, self.overrides, caps);

        info!(
            "Attach: {}, jig: {} -> {} (rule {})",
            snapshot,
            if jig_present { "ON" } else { "OFF" },
            decision.cable.map_or("none", |c| c.name()),
            decision.rule.unwrap_or("-")
        );

        apply_all(&decision.effects, &mut self.port, &mut *self.hooks);

        if decision.cable != self.session.cable {
            if self.session.dock_charger {
                self.session.dock_charger = false;
                self.report(Cable::Charger, false, report);
            }
            if let Some(previous) = self.session.cable {
                self.report(previous, false, report);
            }
            if let Some(cable) = decision.cable {
                self.report(cable, true, report);
            }
        } else if let Some(cable) = decision.cable {
            debug!("{} already announced", cable);
        }

        self.session.cable = decision.cable;
        self.session.snapshot = snapshot;
        self.session.jig_present = jig_present;
    }

    fn detach_pass(&mut self, caps: &Capabilities, report: &mut PassReport) {
        let decision = classify_detach(&self.session, self.overrides, caps);
        if decision.cable != self.session.cable {
            debug!(
                "Detach retracts announced {:?}, remembered registers say {:?}",
                self.session.cable, decision.cable
            );
        }
        info!(
            "Detach: {} (rule {})",
            self.session.snapshot,
            decision.rule.unwrap_or("-")
        );

        if let Some(cable) = self.session.cable {
            self.report(cable, false, report);
        }
        if self.session.dock_charger {
            self.report(Cable::Charger, false, report);
        }

        apply_all(&decision.effects, &mut self.port, &mut *self.hooks);
        self.session.clear();
    }

    fn dock_charger(&mut self, attached: bool, report: &mut PassReport) {
        if self.session.dock_charger == attached {
            debug!("Desk-dock charger already {}", if attached { "on" } else { "off" });
            return;
        }
        self.session.dock_charger = attached;
        self.report(Cable::Charger, attached, report);
    }

    fn dispatch(
        &mut self,
        action: DispatchAction,
        trigger: PassTrigger,
        caps: &Capabilities,
    ) -> PassReport {
        match action {
            DispatchAction::Attach => {
                let mut report = PassReport::new(trigger, PassAction::Attach);
                self.attach_pass(caps, &mut report);
                report
            }
            DispatchAction::Detach => {
                let mut report = PassReport::new(trigger, PassAction::Detach);
                self.detach_pass(caps, &mut report);
                report
            }
            DispatchAction::DockCharger { attached } => {
                let pass = if attached {
                    PassAction::DockChargerAttach
                } else {
                    PassAction::DockChargerDetach
                };
                let mut report = PassReport::new(trigger, pass);
                self.dock_charger(attached, &mut report);
                report
            }
            DispatchAction::Idle => PassReport::new(trigger, PassAction::Idle),
        }
    }

    fn init_registers(&mut self) {
        match self.port.read(Register::DeviceId) {
            Ok(id) if id == DEVICE_ID || id == DEVICE_ID_REV => {
                info!("SM5502 device id: 0x{:02X}", id)
            }
            Ok(id) => warn!("Unexpected device id: 0x{:02X}", id),
            Err(e) => warn!("Failed to read device id: {}", e),
        }

        let sequence = [
            (Register::InterruptMask1, INT_MASK1_DEFAULT),
            (Register::InterruptMask2, INT_MASK2_DEFAULT),
            (Register::Control, Control::DEFAULT.bits()),
            (Register::TimingSet1, TIMING_SET1_DEFAULT),
            (Register::ManualSwitch2, MANSW2_JIG_ON),
        ];
        for (register, value) in sequence {
            self.port.write_logged(register, value);
        }
    }

    fn read_device_types(&mut self) -> Result<(u8, u8, u8), TransportError> {
        Ok((
            self.port.read(Register::DeviceType1)?,
            self.port.read(Register::DeviceType2)?,
            self.port.read(Register::DeviceType3)?,
        ))
    }

    fn status(&self) -> MuicStatus {
        MuicStatus {
            session: self.session,
            overrides: self.overrides,
            manual_path: self.manual_path,
        }
    }
}

/// The cable classification and transition engine
pub struct Muic<P: RegisterPort, S: CableSink> {
    device: Mutex<Device<P, S>>,
    config: EngineConfig,
}

impl<P: RegisterPort, S: CableSink> Muic<P, S> {
    /// Create an engine for a board without platform hooks
    pub fn new(port: P, sink: S, config: EngineConfig) -> Self {
        Self::with_hooks(port, sink, Box::new(NoHooks), config)
    }

    /// Create an engine
    ///
    /// Probes the rustproof sentinel and programs the chip's initial
    /// register values. No classification happens until the first pass.
    pub fn with_hooks(
        mut port: P,
        sink: S,
        hooks: Box<dyn PlatformHooks>,
        config: EngineConfig,
    ) -> Self {
        let uart_disabled = probe_rustproof(&mut port);
        let mut device = Device {
            port,
            sink,
            hooks,
            session: SessionState::default(),
            overrides: ModeOverrides { uart_disabled },
            manual_path: None,
        };
        device.init_registers();

        Self {
            device: Mutex::new(device),
            config,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Device<P, S>> {
        // A pass that panicked left the session consistent up to the panic
        self.device.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.config.capabilities
    }

    // -------------------------------------------------------------------------
    // Passes
    // -------------------------------------------------------------------------

    /// Service one interrupt
    pub fn handle_interrupt(&self) -> PassReport {
        let caps = self.config.capabilities;
        let mut guard = self.lock();
        let device = &mut *guard;

        // The mask guard is released before the fallback read borrows the port
        let engaged = InterruptMask::engage(&mut device.port).map(|mut mask| mask.read_status());
        let status = match engaged {
            Ok(status) => status,
            Err(e) => {
                warn!("Failed to mask interrupts: {}", e);
                read_status(&mut device.port)
            }
        };
        let adc = AdcCode::from_register(device.port.read_or_zero(Register::Adc));
        debug!("Interrupt {}, adc: 0x{:02X}", status, adc.value());

        if caps.has_otg {
            if let Some(on) = vbus_notification(status) {
                SideEffect::OtgPower(on).apply(&mut device.port, &mut *device.hooks);
            }
        }

        let action = decide(status, adc, || LiveRegisters::read(&mut device.port));
        debug!("Dispatch: {:?}", action);
        device.dispatch(action, PassTrigger::Interrupt, &caps)
    }

    /// Deferred first classification after power-up
    ///
    /// Runs an attach pass unconditionally, then reads both interrupt
    /// status registers once to drop anything latched during boot.
    pub fn startup_pass(&self) -> PassReport {
        let caps = self.config.capabilities;
        let mut device = self.lock();

        let mut report = PassReport::new(PassTrigger::Startup, PassAction::Attach);
        device.attach_pass(&caps, &mut report);

        let status = read_status(&mut device.port);
        info!("Startup {}", status);
        report
    }

    /// Re-check the accessory after a system resume
    ///
    /// Classifies again only when a device type register differs from the
    /// remembered snapshot. A failed read skips the pass.
    pub fn resume_pass(&self) -> PassReport {
        let caps = self.config.capabilities;
        let mut device = self.lock();

        let (dev1, dev2, dev3) = match device.read_device_types() {
            Ok(types) => types,
            Err(e) => {
                warn!("Resume: device type read failed: {}", e);
                return PassReport::new(PassTrigger::Resume, PassAction::Skipped);
            }
        };
        read_status(&mut device.port);

        if !device.session.device_types_differ(dev1, dev2, dev3) {
            debug!("Resume: no change");
            return PassReport::new(PassTrigger::Resume, PassAction::Skipped);
        }

        let mut report = PassReport::new(PassTrigger::Resume, PassAction::Attach);
        device.attach_pass(&caps, &mut report);
        report
    }

    /// Leave or enter rustproof mode, then re-classify what is attached
    pub fn set_uart_enabled(&self, enabled: bool) -> PassReport {
        let caps = self.config.capabilities;
        let mut guard = self.lock();
        let device = &mut *guard;

        if enabled {
            device.overrides.uart_disabled = false;
            apply_all(&rustproof_release(), &mut device.port, &mut *device.hooks);
        } else {
            device.overrides.uart_disabled = true;
        }
        info!("UART {}", if enabled { "enabled" } else { "disabled" });

        let mut report = PassReport::new(PassTrigger::ModeChange, PassAction::Attach);
        device.attach_pass(&caps, &mut report);
        report
    }

    /// Soft-reset the chip and program it again
    ///
    /// Leaves rustproof mode. Callers wait the configured reset delay first.
    pub fn reset(&self) -> Result<(), MuicError> {
        let mut device = self.lock();
        device.port.write(Register::Reset, RESET_VALUE)?;
        device.overrides.uart_disabled = false;
        device.init_registers();
        info!("SM5502 reset done");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    pub fn uart_disabled(&self) -> bool {
        self.lock().overrides.uart_disabled
    }

    pub fn jig_present(&self) -> bool {
        self.lock().session.jig_present
    }

    pub fn current_cable(&self) -> Option<Cable> {
        self.lock().session.cable
    }

    pub fn session(&self) -> SessionState {
        self.lock().session
    }

    pub fn status(&self) -> MuicStatus {
        self.lock().status()
    }

    /// Read manual switch 1
    pub fn manual_switch(&self) -> Result<ManualSwitchReading, MuicError> {
        let raw = self.lock().port.read(Register::ManualSwitch1)?;
        Ok(ManualSwitchReading {
            raw,
            path: SwitchPath::from_register(raw),
        })
    }

    /// Route the analog switch by hand
    ///
    /// Refused unless the control register, ignoring the automatic
    /// switching bit, is in its default state. `Auto` hands switching back
    /// to the chip; any other path takes it over.
    pub fn set_manual_switch(&self, path: SwitchPath) -> Result<(), MuicError> {
        if !path.is_user_selectable() {
            return Err(MuicError::PathNotSelectable(path));
        }

        let mut device = self.lock();
        let control = Control::from_register(device.port.read(Register::Control)?);
        let idle = Control::SWITCH_OPEN | Control::RAW_DATA | Control::WAIT;
        if control.difference(Control::MANUAL_SW) != idle {
            warn!("Manual switch to {} refused, control 0x{:02X}", path, control.bits());
            return Err(MuicError::ManualSwitchLocked { control });
        }

        let control = if path == SwitchPath::Auto {
            control.union(Control::MANUAL_SW)
        } else {
            control.difference(Control::MANUAL_SW)
        };
        device.port.write(Register::ManualSwitch1, path.bits())?;
        device.port.write(Register::Control, control.bits())?;
        device.manual_path = Some(path);
        info!("Manual switch: {}", path);
        Ok(())
    }

    pub fn control(&self) -> Result<Control, MuicError> {
        let raw = self.lock().port.read(Register::Control)?;
        Ok(Control::from_register(raw))
    }

    pub fn device_type_1(&self) -> Result<DeviceType1, MuicError> {
        let raw = self.lock().port.read(Register::DeviceType1)?;
        Ok(DeviceType1::from_register(raw))
    }

    pub fn adc(&self) -> Result<AdcCode, MuicError> {
        let raw = self.lock().port.read(Register::Adc)?;
        Ok(AdcCode::from_register(raw))
    }

    pub fn device_id(&self) -> Result<u8, MuicError> {
        Ok(self.lock().port.read(Register::DeviceId)?)
    }

    /// Whether a USB data connection is up, from the live device types
    pub fn usb_state(&self) -> Result<UsbState, MuicError> {
        let mut device = self.lock();
        let dev1 = DeviceType1::from_register(device.port.read(Register::DeviceType1)?);
        let dev2 = DeviceType2::from_register(device.port.read(Register::DeviceType2)?);
        if dev1.intersects(DeviceType1::USB_MASK) || dev2.intersects(DeviceType2::USB_MASK) {
            Ok(UsbState::Configured)
        } else {
            Ok(UsbState::NotConfigured)
        }
    }

    /// Read every register that is safe to read
    ///
    /// The interrupt status registers are skipped; reading them would
    /// clear latched events.
    pub fn dump_registers(&self) -> Result<Vec<(Register, u8)>, MuicError> {
        let mut device = self.lock();
        let mut dump = Vec::new();
        for register in Register::ALL {
            if matches!(
                register,
                Register::Interrupt1 | Register::Interrupt2 | Register::Reset
            ) {
                continue;
            }
            dump.push((register, device.port.read(register)?));
        }
        Ok(dump)
    }
}

fn probe_rustproof<P: RegisterPort>(port: &mut P) -> bool {
    match port.read(Register::ManualSwitch1) {
        Ok(value) if value == MANSW1_OPEN_RUSTPROOF => {
            info!("UART path closed by bootloader, starting in rustproof mode");
            true
        }
        Ok(_) => false,
        Err(e) => {
            warn!("Rustproof probe failed: {}", e);
            false
        }
    }
}
