//! Simulated register file
//!
//! The chip state lives behind an `Arc<Mutex<..>>` so a test can keep one
//! handle for poking registers while the engine owns another as its port.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use muic_regs::{
    AdcCode, Control, Interrupt1, Interrupt2, Register, RegisterPort, TransportError, DEVICE_ID,
    RESET_VALUE,
};
use tracing::{debug, trace};

use crate::accessory::Accessory;

/// Transport failure to inject
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fault {
    /// Reads of this register fail
    Read(Register),
    /// Writes of this register fail
    Write(Register),
    /// Every transfer fails, as if the chip dropped off the bus
    Absent,
}

#[derive(Debug)]
struct ChipState {
    registers: [u8; 256],
    accessory: Option<Accessory>,
    writes: Vec<(Register, u8)>,
    faults: HashSet<Fault>,
    resets: usize,
}

impl ChipState {
    fn power_on() -> Self {
        let mut state = Self {
            registers: [0; 256],
            accessory: None,
            writes: Vec::new(),
            faults: HashSet::new(),
            resets: 0,
        };
        state.load_defaults();
        state
    }

    fn load_defaults(&mut self) {
        self.registers = [0; 256];
        self.set(Register::DeviceId, DEVICE_ID);
        self.set(Register::Control, Control::DEFAULT.bits() | Control::INT_MASK.bits());
        self.set(Register::Adc, AdcCode::OPEN.value());
        if let Some(accessory) = self.accessory {
            self.load_accessory(accessory);
        }
    }

    fn load_accessory(&mut self, accessory: Accessory) {
        let regs = accessory.registers();
        self.set(Register::DeviceType1, regs.device_type_1);
        self.set(Register::DeviceType2, regs.device_type_2);
        self.set(Register::DeviceType3, regs.device_type_3);
        self.set(Register::CarkitStatus, regs.carkit_status);
        self.set(Register::VbusValid, regs.vbus);
        self.set(Register::Adc, regs.adc);
    }

    fn clear_accessory(&mut self) {
        for register in [
            Register::DeviceType1,
            Register::DeviceType2,
            Register::DeviceType3,
            Register::CarkitStatus,
            Register::VbusValid,
        ] {
            self.set(register, 0);
        }
        self.set(Register::Adc, AdcCode::OPEN.value());
    }

    fn get(&self, register: Register) -> u8 {
        self.registers[usize::from(register.address())]
    }

    fn set(&mut self, register: Register, value: u8) {
        self.registers[usize::from(register.address())] = value;
    }

    fn latch(&mut self, int1: Interrupt1, int2: Interrupt2) {
        let i1 = self.get(Register::Interrupt1) | int1.bits();
        let i2 = self.get(Register::Interrupt2) | int2.bits();
        self.set(Register::Interrupt1, i1);
        self.set(Register::Interrupt2, i2);
    }

    fn check(&self, fault: Fault, register: Register) -> Result<(), TransportError> {
        if self.faults.contains(&Fault::Absent) {
            return Err(TransportError::DeviceAbsent);
        }
        if self.faults.contains(&fault) {
            return Err(TransportError::Nack { register });
        }
        Ok(())
    }
}

/// A simulated SM5502 on a simulated bus
///
/// Cloning yields another handle to the same chip.
#[derive(Debug, Clone)]
pub struct SimulatedChip {
    state: Arc<Mutex<ChipState>>,
}

impl Default for SimulatedChip {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedChip {
    /// A freshly powered chip with nothing attached
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(ChipState::power_on())),
        }
    }

    /// A chip whose bootloader left the UART path closed
    pub fn with_rustproof() -> Self {
        let chip = Self::new();
        chip.set_register(Register::ManualSwitch1, muic_regs::MANSW1_OPEN_RUSTPROOF);
        chip
    }

    fn lock(&self) -> MutexGuard<'_, ChipState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // -------------------------------------------------------------------------
    // Register access for tests
    // -------------------------------------------------------------------------

    /// Current register value, without side effects
    pub fn register(&self, register: Register) -> u8 {
        self.lock().get(register)
    }

    /// Overwrite a register, without side effects
    pub fn set_register(&self, register: Register, value: u8) {
        self.lock().set(register, value);
    }

    /// Every write the port accepted, in order
    pub fn writes(&self) -> Vec<(Register, u8)> {
        self.lock().writes.clone()
    }

    /// Accepted writes to one register, in order
    pub fn writes_to(&self, register: Register) -> Vec<u8> {
        self.lock()
            .writes
            .iter()
            .filter(|(r, _)| *r == register)
            .map(|(_, v)| *v)
            .collect()
    }

    /// Forget the write log
    pub fn clear_writes(&self) {
        self.lock().writes.clear();
    }

    /// Whether the interrupt output is currently masked
    pub fn interrupts_masked(&self) -> bool {
        Control::from_register(self.register(Register::Control)).contains(Control::INT_MASK)
    }

    /// Number of soft resets issued through the reset register
    pub fn resets(&self) -> usize {
        self.lock().resets
    }

    // -------------------------------------------------------------------------
    // Physical events
    // -------------------------------------------------------------------------

    /// Accessory currently in the receptacle
    pub fn accessory(&self) -> Option<Accessory> {
        self.lock().accessory
    }

    /// Plug an accessory in and latch ATTACH
    pub fn plug(&self, accessory: Accessory) {
        debug!("sim: plug {}", accessory);
        let mut state = self.lock();
        state.accessory = Some(accessory);
        state.load_accessory(accessory);
        state.latch(Interrupt1::ATTACH, Interrupt2::empty());
    }

    /// Place an accessory without latching an interrupt (present at boot)
    pub fn insert_quietly(&self, accessory: Accessory) {
        let mut state = self.lock();
        state.accessory = Some(accessory);
        state.load_accessory(accessory);
    }

    /// Pull the accessory out and latch DETACH
    pub fn unplug(&self) {
        debug!("sim: unplug");
        let mut state = self.lock();
        state.accessory = None;
        state.clear_accessory();
        state.latch(Interrupt1::DETACH, Interrupt2::empty());
    }

    /// Swap accessories faster than the debounce, latching ATTACH and DETACH together
    pub fn bounce(&self, accessory: Option<Accessory>) {
        debug!("sim: bounce to {:?}", accessory);
        let mut state = self.lock();
        state.accessory = accessory;
        state.clear_accessory();
        if let Some(accessory) = accessory {
            state.load_accessory(accessory);
        }
        state.latch(Interrupt1::ATTACH | Interrupt1::DETACH, Interrupt2::empty());
    }

    /// Change bus power without touching the ID line, latching VBUSOUT_ON/OFF
    pub fn set_vbus(&self, on: bool) {
        debug!("sim: vbus {}", if on { "on" } else { "off" });
        let mut state = self.lock();
        state.set(Register::VbusValid, if on { 0x02 } else { 0x00 });
        let int2 = if on {
            Interrupt2::VBUSOUT_ON
        } else {
            Interrupt2::VBUSOUT_OFF
        };
        state.latch(Interrupt1::empty(), int2);
    }

    /// Latch arbitrary interrupt bits
    pub fn latch_interrupt(&self, int1: Interrupt1, int2: Interrupt2) {
        self.lock().latch(int1, int2);
    }

    /// Interrupt bits waiting to be read
    pub fn pending_interrupts(&self) -> (u8, u8) {
        let state = self.lock();
        (state.get(Register::Interrupt1), state.get(Register::Interrupt2))
    }

    // -------------------------------------------------------------------------
    // Fault injection
    // -------------------------------------------------------------------------

    pub fn inject(&self, fault: Fault) {
        self.lock().faults.insert(fault);
    }

    pub fn clear_fault(&self, fault: Fault) {
        self.lock().faults.remove(&fault);
    }

    pub fn clear_faults(&self) {
        self.lock().faults.clear();
    }
}

impl RegisterPort for SimulatedChip {
    fn read(&mut self, register: Register) -> Result<u8, TransportError> {
        let mut state = self.lock();
        state.check(Fault::Read(register), register)?;
        let value = state.get(register);
        if matches!(register, Register::Interrupt1 | Register::Interrupt2) {
            state.set(register, 0);
        }
        trace!("sim: read {} = 0x{:02X}", register, value);
        Ok(value)
    }

    fn write(&mut self, register: Register, value: u8) -> Result<(), TransportError> {
        let mut state = self.lock();
        state.check(Fault::Write(register), register)?;
        trace!("sim: write {} <- 0x{:02X}", register, value);
        state.writes.push((register, value));
        if register == Register::Reset && value == RESET_VALUE {
            state.resets += 1;
            state.load_defaults();
        } else {
            state.set(register, value);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_power_on_defaults() {
        let chip = SimulatedChip::new();
        assert_eq!(chip.register(Register::DeviceId), DEVICE_ID);
        assert_eq!(chip.register(Register::Adc), 0x1F);
        assert!(chip.interrupts_masked());
        assert_eq!(chip.pending_interrupts(), (0, 0));
    }

    #[test]
    fn test_plug_and_unplug_latch_interrupts() {
        let chip = SimulatedChip::new();
        let mut port = chip.clone();

        chip.plug(Accessory::DeskDockVbus);
        assert_eq!(port.read(Register::DeviceType2).unwrap(), 0x40);
        assert_eq!(port.read(Register::Interrupt1).unwrap(), 0x01);

        chip.unplug();
        assert_eq!(port.read(Register::DeviceType2).unwrap(), 0x00);
        assert_eq!(port.read(Register::Adc).unwrap(), 0x1F);
        assert_eq!(port.read(Register::Interrupt1).unwrap(), 0x02);
        assert_eq!(chip.accessory(), None);
    }

    #[test]
    fn test_interrupt_latches_accumulate_until_read() {
        let chip = SimulatedChip::new();
        let mut port = chip.clone();
        chip.plug(Accessory::Usb);
        chip.unplug();
        assert_eq!(port.read(Register::Interrupt1).unwrap(), 0x03);
        assert_eq!(port.read(Register::Interrupt1).unwrap(), 0x00);
    }

    #[test]
    fn test_vbus_change_latches_int2() {
        let chip = SimulatedChip::new();
        let mut port = chip.clone();
        chip.insert_quietly(Accessory::DeskDock);
        chip.set_vbus(true);
        assert_eq!(port.read(Register::Interrupt1).unwrap(), 0x00);
        assert_eq!(port.read(Register::Interrupt2).unwrap(), 0x80);
        assert_eq!(port.read(Register::VbusValid).unwrap(), 0x02);
    }

    #[test]
    fn test_faults() {
        let chip = SimulatedChip::new();
        let mut port = chip.clone();

        chip.inject(Fault::Read(Register::Adc));
        assert_eq!(
            port.read(Register::Adc),
            Err(TransportError::Nack {
                register: Register::Adc
            })
        );
        assert!(port.read(Register::DeviceId).is_ok());

        chip.inject(Fault::Absent);
        assert_eq!(
            port.write(Register::Control, 0x1E),
            Err(TransportError::DeviceAbsent)
        );
        assert!(chip.writes().is_empty());

        chip.clear_faults();
        assert!(port.write(Register::Control, 0x1E).is_ok());
        assert_eq!(chip.writes_to(Register::Control), vec![0x1E]);
    }

    #[test]
    fn test_reset_restores_defaults_but_keeps_accessory() {
        let chip = SimulatedChip::new();
        let mut port = chip.clone();
        chip.insert_quietly(Accessory::Usb);
        port.write(Register::ManualSwitch1, 0x6C).unwrap();

        port.write(Register::Reset, RESET_VALUE).unwrap();
        assert_eq!(chip.resets(), 1);
        assert_eq!(chip.register(Register::ManualSwitch1), 0x00);
        assert_eq!(chip.register(Register::DeviceType1), 0x04);
    }

    #[test]
    fn test_rustproof_sentinel() {
        let chip = SimulatedChip::with_rustproof();
        assert_eq!(chip.register(Register::ManualSwitch1), 0x0D);
    }
}
