//! SM5502 Simulation Library
//!
//! This crate provides a simulated SM5502 register file for exercising the
//! MUIC engine without a board. It includes:
//!
//! - **SimulatedChip**: a shared register file implementing `RegisterPort`,
//!   with read-to-clear interrupt latches and fault injection
//! - **Accessory**: presets for the register patterns each accessory produces
//!
//! # Example
//!
//! ```rust
//! use muic_regs::{Register, RegisterPort};
//! use muic_sim::{Accessory, SimulatedChip};
//!
//! let chip = SimulatedChip::new();
//! let mut port = chip.clone();
//!
//! chip.plug(Accessory::Usb);
//! assert_eq!(port.read(Register::DeviceType1).unwrap(), 0x04);
//!
//! // Interrupt status clears on read
//! assert_eq!(port.read(Register::Interrupt1).unwrap(), 0x01);
//! assert_eq!(port.read(Register::Interrupt1).unwrap(), 0x00);
//! ```

pub mod accessory;
pub mod chip;

pub use accessory::Accessory;
pub use chip::{Fault, SimulatedChip};
