//! Session state and mode overrides
//!
//! The engine's memory of what is attached. Detach decisions are made from
//! the retained snapshot here, because by the time a detach interrupt fires
//! most device registers already read zero.

use muic_regs::RegisterSnapshot;
use serde::{Deserialize, Serialize};

use crate::cable::Cable;

/// Persistent policy flags consulted by the classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ModeOverrides {
    /// Rustproof mode: keep the UART path closed instead of routing it
    pub uart_disabled: bool,
}

/// What the engine has announced and the registers it announced from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionState {
    /// Identity currently announced to the sink
    pub cable: Option<Cable>,
    /// Snapshot from the last attach pass, zeroed on detach
    pub snapshot: RegisterSnapshot,
    /// A factory JIG was seen on the last attach pass
    pub jig_present: bool,
    /// Charger announced directly on a desk-dock VBUS change
    pub dock_charger: bool,
}

impl SessionState {
    /// True when nothing is remembered
    pub fn is_empty(&self) -> bool {
        *self == SessionState::default()
    }

    /// Forget everything
    pub fn clear(&mut self) {
        *self = SessionState::default();
    }

    /// Whether freshly read device type registers differ from the remembered ones
    pub fn device_types_differ(&self, dev1: u8, dev2: u8, dev3: u8) -> bool {
        self.snapshot.device_types() != (dev1, dev2, dev3)
    }
}
