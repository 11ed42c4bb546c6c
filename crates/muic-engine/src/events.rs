//! Unified event stream for the engine
//!
//! Cable announcements, pass summaries and control-surface outcomes are all
//! emitted through a single event channel, so an observer sees them in the
//! order they happened.

use serde::{Deserialize, Serialize};

use crate::cable::Cable;

/// What started a classification pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PassTrigger {
    /// Hardware interrupt
    Interrupt,
    /// Deferred pass after power-up
    Startup,
    /// System resume
    Resume,
    /// UART enable/disable from the control surface
    ModeChange,
}

/// What a pass ended up doing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PassAction {
    Attach,
    Detach,
    /// Charger announced on a desk-dock VBUS rise
    DockChargerAttach,
    /// Charger retracted on a desk-dock VBUS fall
    DockChargerDetach,
    /// Pass abandoned (resume saw no change, or a read failed)
    Skipped,
    /// Interrupt status needed no action
    Idle,
}

/// Summary of one classification pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassReport {
    pub trigger: PassTrigger,
    pub action: PassAction,
    /// Identities announced as attached, in order
    pub announced: Vec<Cable>,
    /// Identities retracted, in order
    pub retracted: Vec<Cable>,
}

impl PassReport {
    pub fn new(trigger: PassTrigger, action: PassAction) -> Self {
        Self {
            trigger,
            action,
            announced: Vec::new(),
            retracted: Vec::new(),
        }
    }

    /// Whether the pass changed what subscribers see
    pub fn changed_anything(&self) -> bool {
        !self.announced.is_empty() || !self.retracted.is_empty()
    }
}

/// Unified event enum for all engine activity
#[derive(Debug, Clone)]
pub enum MuicEvent {
    // -------------------------------------------------------------------------
    // Cable events
    // -------------------------------------------------------------------------
    /// An identity was announced to subscribers
    CableAttached { cable: Cable },

    /// An identity was retracted
    CableDetached { cable: Cable },

    // -------------------------------------------------------------------------
    // Pass events
    // -------------------------------------------------------------------------
    /// A classification pass finished
    PassCompleted { report: PassReport },

    // -------------------------------------------------------------------------
    // Control events
    // -------------------------------------------------------------------------
    /// Rustproof mode was toggled
    UartModeChanged {
        /// New state (false = rustproof)
        uart_enabled: bool,
    },

    /// The chip was soft-reset and reinitialized
    ResetDone,

    /// An error occurred in the engine
    Error {
        /// Source of the error
        source: String,
        /// Error message
        message: String,
    },
}

impl MuicEvent {
    /// Check if this is a cable announcement
    pub fn is_cable(&self) -> bool {
        matches!(
            self,
            MuicEvent::CableAttached { .. } | MuicEvent::CableDetached { .. }
        )
    }
}
