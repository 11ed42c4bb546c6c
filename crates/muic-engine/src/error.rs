//! Error types for the engine

use muic_regs::{Control, ParsePathError, SwitchPath, TransportError};
use thiserror::Error;

/// Errors surfaced by control-surface operations
///
/// Classification passes never fail; they log and continue.
#[derive(Debug, Error)]
pub enum MuicError {
    /// Register I/O failed
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Manual switching refused because the chip is not in its default control state
    #[error("manual switch locked: control register is 0x{:02X}", .control.bits())]
    ManualSwitchLocked { control: Control },

    /// The path cannot be selected from the control surface
    #[error("switch path {0} is not selectable")]
    PathNotSelectable(SwitchPath),

    /// Unrecognized path name
    #[error(transparent)]
    UnknownSwitchPath(#[from] ParsePathError),

    /// A pass panicked on its blocking worker
    #[error("engine task failed: {0}")]
    TaskFailed(String),

    /// The engine actor is no longer running
    #[error("engine actor stopped")]
    ActorStopped,
}
