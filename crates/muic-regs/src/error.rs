//! Error types for register transport

use thiserror::Error;

use crate::Register;

/// Failure of a single register read or write on the bus
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The device did not acknowledge the transfer
    #[error("no acknowledge accessing {register}")]
    Nack { register: Register },

    /// The bus is held by another master or transfer
    #[error("bus busy")]
    Busy,

    /// The device is not present on the bus
    #[error("device absent")]
    DeviceAbsent,

    /// Any other adapter-level failure
    #[error("bus I/O error: {0}")]
    Io(String),
}
