//! Analog switch paths (manual switch 1 register)
//!
//! Layout: D- in bits [7:5], D+ in bits [4:2], VBUS path in bits [1:0].
//! Line codes are 000 open, 001 USB, 010 audio, 011 UART, 100 V-audio.

use std::str::FromStr;

use thiserror::Error;

/// A routing of the D+/D-/VBUS lines through the analog switch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SwitchPath {
    /// Everything open
    AllOpen,
    /// Data lines open, VBUS connected (rustproof closure)
    OpenWithVbus,
    /// UART on both data lines
    Uart,
    /// Audio on both data lines, VBUS connected
    Audio,
    /// Video/audio lines
    VAudio,
    /// USB host path with VBUS (OTG and audio dock)
    DHost,
    /// Automatic switching by the chip
    Auto,
}

impl SwitchPath {
    /// Raw manual switch 1 value for this path
    pub fn bits(self) -> u8 {
        match self {
            SwitchPath::AllOpen => 0x00,
            SwitchPath::OpenWithVbus => 0x01,
            SwitchPath::Uart => (3 << 5) | (3 << 2),
            SwitchPath::Audio => (2 << 5) | (2 << 2) | 1,
            SwitchPath::VAudio => (4 << 5) | (4 << 2) | (1 << 1) | 1,
            SwitchPath::DHost => (1 << 5) | (1 << 2) | 1,
            SwitchPath::Auto => 0x00,
        }
    }

    /// Decode a manual switch 1 value into one of the user-selectable paths
    ///
    /// A zero register reads back as `Auto`, matching the way the path was
    /// most likely selected.
    pub fn from_register(value: u8) -> Option<SwitchPath> {
        [
            SwitchPath::VAudio,
            SwitchPath::Uart,
            SwitchPath::Audio,
            SwitchPath::DHost,
            SwitchPath::Auto,
        ]
        .into_iter()
        .find(|p| p.bits() == value)
    }

    /// Name used on the control surface
    pub fn name(self) -> &'static str {
        match self {
            SwitchPath::AllOpen => "OPEN",
            SwitchPath::OpenWithVbus => "OPEN_VBUS",
            SwitchPath::Uart => "UART",
            SwitchPath::Audio => "AUDIO",
            SwitchPath::VAudio => "VAUDIO",
            SwitchPath::DHost => "DHOST",
            SwitchPath::Auto => "AUTO",
        }
    }

    /// Whether the control surface may select this path directly
    pub fn is_user_selectable(self) -> bool {
        !matches!(self, SwitchPath::AllOpen | SwitchPath::OpenWithVbus)
    }
}

impl std::fmt::Display for SwitchPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Unrecognized switch path name
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown switch path: {0}")]
pub struct ParsePathError(pub String);

impl FromStr for SwitchPath {
    type Err = ParsePathError;

    /// Parse a user-selectable path name; trailing whitespace is ignored
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim_end() {
            "VAUDIO" => Ok(SwitchPath::VAudio),
            "UART" => Ok(SwitchPath::Uart),
            "AUDIO" => Ok(SwitchPath::Audio),
            "DHOST" => Ok(SwitchPath::DHost),
            "AUTO" => Ok(SwitchPath::Auto),
            other => Err(ParsePathError(other.to_string())),
        }
    }
}
