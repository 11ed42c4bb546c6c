//! Engine configuration
//!
//! The supported accessory set is chosen per board at construction time and
//! consulted by the classifier at runtime.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Optional accessory support of the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    /// OTG host mode, with VBUS-out power notifications
    #[serde(default = "default_true")]
    pub has_otg: bool,
    /// Audio dock detection (shares the host notify path with OTG)
    #[serde(default = "default_true")]
    pub has_audio_dock: bool,
    /// MHL video bridge present
    #[serde(default)]
    pub has_mhl: bool,
    /// Factory build: JIG UART on is a car dock
    #[serde(default)]
    pub cardock_factory_mode: bool,
}

fn default_true() -> bool {
    true
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            has_otg: true,
            has_audio_dock: true,
            has_mhl: false,
            cardock_factory_mode: false,
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Accessory support
    #[serde(default)]
    pub capabilities: Capabilities,
    /// Delay before the first classification pass (ms)
    #[serde(default = "default_startup_delay")]
    pub startup_delay_ms: u64,
    /// Delay before a requested soft reset is issued (ms)
    #[serde(default = "default_reset_delay")]
    pub reset_delay_ms: u64,
}

fn default_startup_delay() -> u64 {
    2700
}

fn default_reset_delay() -> u64 {
    1000
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            capabilities: Capabilities::default(),
            startup_delay_ms: default_startup_delay(),
            reset_delay_ms: default_reset_delay(),
        }
    }
}

impl EngineConfig {
    pub fn startup_delay(&self) -> Duration {
        Duration::from_millis(self.startup_delay_ms)
    }

    pub fn reset_delay(&self) -> Duration {
        Duration::from_millis(self.reset_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_use_defaults() {
        let config: EngineConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, EngineConfig::default());

        let config: EngineConfig =
            serde_json::from_str(r#"{"capabilities": {"has_mhl": true}}"#).unwrap();
        assert!(config.capabilities.has_mhl);
        assert!(config.capabilities.has_otg);
        assert_eq!(config.startup_delay(), Duration::from_millis(2700));
    }
}
