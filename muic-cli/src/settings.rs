//! Runner settings

use std::path::{Path, PathBuf};

use anyhow::Context;
use muic_engine::EngineConfig;
use muic_sim::Accessory;
use serde::{Deserialize, Serialize};

use crate::scenario::ScenarioStep;

/// Runner settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    /// Engine configuration
    #[serde(default)]
    pub engine: EngineConfig,
    /// Simulated chip starts in rustproof mode
    #[serde(default)]
    pub rustproof: bool,
    /// Accessory in the receptacle at power-on
    #[serde(default)]
    pub boot_accessory: Option<Accessory>,
    /// Steps to run, in order
    #[serde(default = "default_scenario")]
    pub scenario: Vec<ScenarioStep>,
}

fn default_scenario() -> Vec<ScenarioStep> {
    vec![
        ScenarioStep::Wait { ms: 3000 },
        ScenarioStep::Plug {
            accessory: Accessory::Usb,
        },
        ScenarioStep::Wait { ms: 100 },
        ScenarioStep::Unplug,
        ScenarioStep::Wait { ms: 100 },
        ScenarioStep::Plug {
            accessory: Accessory::DeskDock,
        },
        ScenarioStep::Wait { ms: 100 },
        ScenarioStep::Vbus { on: true },
        ScenarioStep::Wait { ms: 100 },
        ScenarioStep::Vbus { on: false },
        ScenarioStep::Wait { ms: 100 },
        ScenarioStep::Unplug,
        ScenarioStep::Wait { ms: 100 },
        ScenarioStep::Status,
    ]
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            rustproof: false,
            boot_accessory: None,
            scenario: default_scenario(),
        }
    }
}

impl Settings {
    /// Config directory for muicd
    /// Uses $XDG_CONFIG_HOME/muicd when set, otherwise the platform config dir
    fn config_dir() -> Option<PathBuf> {
        if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_config);
            if path.is_absolute() {
                return Some(path.join("muicd"));
            }
        }

        dirs::config_dir().map(|c| c.join("muicd"))
    }

    /// Default settings file path
    pub fn default_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("settings.json"))
    }

    /// Load settings from an explicit path; a missing or bad file is an error
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;
        Self::from_json(&json).with_context(|| format!("Invalid settings in {}", path.display()))
    }

    /// Load settings from the default location, falling back to defaults
    pub fn load() -> Self {
        Self::default_path()
            .and_then(|path| std::fs::read_to_string(path).ok())
            .and_then(|s| Self::from_json(&s).ok())
            .unwrap_or_default()
    }

    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_gives_defaults() {
        let settings = Settings::from_json("{}").unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_partial_engine_config() {
        let json = r#"{
            "engine": { "startup_delay_ms": 10, "capabilities": { "has_mhl": true } },
            "rustproof": true,
            "scenario": [
                { "step": "plug", "accessory": "mhl" },
                { "step": "wait", "ms": 50 },
                { "step": "unplug" }
            ]
        }"#;
        let settings = Settings::from_json(json).unwrap();
        assert_eq!(settings.engine.startup_delay_ms, 10);
        assert_eq!(settings.engine.reset_delay_ms, 1000);
        assert!(settings.engine.capabilities.has_mhl);
        assert!(settings.engine.capabilities.has_otg);
        assert!(settings.rustproof);
        assert_eq!(settings.scenario.len(), 3);
        assert_eq!(
            settings.scenario[0],
            ScenarioStep::Plug {
                accessory: Accessory::Mhl
            }
        );
    }

    #[test]
    fn test_rejects_unknown_step() {
        let json = r#"{ "scenario": [ { "step": "explode" } ] }"#;
        assert!(Settings::from_json(json).is_err());
    }

    #[test]
    fn test_default_roundtrips_through_json() {
        let settings = Settings::default();
        let json = settings.to_json().unwrap();
        assert_eq!(Settings::from_json(&json).unwrap(), settings);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let err = Settings::load_from(Path::new("/nonexistent/muicd/settings.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to read settings"));
    }

    #[test]
    fn test_default_path_ends_with_settings_json() {
        if let Some(path) = Settings::default_path() {
            assert!(path.ends_with("muicd/settings.json"));
        }
    }
}
