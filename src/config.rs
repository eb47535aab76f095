//! Configuration types for the assistant runtime.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::orchestrator::InteractionMode;

/// Top-level configuration for the assistant runtime.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ElzaConfig {
    /// Locale selection for replies and canned phrases.
    pub locale: LocaleConfig,
    /// Startup defaults for the runtime behavior flags.
    pub behavior: BehaviorConfig,
    /// Reasoning gateway settings.
    pub gateway: GatewayConfig,
    /// Text console front-end settings.
    pub console: ConsoleConfig,
}

/// Locale configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocaleConfig {
    /// BCP 47 tag for replies and status phrases. Anything that is not
    /// `lv-LV` currently falls back to the English lexicon.
    pub primary: String,
}

impl Default for LocaleConfig {
    fn default() -> Self {
        Self {
            primary: "lv-LV".to_owned(),
        }
    }
}

/// Behavior defaults, mirrored into the settings store at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Whether the user may interrupt the assistant mid-sentence.
    pub barge_in_enabled: bool,
    /// Start muted: replies are shown, never spoken.
    pub mute_default: bool,
    /// Interaction mode at startup.
    pub default_mode: InteractionMode,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            barge_in_enabled: false,
            mute_default: false,
            default_mode: InteractionMode::Voice,
        }
    }
}

/// Reasoning gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Upper bound for one reasoning port call, in milliseconds. A call
    /// that exceeds it counts as a failed turn, not an error.
    pub reply_timeout_ms: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            reply_timeout_ms: 30_000,
        }
    }
}

/// Text console front-end configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Prefix printed before each assistant reply.
    pub reply_prefix: String,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            reply_prefix: "elza> ".to_owned(),
        }
    }
}

impl ElzaConfig {
    /// Load configuration from a TOML file, falling back to defaults for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| crate::error::ElzaError::Config(e.to_string()))
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &std::path::Path) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::ElzaError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Default config file path: `dirs::config_dir()/elza/config.toml`.
    ///
    /// Override the directory with the `ELZA_CONFIG_DIR` environment
    /// variable.
    pub fn default_config_path() -> PathBuf {
        Self::config_path_with(std::env::var_os("ELZA_CONFIG_DIR"))
    }

    fn config_path_with(override_dir: Option<std::ffi::OsString>) -> PathBuf {
        if let Some(dir) = override_dir {
            return PathBuf::from(dir).join("config.toml");
        }
        dirs::config_dir()
            .map(|d| d.join("elza").join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("/tmp/elza-config/config.toml"))
    }
}
