//! Daemon configuration management.
//!
//! Configuration is stored as TOML at `~/.config/traywatch/traywatchd.toml`
//! and created with defaults on first run.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Daemon configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Target icon width used when selecting among a peer's bitmaps.
    #[serde(default = "default_icon_size")]
    pub icon_size: i32,
}

fn default_icon_size() -> i32 {
    22
}

impl Default for Config {
    fn default() -> Self {
        Self {
            icon_size: default_icon_size(),
        }
    }
}

impl Config {
    /// Loads configuration from disk, or creates a default if not found.
    pub fn load() -> anyhow::Result<Self> {
        let path = config_path();

        if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save()?;
            Ok(config)
        }
    }

    /// Saves the current configuration to disk.
    pub fn save(&self) -> anyhow::Result<()> {
        let path = config_path();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(&path, content)?;

        tracing::debug!(path = %path.display(), "configuration saved");
        Ok(())
    }
}

/// Returns the configuration file path.
fn config_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
    PathBuf::from(home)
        .join(".config")
        .join("traywatch")
        .join("traywatchd.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.icon_size, 22);
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = Config { icon_size: 32 };
        let serialized = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(parsed.icon_size, 32);
    }

    #[test]
    fn missing_fields_use_defaults() {
        let parsed: Config = toml::from_str("").unwrap();
        assert_eq!(parsed.icon_size, 22);
    }
}
