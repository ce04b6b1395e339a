//! Configuration management for tintgate.
//!
//! Configuration is loaded from the platform config directory with sensible
//! defaults. The library itself never reads it: callers pull bounds and
//! timeouts out of [`Config`] and pass them explicitly.

mod types;
mod validate;

pub use types::*;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration structure for tintgate.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Resource limits
    pub limits: LimitsConfig,

    /// Tint settings
    pub tint: TintConfig,

    /// Report output settings
    pub output: OutputConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Returns default configuration if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path (`~` is expanded).
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let path = expand_path(path);
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path.
    ///
    /// Uses platform-appropriate directories:
    /// - macOS: ~/Library/Application Support/com.tintgate.tintgate/config.toml
    /// - Linux: ~/.config/tintgate/config.toml
    /// - Windows: C:\Users\<User>\AppData\Roaming\tintgate\config\config.toml
    ///
    /// Falls back to ~/.tintgate/config.toml if directory detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "tintgate", "tintgate")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".tintgate").join("config.toml")
            })
    }

    /// Producer deadline as a `Duration`.
    pub fn producer_timeout(&self) -> Duration {
        Duration::from_millis(self.limits.producer_timeout_ms)
    }

    /// Conversion-side decode deadline as a `Duration`.
    pub fn decode_timeout(&self) -> Duration {
        Duration::from_millis(self.limits.decode_timeout_ms)
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}

/// Expand a leading `~` in a user-supplied path.
pub fn expand_path(path: &Path) -> PathBuf {
    let path_str = path.to_string_lossy();
    let expanded = shellexpand::tilde(&path_str);
    PathBuf::from(expanded.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tint::TintStrategy;
    use crate::types::Bounds;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.limits.image.bounds(), Bounds::IMAGE);
        assert_eq!(config.limits.icon.bounds(), Bounds::ICON);
        assert_eq!(config.limits.max_input_bytes(), 100 * 1024 * 1024);
        assert_eq!(config.tint.strategy, TintStrategy::Label);
        assert_eq!(config.producer_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_config_to_toml() {
        let config = Config::default();
        let toml = config.to_toml().unwrap();
        assert!(toml.contains("[limits.image]"));
        assert!(toml.contains("[tint]"));
        assert!(toml.contains("strategy = \"label\""));
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            [limits.icon]
            max_width = 256
            max_height = 128

            [tint]
            strategy = "hls"
            "#,
        )
        .unwrap();
        assert_eq!(config.limits.icon.bounds(), Bounds::new(256, 128));
        assert_eq!(config.limits.image.bounds(), Bounds::IMAGE);
        assert_eq!(config.tint.strategy, TintStrategy::Hls);
        assert_eq!(config.tint.default_label, "red");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[logging]\nlevel = \"debug\"\n").unwrap();
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_load_from_rejects_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[limits.image]\nmax_width = 0\n").unwrap();
        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("limits.image.max_width"));
    }

    #[test]
    fn test_load_from_rejects_overflowing_bounds() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[limits.image]\nmax_width = 4294967295\nmax_height = 4294967295\n",
        )
        .unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_load_from_rejects_unknown_strategy() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[tint]\nstrategy = \"sepia\"\n").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::ParseError(_))
        ));
    }
}
