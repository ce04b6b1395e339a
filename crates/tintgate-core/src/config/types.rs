//! Sub-configuration structs with their defaults.

use serde::{Deserialize, Serialize};

use crate::tint::TintStrategy;
use crate::types::Bounds;

/// Maximum dimensions for one class of import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundsConfig {
    /// Maximum width in pixels
    pub max_width: u32,

    /// Maximum height in pixels
    pub max_height: u32,
}

impl BoundsConfig {
    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.max_width, self.max_height)
    }
}

impl From<Bounds> for BoundsConfig {
    fn from(bounds: Bounds) -> Self {
        Self {
            max_width: bounds.max_width,
            max_height: bounds.max_height,
        }
    }
}

impl Default for BoundsConfig {
    fn default() -> Self {
        Bounds::IMAGE.into()
    }
}

/// Resource limits to protect against hostile producers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Largest untrusted file sent through a disposable conversion
    pub max_input_mb: u64,

    /// How long a producer may take to deliver a complete image
    pub producer_timeout_ms: u64,

    /// Decode timeout on the conversion side
    pub decode_timeout_ms: u64,

    /// Bounds for general images
    pub image: BoundsConfig,

    /// Bounds for icon-sized assets
    pub icon: BoundsConfig,
}

impl LimitsConfig {
    /// `max_input_mb` in bytes.
    pub fn max_input_bytes(&self) -> u64 {
        self.max_input_mb.saturating_mul(1024 * 1024)
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_input_mb: 100,
            producer_timeout_ms: 30000,
            decode_timeout_ms: 5000,
            image: Bounds::IMAGE.into(),
            icon: Bounds::ICON.into(),
        }
    }
}

/// Tint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TintConfig {
    /// Algorithm used when none is given on the command line
    pub strategy: TintStrategy,

    /// Label name or hex colour used when none is given
    pub default_label: String,
}

impl Default for TintConfig {
    fn default() -> Self {
        Self {
            strategy: TintStrategy::default(),
            default_label: "red".to_string(),
        }
    }
}

/// Output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Report format ("json" or "jsonl")
    pub format: String,

    /// Pretty-print JSON output
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: "json".to_string(),
            pretty: false,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
