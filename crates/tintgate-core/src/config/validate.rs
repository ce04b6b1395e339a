//! Configuration validation with range checks.

use crate::color::Color;
use crate::error::ConfigError;

use super::{BoundsConfig, Config};

/// Upper limit for `limits.max_input_mb` (16 GiB).
const MAX_INPUT_MB: u64 = 16 * 1024;

fn check_bounds(name: &str, bounds: &BoundsConfig) -> Result<(), ConfigError> {
    if bounds.max_width == 0 {
        return Err(ConfigError::ValidationError(format!(
            "limits.{name}.max_width must be > 0"
        )));
    }
    if bounds.max_height == 0 {
        return Err(ConfigError::ValidationError(format!(
            "limits.{name}.max_height must be > 0"
        )));
    }
    // Every accepted payload must be addressable in memory.
    let addressable = bounds
        .bounds()
        .max_payload_len()
        .and_then(|len| usize::try_from(len).ok())
        .is_some_and(|len| len <= isize::MAX as usize);
    if !addressable {
        return Err(ConfigError::ValidationError(format!(
            "limits.{name} allows payloads larger than addressable memory"
        )));
    }
    Ok(())
}

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        check_bounds("image", &self.limits.image)?;
        check_bounds("icon", &self.limits.icon)?;
        if self.limits.max_input_mb == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_input_mb must be > 0".into(),
            ));
        }
        if self.limits.max_input_mb > MAX_INPUT_MB {
            return Err(ConfigError::ValidationError(format!(
                "limits.max_input_mb must be <= {MAX_INPUT_MB}"
            )));
        }
        if self.limits.producer_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "limits.producer_timeout_ms must be > 0".into(),
            ));
        }
        if self.limits.decode_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "limits.decode_timeout_ms must be > 0".into(),
            ));
        }
        if let Err(e) = Color::parse_tint(&self.tint.default_label) {
            return Err(ConfigError::ValidationError(format!(
                "tint.default_label: {e}"
            )));
        }
        Ok(())
    }
}
