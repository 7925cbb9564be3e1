//! Session configuration, loadable from TOML.
//!
//! ```toml
//! debounce_ms = 300
//! currency_decimals = 2
//! quantity_decimals = 8
//! ```
//!
//! Every key is optional; missing keys take the defaults above.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::format::Precision;

const MAX_DECIMALS: u32 = 12;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Quiet period after the last keystroke before a commit.
    pub debounce_ms: u64,
    pub currency_decimals: u32,
    pub quantity_decimals: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { debounce_ms: 300, currency_decimals: 2, quantity_decimals: 8 }
    }
}

impl SessionConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: SessionConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.debounce_ms == 0 {
            return Err(ConfigError::Invalid("debounce_ms must be at least 1".into()));
        }
        if self.currency_decimals > MAX_DECIMALS || self.quantity_decimals > MAX_DECIMALS {
            return Err(ConfigError::Invalid(format!(
                "decimals must be at most {MAX_DECIMALS}"
            )));
        }
        Ok(())
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn precision(&self) -> Precision {
        Precision {
            currency_decimals: self.currency_decimals,
            quantity_decimals: self.quantity_decimals,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_gives_defaults() {
        let config = SessionConfig::from_toml_str("").unwrap();
        assert_eq!(config, SessionConfig::default());
        assert_eq!(config.debounce(), Duration::from_millis(300));
        assert_eq!(config.precision(), Precision::default());
    }

    #[test]
    fn partial_toml_overrides_only_given_keys() {
        let config = SessionConfig::from_toml_str("debounce_ms = 150").unwrap();
        assert_eq!(config.debounce_ms, 150);
        assert_eq!(config.quantity_decimals, 8);
    }

    #[test]
    fn zero_debounce_is_rejected() {
        let err = SessionConfig::from_toml_str("debounce_ms = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn excessive_decimals_are_rejected() {
        let err = SessionConfig::from_toml_str("quantity_decimals = 40").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = SessionConfig::from_toml_str("debounce_ms = \"fast\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn reads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sizelab.toml");
        std::fs::write(&path, "debounce_ms = 500\ncurrency_decimals = 4\n").unwrap();

        let config = SessionConfig::from_file(&path).unwrap();
        assert_eq!(config.debounce_ms, 500);
        assert_eq!(config.currency_decimals, 4);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = SessionConfig::from_file(Path::new("/nonexistent/sizelab.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
