//! Interpreter configuration
//!
//! Loaded from a TOML fragment by the embedding application; locating the
//! file is the application's business.
//!
//! ```toml
//! word-delimiters = " \t()[]"
//! large-word-delimiters = " "
//! max-count = 999
//!
//! [shortcuts]
//! F = "?: error:\n"
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Delimiters for `w`, `b` and `e`
pub const DEFAULT_WORD_DELIMITERS: &str = " \t`'\"()[]{}<>|,;:.";
/// Delimiters for `W`, `B` and `E`
pub const DEFAULT_LARGE_WORD_DELIMITERS: &str = " \t";
/// Largest repeat count
pub const DEFAULT_MAX_COUNT: u32 = i16::MAX as u32;

/// Keys with a built-in meaning, which shortcuts may not shadow
const RESERVED_KEYS: &str = "0123456789hjklHMLG$wWbBeE/?nNtyvVia.";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("failed to parse config: {0}")]
    Parse(String),
    #[error("shortcut '{key}' is invalid: {reason}")]
    InvalidShortcut { key: char, reason: &'static str },
    #[error("max-count must be at least 1")]
    InvalidCount,
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Interpreter settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct NormalModeConfig {
    pub word_delimiters: String,
    pub large_word_delimiters: String,
    pub max_count: u32,
    /// Single-key macros, replayed keystroke by keystroke
    pub shortcuts: BTreeMap<char, String>,
}

impl Default for NormalModeConfig {
    fn default() -> Self {
        let shortcuts = [('F', "?: error:\n"), ('f', "/: error:\n")]
            .into_iter()
            .map(|(key, value)| (key, value.to_string()))
            .collect();
        Self {
            word_delimiters: DEFAULT_WORD_DELIMITERS.to_string(),
            large_word_delimiters: DEFAULT_LARGE_WORD_DELIMITERS.to_string(),
            max_count: DEFAULT_MAX_COUNT,
            shortcuts,
        }
    }
}

impl NormalModeConfig {
    /// Parse and validate a TOML fragment; missing keys keep their defaults
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: NormalModeConfig =
            toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_count == 0 {
            return Err(ConfigError::InvalidCount);
        }
        for (&key, value) in &self.shortcuts {
            if RESERVED_KEYS.contains(key) {
                return Err(ConfigError::InvalidShortcut {
                    key,
                    reason: "key already has a meaning",
                });
            }
            if value.is_empty() {
                return Err(ConfigError::InvalidShortcut {
                    key,
                    reason: "empty key sequence",
                });
            }
        }
        Ok(())
    }

    pub fn shortcut(&self, key: char) -> Option<&str> {
        self.shortcuts.get(&key).map(String::as_str)
    }

    /// Delimiter set for a word motion key; upper case keys use the large set
    pub fn delimiters_for(&self, key: char) -> &str {
        if key.is_ascii_uppercase() {
            &self.large_word_delimiters
        } else {
            &self.word_delimiters
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = NormalModeConfig::default();
        assert_eq!(config.max_count, 32767);
        assert_eq!(config.shortcut('F'), Some("?: error:\n"));
        assert!(config.validate().is_ok());
        assert_eq!(config.delimiters_for('W'), " \t");
        assert_eq!(config.delimiters_for('w'), DEFAULT_WORD_DELIMITERS);
    }

    #[test]
    fn test_from_toml_partial() {
        let config = NormalModeConfig::from_toml("max-count = 99").unwrap();
        assert_eq!(config.max_count, 99);
        assert_eq!(config.word_delimiters, DEFAULT_WORD_DELIMITERS);
    }

    #[test]
    fn test_from_toml_shortcuts() {
        let text = r#"
            [shortcuts]
            g = "?TODO\n"
        "#;
        let config = NormalModeConfig::from_toml(text).unwrap();
        assert_eq!(config.shortcut('g'), Some("?TODO\n"));
        assert_eq!(config.shortcut('F'), None);
    }

    #[test]
    fn test_invalid_configs() {
        assert!(matches!(
            NormalModeConfig::from_toml("max-count = 0"),
            Err(ConfigError::InvalidCount)
        ));
        assert!(matches!(
            NormalModeConfig::from_toml("[shortcuts]\nw = \"x\""),
            Err(ConfigError::InvalidShortcut { key: 'w', .. })
        ));
        assert!(matches!(
            NormalModeConfig::from_toml("[shortcuts]\ng = \"\""),
            Err(ConfigError::InvalidShortcut { key: 'g', .. })
        ));
        assert!(matches!(
            NormalModeConfig::from_toml("max-count = \"lots\""),
            Err(ConfigError::Parse(_))
        ));
    }
}
