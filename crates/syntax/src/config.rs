//! Engine tunables, loadable from TOML.

use std::time::Duration;

use serde::{Deserialize, Deserializer};
use thiserror::Error;

/// Errors that can occur while loading a [`HighlightConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("failed to parse highlight config: {0}")]
	Parse(#[from] toml::de::Error),
	#[error("invalid highlight config: {0}")]
	Invalid(String),
}

/// Highlight engine configuration.
///
/// ```toml
/// block-kind = "codeBlock"
/// fallback-language = "plaintext"
/// cache-capacity = 500
/// large-block-lines = 100
/// debounce-ms = 300
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct HighlightConfig {
	/// Node type name of highlightable blocks.
	pub block_kind: String,
	/// Language used when a block's tag is missing or unsupported.
	pub fallback_language: String,
	/// Maximum number of cached tokenizations.
	pub cache_capacity: usize,
	/// Blocks with more lines than this are re-highlighted after a delay
	/// instead of on every keystroke.
	pub large_block_lines: usize,
	#[serde(rename = "debounce-ms", deserialize_with = "millis")]
	pub debounce: Duration,
}

impl Default for HighlightConfig {
	fn default() -> Self {
		Self {
			block_kind: "codeBlock".into(),
			fallback_language: "plaintext".into(),
			cache_capacity: 500,
			large_block_lines: 100,
			debounce: Duration::from_millis(300),
		}
	}
}

impl HighlightConfig {
	/// Parses a config from TOML; absent keys keep their defaults.
	pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
		let config: Self = toml::from_str(input)?;
		config.validate()?;
		Ok(config)
	}

	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.block_kind.is_empty() {
			return Err(ConfigError::Invalid("block-kind must not be empty".into()));
		}
		if self.fallback_language.is_empty() {
			return Err(ConfigError::Invalid("fallback-language must not be empty".into()));
		}
		if self.cache_capacity == 0 {
			return Err(ConfigError::Invalid("cache-capacity must be at least 1".into()));
		}
		Ok(())
	}
}

fn millis<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
	u64::deserialize(deserializer).map(Duration::from_millis)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_empty_input_yields_defaults() {
		assert_eq!(HighlightConfig::from_toml_str("").unwrap(), HighlightConfig::default());
	}

	#[test]
	fn test_partial_override() {
		let cfg = HighlightConfig::from_toml_str("debounce-ms = 50\nlarge-block-lines = 10").unwrap();
		assert_eq!(cfg.debounce, Duration::from_millis(50));
		assert_eq!(cfg.large_block_lines, 10);
		assert_eq!(cfg.cache_capacity, 500);
		assert_eq!(cfg.block_kind, "codeBlock");
	}

	#[test]
	fn test_unknown_key_rejected() {
		assert!(matches!(
			HighlightConfig::from_toml_str("debounce = 1"),
			Err(ConfigError::Parse(_))
		));
	}

	#[test]
	fn test_zero_capacity_rejected() {
		assert!(matches!(
			HighlightConfig::from_toml_str("cache-capacity = 0"),
			Err(ConfigError::Invalid(_))
		));
	}
}
