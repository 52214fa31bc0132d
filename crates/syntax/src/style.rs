//! Token style attributes and tokenizer output shapes.

use std::collections::BTreeMap;
use std::fmt;

/// Key/value style attributes attached to a token (`color`, `font-style`, ...).
///
/// Keys are kept sorted so two equal sets always serialize identically,
/// which is what adjacent-token merging compares.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Style(BTreeMap<String, String>);

impl Style {
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns the style with `key` set to `value`.
	pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.0.insert(key.into(), value.into());
		self
	}

	pub fn get(&self, key: &str) -> Option<&str> {
		self.0.get(key).map(String::as_str)
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Serializes to inline CSS (`key:value;key:value`), keys in sorted order.
	///
	/// An empty style serializes to the empty string.
	pub fn to_css(&self) -> String {
		self.to_string()
	}
}

impl fmt::Display for Style {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for (i, (key, value)) in self.0.iter().enumerate() {
			if i > 0 {
				f.write_str(";")?;
			}
			write!(f, "{key}:{value}")?;
		}
		Ok(())
	}
}

impl<K, V> FromIterator<(K, V)> for Style
where
	K: Into<String>,
	V: Into<String>,
{
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
	}
}

/// One tokenizer output unit: a substring of the block text and its style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSpan {
	pub content: String,
	pub style: Style,
}

impl TokenSpan {
	pub fn new(content: impl Into<String>, style: Style) -> Self {
		Self {
			content: content.into(),
			style,
		}
	}

	/// Creates an unstyled span.
	pub fn plain(content: impl Into<String>) -> Self {
		Self::new(content, Style::default())
	}
}

/// Spans of one tokenizer line, in order.
pub type TokenLine = Vec<TokenSpan>;

/// Tokenizer output for a whole block, one entry per tokenizer line.
///
/// Tokenizer lines usually correspond to newline-delimited source lines,
/// but the mapper does not rely on it.
pub type TokenLines = Vec<TokenLine>;
