//! Tokenizer collaborator interface.

use rustc_hash::FxHashSet;
use thiserror::Error;

use crate::style::{TokenLines, TokenSpan};

/// Errors reported by a [`Tokenizer`] for a single block.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenizeError {
	/// The grammar for this language is not loaded.
	#[error("language `{0}` is not loaded")]
	UnsupportedLanguage(String),
	/// The tokenizer rejected the input.
	#[error("tokenizer rejected input: {0}")]
	Malformed(String),
}

/// Failure of the one-time asynchronous tokenizer initialization.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("tokenizer failed to load: {0}")]
pub struct TokenizerLoadError(pub String);

/// Converts block text into styled token lines.
///
/// Implementations must be pure: the same `(text, language)` always yields
/// the same output, since results are cached by content fingerprint.
pub trait Tokenizer: Send + Sync {
	fn tokenize(&self, text: &str, language: &str) -> Result<TokenLines, TokenizeError>;

	/// Languages this tokenizer has grammars for.
	fn supported_languages(&self) -> &FxHashSet<String>;

	fn supports(&self, language: &str) -> bool {
		self.supported_languages().contains(language)
	}
}

/// Picks the language a block is tokenized as.
///
/// Missing, empty, or unsupported tags resolve to `fallback`.
pub fn resolve_language<'a>(tokenizer: &dyn Tokenizer, requested: Option<&'a str>, fallback: &'a str) -> &'a str {
	match requested {
		Some(language) if !language.is_empty() && tokenizer.supports(language) => language,
		_ => fallback,
	}
}

/// Tokenizer that only knows the fallback grammar: one unstyled span per line.
#[derive(Debug, Clone)]
pub struct PlainTokenizer {
	languages: FxHashSet<String>,
}

impl PlainTokenizer {
	pub fn new(language: impl Into<String>) -> Self {
		Self {
			languages: FxHashSet::from_iter([language.into()]),
		}
	}
}

impl Tokenizer for PlainTokenizer {
	fn tokenize(&self, text: &str, language: &str) -> Result<TokenLines, TokenizeError> {
		if !self.supports(language) {
			return Err(TokenizeError::UnsupportedLanguage(language.to_owned()));
		}

		Ok(text
			.split('\n')
			.map(|line| {
				let line = line.strip_suffix('\r').unwrap_or(line);
				if line.is_empty() {
					Vec::new()
				} else {
					vec![TokenSpan::plain(line)]
				}
			})
			.collect())
	}

	fn supported_languages(&self) -> &FxHashSet<String> {
		&self.languages
	}
}
