//! Bounded LRU cache of tokenizer output keyed by content fingerprint.

use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;

use crate::fingerprint::Fingerprint;
use crate::style::TokenLines;


/// Tokenizer output stored under a fingerprint, together with the key it
/// was computed from.
#[derive(Debug, Clone)]
pub struct CachedTokens {
	language: Box<str>,
	text: Box<str>,
	lines: Arc<TokenLines>,
}

impl CachedTokens {
	pub fn new(language: &str, text: &str, lines: TokenLines) -> Self {
		Self {
			language: language.into(),
			text: text.into(),
			lines: Arc::new(lines),
		}
	}

	/// Returns true if this entry was computed for exactly `(language, text)`.
	pub fn matches(&self, language: &str, text: &str) -> bool {
		*self.language == *language && *self.text == *text
	}

	pub fn lines(&self) -> &Arc<TokenLines> {
		&self.lines
	}
}

/// Lookup counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
	pub hits: u64,
	pub misses: u64,
	/// Fingerprint hits whose stored key differed (counted as misses too).
	pub collisions: u64,
	pub evictions: u64,
}

/// Fixed-capacity least-recently-used token cache.
///
/// Entries are never invalidated, only evicted: a fingerprint's token layout
/// is a pure function of its `(language, text)` key.
pub struct TokenCache {
	entries: LruCache<Fingerprint, CachedTokens>,
	stats: CacheStats,
}

impl TokenCache {
	pub const DEFAULT_CAPACITY: usize = 500;

	pub fn new(capacity: NonZeroUsize) -> Self {
		Self {
			entries: LruCache::new(capacity),
			stats: CacheStats::default(),
		}
	}

	/// Returns the entry stored under `fp`, marking it most recently used.
	pub fn get(&mut self, fp: Fingerprint) -> Option<&CachedTokens> {
		self.entries.get(&fp)
	}

	/// Stores `entry` under `fp`, evicting the least recently used entry when full.
	pub fn put(&mut self, fp: Fingerprint, entry: CachedTokens) {
		if let Some((evicted, _)) = self.entries.push(fp, entry)
			&& evicted != fp
		{
			self.stats.evictions += 1;
		}
	}

	/// Returns true if `fp` is cached, without touching recency.
	pub fn contains(&self, fp: Fingerprint) -> bool {
		self.entries.contains(&fp)
	}

	/// Looks up the token lines for `(language, text)`.
	///
	/// A fingerprint hit whose stored key differs is treated as a miss.
	pub fn lookup(&mut self, language: &str, text: &str) -> Option<Arc<TokenLines>> {
		let fp = Fingerprint::of(language, text);
		match self.entries.get(&fp) {
			Some(entry) if entry.matches(language, text) => {
				self.stats.hits += 1;
				Some(Arc::clone(entry.lines()))
			}
			Some(_) => {
				tracing::debug!(%fp, language, "fingerprint collision in token cache");
				self.stats.collisions += 1;
				self.stats.misses += 1;
				None
			}
			None => {
				self.stats.misses += 1;
				None
			}
		}
	}

	/// Caches freshly tokenized lines for `(language, text)` and returns them.
	pub fn insert(&mut self, language: &str, text: &str, lines: TokenLines) -> Arc<TokenLines> {
		let entry = CachedTokens::new(language, text, lines);
		let lines = Arc::clone(entry.lines());
		self.put(Fingerprint::of(language, text), entry);
		lines
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn capacity(&self) -> usize {
		self.entries.cap().get()
	}

	pub fn stats(&self) -> CacheStats {
		self.stats
	}

	pub fn clear(&mut self) {
		self.entries.clear();
	}
}

impl Default for TokenCache {
	fn default() -> Self {
		Self::new(NonZeroUsize::new(Self::DEFAULT_CAPACITY).unwrap_or(NonZeroUsize::MIN))
	}
}

impl std::fmt::Debug for TokenCache {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("TokenCache")
			.field("len", &self.entries.len())
			.field("capacity", &self.capacity())
			.field("stats", &self.stats)
			.finish()
	}
}
