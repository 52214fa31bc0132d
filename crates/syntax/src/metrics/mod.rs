//! Highlight engine counters and tokenizer timing.
//!
//! Cycle counters are plain totals. Tokenizer durations are tracked per
//! language as exponential moving averages, so a slow grammar stands out
//! without keeping a history.

use std::time::Duration;

use rustc_hash::FxHashMap;

use crate::engine::UpdateMode;


/// Smoothing factor for the duration EMA.
/// alpha = 2 / (N + 1). For N=10, alpha ~= 0.18.
const EMA_ALPHA: f64 = 0.2;

#[derive(Debug, Clone, Copy, Default)]
struct Ema {
	value: f64,
	initialized: bool,
}

impl Ema {
	fn update(&mut self, next: f64) {
		if self.initialized {
			self.value = EMA_ALPHA * next + (1.0 - EMA_ALPHA) * self.value;
		} else {
			self.value = next;
			self.initialized = true;
		}
	}
}

/// Running totals collected by a [`HighlightEngine`](crate::HighlightEngine).
#[derive(Debug, Clone, Default)]
pub struct HighlightMetrics {
	pub full_cycles: u64,
	pub point_cycles: u64,
	pub incremental_cycles: u64,
	pub unchanged_cycles: u64,
	pub disabled_cycles: u64,
	/// Blocks mapped to ranges, across all cycle kinds.
	pub blocks_highlighted: u64,
	/// Blocks whose tokens stopped matching their text.
	pub desyncs: u64,
	/// Tokenizer failures retried with the fallback language.
	pub tokenizer_fallbacks: u64,
	pub deferred_arms: u64,
	/// Debounce timers that fired after being superseded.
	pub stale_deferrals: u64,
	/// Point requests that did not resolve to a highlightable block.
	pub stale_points: u64,
	tokenize_ms: FxHashMap<String, Ema>,
}

impl HighlightMetrics {
	pub fn new() -> Self {
		Self::default()
	}

	pub(crate) fn record_cycle(&mut self, mode: UpdateMode) {
		let counter = match mode {
			UpdateMode::Full => &mut self.full_cycles,
			UpdateMode::Point => &mut self.point_cycles,
			UpdateMode::Incremental => &mut self.incremental_cycles,
			UpdateMode::Unchanged => &mut self.unchanged_cycles,
			UpdateMode::Disabled => &mut self.disabled_cycles,
			UpdateMode::Detached => return,
		};
		*counter += 1;
	}

	pub(crate) fn record_tokenize(&mut self, language: &str, elapsed: Duration) {
		let ms = elapsed.as_secs_f64() * 1000.0;
		match self.tokenize_ms.get_mut(language) {
			Some(ema) => ema.update(ms),
			None => {
				let mut ema = Ema::default();
				ema.update(ms);
				self.tokenize_ms.insert(language.to_owned(), ema);
			}
		}
	}

	/// Smoothed tokenizer duration for `language`, if it was ever tokenized.
	pub fn avg_tokenize(&self, language: &str) -> Option<Duration> {
		self.tokenize_ms
			.get(language)
			.map(|ema| Duration::from_secs_f64(ema.value / 1000.0))
	}

	/// Total number of cycles that produced a decoration snapshot.
	pub fn total_cycles(&self) -> u64 {
		self.full_cycles + self.point_cycles + self.incremental_cycles + self.unchanged_cycles + self.disabled_cycles
	}
}
