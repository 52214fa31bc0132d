//! Cycle classification and the per-mode update paths.

use std::sync::Arc;
use std::time::Instant;

use quill_primitives::{CharIdx, ChangeSet};

use super::{Cycle, HighlightEngine, Signal, UpdateMode};
use crate::decorations::{DecorationSet, StyleRange};
use crate::document::{Block, DocumentTree};
use crate::mapper::map_block;
use crate::style::TokenLines;
use crate::tokenizer::{Tokenizer, resolve_language};

impl HighlightEngine {
	/// Runs one update cycle against `doc`, which must already reflect
	/// `cycle.changes`.
	pub fn apply<D: DocumentTree + ?Sized>(&mut self, doc: &D, cycle: Cycle<'_>) -> UpdateMode {
		if self.detached {
			return UpdateMode::Detached;
		}
		if let Some(changes) = cycle.changes {
			self.scheduler.remap(changes);
		}

		let mode = match self.tokenizer.clone() {
			None => {
				self.decorations = DecorationSet::empty();
				UpdateMode::Disabled
			}
			Some(tokenizer) => self.classify(doc, cycle, tokenizer.as_ref()),
		};

		self.metrics.record_cycle(mode);
		tracing::debug!(?mode, signal = ?cycle.signal, ranges = self.decorations.len(), "highlight cycle");
		mode
	}

	fn classify<D: DocumentTree + ?Sized>(&mut self, doc: &D, cycle: Cycle<'_>, tokenizer: &dyn Tokenizer) -> UpdateMode {
		if matches!(cycle.signal, Some(Signal::Ready | Signal::Refresh)) {
			self.full(doc, tokenizer);
			return UpdateMode::Full;
		}

		if let Some(changes) = cycle.changes {
			self.decorations = self.decorations.map(changes);
		}

		if let Some(Signal::Point(pos)) = cycle.signal {
			self.point(doc, tokenizer, pos);
			return UpdateMode::Point;
		}

		match cycle.changes {
			Some(changes) if !changes.is_identity() => {
				self.incremental(doc, tokenizer, changes);
				UpdateMode::Incremental
			}
			_ => UpdateMode::Unchanged,
		}
	}

	fn full<D: DocumentTree + ?Sized>(&mut self, doc: &D, tokenizer: &dyn Tokenizer) {
		// Every block is about to be rebuilt, including any waiting on the timer.
		self.scheduler.cancel();

		let mut ranges = Vec::new();
		for block in doc.blocks_between(0, doc.content_size(), &self.cfg.block_kind) {
			ranges.extend(self.highlight_block(tokenizer, &block));
		}
		self.decorations = DecorationSet::from_ranges(ranges);
	}

	fn point<D: DocumentTree + ?Sized>(&mut self, doc: &D, tokenizer: &dyn Tokenizer, pos: CharIdx) {
		let Some(block) = doc.node_at(pos).filter(|block| block.kind == self.cfg.block_kind) else {
			tracing::debug!(pos, "point recompute target is gone");
			self.metrics.stale_points += 1;
			return;
		};

		let fresh = self.highlight_block(tokenizer, &block);
		self.decorations = self.decorations.remove_range(block.position, block.end()).add(fresh);
	}

	fn incremental<D: DocumentTree + ?Sized>(&mut self, doc: &D, tokenizer: &dyn Tokenizer, changes: &ChangeSet) {
		let Some((from, to)) = changes
			.changed_ranges()
			.iter()
			.fold(None, |acc: Option<(CharIdx, CharIdx)>, r| match acc {
				Some((from, to)) => Some((from.min(r.from), to.max(r.to))),
				None => Some((r.from, r.to)),
			})
		else {
			return;
		};

		let size = doc.content_size();
		let from = from.saturating_sub(1);
		let to = to.saturating_add(1).min(size);

		for block in doc.blocks_between(from, to, &self.cfg.block_kind) {
			if block.line_count() > self.cfg.large_block_lines {
				self.scheduler.arm(block.position);
				self.metrics.deferred_arms += 1;
				continue;
			}
			let fresh = self.highlight_block(tokenizer, &block);
			self.decorations = self.decorations.remove_range(block.position, block.end()).add(fresh);
		}
	}

	/// Tokenizes and maps one block into document ranges.
	fn highlight_block(&mut self, tokenizer: &dyn Tokenizer, block: &Block<'_>) -> Vec<StyleRange> {
		let language = resolve_language(tokenizer, block.language, &self.cfg.fallback_language).to_owned();
		let Some(lines) = self.tokens(tokenizer, block.text, &language) else {
			return Vec::new();
		};

		let mapping = map_block(block, &lines);
		self.metrics.blocks_highlighted += 1;
		if mapping.desync.is_some() {
			self.metrics.desyncs += 1;
		}
		mapping.ranges
	}

	/// Returns cached or fresh tokens, retrying once with the fallback
	/// language when the tokenizer fails.
	fn tokens(&mut self, tokenizer: &dyn Tokenizer, text: &str, language: &str) -> Option<Arc<TokenLines>> {
		if let Some(lines) = self.cache.lookup(language, text) {
			tracing::trace!(language, "token cache hit");
			return Some(lines);
		}

		let started = Instant::now();
		let result = tokenizer.tokenize(text, language);
		self.metrics.record_tokenize(language, started.elapsed());

		match result {
			Ok(lines) => Some(self.cache.insert(language, text, lines)),
			Err(error) if language != self.cfg.fallback_language => {
				tracing::warn!(language, %error, "tokenization failed; retrying with fallback language");
				self.metrics.tokenizer_fallbacks += 1;
				let fallback = self.cfg.fallback_language.clone();
				self.tokens(tokenizer, text, &fallback)
			}
			Err(error) => {
				tracing::warn!(language, %error, "fallback tokenization failed; block left unstyled");
				None
			}
		}
	}
}
