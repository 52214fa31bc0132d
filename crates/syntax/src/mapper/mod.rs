//! Token-to-document alignment.
//!
//! Walks a block's token lines alongside its raw text, converting token
//! spans into document-coordinate [`StyleRange`]s. Every span is checked
//! against the text it claims to cover before anything is emitted for it;
//! the first mismatch stops the walk for the rest of the block.

use std::sync::Arc;

use quill_primitives::CharIdx;

use crate::decorations::StyleRange;
use crate::document::Block;
use crate::style::TokenLine;


/// Tokenizer output that disagreed with the block text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Desync {
	/// Start position of the block.
	pub block_pos: CharIdx,
	/// Char offset into the block text where the mismatch was found.
	pub text_offset: usize,
	/// Span content reported by the tokenizer.
	pub expected: String,
	/// Text actually present at that offset.
	pub found: String,
}

/// Result of mapping one block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockMapping {
	/// Ranges emitted before the walk finished or stopped.
	pub ranges: Vec<StyleRange>,
	/// Set when the walk stopped at a mismatching span.
	pub desync: Option<Desync>,
}

/// Maps `lines` onto `block`, merging adjacent spans with equal styles.
///
/// Merging continues across tokenizer line boundaries, so a style that runs
/// over several lines becomes one range covering the line terminators too.
/// Spans with an empty style never produce ranges.
pub fn map_block(block: &Block<'_>, lines: &[TokenLine]) -> BlockMapping {
	let text = block.text;
	let content_start = block.position + 1;
	let mut byte_offset = 0;
	let mut char_offset = 0;
	let mut merger = RangeMerger::default();

	for (index, line) in lines.iter().enumerate() {
		for span in line {
			let rest = &text[byte_offset..];
			let span_chars = span.content.chars().count();

			if !rest.starts_with(span.content.as_str()) {
				let found: String = rest.chars().take(span_chars).collect();
				tracing::warn!(
					pos = block.position,
					offset = char_offset,
					expected = %span.content,
					found = %found,
					"token desync; truncating block highlight"
				);
				return BlockMapping {
					ranges: merger.finish(),
					desync: Some(Desync {
						block_pos: block.position,
						text_offset: char_offset,
						expected: span.content.clone(),
						found,
					}),
				};
			}

			let from = content_start + char_offset;
			merger.push(from, from + span_chars, span.style.to_css());
			byte_offset += span.content.len();
			char_offset += span_chars;
		}

		if index + 1 < lines.len() {
			let (bytes, chars) = line_break(&text[byte_offset..]);
			byte_offset += bytes;
			char_offset += chars;
		}
	}

	BlockMapping {
		ranges: merger.finish(),
		desync: None,
	}
}

/// Returns the `(bytes, chars)` to skip between two tokenizer lines.
///
/// Handles `\n`, `\r\n`, and a lone `\r`. When the tokenizer split a line the
/// text does not break, skips exactly one character. Nothing is skipped at
/// the end of the text.
fn line_break(rest: &str) -> (usize, usize) {
	if rest.starts_with("\r\n") {
		(2, 2)
	} else if rest.starts_with(['\n', '\r']) {
		(1, 1)
	} else {
		rest.chars().next().map_or((0, 0), |c| (c.len_utf8(), 1))
	}
}

struct PendingRange {
	from: CharIdx,
	to: CharIdx,
	style: String,
}

/// Coalesces consecutive equal-style spans into single ranges.
#[derive(Default)]
struct RangeMerger {
	ranges: Vec<StyleRange>,
	pending: Option<PendingRange>,
}

impl RangeMerger {
	fn push(&mut self, from: CharIdx, to: CharIdx, style: String) {
		if from == to {
			return;
		}

		if let Some(pending) = &mut self.pending
			&& pending.style == style
		{
			pending.to = to;
			return;
		}

		self.flush();
		if !style.is_empty() {
			self.pending = Some(PendingRange { from, to, style });
		}
	}

	fn flush(&mut self) {
		if let Some(PendingRange { from, to, style }) = self.pending.take() {
			self.ranges.push(StyleRange::new(from, to, Arc::<str>::from(style)));
		}
	}

	fn finish(mut self) -> Vec<StyleRange> {
		self.flush();
		self.ranges
	}
}
