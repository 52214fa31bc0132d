//! Immutable, edit-remappable decoration snapshots.

use std::sync::Arc;

use quill_primitives::{Bias, CharIdx, ChangeSet};
use rustc_hash::FxHashSet;

#[cfg(test)]
mod tests;

/// An inline style over the document range `[from, to)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StyleRange {
	pub from: CharIdx,
	pub to: CharIdx,
	/// Serialized inline CSS.
	pub style: Arc<str>,
}

impl StyleRange {
	pub fn new(from: CharIdx, to: CharIdx, style: impl Into<Arc<str>>) -> Self {
		Self {
			from,
			to,
			style: style.into(),
		}
	}

	pub fn len(&self) -> usize {
		self.to.saturating_sub(self.from)
	}

	pub fn is_empty(&self) -> bool {
		self.from >= self.to
	}

	/// Returns true if the range touches `[from, to]`, boundaries included.
	pub fn touches(&self, from: CharIdx, to: CharIdx) -> bool {
		self.from <= to && self.to >= from
	}
}

/// Snapshot of all style ranges, ordered by `(from, to)`.
///
/// Snapshots are immutable; every operation returns a new one. Cloning is
/// an `Arc` bump, so the renderer can hold a snapshot while the engine
/// builds the next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecorationSet {
	ranges: Arc<[StyleRange]>,
}

impl Default for DecorationSet {
	fn default() -> Self {
		Self::empty()
	}
}

impl DecorationSet {
	pub fn empty() -> Self {
		Self { ranges: Arc::new([]) }
	}

	/// Builds a snapshot from unordered ranges. Empty ranges are dropped.
	pub fn from_ranges(ranges: impl IntoIterator<Item = StyleRange>) -> Self {
		let mut ranges: Vec<_> = ranges.into_iter().filter(|r| !r.is_empty()).collect();
		ranges.sort_unstable();
		Self { ranges: ranges.into() }
	}

	pub fn len(&self) -> usize {
		self.ranges.len()
	}

	pub fn is_empty(&self) -> bool {
		self.ranges.is_empty()
	}

	pub fn iter(&self) -> std::slice::Iter<'_, StyleRange> {
		self.ranges.iter()
	}

	pub fn as_slice(&self) -> &[StyleRange] {
		&self.ranges
	}

	/// Carries every range across an edit.
	///
	/// Range starts map with [`Bias::Right`] and ends with [`Bias::Left`], so
	/// text inserted at either edge is not absorbed. Ranges whose text was
	/// deleted entirely collapse and are dropped.
	pub fn map(&self, changes: &ChangeSet) -> Self {
		if changes.is_identity() {
			return self.clone();
		}

		Self::from_ranges(self.ranges.iter().map(|range| StyleRange {
			from: changes.map_pos(range.from, Bias::Right),
			to: changes.map_pos(range.to, Bias::Left),
			style: Arc::clone(&range.style),
		}))
	}

	/// Returns the ranges touching `[from, to]`, including ranges that start
	/// or end exactly at a boundary.
	pub fn find(&self, from: CharIdx, to: CharIdx) -> Vec<StyleRange> {
		let end = self.ranges.partition_point(|r| r.from <= to);
		self.ranges[..end].iter().filter(|r| r.to >= from).cloned().collect()
	}

	/// Returns a snapshot without the given ranges.
	pub fn remove(&self, targets: &[StyleRange]) -> Self {
		if targets.is_empty() {
			return self.clone();
		}
		let targets: FxHashSet<&StyleRange> = targets.iter().collect();
		Self {
			ranges: self.ranges.iter().filter(|r| !targets.contains(r)).cloned().collect(),
		}
	}

	/// Returns a snapshot without the ranges touching `[from, to]`.
	pub fn remove_range(&self, from: CharIdx, to: CharIdx) -> Self {
		self.remove(&self.find(from, to))
	}

	/// Returns a snapshot with `ranges` added.
	pub fn add(&self, ranges: impl IntoIterator<Item = StyleRange>) -> Self {
		let mut ranges = ranges.into_iter().peekable();
		if ranges.peek().is_none() {
			return self.clone();
		}
		Self::from_ranges(self.ranges.iter().cloned().chain(ranges))
	}
}

impl<'a> IntoIterator for &'a DecorationSet {
	type Item = &'a StyleRange;
	type IntoIter = std::slice::Iter<'a, StyleRange>;

	fn into_iter(self) -> Self::IntoIter {
		self.ranges.iter()
	}
}
