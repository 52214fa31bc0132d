use smallvec::SmallVec;

use super::types::{Bias, Change, ChangedRange, Insertion, Operation, Tendril};
use crate::Rope;
use crate::range::{CharIdx, CharLen};

/// A sequence of operations representing a set of changes to a document.
///
/// ChangeSet represents document changes as a sequence of retain, delete,
/// and insert operations, which is enough to map positions from the pre-edit
/// document into the post-edit one.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ChangeSet {
	/// Sequence of retain/delete/insert operations.
	pub(super) changes: Vec<Operation>,
	/// Length of the source document before changes.
	pub(super) len: usize,
	/// Length of the document after applying changes.
	pub(super) len_after: usize,
}

impl ChangeSet {
	/// Creates an identity changeset over a document of `len` characters.
	pub fn identity(len: CharLen) -> Self {
		let mut cs = Self::default();
		cs.retain(len);
		cs
	}

	/// Builds a changeset from sorted, non-overlapping changes against a
	/// document of `len` characters.
	///
	/// Out-of-order or overlapping changes are clamped so the result always
	/// spans exactly `len` source characters.
	pub fn from_changes(len: CharLen, changes: impl IntoIterator<Item = Change>) -> Self {
		let mut cs = Self::default();
		let mut last = 0;

		for Change { start, end, replacement } in changes {
			debug_assert!(start >= last, "changes must be sorted and non-overlapping");
			let start = start.clamp(last, len);
			let end = end.clamp(start, len);

			cs.retain(start - last);
			cs.delete(end - start);
			if let Some(text) = replacement {
				cs.insert(text);
			}
			last = end;
		}

		cs.retain(len - last);
		cs
	}

	/// Returns the length of the source document (before changes).
	pub fn len(&self) -> usize {
		self.len
	}

	/// Returns the length of the document after applying changes.
	pub fn len_after(&self) -> usize {
		self.len_after
	}

	/// Returns true if this changeset contains no operations.
	pub fn is_empty(&self) -> bool {
		self.changes.is_empty()
	}

	/// Returns true if applying this changeset leaves the document unchanged.
	pub fn is_identity(&self) -> bool {
		self.changes.iter().all(|op| matches!(op, Operation::Retain(_)))
	}

	/// Returns a slice of all operations in this changeset.
	pub fn changes(&self) -> &[Operation] {
		&self.changes
	}

	/// Adds a retain operation, preserving N characters from the source.
	///
	/// Consecutive retain operations are automatically merged.
	pub(crate) fn retain(&mut self, n: CharLen) {
		if n == 0 {
			return;
		}

		self.len += n;
		self.len_after += n;

		if let Some(Operation::Retain(count)) = self.changes.last_mut() {
			*count += n;
		} else {
			self.changes.push(Operation::Retain(n));
		}
	}

	/// Adds a delete operation, removing N characters from the source.
	///
	/// Consecutive delete operations are automatically merged.
	pub(crate) fn delete(&mut self, n: CharLen) {
		if n == 0 {
			return;
		}

		self.len += n;

		if let Some(Operation::Delete(count)) = self.changes.last_mut() {
			*count += n;
		} else {
			self.changes.push(Operation::Delete(n));
		}
	}

	/// Adds an insert operation, inserting text at the current position.
	///
	/// Insertions are merged with adjacent inserts and always ordered before
	/// a trailing delete, so equivalent edits produce equal operation
	/// sequences.
	pub(crate) fn insert(&mut self, text: Tendril) {
		if text.is_empty() {
			return;
		}
		let ins = Insertion::new(text);
		self.len_after += ins.char_len();

		match self.changes.as_mut_slice() {
			[.., Operation::Insert(prev)] | [.., Operation::Insert(prev), Operation::Delete(_)] => {
				prev.push_str(&ins);
			}
			[.., last @ Operation::Delete(_)] => {
				let del = std::mem::replace(last, Operation::Insert(ins));
				self.changes.push(del);
			}
			_ => {
				self.changes.push(Operation::Insert(ins));
			}
		}
	}

	/// Applies this changeset to a document, modifying it in place.
	pub fn apply(&self, doc: &mut Rope) {
		let mut pos = 0;
		for op in &self.changes {
			match op {
				Operation::Retain(n) => {
					pos += n;
				}
				Operation::Delete(n) => {
					doc.remove(pos..pos + n);
				}
				Operation::Insert(ins) => {
					doc.insert(pos, ins.text());
					pos += ins.char_len();
				}
			}
		}
	}

	/// Maps a position through this changeset using the specified bias.
	///
	/// Positions inside a deleted region collapse to the deletion point.
	pub fn map_pos(&self, pos: CharIdx, bias: Bias) -> CharIdx {
		let mut old_pos = 0;
		let mut new_pos = 0;

		for op in &self.changes {
			if old_pos > pos {
				break;
			}

			match op {
				Operation::Retain(n) => {
					if old_pos + n > pos {
						return new_pos + (pos - old_pos);
					}
					old_pos += n;
					new_pos += n;
				}
				Operation::Delete(n) => {
					if old_pos + n > pos {
						return new_pos;
					}
					old_pos += n;
				}
				Operation::Insert(ins) => {
					if old_pos == pos && bias == Bias::Left {
						// Position is exactly at insert point, stay before
					} else {
						new_pos += ins.char_len();
					}
				}
			}
		}

		new_pos + (pos - old_pos)
	}

	/// Returns the post-edit regions touched by this changeset, in order.
	///
	/// Insertions yield the inserted span, deletions an empty range at the
	/// deletion point. Touching regions are coalesced.
	pub fn changed_ranges(&self) -> SmallVec<[ChangedRange; 4]> {
		let mut out: SmallVec<[ChangedRange; 4]> = SmallVec::new();
		let mut new_pos = 0;

		for op in &self.changes {
			let range = match op {
				Operation::Retain(n) => {
					new_pos += n;
					continue;
				}
				Operation::Delete(_) => ChangedRange {
					from: new_pos,
					to: new_pos,
				},
				Operation::Insert(ins) => {
					let from = new_pos;
					new_pos += ins.char_len();
					ChangedRange { from, to: new_pos }
				}
			};

			match out.last_mut() {
				Some(last) if last.to == range.from => last.to = range.to,
				_ => out.push(range),
			}
		}

		out
	}
}
