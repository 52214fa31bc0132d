//! Core types for editing a block-structured document: char-indexed ranges,
//! changesets with position mapping, and the reference document model.

/// Block document model: top-level nodes with structural markers.
pub mod document;
/// Edit operation errors.
pub mod edit;
/// Text coordinate types.
pub mod range;
/// Changeset primitives: operations, composition, and position mapping.
pub mod transaction;

pub use document::{CODE_BLOCK, Document, Node, NodeKind, PARAGRAPH};
pub use edit::EditError;
pub use range::{CharIdx, CharLen};
pub use ropey::{Rope, RopeSlice};
pub use transaction::{Bias, Change, ChangeSet, ChangedRange};
