use thiserror::Error;

use crate::range::CharIdx;

/// Errors returned by [`crate::Document`] edit operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
	/// Position or node index lies outside the document.
	#[error("position {pos} is out of bounds (content size {size})")]
	OutOfBounds { pos: CharIdx, size: usize },
	/// Node index lies outside the document.
	#[error("node index {index} is out of bounds ({len} nodes)")]
	NoSuchNode { index: usize, len: usize },
	/// A text replacement spans more than one node's content.
	#[error("edit {from}..{to} is not confined to a single node's content")]
	CrossesNode { from: CharIdx, to: CharIdx },
	/// The targeted node is not a code block.
	#[error("node {index} is not a code block")]
	NotABlock { index: usize },
}

/// Result type for document edit operations.
pub type Result<T> = std::result::Result<T, EditError>;
