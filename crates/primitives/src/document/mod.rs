//! Block-structured document model.
//!
//! A [`Document`] is a flat sequence of top-level nodes. Every node occupies
//! `1 + text_len + 1` positions: an opening marker, its text content, and a
//! closing marker. A node starting at position `p` therefore has its first
//! content character at `p + 1`.
//!
//! Every edit returns the [`ChangeSet`] that maps pre-edit positions into the
//! post-edit document, so position-based state held elsewhere can be carried
//! across the edit.

use ropey::Rope;

use crate::edit::{EditError, Result};
use crate::range::{CharIdx, CharLen, char_to_byte};
use crate::transaction::{Change, ChangeSet};


/// Type name of fenced code block nodes.
pub const CODE_BLOCK: &str = "codeBlock";
/// Type name of paragraph nodes.
pub const PARAGRAPH: &str = "paragraph";

/// Character standing in for a structural marker in flattened text.
const MARKER: char = '\u{FFFC}';

/// Node type and attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
	Paragraph,
	CodeBlock {
		/// Language tag as written by the author, if any.
		language: Option<String>,
	},
}

/// A top-level document node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
	kind: NodeKind,
	text: String,
	len_chars: CharLen,
}

impl Node {
	pub fn paragraph(text: impl Into<String>) -> Self {
		Self::new(NodeKind::Paragraph, text.into())
	}

	pub fn code_block(language: Option<&str>, text: impl Into<String>) -> Self {
		Self::new(
			NodeKind::CodeBlock {
				language: language.map(str::to_owned),
			},
			text.into(),
		)
	}

	fn new(kind: NodeKind, text: String) -> Self {
		let len_chars = text.chars().count();
		Self { kind, text, len_chars }
	}

	pub fn kind(&self) -> &NodeKind {
		&self.kind
	}

	/// Returns the node's type name ([`CODE_BLOCK`] or [`PARAGRAPH`]).
	pub fn type_name(&self) -> &'static str {
		match self.kind {
			NodeKind::Paragraph => PARAGRAPH,
			NodeKind::CodeBlock { .. } => CODE_BLOCK,
		}
	}

	/// Returns the language attribute for code blocks.
	pub fn language(&self) -> Option<&str> {
		match &self.kind {
			NodeKind::CodeBlock { language } => language.as_deref(),
			NodeKind::Paragraph => None,
		}
	}

	pub fn text(&self) -> &str {
		&self.text
	}

	/// Returns the content length in characters.
	pub fn len_chars(&self) -> CharLen {
		self.len_chars
	}

	/// Returns the number of positions the node occupies, markers included.
	pub fn node_size(&self) -> CharLen {
		self.len_chars + 2
	}

	fn flattened(&self) -> String {
		let mut out = String::with_capacity(self.text.len() + 2 * MARKER.len_utf8());
		out.push(MARKER);
		out.push_str(&self.text);
		out.push(MARKER);
		out
	}
}

/// A sequence of top-level nodes addressed by char positions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
	nodes: Vec<Node>,
}

impl Document {
	pub fn new(nodes: impl IntoIterator<Item = Node>) -> Self {
		Self {
			nodes: nodes.into_iter().collect(),
		}
	}

	pub fn nodes(&self) -> &[Node] {
		&self.nodes
	}

	/// Returns the total number of positions in the document.
	pub fn content_size(&self) -> CharLen {
		self.nodes.iter().map(Node::node_size).sum()
	}

	/// Iterates over `(start_position, node)` pairs in document order.
	pub fn positioned(&self) -> impl Iterator<Item = (CharIdx, &Node)> {
		self.nodes.iter().scan(0, |pos, node| {
			let start = *pos;
			*pos += node.node_size();
			Some((start, node))
		})
	}

	/// Returns the start position of the node at `index`.
	pub fn node_start(&self, index: usize) -> Option<CharIdx> {
		(index <= self.nodes.len()).then(|| self.nodes[..index].iter().map(Node::node_size).sum())
	}

	/// Returns the node that starts exactly at `pos`, with its index.
	pub fn node_starting_at(&self, pos: CharIdx) -> Option<(usize, &Node)> {
		self.positioned()
			.enumerate()
			.take_while(|(_, (start, _))| *start <= pos)
			.find(|(_, (start, _))| *start == pos)
			.map(|(index, (_, node))| (index, node))
	}

	/// Replaces the content range `[from, to)` with `text`.
	///
	/// The range must lie within a single node's content, i.e. between its
	/// opening and closing markers.
	pub fn replace(&mut self, from: CharIdx, to: CharIdx, text: &str) -> Result<ChangeSet> {
		let size = self.content_size();
		if from > to || to > size {
			return Err(EditError::OutOfBounds { pos: to.max(from), size });
		}

		let (index, start) = self
			.positioned()
			.enumerate()
			.find(|(_, (start, node))| from > *start && to < start + node.node_size())
			.map(|(index, (start, _))| (index, start))
			.ok_or(EditError::CrossesNode { from, to })?;

		let node = &mut self.nodes[index];
		let local_from = from - start - 1;
		let local_to = to - start - 1;
		let byte_from = char_to_byte(&node.text, local_from);
		let byte_to = char_to_byte(&node.text, local_to);
		node.text.replace_range(byte_from..byte_to, text);
		node.len_chars = node.text.chars().count();

		Ok(ChangeSet::from_changes(
			size,
			[Change {
				start: from,
				end: to,
				replacement: (!text.is_empty()).then(|| text.to_owned()),
			}],
		))
	}

	/// Inserts `node` before the node at `index` (or at the end when `index == len`).
	pub fn insert_node(&mut self, index: usize, node: Node) -> Result<ChangeSet> {
		let size = self.content_size();
		let pos = self.node_start(index).ok_or(EditError::NoSuchNode {
			index,
			len: self.nodes.len(),
		})?;
		let cs = ChangeSet::from_changes(size, [Change::insert(pos, node.flattened())]);
		self.nodes.insert(index, node);
		Ok(cs)
	}

	/// Removes the node at `index`.
	pub fn remove_node(&mut self, index: usize) -> Result<ChangeSet> {
		let size = self.content_size();
		let len = self.nodes.len();
		if index >= len {
			return Err(EditError::NoSuchNode { index, len });
		}
		let pos = self.node_start(index).unwrap_or(size);
		let node = self.nodes.remove(index);
		Ok(ChangeSet::from_changes(size, [Change::delete(pos, pos + node.node_size())]))
	}

	/// Changes the language attribute of the code block at `index`.
	///
	/// Attribute changes rewrite the node's opening marker, so the returned
	/// changeset touches the block even though its text is unchanged.
	pub fn set_language(&mut self, index: usize, language: Option<&str>) -> Result<ChangeSet> {
		let size = self.content_size();
		let pos = self
			.node_start(index)
			.filter(|_| index < self.nodes.len())
			.ok_or(EditError::NoSuchNode {
				index,
				len: self.nodes.len(),
			})?;

		match &mut self.nodes[index].kind {
			NodeKind::CodeBlock { language: current } => *current = language.map(str::to_owned),
			NodeKind::Paragraph => return Err(EditError::NotABlock { index }),
		}

		Ok(ChangeSet::from_changes(
			size,
			[Change {
				start: pos,
				end: pos + 1,
				replacement: Some(MARKER.to_string()),
			}],
		))
	}

	/// Returns the document flattened to text, with markers standing in for
	/// node boundaries. Positions in the result equal document positions.
	pub fn flat_text(&self) -> Rope {
		let mut rope = Rope::new();
		for node in &self.nodes {
			let end = rope.len_chars();
			rope.insert(end, &node.flattened());
		}
		rope
	}
}
