//! Document tree collaborator interface.

use quill_primitives::{CharIdx, CharLen, Document};

/// A document node as seen by the highlighter.
///
/// `position` is the node's start (its opening marker); content begins at
/// `position + 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block<'a> {
	/// Node type name.
	pub kind: &'a str,
	pub position: CharIdx,
	/// Positions occupied by the node, markers included.
	pub size: CharLen,
	/// Language attribute, for code blocks.
	pub language: Option<&'a str>,
	pub text: &'a str,
}

impl Block<'_> {
	/// Position just past the node's closing marker.
	pub fn end(&self) -> CharIdx {
		self.position + self.size
	}

	/// Number of `\n`-delimited lines in the block text.
	pub fn line_count(&self) -> usize {
		self.text.split('\n').count()
	}
}

/// Read access to the document tree the engine decorates.
pub trait DocumentTree {
	/// Total number of positions in the document.
	fn content_size(&self) -> CharLen;

	/// Visits nodes whose span intersects `[from, to)` in document order.
	///
	/// Returning `false` from `visit` skips the node's descendants.
	fn nodes_between<'a>(&'a self, from: CharIdx, to: CharIdx, visit: &mut dyn FnMut(Block<'a>) -> bool);

	/// Returns the node starting at `pos`, if any.
	fn node_at(&self, pos: CharIdx) -> Option<Block<'_>>;

	/// Collects the nodes of type `kind` intersecting `[from, to)`, without
	/// descending into matched nodes.
	fn blocks_between(&self, from: CharIdx, to: CharIdx, kind: &str) -> Vec<Block<'_>> {
		let mut blocks = Vec::new();
		self.nodes_between(from, to, &mut |block| {
			if block.kind == kind {
				blocks.push(block);
				false
			} else {
				true
			}
		});
		blocks
	}
}

impl DocumentTree for Document {
	fn content_size(&self) -> CharLen {
		Document::content_size(self)
	}

	fn nodes_between<'a>(&'a self, from: CharIdx, to: CharIdx, visit: &mut dyn FnMut(Block<'a>) -> bool) {
		for (position, node) in self.positioned() {
			if position >= to {
				break;
			}
			if position + node.node_size() > from {
				// Top-level nodes only hold text, so there is nothing to descend into.
				visit(block_view(position, node));
			}
		}
	}

	fn node_at(&self, pos: CharIdx) -> Option<Block<'_>> {
		self.node_starting_at(pos).map(|(_, node)| block_view(pos, node))
	}
}

fn block_view(position: CharIdx, node: &quill_primitives::Node) -> Block<'_> {
	Block {
		kind: node.type_name(),
		position,
		size: node.node_size(),
		language: node.language(),
		text: node.text(),
	}
}
