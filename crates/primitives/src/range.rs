/// A position in the document, measured in characters (not bytes).
///
/// This is the canonical coordinate space for Quill. Structural markers
/// (node open/close tokens) each occupy one position.
pub type CharIdx = usize;

/// A length in the document, measured in characters. Node sizes count both
/// structural markers.
pub type CharLen = usize;

/// Converts a char index into a byte offset within `text`.
///
/// Indices past the end clamp to `text.len()`.
pub fn char_to_byte(text: &str, char_idx: CharIdx) -> usize {
	text.char_indices().nth(char_idx).map_or(text.len(), |(byte, _)| byte)
}
