//! Engine inputs: external signals and per-cycle edit descriptions.

use std::sync::Arc;

use quill_primitives::{CharIdx, ChangeSet};
use tokio::sync::mpsc;

use crate::tokenizer::Tokenizer;

/// Out-of-band requests delivered to the engine alongside edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
	/// The tokenizer became available; highlight everything.
	Ready,
	/// Rebuild all decorations from scratch.
	Refresh,
	/// Re-highlight the single block starting at this position.
	Point(CharIdx),
}

/// Messages drained by [`HighlightEngine::pump`](super::HighlightEngine::pump).
pub(crate) enum EngineMsg {
	Signal(Signal),
	/// A debounce timer of the given generation fired.
	Deferred { generation: u64 },
	/// The tokenizer load of the given generation finished.
	TokenizerLoaded { generation: u64, tokenizer: Arc<dyn Tokenizer> },
}

impl std::fmt::Debug for EngineMsg {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Signal(signal) => f.debug_tuple("Signal").field(signal).finish(),
			Self::Deferred { generation } => f.debug_struct("Deferred").field("generation", generation).finish(),
			Self::TokenizerLoaded { generation, .. } => f
				.debug_struct("TokenizerLoaded")
				.field("generation", generation)
				.finish_non_exhaustive(),
		}
	}
}

/// Cloneable handle for posting [`Signal`]s to an engine.
#[derive(Debug, Clone)]
pub struct SignalSender {
	tx: mpsc::UnboundedSender<EngineMsg>,
}

impl SignalSender {
	pub(crate) fn new(tx: mpsc::UnboundedSender<EngineMsg>) -> Self {
		Self { tx }
	}

	/// Posts a signal. Returns false once the engine has shut down.
	pub fn send(&self, signal: Signal) -> bool {
		self.tx.send(EngineMsg::Signal(signal)).is_ok()
	}

	pub fn is_closed(&self) -> bool {
		self.tx.is_closed()
	}
}

/// Input for one update cycle: the edit applied since the previous cycle
/// and an optional signal.
#[derive(Debug, Clone, Copy, Default)]
pub struct Cycle<'a> {
	pub changes: Option<&'a ChangeSet>,
	pub signal: Option<Signal>,
}

impl<'a> Cycle<'a> {
	/// A cycle carrying an edit and no signal.
	pub fn edit(changes: &'a ChangeSet) -> Self {
		Self {
			changes: Some(changes),
			signal: None,
		}
	}

	/// A cycle carrying only a signal.
	pub fn signal(signal: Signal) -> Self {
		Self {
			changes: None,
			signal: Some(signal),
		}
	}

	pub fn with_signal(mut self, signal: Signal) -> Self {
		self.signal = Some(signal);
		self
	}

	/// A cycle with neither edit nor signal.
	pub fn idle() -> Self {
		Self::default()
	}
}
