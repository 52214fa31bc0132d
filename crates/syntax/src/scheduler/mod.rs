//! Debounced re-highlighting of large blocks.
//!
//! At most one recompute is pending at a time. Arming a new one cancels the
//! previous timer and bumps the generation, so a timer that fires late can
//! be recognized and ignored.

use std::time::Duration;

use quill_primitives::{Bias, CharIdx, ChangeSet};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::engine::EngineMsg;

#[cfg(test)]
mod tests;

#[derive(Debug)]
struct PendingRecompute {
	generation: u64,
	pos: CharIdx,
	cancel: CancellationToken,
}

/// Single-slot debounce timer that posts [`EngineMsg::Deferred`] on expiry.
#[derive(Debug)]
pub struct DebounceScheduler {
	delay: Duration,
	runtime: Handle,
	tx: mpsc::UnboundedSender<EngineMsg>,
	generation: u64,
	pending: Option<PendingRecompute>,
}

impl DebounceScheduler {
	pub(crate) fn new(delay: Duration, runtime: Handle, tx: mpsc::UnboundedSender<EngineMsg>) -> Self {
		Self {
			delay,
			runtime,
			tx,
			generation: 0,
			pending: None,
		}
	}

	/// Schedules a recompute of the block at `pos`, replacing any pending one.
	///
	/// Returns the generation of the new timer.
	pub fn arm(&mut self, pos: CharIdx) -> u64 {
		self.cancel();
		self.generation = self.generation.wrapping_add(1);
		let generation = self.generation;
		let cancel = CancellationToken::new();

		let token = cancel.clone();
		let tx = self.tx.clone();
		let delay = self.delay;
		self.runtime.spawn(async move {
			tokio::select! {
				_ = token.cancelled() => {}
				_ = tokio::time::sleep(delay) => {
					// Receiver gone means the engine shut down.
					let _ = tx.send(EngineMsg::Deferred { generation });
				}
			}
		});

		tracing::debug!(pos, generation, delay_ms = delay.as_millis() as u64, "armed deferred recompute");
		self.pending = Some(PendingRecompute { generation, pos, cancel });
		generation
	}

	/// Cancels the pending recompute. Returns true if one was pending.
	pub fn cancel(&mut self) -> bool {
		match self.pending.take() {
			Some(pending) => {
				pending.cancel.cancel();
				true
			}
			None => false,
		}
	}

	/// Carries the pending position across an edit.
	pub fn remap(&mut self, changes: &ChangeSet) {
		if let Some(pending) = &mut self.pending {
			pending.pos = changes.map_pos(pending.pos, Bias::Left);
		}
	}

	/// Position of the pending recompute, if any.
	pub fn pending_pos(&self) -> Option<CharIdx> {
		self.pending.as_ref().map(|p| p.pos)
	}

	/// Resolves a fired timer to its block position.
	///
	/// Returns `None` if `generation` was superseded or cancelled.
	pub(crate) fn take_fired(&mut self, generation: u64) -> Option<CharIdx> {
		match &self.pending {
			Some(pending) if pending.generation == generation => self.pending.take().map(|p| p.pos),
			_ => None,
		}
	}

	pub fn delay(&self) -> Duration {
		self.delay
	}
}

impl Drop for DebounceScheduler {
	fn drop(&mut self) {
		self.cancel();
	}
}
