//! The highlight engine: owns the token cache, the decoration snapshot, and
//! the debounce timer, and runs one update per cycle.
//!
//! All state is confined to the owning task. Asynchronous work (tokenizer
//! loading and debounce timers) only ever posts messages back through the
//! engine's channel; [`HighlightEngine::pump`] turns them into cycles.

use std::collections::VecDeque;
use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::Arc;

use quill_primitives::CharIdx;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::cache::{CacheStats, TokenCache};
use crate::config::HighlightConfig;
use crate::decorations::DecorationSet;
use crate::document::DocumentTree;
use crate::metrics::HighlightMetrics;
use crate::scheduler::DebounceScheduler;
use crate::tokenizer::{Tokenizer, TokenizerLoadError};

mod classify;
mod signals;
#[cfg(test)]
mod tests;

pub(crate) use signals::EngineMsg;
pub use signals::{Cycle, Signal, SignalSender};

/// What a cycle did to the decoration snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdateMode {
	/// The engine was shut down; nothing happened.
	Detached,
	/// No tokenizer is installed; decorations were cleared.
	Disabled,
	/// Every block was re-highlighted.
	Full,
	/// One deferred or requested block was re-highlighted.
	Point,
	/// Blocks touched by the edit were re-highlighted, the rest remapped.
	Incremental,
	/// Nothing changed; the snapshot was kept.
	Unchanged,
}

/// Per-document highlighting state.
pub struct HighlightEngine {
	cfg: HighlightConfig,
	tokenizer: Option<Arc<dyn Tokenizer>>,
	cache: TokenCache,
	decorations: DecorationSet,
	scheduler: DebounceScheduler,
	runtime: Handle,
	tx: mpsc::UnboundedSender<EngineMsg>,
	rx: mpsc::UnboundedReceiver<EngineMsg>,
	/// Messages received by [`Self::wait_for_signal`] but not yet pumped.
	backlog: VecDeque<EngineMsg>,
	/// Cancellation handle of the in-flight tokenizer load.
	loader: Option<CancellationToken>,
	/// Generation of the most recent [`Self::load_tokenizer`] call.
	loader_generation: u64,
	metrics: HighlightMetrics,
	detached: bool,
}

impl HighlightEngine {
	/// Creates an engine that spawns its timers and loader onto `runtime`.
	///
	/// Highlighting stays disabled until a tokenizer is installed. `cfg` is
	/// taken as given; a `cache_capacity` of zero, which
	/// [`HighlightConfig::validate`] rejects, is raised to one entry.
	pub fn new(cfg: HighlightConfig, runtime: Handle) -> Self {
		let (tx, rx) = mpsc::unbounded_channel();
		let capacity = NonZeroUsize::new(cfg.cache_capacity).unwrap_or(NonZeroUsize::MIN);
		if capacity.get() != cfg.cache_capacity {
			tracing::warn!(requested = cfg.cache_capacity, "token cache capacity raised to 1");
		}
		let scheduler = DebounceScheduler::new(cfg.debounce, runtime.clone(), tx.clone());

		Self {
			cache: TokenCache::new(capacity),
			cfg,
			tokenizer: None,
			decorations: DecorationSet::empty(),
			scheduler,
			runtime,
			tx,
			rx,
			backlog: VecDeque::new(),
			loader: None,
			loader_generation: 0,
			metrics: HighlightMetrics::new(),
			detached: false,
		}
	}

	/// Current decoration snapshot.
	pub fn decorations(&self) -> &DecorationSet {
		&self.decorations
	}

	pub fn metrics(&self) -> &HighlightMetrics {
		&self.metrics
	}

	pub fn cache_stats(&self) -> CacheStats {
		self.cache.stats()
	}

	/// Maximum number of tokenizations the cache holds.
	pub fn cache_capacity(&self) -> usize {
		self.cache.capacity()
	}

	pub fn config(&self) -> &HighlightConfig {
		&self.cfg
	}

	pub fn has_tokenizer(&self) -> bool {
		self.tokenizer.is_some()
	}

	pub fn is_detached(&self) -> bool {
		self.detached
	}

	/// Returns a handle for posting signals to this engine.
	pub fn signals(&self) -> SignalSender {
		SignalSender::new(self.tx.clone())
	}

	/// Position of the block waiting on the debounce timer, if any.
	pub fn pending_deferred(&self) -> Option<CharIdx> {
		self.scheduler.pending_pos()
	}

	/// Installs `tokenizer`, dropping tokens cached from any previous one.
	///
	/// Does not highlight anything by itself; follow with a
	/// [`Signal::Ready`] cycle.
	pub fn install_tokenizer(&mut self, tokenizer: Arc<dyn Tokenizer>) {
		if self.detached {
			return;
		}
		self.cache.clear();
		self.tokenizer = Some(tokenizer);
		tracing::debug!("tokenizer installed");
	}

	/// Spawns the tokenizer initialization future.
	///
	/// On success the tokenizer is installed by the next [`Self::pump`],
	/// which then runs a full recompute. On failure the error is logged and
	/// highlighting stays disabled. A second call supersedes the first: its
	/// predecessor is cancelled, and a result the predecessor already
	/// posted is dropped when pumped.
	pub fn load_tokenizer<F>(&mut self, init: F)
	where
		F: Future<Output = Result<Arc<dyn Tokenizer>, TokenizerLoadError>> + Send + 'static,
	{
		if self.detached {
			return;
		}
		if let Some(previous) = self.loader.take() {
			previous.cancel();
		}

		self.loader_generation = self.loader_generation.wrapping_add(1);
		let generation = self.loader_generation;
		let cancel = CancellationToken::new();
		let token = cancel.clone();
		let tx = self.tx.clone();
		self.runtime.spawn(async move {
			tokio::select! {
				_ = token.cancelled() => {}
				result = init => match result {
					Ok(tokenizer) => {
						let _ = tx.send(EngineMsg::TokenizerLoaded { generation, tokenizer });
					}
					Err(error) => {
						tracing::error!(generation, %error, "tokenizer initialization failed; highlighting disabled");
					}
				},
			}
		});
		self.loader = Some(cancel);
	}

	/// Waits until at least one message is ready for [`Self::pump`].
	///
	/// Returns false once the engine is detached.
	pub async fn wait_for_signal(&mut self) -> bool {
		if self.detached {
			return false;
		}
		if !self.backlog.is_empty() {
			return true;
		}
		match self.rx.recv().await {
			Some(msg) => {
				self.backlog.push_back(msg);
				true
			}
			None => false,
		}
	}

	/// Runs one cycle per queued message, in arrival order.
	///
	/// `doc` must be the document as of the last [`Self::apply`]; pumped
	/// cycles carry no edits. Returns the number of cycles run.
	pub fn pump<D: DocumentTree + ?Sized>(&mut self, doc: &D) -> usize {
		if self.detached {
			return 0;
		}
		while let Ok(msg) = self.rx.try_recv() {
			self.backlog.push_back(msg);
		}

		let mut cycles = 0;
		while let Some(msg) = self.backlog.pop_front() {
			let signal = match msg {
				EngineMsg::Signal(signal) => signal,
				EngineMsg::TokenizerLoaded { generation, tokenizer } => {
					if generation != self.loader_generation {
						tracing::debug!(generation, current = self.loader_generation, "dropping superseded tokenizer load");
						continue;
					}
					self.loader = None;
					self.install_tokenizer(tokenizer);
					Signal::Ready
				}
				EngineMsg::Deferred { generation } => match self.scheduler.take_fired(generation) {
					Some(pos) => Signal::Point(pos),
					None => {
						tracing::debug!(generation, "dropping superseded deferred recompute");
						self.metrics.stale_deferrals += 1;
						continue;
					}
				},
			};
			self.apply(doc, Cycle::signal(signal));
			cycles += 1;
		}
		cycles
	}

	/// Detaches the engine: cancels the timer and the loader, drops the
	/// tokenizer, closes the signal channel, and clears decorations.
	///
	/// Every later cycle is ignored. Idempotent.
	pub fn shutdown(&mut self) {
		if self.detached {
			return;
		}
		self.detached = true;
		self.scheduler.cancel();
		if let Some(loader) = self.loader.take() {
			loader.cancel();
		}
		self.tokenizer = None;
		self.rx.close();
		while self.rx.try_recv().is_ok() {}
		self.backlog.clear();
		self.cache.clear();
		self.decorations = DecorationSet::empty();
		tracing::debug!("highlight engine detached");
	}
}

impl Drop for HighlightEngine {
	fn drop(&mut self) {
		self.shutdown();
	}
}

impl std::fmt::Debug for HighlightEngine {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("HighlightEngine")
			.field("has_tokenizer", &self.tokenizer.is_some())
			.field("decorations", &self.decorations.len())
			.field("cache", &self.cache)
			.field("pending_deferred", &self.scheduler.pending_pos())
			.field("detached", &self.detached)
			.finish()
	}
}
