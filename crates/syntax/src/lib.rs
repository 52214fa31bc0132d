//! Incremental syntax highlighting for fenced code blocks.
//!
//! The engine overlays per-character styles, derived from tokenizing each
//! code block, onto a document that is being edited. Each edit cycle is
//! classified into one of a few update modes:
//!
//! - full recompute when the tokenizer becomes ready or a refresh is forced
//! - incremental recompute of the blocks an edit touched, with everything
//!   else carried across the edit by position mapping
//! - deferred point recompute for oversized blocks, coalesced by a single
//!   trailing debounce timer
//!
//! Tokenizer output is cached by content fingerprint and validated against
//! the block text before any style is emitted, so a tokenizer that disagrees
//! with the document truncates highlighting instead of painting the wrong
//! characters.

pub mod cache;
pub mod config;
pub mod decorations;
pub mod document;
pub mod engine;
pub mod fingerprint;
pub mod mapper;
pub mod metrics;
pub mod scheduler;
pub mod style;
pub mod tokenizer;

pub use cache::{CacheStats, CachedTokens, TokenCache};
pub use config::{ConfigError, HighlightConfig};
pub use decorations::{DecorationSet, StyleRange};
pub use document::{Block, DocumentTree};
pub use engine::{Cycle, HighlightEngine, Signal, SignalSender, UpdateMode};
pub use fingerprint::Fingerprint;
pub use mapper::{BlockMapping, Desync, map_block};
pub use metrics::HighlightMetrics;
pub use scheduler::DebounceScheduler;
pub use style::{Style, TokenLine, TokenLines, TokenSpan};
pub use tokenizer::{PlainTokenizer, TokenizeError, Tokenizer, TokenizerLoadError, resolve_language};
