use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use quill_primitives::{Document, Node};
use rustc_hash::FxHashSet;

use super::*;
use crate::decorations::StyleRange;
use crate::style::{Style, TokenLines, TokenSpan};
use crate::tokenizer::TokenizeError;

/// Styles every `rust` line red, leaves `plaintext` unstyled, always fails
/// on `broken`, and emits misaligned tokens for `shifted`.
struct StubTokenizer {
	languages: FxHashSet<String>,
	calls: AtomicUsize,
}

impl StubTokenizer {
	fn new() -> Arc<Self> {
		Arc::new(Self {
			languages: ["rust", "plaintext", "broken", "shifted"].into_iter().map(String::from).collect(),
			calls: AtomicUsize::new(0),
		})
	}

	fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}
}

impl Tokenizer for StubTokenizer {
	fn tokenize(&self, text: &str, language: &str) -> Result<TokenLines, TokenizeError> {
		self.calls.fetch_add(1, Ordering::SeqCst);
		let style = match language {
			"rust" => Style::new().with("color", "red"),
			"plaintext" => Style::new(),
			"broken" => return Err(TokenizeError::Malformed("stub".into())),
			"shifted" => return Ok(vec![vec![TokenSpan::new(format!("_{text}"), Style::new().with("color", "red"))]]),
			other => return Err(TokenizeError::UnsupportedLanguage(other.into())),
		};
		Ok(text
			.split('\n')
			.map(|line| {
				if line.is_empty() {
					Vec::new()
				} else {
					vec![TokenSpan::new(line, style.clone())]
				}
			})
			.collect())
	}

	fn supported_languages(&self) -> &FxHashSet<String> {
		&self.languages
	}
}

fn engine_with(cfg: HighlightConfig, tokenizer: &Arc<StubTokenizer>) -> HighlightEngine {
	let _ = tracing_subscriber::fmt().with_test_writer().try_init();
	let mut engine = HighlightEngine::new(cfg, Handle::current());
	engine.install_tokenizer(Arc::clone(tokenizer) as Arc<dyn Tokenizer>);
	engine
}

fn engine(tokenizer: &Arc<StubTokenizer>) -> HighlightEngine {
	engine_with(HighlightConfig::default(), tokenizer)
}

fn red(from: CharIdx, to: CharIdx) -> StyleRange {
	StyleRange::new(from, to, "color:red")
}

/// `"hi"` paragraph at 0, rust block `"ab\ncd"` at 4 (content 5..10).
fn sample() -> Document {
	Document::new([Node::paragraph("hi"), Node::code_block(Some("rust"), "ab\ncd")])
}

#[tokio::test]
async fn test_full_recompute_is_stable() {
	let tokenizer = StubTokenizer::new();
	let mut engine = engine(&tokenizer);
	let doc = sample();

	assert_eq!(engine.apply(&doc, Cycle::signal(Signal::Ready)), UpdateMode::Full);
	let first = engine.decorations().clone();
	assert_eq!(engine.apply(&doc, Cycle::signal(Signal::Refresh)), UpdateMode::Full);

	assert_eq!(first.as_slice(), &[red(5, 10)]);
	assert_eq!(engine.decorations(), &first);
	assert_eq!(tokenizer.calls(), 1, "second full recompute is served from cache");
	assert_eq!(engine.cache_stats().hits, 1);
}

#[tokio::test]
async fn test_disabled_without_tokenizer() {
	let mut engine = HighlightEngine::new(HighlightConfig::default(), Handle::current());
	let doc = sample();

	assert_eq!(engine.apply(&doc, Cycle::signal(Signal::Ready)), UpdateMode::Disabled);
	assert!(engine.decorations().is_empty());
	assert_eq!(engine.metrics().disabled_cycles, 1);
}

#[tokio::test]
async fn test_unsupported_language_renders_plain() {
	let tokenizer = StubTokenizer::new();
	let mut engine = engine(&tokenizer);
	let doc = Document::new([Node::code_block(Some("cobol"), "MOVE A TO B")]);

	assert_eq!(engine.apply(&doc, Cycle::signal(Signal::Ready)), UpdateMode::Full);
	assert!(engine.decorations().is_empty());
	assert_eq!(engine.metrics().tokenizer_fallbacks, 0);
	assert_eq!(engine.metrics().blocks_highlighted, 1);
}

#[tokio::test]
async fn test_paragraphs_are_not_highlighted() {
	let tokenizer = StubTokenizer::new();
	let mut engine = engine(&tokenizer);
	let doc = Document::new([Node::paragraph("fn main() {}")]);

	engine.apply(&doc, Cycle::signal(Signal::Ready));
	assert!(engine.decorations().is_empty());
	assert_eq!(tokenizer.calls(), 0);
}

#[tokio::test]
async fn test_incremental_rehighlights_edited_block() {
	let tokenizer = StubTokenizer::new();
	let mut engine = engine(&tokenizer);
	let mut doc = Document::new([
		Node::code_block(Some("rust"), "ab"),
		Node::paragraph("x"),
		Node::code_block(Some("rust"), "cd"),
	]);
	engine.apply(&doc, Cycle::signal(Signal::Ready));
	assert_eq!(engine.decorations().as_slice(), &[red(1, 3), red(8, 10)]);

	let changes = doc.replace(3, 3, "\nzz").unwrap();
	assert_eq!(engine.apply(&doc, Cycle::edit(&changes)), UpdateMode::Incremental);

	// First block grew to "ab\nzz"; the untouched one only moved.
	assert_eq!(engine.decorations().as_slice(), &[red(1, 6), red(11, 13)]);
	assert_eq!(engine.metrics().incremental_cycles, 1);
}

#[tokio::test]
async fn test_edit_outside_blocks_only_remaps() {
	let tokenizer = StubTokenizer::new();
	let mut engine = engine(&tokenizer);
	let mut doc = sample();
	engine.apply(&doc, Cycle::signal(Signal::Ready));
	let calls = tokenizer.calls();

	let changes = doc.replace(1, 1, "oh ").unwrap();
	assert_eq!(engine.apply(&doc, Cycle::edit(&changes)), UpdateMode::Incremental);

	assert_eq!(engine.decorations().as_slice(), &[red(8, 13)]);
	assert_eq!(tokenizer.calls(), calls);
}

#[tokio::test]
async fn test_idle_cycle_keeps_snapshot() {
	let tokenizer = StubTokenizer::new();
	let mut engine = engine(&tokenizer);
	let doc = sample();
	engine.apply(&doc, Cycle::signal(Signal::Ready));
	let before = engine.decorations().clone();

	assert_eq!(engine.apply(&doc, Cycle::idle()), UpdateMode::Unchanged);
	assert_eq!(engine.decorations(), &before);
}

#[tokio::test]
async fn test_removing_block_drops_its_ranges() {
	let tokenizer = StubTokenizer::new();
	let mut engine = engine(&tokenizer);
	let mut doc = sample();
	engine.apply(&doc, Cycle::signal(Signal::Ready));

	let changes = doc.remove_node(1).unwrap();
	assert_eq!(engine.apply(&doc, Cycle::edit(&changes)), UpdateMode::Incremental);
	assert!(engine.decorations().is_empty());
}

#[tokio::test]
async fn test_language_change_rehighlights() {
	let tokenizer = StubTokenizer::new();
	let mut engine = engine(&tokenizer);
	let mut doc = sample();
	engine.apply(&doc, Cycle::signal(Signal::Ready));
	assert!(!engine.decorations().is_empty());

	let changes = doc.set_language(1, Some("plaintext")).unwrap();
	assert_eq!(engine.apply(&doc, Cycle::edit(&changes)), UpdateMode::Incremental);
	assert!(engine.decorations().is_empty());
}

#[tokio::test]
async fn test_tokenize_error_falls_back() {
	let tokenizer = StubTokenizer::new();
	let mut engine = engine(&tokenizer);
	let doc = Document::new([Node::code_block(Some("broken"), "x")]);

	assert_eq!(engine.apply(&doc, Cycle::signal(Signal::Ready)), UpdateMode::Full);
	assert!(engine.decorations().is_empty());
	assert_eq!(engine.metrics().tokenizer_fallbacks, 1);
	assert_eq!(tokenizer.calls(), 2);
}

#[tokio::test]
async fn test_desync_is_counted() {
	let tokenizer = StubTokenizer::new();
	let mut engine = engine(&tokenizer);
	let doc = Document::new([Node::code_block(Some("shifted"), "abc")]);

	engine.apply(&doc, Cycle::signal(Signal::Ready));
	assert!(engine.decorations().is_empty());
	assert_eq!(engine.metrics().desyncs, 1);
}

#[tokio::test]
async fn test_stale_point_is_noop() {
	let tokenizer = StubTokenizer::new();
	let mut engine = engine(&tokenizer);
	let doc = sample();
	engine.apply(&doc, Cycle::signal(Signal::Ready));
	let before = engine.decorations().clone();

	assert_eq!(engine.apply(&doc, Cycle::signal(Signal::Point(2))), UpdateMode::Point);
	assert_eq!(engine.apply(&doc, Cycle::signal(Signal::Point(0))), UpdateMode::Point);
	assert_eq!(engine.decorations(), &before);
	assert_eq!(engine.metrics().stale_points, 2);
}

#[tokio::test(start_paused = true)]
async fn test_large_block_is_deferred() {
	let tokenizer = StubTokenizer::new();
	let cfg = HighlightConfig {
		large_block_lines: 2,
		..HighlightConfig::default()
	};
	let mut engine = engine_with(cfg, &tokenizer);
	let mut doc = Document::new([Node::code_block(Some("rust"), "a\nb\nc")]);
	engine.apply(&doc, Cycle::signal(Signal::Ready));
	assert_eq!(engine.decorations().as_slice(), &[red(1, 6)]);

	let changes = doc.replace(1, 1, "x").unwrap();
	assert_eq!(engine.apply(&doc, Cycle::edit(&changes)), UpdateMode::Incremental);
	assert_eq!(engine.pending_deferred(), Some(0));
	// Stale but remapped until the timer fires.
	assert_eq!(engine.decorations().as_slice(), &[red(2, 7)]);

	tokio::time::sleep(Duration::from_millis(299)).await;
	assert_eq!(engine.pump(&doc), 0);

	tokio::time::sleep(Duration::from_millis(2)).await;
	assert!(engine.wait_for_signal().await);
	assert_eq!(engine.pump(&doc), 1);
	assert_eq!(engine.decorations().as_slice(), &[red(1, 7)]);
	assert_eq!(engine.pending_deferred(), None);
	assert_eq!(engine.metrics().point_cycles, 1);
	assert_eq!(engine.metrics().deferred_arms, 1);
}

#[tokio::test(start_paused = true)]
async fn test_typing_burst_coalesces_deferred_recompute() {
	let tokenizer = StubTokenizer::new();
	let cfg = HighlightConfig {
		large_block_lines: 2,
		..HighlightConfig::default()
	};
	let mut engine = engine_with(cfg, &tokenizer);
	let mut doc = Document::new([Node::paragraph(""), Node::code_block(Some("rust"), "a\nb\nc")]);
	engine.apply(&doc, Cycle::signal(Signal::Ready));

	for _ in 0..3 {
		let changes = doc.replace(3, 3, "x").unwrap();
		engine.apply(&doc, Cycle::edit(&changes));
		tokio::time::sleep(Duration::from_millis(100)).await;
	}
	// Typing in the paragraph moves the block; the pending position follows.
	let changes = doc.replace(1, 1, "p").unwrap();
	engine.apply(&doc, Cycle::edit(&changes));
	assert_eq!(engine.pending_deferred(), Some(3));

	tokio::time::sleep(Duration::from_millis(400)).await;
	assert_eq!(engine.pump(&doc), 1);
	assert_eq!(engine.metrics().point_cycles, 1);
	assert_eq!(engine.metrics().deferred_arms, 3);
	assert_eq!(engine.decorations().as_slice(), &[red(4, 12)]);
}

#[tokio::test(start_paused = true)]
async fn test_full_recompute_cancels_deferred() {
	let tokenizer = StubTokenizer::new();
	let cfg = HighlightConfig {
		large_block_lines: 0,
		..HighlightConfig::default()
	};
	let mut engine = engine_with(cfg, &tokenizer);
	let mut doc = sample();
	engine.apply(&doc, Cycle::signal(Signal::Ready));

	let changes = doc.replace(5, 5, "z").unwrap();
	engine.apply(&doc, Cycle::edit(&changes));
	assert!(engine.pending_deferred().is_some());

	engine.apply(&doc, Cycle::signal(Signal::Refresh));
	assert_eq!(engine.pending_deferred(), None);

	tokio::time::sleep(Duration::from_millis(500)).await;
	assert_eq!(engine.pump(&doc), 0);
}

#[tokio::test]
async fn test_refresh_through_signal_sender() {
	let tokenizer = StubTokenizer::new();
	let mut engine = engine(&tokenizer);
	let doc = sample();

	let signals = engine.signals();
	assert!(signals.send(Signal::Refresh));
	assert_eq!(engine.pump(&doc), 1);
	assert_eq!(engine.decorations().as_slice(), &[red(5, 10)]);
	assert_eq!(engine.metrics().full_cycles, 1);
}

#[tokio::test(start_paused = true)]
async fn test_loader_installs_tokenizer() {
	let tokenizer = StubTokenizer::new();
	let mut engine = HighlightEngine::new(HighlightConfig::default(), Handle::current());
	let doc = sample();
	assert_eq!(engine.apply(&doc, Cycle::idle()), UpdateMode::Disabled);

	let loaded = Arc::clone(&tokenizer) as Arc<dyn Tokenizer>;
	engine.load_tokenizer(async move {
		tokio::time::sleep(Duration::from_millis(50)).await;
		Ok(loaded)
	});

	assert!(engine.wait_for_signal().await);
	assert_eq!(engine.pump(&doc), 1);
	assert!(engine.has_tokenizer());
	assert_eq!(engine.decorations().as_slice(), &[red(5, 10)]);
}

#[tokio::test(start_paused = true)]
async fn test_loader_failure_keeps_disabled() {
	let mut engine = HighlightEngine::new(HighlightConfig::default(), Handle::current());
	let doc = sample();

	engine.load_tokenizer(async { Err(TokenizerLoadError("no grammars".into())) });
	tokio::time::sleep(Duration::from_millis(10)).await;

	assert_eq!(engine.pump(&doc), 0);
	assert!(!engine.has_tokenizer());
	assert_eq!(engine.apply(&doc, Cycle::signal(Signal::Ready)), UpdateMode::Disabled);
}

#[tokio::test(start_paused = true)]
async fn test_superseded_loader_result_is_dropped() {
	let tokenizer = StubTokenizer::new();
	let mut engine = HighlightEngine::new(HighlightConfig::default(), Handle::current());
	let doc = sample();

	let first = Arc::clone(&tokenizer) as Arc<dyn Tokenizer>;
	engine.load_tokenizer(async move { Ok(first) });
	tokio::time::sleep(Duration::from_millis(1)).await;

	engine.load_tokenizer(async {
		tokio::time::sleep(Duration::from_millis(10)).await;
		Err(TokenizerLoadError("grammar bundle missing".into()))
	});
	tokio::time::sleep(Duration::from_millis(50)).await;

	assert_eq!(engine.pump(&doc), 0);
	assert!(!engine.has_tokenizer());
	assert!(engine.decorations().is_empty());
	assert_eq!(engine.metrics().full_cycles, 0);
}

#[tokio::test(start_paused = true)]
async fn test_latest_loader_wins() {
	let stale = StubTokenizer::new();
	let current = StubTokenizer::new();
	let mut engine = HighlightEngine::new(HighlightConfig::default(), Handle::current());
	let doc = sample();

	let first = Arc::clone(&stale) as Arc<dyn Tokenizer>;
	engine.load_tokenizer(async move { Ok(first) });
	tokio::time::sleep(Duration::from_millis(1)).await;

	let second = Arc::clone(&current) as Arc<dyn Tokenizer>;
	engine.load_tokenizer(async move { Ok(second) });
	tokio::time::sleep(Duration::from_millis(1)).await;

	assert_eq!(engine.pump(&doc), 1);
	assert_eq!(engine.decorations().as_slice(), &[red(5, 10)]);
	assert_eq!(stale.calls(), 0);
	assert_eq!(current.calls(), 1);
}

#[tokio::test]
async fn test_zero_cache_capacity_is_raised() {
	let tokenizer = StubTokenizer::new();
	let cfg = HighlightConfig {
		cache_capacity: 0,
		..HighlightConfig::default()
	};
	assert!(cfg.validate().is_err());

	let mut engine = engine_with(cfg, &tokenizer);
	assert_eq!(engine.cache_capacity(), 1);
	assert_eq!(engine.apply(&sample(), Cycle::signal(Signal::Ready)), UpdateMode::Full);
	assert_eq!(engine.decorations().as_slice(), &[red(5, 10)]);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_discards_everything() {
	let tokenizer = StubTokenizer::new();
	let cfg = HighlightConfig {
		large_block_lines: 0,
		..HighlightConfig::default()
	};
	let mut engine = engine_with(cfg, &tokenizer);
	let mut doc = sample();
	engine.apply(&doc, Cycle::signal(Signal::Ready));
	let changes = doc.replace(5, 5, "z").unwrap();
	engine.apply(&doc, Cycle::edit(&changes));
	let signals = engine.signals();

	engine.shutdown();
	assert!(engine.is_detached());
	assert!(engine.decorations().is_empty());
	assert_eq!(engine.pending_deferred(), None);
	assert!(!signals.send(Signal::Refresh));
	assert!(signals.is_closed());

	tokio::time::sleep(Duration::from_millis(500)).await;
	assert_eq!(engine.pump(&doc), 0);
	assert_eq!(engine.apply(&doc, Cycle::signal(Signal::Ready)), UpdateMode::Detached);
	assert!(!engine.wait_for_signal().await);
	assert!(engine.decorations().is_empty());
}
