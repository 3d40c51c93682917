//! The tree-sitter [`LanguageMode`].

use crate::capture::Capture;
use crate::indent::{TreeSitterIndentController, TreeSitterIndentStrategyDetector};
use crate::input::line_position;
use crate::language::{LanguageProvider, TreeSitterLanguage};
use crate::layer::{LayerTree, SyntaxSnapshot};
use crossbeam_channel::{Receiver, bounded};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use synedit_core::{
    ByteRange, DetectedIndentStrategy, IndentStrategy, InsertLineBreakIndentStrategy,
    LanguageMode, LineChangeSet, LineManager, LinePosition, StringView, SyntaxNode, TextEdit,
};
use tracing::{debug, warn};

/// A running background parse.
#[derive(Debug)]
pub struct ParseHandle {
    cancelled: Arc<AtomicBool>,
    result: Receiver<bool>,
}

impl ParseHandle {
    /// Stop the parse. Its trees are discarded.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Whether the parse was cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Block until the parse finishes. Returns whether its trees were installed; `false` when
    /// it was cancelled, failed or superseded by a newer edit.
    pub fn wait(self) -> bool {
        self.result.recv().unwrap_or(false)
    }

    /// Like [`wait`](Self::wait), giving up after `timeout`.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<bool> {
        self.result.recv_timeout(timeout).ok()
    }
}

/// Syntax support backed by tree-sitter, with injected languages.
///
/// Edits are applied synchronously. The first parse of a large document can run in the
/// background with [`parse_in_background`](Self::parse_in_background); until it completes,
/// [`can_highlight`](LanguageMode::can_highlight) is `false`.
pub struct TreeSitterLanguageMode {
    language: Arc<TreeSitterLanguage>,
    provider: Option<Arc<dyn LanguageProvider>>,
    layers: Arc<Mutex<LayerTree>>,
    generation: Arc<AtomicU64>,
    pending_parse: Option<Arc<AtomicBool>>,
}

impl TreeSitterLanguageMode {
    /// Create a language mode for `language`, resolving injections through `provider`.
    pub fn new(
        language: Arc<TreeSitterLanguage>,
        provider: Option<Arc<dyn LanguageProvider>>,
    ) -> Self {
        let layers = LayerTree::new(Arc::clone(&language), provider.clone());
        Self {
            language,
            provider,
            layers: Arc::new(Mutex::new(layers)),
            generation: Arc::new(AtomicU64::new(0)),
            pending_parse: None,
        }
    }

    /// The root language.
    pub fn language(&self) -> &Arc<TreeSitterLanguage> {
        &self.language
    }

    /// Incremented by every parse and edit.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Parse `text` on a worker thread.
    ///
    /// The result is installed only if no parse or edit happened in the meantime. Starting a
    /// new background parse cancels the previous one.
    pub fn parse_in_background(&mut self, text: &StringView) -> ParseHandle {
        self.cancel_pending_parse();
        let generation = self.bump_generation();
        let cancelled = Arc::new(AtomicBool::new(false));
        self.pending_parse = Some(Arc::clone(&cancelled));
        let (result_tx, result_rx) = bounded(1);

        let job = BackgroundParse {
            language: Arc::clone(&self.language),
            provider: self.provider.clone(),
            text: text.clone(),
            layers: Arc::clone(&self.layers),
            generation: Arc::clone(&self.generation),
            expected_generation: generation,
            cancelled: Arc::clone(&cancelled),
        };
        let spawned = std::thread::Builder::new()
            .name("synedit-parse".to_string())
            .spawn(move || {
                let installed = job.run();
                let _ = result_tx.send(installed);
            });
        if let Err(err) = spawned {
            warn!(
                target: "synedit::layer",
                error = %err,
                "failed to start background parse; parsing synchronously"
            );
            self.parse_now(text);
            cancelled.store(true, Ordering::Release);
        }
        ParseHandle {
            cancelled,
            result: result_rx,
        }
    }

    /// Highlight captures overlapping `range`, in application order.
    pub fn captures(&self, range: ByteRange) -> Vec<Capture> {
        self.layers.lock().captures(range)
    }

    /// A copy of the current trees for querying on another thread.
    pub fn highlight_snapshot(&self) -> SyntaxSnapshot {
        self.layers.lock().snapshot()
    }

    /// Indented description of the language layers.
    pub fn language_hierarchy(&self) -> String {
        self.layers.lock().language_hierarchy()
    }

    /// Run `f` with the layers locked.
    pub fn with_layers<R>(&self, f: impl FnOnce(&LayerTree) -> R) -> R {
        f(&self.layers.lock())
    }

    fn bump_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::AcqRel) + 1
    }

    fn cancel_pending_parse(&mut self) {
        if let Some(cancelled) = self.pending_parse.take() {
            cancelled.store(true, Ordering::Release);
        }
    }

    fn parse_now(&self, text: &StringView) {
        if let Err(err) = self.layers.lock().parse(text) {
            warn!(target: "synedit::layer", error = %err, "parse failed");
        }
    }
}

impl std::fmt::Debug for TreeSitterLanguageMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeSitterLanguageMode")
            .field("language", &self.language.name())
            .field("generation", &self.generation())
            .finish_non_exhaustive()
    }
}

impl Drop for TreeSitterLanguageMode {
    fn drop(&mut self) {
        self.cancel_pending_parse();
    }
}

impl LanguageMode for TreeSitterLanguageMode {
    fn parse(&mut self, text: &StringView) {
        self.cancel_pending_parse();
        self.bump_generation();
        self.parse_now(text);
    }

    fn apply_edit(
        &mut self,
        edit: &TextEdit,
        text: &StringView,
        lines: &LineManager,
    ) -> LineChangeSet {
        self.cancel_pending_parse();
        self.bump_generation();
        match self.layers.lock().apply_edit(edit, text, lines) {
            Ok(changes) => changes,
            Err(err) => {
                warn!(target: "synedit::layer", error = %err, "failed to apply edit to syntax tree");
                LineChangeSet::new()
            }
        }
    }

    fn can_highlight(&self) -> bool {
        self.layers.lock().is_parsed()
    }

    fn strategy_for_inserting_line_break(
        &self,
        text: &StringView,
        lines: &LineManager,
        start: LinePosition,
        end: LinePosition,
        strategy: IndentStrategy,
    ) -> InsertLineBreakIndentStrategy {
        let layers = self.layers.lock();
        let start_pair = layers.layer_and_node_at(start);
        let end_pair = layers.layer_and_node_at(end);
        let scopes = [start_pair.as_ref(), end_pair.as_ref()]
            .into_iter()
            .flatten()
            .find_map(|(layer, _)| layers.language(*layer)?.indentation_scopes());
        let Some(scopes) = scopes else {
            return InsertLineBreakIndentStrategy::new(0, false);
        };
        TreeSitterIndentController::new(scopes, text, lines, strategy.tab_length())
            .strategy_for_inserting_line_break(
                start_pair.map(|(_, node)| node),
                end_pair.map(|(_, node)| node),
                start,
                end,
            )
    }

    fn syntax_node_at(&self, position: LinePosition) -> Option<SyntaxNode> {
        let layers = self.layers.lock();
        let (_, node) = layers.layer_and_node_at(position)?;
        Some(SyntaxNode {
            kind: node.kind().to_string(),
            start: line_position(node.start_position()),
            end: line_position(node.end_position()),
        })
    }

    fn detect_indent_strategy(
        &self,
        text: &StringView,
        lines: &LineManager,
    ) -> DetectedIndentStrategy {
        let layers = self.layers.lock();
        match layers.tree(layers.root()) {
            Some(tree) => TreeSitterIndentStrategyDetector::new(text, lines, tree).detect(),
            None => DetectedIndentStrategy::Unknown,
        }
    }
}

struct BackgroundParse {
    language: Arc<TreeSitterLanguage>,
    provider: Option<Arc<dyn LanguageProvider>>,
    text: StringView,
    layers: Arc<Mutex<LayerTree>>,
    generation: Arc<AtomicU64>,
    expected_generation: u64,
    cancelled: Arc<AtomicBool>,
}

impl BackgroundParse {
    fn run(self) -> bool {
        let mut layers = LayerTree::new(self.language, self.provider);
        if let Err(err) = layers.parse_cancellable(&self.text, Some(&self.cancelled)) {
            debug!(target: "synedit::layer", error = %err, "background parse stopped");
            return false;
        }
        let mut shared = self.layers.lock();
        let is_current = self.generation.load(Ordering::Acquire) == self.expected_generation;
        if !is_current || self.cancelled.load(Ordering::Acquire) {
            debug!(target: "synedit::layer", "discarding outdated background parse");
            return false;
        }
        *shared = layers;
        debug!(
            target: "synedit::layer",
            layer_count = shared.layer_count(),
            "installed background parse"
        );
        true
    }
}
