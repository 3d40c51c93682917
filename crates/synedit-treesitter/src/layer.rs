//! Language layers.
//!
//! A document has one root layer for its own language and a child layer for every injected
//! region, e.g. a `<script>` element in HTML. Layers live in an arena ([`LayerTree`]) and refer
//! to each other through generation-checked [`LayerId`]s: a parent owns its children by site,
//! a child only records its parent's id.
//!
//! Edits are applied top-down. Each layer patches its tree, re-parses with the patched tree as
//! a hint, reports the rows whose syntax changed and then re-derives its children from the
//! injections query. Children whose site is still present keep their layer and incremental
//! state; children whose site disappeared, or whose tree became empty, are dropped.

use crate::capture::{Capture, sort_captures};
use crate::error::TreeSitterError;
use crate::injection::{
    InjectedLanguage, InjectionCapture, InjectionSiteId, LANGUAGE_PROPERTY, map_injections,
};
use crate::input::{Utf16TextProvider, byte_range, input_edit, node_text, parse_text, point};
use crate::language::{LanguageProvider, TreeSitterLanguage};
use std::collections::{HashMap, HashSet};
use std::fmt::Write as _;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use streaming_iterator::StreamingIterator;
use synedit_core::{ByteRange, LineChangeSet, LineManager, LinePosition, StringView, TextEdit};
use tracing::{debug, trace, warn};
use tree_sitter::{InputEdit, Node, Parser, Point, QueryCursor, QueryMatch, Range, Tree};

/// Handle to a layer in a [`LayerTree`].
///
/// Ids of removed layers are never handed out again for a different layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LayerId {
    index: u32,
    generation: u32,
}

struct Layer {
    language: Arc<TreeSitterLanguage>,
    tree: Option<Tree>,
    parent: Option<LayerId>,
    children: HashMap<InjectionSiteId, LayerId>,
    /// Included range of an injected layer. `None` for the root, which sees the whole text.
    range: Option<Range>,
}

impl Layer {
    fn has_empty_tree(&self) -> bool {
        self.tree.as_ref().is_none_or(|tree| {
            let root = tree.root_node();
            root.start_byte() >= root.end_byte()
        })
    }
}

struct Slot {
    generation: u32,
    layer: Option<Layer>,
}

/// All language layers of one document.
pub struct LayerTree {
    slots: Vec<Slot>,
    free: Vec<u32>,
    root: LayerId,
    provider: Option<Arc<dyn LanguageProvider>>,
    parser: Parser,
    text: StringView,
    unknown_languages: HashSet<String>,
}

impl LayerTree {
    /// Create an unparsed tree whose root layer uses `language`. Injected languages are
    /// resolved through `provider`; without one, injections are ignored.
    pub fn new(
        language: Arc<TreeSitterLanguage>,
        provider: Option<Arc<dyn LanguageProvider>>,
    ) -> Self {
        let mut tree = Self {
            slots: Vec::new(),
            free: Vec::new(),
            root: LayerId {
                index: 0,
                generation: 0,
            },
            provider,
            parser: Parser::new(),
            text: StringView::default(),
            unknown_languages: HashSet::new(),
        };
        tree.root = tree.insert(Layer {
            language,
            tree: None,
            parent: None,
            children: HashMap::new(),
            range: None,
        });
        tree
    }

    /// The root layer.
    pub fn root(&self) -> LayerId {
        self.root
    }

    /// The text the layers were last parsed against.
    pub fn text(&self) -> &StringView {
        &self.text
    }

    /// Whether the root layer has a tree.
    pub fn is_parsed(&self) -> bool {
        self.tree(self.root).is_some()
    }

    /// Number of live layers, the root included.
    pub fn layer_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.layer.is_some()).count()
    }

    /// Language of a layer.
    pub fn language(&self, id: LayerId) -> Option<&Arc<TreeSitterLanguage>> {
        self.layer(id).map(|layer| &layer.language)
    }

    /// Syntax tree of a layer.
    pub fn tree(&self, id: LayerId) -> Option<&Tree> {
        self.layer(id)?.tree.as_ref()
    }

    /// Parent of a layer.
    pub fn parent(&self, id: LayerId) -> Option<LayerId> {
        self.layer(id)?.parent
    }

    /// Children of a layer in document order.
    pub fn children(&self, id: LayerId) -> Vec<LayerId> {
        let Some(layer) = self.layer(id) else {
            return Vec::new();
        };
        let mut children: Vec<LayerId> = layer.children.values().copied().collect();
        children.sort_by_key(|child| {
            self.layer(*child)
                .and_then(|layer| layer.range)
                .map(|range| range.start_byte)
        });
        children
    }

    /// Included range of an injected layer.
    pub fn included_range(&self, id: LayerId) -> Option<ByteRange> {
        let range = self.layer(id)?.range?;
        Some(ByteRange::from(range.start_byte..range.end_byte))
    }

    /// Bytes covered by the root node of a layer's tree.
    pub fn root_byte_range(&self, id: LayerId) -> Option<ByteRange> {
        self.tree(id).map(|tree| byte_range(&tree.root_node()))
    }

    /// Parse `text` from scratch and re-derive every child layer.
    pub fn parse(&mut self, text: &StringView) -> Result<(), TreeSitterError> {
        self.parse_cancellable(text, None)
    }

    pub(crate) fn parse_cancellable(
        &mut self,
        text: &StringView,
        cancel: Option<&AtomicBool>,
    ) -> Result<(), TreeSitterError> {
        self.text = text.clone();
        self.parse_layer(self.root, cancel)
    }

    /// Apply an edit to every layer and report rows whose syntax changed.
    ///
    /// `text` and `lines` must already reflect the edit. An unparsed tree is parsed from
    /// scratch instead.
    pub fn apply_edit(
        &mut self,
        edit: &TextEdit,
        text: &StringView,
        lines: &LineManager,
    ) -> Result<LineChangeSet, TreeSitterError> {
        let mut changes = LineChangeSet::new();
        if !self.is_parsed() {
            self.parse(text)?;
            return Ok(changes);
        }
        self.text = text.clone();
        let input = input_edit(edit);
        self.apply_to_layer(self.root, &input, edit, lines, &mut changes)?;
        Ok(changes)
    }

    /// Highlight captures overlapping `range` from every layer, in application order.
    pub fn captures(&self, range: ByteRange) -> Vec<Capture> {
        let mut captures = Vec::new();
        if range.is_empty() {
            return captures;
        }
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            let Some(layer) = self.layer(id) else {
                continue;
            };
            if let Some(tree) = &layer.tree {
                query_captures(&layer.language, tree, &self.text, range, &mut captures);
            }
            stack.extend(layer.children.values().copied());
        }
        sort_captures(&mut captures);
        captures
    }

    /// The smallest node at `position` across all layers, with the layer that owns it.
    pub fn layer_and_node_at(&self, position: LinePosition) -> Option<(LayerId, Node<'_>)> {
        self.layer_and_node_in(self.root, point(position))
    }

    /// Indented description of the layers and the bytes they cover.
    pub fn language_hierarchy(&self) -> String {
        let mut out = String::new();
        self.describe(self.root, 0, &mut out);
        out
    }

    /// An immutable copy of the trees for querying off the editing thread.
    pub fn snapshot(&self) -> SyntaxSnapshot {
        SyntaxSnapshot {
            text: self.text.clone(),
            root: self.snapshot_layer(self.root),
        }
    }

    fn layer(&self, id: LayerId) -> Option<&Layer> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.layer.as_ref()
    }

    fn layer_mut(&mut self, id: LayerId) -> Option<&mut Layer> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.layer.as_mut()
    }

    fn insert(&mut self, layer: Layer) -> LayerId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            debug_assert!(slot.layer.is_none());
            slot.layer = Some(layer);
            return LayerId {
                index,
                generation: slot.generation,
            };
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            layer: Some(layer),
        });
        LayerId {
            index,
            generation: 0,
        }
    }

    fn remove(&mut self, id: LayerId) {
        let Some(slot) = self.slots.get_mut(id.index as usize) else {
            return;
        };
        if slot.generation != id.generation {
            return;
        }
        let Some(layer) = slot.layer.take() else {
            return;
        };
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        debug!(
            target: "synedit::layer",
            language = %layer.language.name(),
            "removed language layer"
        );
        for child in layer.children.into_values() {
            self.remove(child);
        }
    }

    fn configure_parser(
        &mut self,
        language: &TreeSitterLanguage,
        range: Option<Range>,
    ) -> Result<(), TreeSitterError> {
        self.parser
            .set_language(language.language())
            .map_err(|e| TreeSitterError::Language(e.to_string()))?;
        let ranges = match &range {
            Some(range) => std::slice::from_ref(range),
            None => &[],
        };
        self.parser
            .set_included_ranges(ranges)
            .map_err(|e| TreeSitterError::Language(format!("invalid included range: {e:?}")))
    }

    fn parse_layer(
        &mut self,
        id: LayerId,
        cancel: Option<&AtomicBool>,
    ) -> Result<(), TreeSitterError> {
        let Some(layer) = self.layer(id) else {
            return Ok(());
        };
        let language = Arc::clone(&layer.language);
        let range = layer.range;
        self.configure_parser(&language, range)?;
        let tree = parse_text(&mut self.parser, &self.text, None, cancel)
            .ok_or(TreeSitterError::ParseAborted)?;

        let old_children = match self.layer_mut(id) {
            Some(layer) => {
                layer.tree = Some(tree);
                std::mem::take(&mut layer.children)
            }
            None => return Ok(()),
        };
        for child in old_children.into_values() {
            self.remove(child);
        }
        for injected in self.injections(id) {
            self.create_child(id, injected, cancel)?;
        }
        Ok(())
    }

    fn apply_to_layer(
        &mut self,
        id: LayerId,
        input: &InputEdit,
        edit: &TextEdit,
        lines: &LineManager,
        changes: &mut LineChangeSet,
    ) -> Result<(), TreeSitterError> {
        let Some(layer) = self.layer_mut(id) else {
            return Ok(());
        };
        let Some(mut old_tree) = layer.tree.take() else {
            return Ok(());
        };
        old_tree.edit(input);
        let language = Arc::clone(&layer.language);
        let range = layer.range;

        let parsed = self.configure_parser(&language, range).and_then(|()| {
            parse_text(&mut self.parser, &self.text, Some(&old_tree), None)
                .ok_or(TreeSitterError::ParseAborted)
        });
        let new_tree = match parsed {
            Ok(tree) => tree,
            Err(err) => {
                if let Some(layer) = self.layer_mut(id) {
                    layer.tree = Some(old_tree);
                }
                return Err(err);
            }
        };
        for changed in old_tree.changed_ranges(&new_tree) {
            mark_rows(
                changes,
                lines,
                changed.start_point.row,
                changed.end_point.row,
            );
        }
        trace!(
            target: "synedit::layer",
            language = %language.name(),
            start_byte = input.start_byte,
            "re-parsed language layer"
        );
        if let Some(layer) = self.layer_mut(id) {
            layer.tree = Some(new_tree);
        }
        self.update_children(id, input, edit, lines, changes)
    }

    fn update_children(
        &mut self,
        id: LayerId,
        input: &InputEdit,
        edit: &TextEdit,
        lines: &LineManager,
        changes: &mut LineChangeSet,
    ) -> Result<(), TreeSitterError> {
        let injections = self.injections(id);
        let mut unclaimed: Vec<(InjectionSiteId, LayerId)> = match self.layer_mut(id) {
            Some(layer) => layer.children.drain().collect(),
            None => return Ok(()),
        };

        let mut kept = HashMap::new();
        let mut fresh = Vec::new();
        for injected in injections {
            if kept.contains_key(&injected.site) {
                continue;
            }
            let Some(language) = self.resolve_language(&injected.language_name) else {
                continue;
            };
            match self.claim_child(&mut unclaimed, &injected, &language, edit) {
                Some(child) => {
                    if let Some(layer) = self.layer_mut(child) {
                        layer.range = Some(injected.range);
                    }
                    kept.insert(injected.site, child);
                }
                None => fresh.push((injected, language)),
            }
        }

        for (_, child) in unclaimed {
            if let Some(range) = self.included_range(child) {
                mark_byte_range(changes, lines, edit.map_range(range));
            }
            self.remove(child);
        }

        let kept_children: Vec<(InjectionSiteId, LayerId)> = kept.into_iter().collect();
        for (site, child) in kept_children {
            self.apply_to_layer(child, input, edit, lines, changes)?;
            if self.layer(child).is_none_or(Layer::has_empty_tree) {
                self.remove(child);
                continue;
            }
            if let Some(layer) = self.layer_mut(id) {
                layer.children.insert(site, child);
            }
        }

        for (injected, language) in fresh {
            let range = injected.byte_range();
            if self.create_child_with(id, injected, language, None)?.is_some() {
                mark_byte_range(changes, lines, range);
            }
        }
        Ok(())
    }

    /// Take the previous child for `injected`: one at the same site, else one whose old
    /// content range maps onto the new one.
    fn claim_child(
        &self,
        unclaimed: &mut Vec<(InjectionSiteId, LayerId)>,
        injected: &InjectedLanguage,
        language: &Arc<TreeSitterLanguage>,
        edit: &TextEdit,
    ) -> Option<LayerId> {
        let same_language = |child: LayerId| {
            self.layer(child)
                .is_some_and(|layer| Arc::ptr_eq(&layer.language, language))
        };
        let position = unclaimed
            .iter()
            .position(|(site, child)| *site == injected.site && same_language(*child))
            .or_else(|| {
                unclaimed.iter().position(|(_, child)| {
                    same_language(*child)
                        && self
                            .included_range(*child)
                            .is_some_and(|range| edit.map_range(range) == injected.byte_range())
                })
            })?;
        Some(unclaimed.swap_remove(position).1)
    }

    fn create_child(
        &mut self,
        parent: LayerId,
        injected: InjectedLanguage,
        cancel: Option<&AtomicBool>,
    ) -> Result<Option<LayerId>, TreeSitterError> {
        let Some(language) = self.resolve_language(&injected.language_name) else {
            return Ok(None);
        };
        self.create_child_with(parent, injected, language, cancel)
    }

    fn create_child_with(
        &mut self,
        parent: LayerId,
        injected: InjectedLanguage,
        language: Arc<TreeSitterLanguage>,
        cancel: Option<&AtomicBool>,
    ) -> Result<Option<LayerId>, TreeSitterError> {
        if self
            .layer(parent)
            .is_none_or(|layer| layer.children.contains_key(&injected.site))
        {
            return Ok(None);
        }
        let language_name = language.name().to_string();
        let child = self.insert(Layer {
            language,
            tree: None,
            parent: Some(parent),
            children: HashMap::new(),
            range: Some(injected.range),
        });
        if let Some(layer) = self.layer_mut(parent) {
            layer.children.insert(injected.site, child);
        }
        if let Err(err) = self.parse_layer(child, cancel) {
            self.detach(parent, injected.site, child);
            return Err(err);
        }
        if self.layer(child).is_none_or(Layer::has_empty_tree) {
            self.detach(parent, injected.site, child);
            return Ok(None);
        }
        debug!(
            target: "synedit::layer",
            language = %language_name,
            start_byte = injected.range.start_byte,
            end_byte = injected.range.end_byte,
            "created language layer"
        );
        Ok(Some(child))
    }

    fn detach(&mut self, parent: LayerId, site: InjectionSiteId, child: LayerId) {
        if let Some(layer) = self.layer_mut(parent) {
            layer.children.remove(&site);
        }
        self.remove(child);
    }

    fn resolve_language(&mut self, name: &str) -> Option<Arc<TreeSitterLanguage>> {
        let language = self
            .provider
            .as_ref()
            .and_then(|provider| provider.language(name));
        if language.is_none() && self.unknown_languages.insert(name.to_string()) {
            warn!(
                target: "synedit::layer",
                language = %name,
                "injected language is not available; region is left unparsed"
            );
        }
        language
    }

    fn injections(&self, id: LayerId) -> Vec<InjectedLanguage> {
        let Some(layer) = self.layer(id) else {
            return Vec::new();
        };
        let (Some(tree), Some(query)) = (&layer.tree, layer.language.injections_query()) else {
            return Vec::new();
        };
        let text = &self.text;
        let names = query.query().capture_names();
        let mut cursor = QueryCursor::new();
        let mut matches =
            cursor.matches(query.query(), tree.root_node(), Utf16TextProvider::new(text));
        let mut captures = Vec::new();
        let mut match_index = 0;
        while let Some(m) = matches.next() {
            if !query
                .predicates()
                .evaluate(m.pattern_index, &|index| capture_text(m, index, text))
            {
                continue;
            }
            let language_property = query.property(m.pattern_index, LANGUAGE_PROPERTY);
            for capture in m.captures {
                let Some(name) = names.get(capture.index as usize) else {
                    continue;
                };
                captures.push(InjectionCapture {
                    name,
                    node: capture.node,
                    language_property,
                    match_index,
                });
            }
            match_index += 1;
        }
        captures.sort_by_key(|capture| (capture.match_index, capture.node.start_byte()));
        map_injections(captures, |node| node_text(text, node))
    }

    fn layer_and_node_in(&self, id: LayerId, point: Point) -> Option<(LayerId, Node<'_>)> {
        let layer = self.layer(id)?;
        let tree = layer.tree.as_ref()?;
        let mut best = tree
            .root_node()
            .descendant_for_point_range(point, point)
            .map(|node| (id, node));
        for child in layer.children.values() {
            let Some(root) = self.tree(*child).map(Tree::root_node) else {
                continue;
            };
            if !contains_point(&root, point) {
                continue;
            }
            if let Some((child_id, node)) = self.layer_and_node_in(*child, point) {
                let replace = match &best {
                    Some((_, current)) => node.byte_range().len() <= current.byte_range().len(),
                    None => true,
                };
                if replace {
                    best = Some((child_id, node));
                }
            }
        }
        best
    }

    fn describe(&self, id: LayerId, depth: usize, out: &mut String) {
        let Some(layer) = self.layer(id) else {
            return;
        };
        let range = self.root_byte_range(id).unwrap_or_default();
        let _ = writeln!(
            out,
            "{}● {} [{} - {}]",
            "  ".repeat(depth),
            layer.language.name(),
            range.lower_bound(),
            range.upper_bound()
        );
        for child in self.children(id) {
            self.describe(child, depth + 1, out);
        }
    }

    fn snapshot_layer(&self, id: LayerId) -> Option<LayerSnapshot> {
        let layer = self.layer(id)?;
        Some(LayerSnapshot {
            language: Arc::clone(&layer.language),
            tree: layer.tree.clone(),
            children: self
                .children(id)
                .into_iter()
                .filter_map(|child| self.snapshot_layer(child))
                .collect(),
        })
    }
}

impl std::fmt::Debug for LayerTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayerTree")
            .field("root", &self.root)
            .field("layer_count", &self.layer_count())
            .field("is_parsed", &self.is_parsed())
            .finish_non_exhaustive()
    }
}

/// Trees of every layer at one point in time.
#[derive(Clone)]
pub struct SyntaxSnapshot {
    text: StringView,
    root: Option<LayerSnapshot>,
}

#[derive(Clone)]
struct LayerSnapshot {
    language: Arc<TreeSitterLanguage>,
    tree: Option<Tree>,
    children: Vec<LayerSnapshot>,
}

impl SyntaxSnapshot {
    /// The text the snapshot was taken against.
    pub fn text(&self) -> &StringView {
        &self.text
    }

    /// Highlight captures overlapping `range`, in application order.
    pub fn captures(&self, range: ByteRange) -> Vec<Capture> {
        let mut captures = Vec::new();
        if range.is_empty() {
            return captures;
        }
        let mut stack: Vec<&LayerSnapshot> = self.root.iter().collect();
        while let Some(layer) = stack.pop() {
            if let Some(tree) = &layer.tree {
                query_captures(&layer.language, tree, &self.text, range, &mut captures);
            }
            stack.extend(layer.children.iter());
        }
        sort_captures(&mut captures);
        captures
    }
}

impl std::fmt::Debug for SyntaxSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyntaxSnapshot")
            .field("length", &self.text.len())
            .field(
                "language",
                &self.root.as_ref().map(|root| root.language.name()),
            )
            .finish_non_exhaustive()
    }
}

fn query_captures(
    language: &TreeSitterLanguage,
    tree: &Tree,
    text: &StringView,
    range: ByteRange,
    out: &mut Vec<Capture>,
) {
    let Some(query) = language.highlights_query() else {
        return;
    };
    let root = tree.root_node();
    if root.start_byte() >= root.end_byte() {
        return;
    }
    let names = query.query().capture_names();
    let mut cursor = QueryCursor::new();
    cursor.set_byte_range(range.as_std_range());
    let mut matches = cursor.matches(query.query(), root, Utf16TextProvider::new(text));
    while let Some(m) = matches.next() {
        if !query
            .predicates()
            .evaluate(m.pattern_index, &|index| capture_text(m, index, text))
        {
            continue;
        }
        let properties: HashMap<String, String> = query
            .query()
            .property_settings(m.pattern_index)
            .iter()
            .filter_map(|property| {
                let value = property.value.as_deref()?;
                Some((property.key.to_string(), value.to_string()))
            })
            .collect();
        for capture in m.captures {
            let Some(name) = names.get(capture.index as usize) else {
                continue;
            };
            if name.starts_with('_') {
                continue;
            }
            let capture_range = byte_range(&capture.node);
            if !capture_range.overlaps(&range) {
                continue;
            }
            out.push(Capture {
                name: name.to_string(),
                byte_range: capture_range,
                node_kind: capture.node.kind().to_string(),
                properties: properties.clone(),
            });
        }
    }
}

fn capture_text(m: &QueryMatch<'_, '_>, index: u32, text: &StringView) -> Option<String> {
    m.captures
        .iter()
        .find(|capture| capture.index == index)
        .map(|capture| node_text(text, &capture.node))
}

fn contains_point(node: &Node<'_>, point: Point) -> bool {
    let start = node.start_position();
    let end = node.end_position();
    (start.row, start.column) <= (point.row, point.column)
        && (point.row, point.column) <= (end.row, end.column)
}

fn mark_rows(changes: &mut LineChangeSet, lines: &LineManager, start_row: usize, end_row: usize) {
    for row in start_row..=end_row {
        match lines.line_at_row(row) {
            Ok(line) => changes.mark_edited(line.id),
            Err(_) => break,
        }
    }
}

fn mark_byte_range(changes: &mut LineChangeSet, lines: &LineManager, range: ByteRange) {
    let start = lines.line_containing_byte(range.lower_bound());
    let end = lines.line_containing_byte(range.upper_bound());
    if let (Ok(start), Ok(end)) = (start, end) {
        mark_rows(changes, lines, start.row, end.row);
    }
}
