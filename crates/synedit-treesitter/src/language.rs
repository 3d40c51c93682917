//! Language definitions.
//!
//! A [`TreeSitterLanguage`] bundles a grammar with its compiled queries and indentation scopes.
//! Languages referenced by injections are resolved by name through a [`LanguageProvider`].

use crate::error::TreeSitterError;
use crate::predicates::TextPredicatesEvaluator;
use std::collections::HashMap;
use std::sync::Arc;
use tree_sitter::{Language, Query};

/// A compiled query together with the evaluator for its general predicates.
pub struct LanguageQuery {
    query: Query,
    predicates: TextPredicatesEvaluator,
}

impl LanguageQuery {
    /// Compile `source` for `language`.
    pub fn new(language: &Language, source: &str) -> Result<Self, TreeSitterError> {
        let query =
            Query::new(language, source).map_err(|e| TreeSitterError::Query(e.to_string()))?;
        let predicates = TextPredicatesEvaluator::new(&query);
        Ok(Self { query, predicates })
    }

    /// The compiled query.
    pub fn query(&self) -> &Query {
        &self.query
    }

    /// Evaluator for the query's general predicates.
    pub fn predicates(&self) -> &TextPredicatesEvaluator {
        &self.predicates
    }

    /// Value of a `#set! key value` property on a pattern.
    pub fn property(&self, pattern_index: usize, key: &str) -> Option<&str> {
        self.query
            .property_settings(pattern_index)
            .iter()
            .find(|property| &*property.key == key)
            .and_then(|property| property.value.as_deref())
    }
}

impl std::fmt::Debug for LanguageQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LanguageQuery")
            .field("pattern_count", &self.query.pattern_count())
            .field("capture_names", &self.query.capture_names())
            .finish()
    }
}

/// Node kinds that drive line-break indentation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeSitterIndentationScopes {
    /// Nodes whose body is indented one level deeper, e.g. `block`.
    pub indent: Vec<String>,
    /// Nodes whose children keep the indentation of the node's first line.
    pub inherit_indent: Vec<String>,
    /// Nodes that close a scope and decrease the indent level, e.g. `}`.
    pub outdent: Vec<String>,
    /// Whether blocks are delimited by indentation rather than tokens, as in Python.
    pub whitespace_denotes_blocks: bool,
}

impl TreeSitterIndentationScopes {
    /// Create empty scopes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the indent scopes.
    pub fn with_indent<I, S>(mut self, kinds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.indent = kinds.into_iter().map(Into::into).collect();
        self
    }

    /// Set the inherit-indent scopes.
    pub fn with_inherit_indent<I, S>(mut self, kinds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inherit_indent = kinds.into_iter().map(Into::into).collect();
        self
    }

    /// Set the outdent scopes.
    pub fn with_outdent<I, S>(mut self, kinds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.outdent = kinds.into_iter().map(Into::into).collect();
        self
    }

    /// Set whether whitespace denotes blocks.
    pub fn with_whitespace_denotes_blocks(mut self, whitespace_denotes_blocks: bool) -> Self {
        self.whitespace_denotes_blocks = whitespace_denotes_blocks;
        self
    }

    pub(crate) fn indents(&self, kind: &str) -> bool {
        self.indent.iter().any(|k| k == kind)
    }

    pub(crate) fn inherits_indent(&self, kind: &str) -> bool {
        self.inherit_indent.iter().any(|k| k == kind)
    }

    pub(crate) fn outdents(&self, kind: &str) -> bool {
        self.outdent.iter().any(|k| k == kind)
    }
}

/// A grammar with its highlight and injection queries.
#[derive(Debug)]
pub struct TreeSitterLanguage {
    name: String,
    language: Language,
    highlights_query: Option<LanguageQuery>,
    injections_query: Option<LanguageQuery>,
    indentation_scopes: Option<TreeSitterIndentationScopes>,
}

impl TreeSitterLanguage {
    /// Create a language. An empty `highlights_query` means the language produces no captures.
    pub fn new(
        name: impl Into<String>,
        language: Language,
        highlights_query: &str,
    ) -> Result<Self, TreeSitterError> {
        let highlights_query = compile_optional(&language, highlights_query)?;
        Ok(Self {
            name: name.into(),
            language,
            highlights_query,
            injections_query: None,
            indentation_scopes: None,
        })
    }

    /// Set the injections query.
    pub fn with_injections_query(mut self, source: &str) -> Result<Self, TreeSitterError> {
        self.injections_query = compile_optional(&self.language, source)?;
        Ok(self)
    }

    /// Set the indentation scopes.
    pub fn with_indentation_scopes(mut self, scopes: TreeSitterIndentationScopes) -> Self {
        self.indentation_scopes = Some(scopes);
        self
    }

    /// Name used by injections to refer to this language.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The grammar.
    pub fn language(&self) -> &Language {
        &self.language
    }

    /// The highlights query, if any.
    pub fn highlights_query(&self) -> Option<&LanguageQuery> {
        self.highlights_query.as_ref()
    }

    /// The injections query, if any.
    pub fn injections_query(&self) -> Option<&LanguageQuery> {
        self.injections_query.as_ref()
    }

    /// The indentation scopes, if any.
    pub fn indentation_scopes(&self) -> Option<&TreeSitterIndentationScopes> {
        self.indentation_scopes.as_ref()
    }
}

fn compile_optional(
    language: &Language,
    source: &str,
) -> Result<Option<LanguageQuery>, TreeSitterError> {
    if source.trim().is_empty() {
        return Ok(None);
    }
    LanguageQuery::new(language, source).map(Some)
}

/// Resolves language names requested by injections.
pub trait LanguageProvider: Send + Sync {
    /// The language registered under `name`.
    fn language(&self, name: &str) -> Option<Arc<TreeSitterLanguage>>;
}

/// A [`LanguageProvider`] backed by a map.
#[derive(Debug, Clone, Default)]
pub struct LanguageRegistry {
    languages: HashMap<String, Arc<TreeSitterLanguage>>,
}

impl LanguageRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `language` under its name, replacing any previous entry.
    pub fn register(&mut self, language: TreeSitterLanguage) -> Arc<TreeSitterLanguage> {
        let language = Arc::new(language);
        self.languages
            .insert(language.name().to_string(), Arc::clone(&language));
        language
    }

    /// Register `language` and return the registry.
    pub fn with_language(mut self, language: TreeSitterLanguage) -> Self {
        self.register(language);
        self
    }

    /// Register `language` under an additional name, e.g. `"js"` for `"javascript"`.
    pub fn register_alias(&mut self, alias: impl Into<String>, language: Arc<TreeSitterLanguage>) {
        self.languages.insert(alias.into(), language);
    }

    /// Number of registered names.
    pub fn len(&self) -> usize {
        self.languages.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.languages.is_empty()
    }
}

impl LanguageProvider for LanguageRegistry {
    fn language(&self, name: &str) -> Option<Arc<TreeSitterLanguage>> {
        self.languages.get(name).cloned()
    }
}
