//! Maps injection-query captures to injected languages.
//!
//! Captures are grouped per query match and visited in document order within the match, with
//! a pending-language register that is cleared at every match boundary:
//!
//! - `language` / `injection.language` sets the register from the node's text;
//! - `content` / `injection.content` consumes the register (or the pattern's
//!   `injection.language` property) as the language of that node;
//! - any other capture uses the pattern property, then the register, then its own name.
//!
//! This handles grammars that declare the language on the content node itself, on a sibling
//! node, or only through a fixed `#set! injection.language` property.

use crate::input::byte_range;
use synedit_core::ByteRange;
use tree_sitter::{Node, Range};

pub(crate) const LANGUAGE_PROPERTY: &str = "injection.language";

/// Identity of the node that hosts an injection.
///
/// Valid only for the tree that produced it; trees from separate parses may reuse ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InjectionSiteId(usize);

impl InjectionSiteId {
    /// The site id of `node`.
    pub fn of(node: &Node<'_>) -> Self {
        Self(node.id())
    }
}

/// A region of the parent tree written in another language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InjectedLanguage {
    /// The node holding the injected text.
    pub site: InjectionSiteId,
    /// Language name to resolve through the provider.
    pub language_name: String,
    /// The region handed to the child parser as its included range.
    pub range: Range,
}

impl InjectedLanguage {
    /// The region as a byte range.
    pub fn byte_range(&self) -> ByteRange {
        ByteRange::from(self.range.start_byte..self.range.end_byte)
    }
}

/// One capture of the injections query.
pub(crate) struct InjectionCapture<'tree> {
    pub(crate) name: &'tree str,
    pub(crate) node: Node<'tree>,
    /// `injection.language` set on the matching pattern.
    pub(crate) language_property: Option<&'tree str>,
    /// Index of the query match that produced the capture.
    pub(crate) match_index: usize,
}

/// Run the pending-register pass over captures ordered by match, then by start.
pub(crate) fn map_injections<'tree, I, F>(captures: I, text_of: F) -> Vec<InjectedLanguage>
where
    I: IntoIterator<Item = InjectionCapture<'tree>>,
    F: Fn(&Node<'tree>) -> String,
{
    let mut pending: Option<String> = None;
    let mut current_match = None;
    let mut injected = Vec::new();
    for capture in captures {
        if current_match != Some(capture.match_index) {
            current_match = Some(capture.match_index);
            pending = None;
        }
        let language_name = match capture.name {
            "language" | "injection.language" => {
                let name = text_of(&capture.node).trim().to_string();
                pending = (!name.is_empty()).then_some(name);
                continue;
            }
            "content" | "injection.content" => pending
                .take()
                .or_else(|| capture.language_property.map(str::to_string)),
            other => capture
                .language_property
                .map(str::to_string)
                .or_else(|| pending.take())
                .or_else(|| Some(other.to_string())),
        };
        pending = None;
        let Some(language_name) = language_name else {
            continue;
        };
        if byte_range(&capture.node).is_empty() {
            continue;
        }
        injected.push(InjectedLanguage {
            site: InjectionSiteId::of(&capture.node),
            language_name,
            range: capture.node.range(),
        });
    }
    injected
}

#[cfg(test)]
mod tests {
    use super::*;
    use tree_sitter::{Parser, Tree};

    // `fn sql() { query }`: the function name stands in for a language tag, the block for
    // the injected content.
    fn tree() -> (String, Tree) {
        let source = "fn sql() { query }".to_string();
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_rust::LANGUAGE.into())
            .unwrap();
        let tree = parser.parse(&source, None).unwrap();
        (source, tree)
    }

    fn capture<'tree>(
        name: &'tree str,
        node: Node<'tree>,
        language_property: Option<&'tree str>,
    ) -> InjectionCapture<'tree> {
        InjectionCapture {
            name,
            node,
            language_property,
            match_index: 0,
        }
    }

    #[test]
    fn test_language_capture_names_the_following_content() {
        let (source, tree) = tree();
        let function = tree.root_node().child(0).unwrap();
        let name = function.child_by_field_name("name").unwrap();
        let body = function.child_by_field_name("body").unwrap();

        let injected = map_injections(
            [
                capture("injection.language", name, None),
                capture("injection.content", body, None),
            ],
            |node| source[node.byte_range()].to_string(),
        );

        assert_eq!(injected.len(), 1);
        assert_eq!(injected[0].language_name, "sql");
        assert_eq!(injected[0].range, body.range());
        assert_eq!(injected[0].site, InjectionSiteId::of(&body));
    }

    #[test]
    fn test_content_falls_back_to_language_property() {
        let (source, tree) = tree();
        let body = tree.root_node().child(0).unwrap().child_by_field_name("body").unwrap();

        let injected = map_injections(
            [capture("content", body, Some("javascript"))],
            |node| source[node.byte_range()].to_string(),
        );

        assert_eq!(injected[0].language_name, "javascript");
    }

    #[test]
    fn test_content_without_language_is_skipped() {
        let (source, tree) = tree();
        let body = tree.root_node().child(0).unwrap().child_by_field_name("body").unwrap();

        let injected = map_injections([capture("content", body, None)], |node| {
            source[node.byte_range()].to_string()
        });

        assert!(injected.is_empty());
    }

    #[test]
    fn test_other_capture_names_are_languages() {
        let (source, tree) = tree();
        let body = tree.root_node().child(0).unwrap().child_by_field_name("body").unwrap();

        let injected = map_injections([capture("css", body, None)], |node| {
            source[node.byte_range()].to_string()
        });

        assert_eq!(injected[0].language_name, "css");
    }

    #[test]
    fn test_language_does_not_carry_into_the_next_match() {
        let (source, tree) = tree();
        let function = tree.root_node().child(0).unwrap();
        let name = function.child_by_field_name("name").unwrap();
        let body = function.child_by_field_name("body").unwrap();

        let injected = map_injections(
            [
                capture("injection.language", name, None),
                InjectionCapture {
                    match_index: 1,
                    ..capture("injection.content", body, None)
                },
            ],
            |node| source[node.byte_range()].to_string(),
        );

        assert!(injected.is_empty());
    }
}
