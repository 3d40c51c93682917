//! Highlight captures and their ordering.

use std::cmp::Ordering;
use std::collections::HashMap;
use synedit_core::ByteRange;

/// A named node matched by a highlight query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capture {
    /// Capture name, e.g. `"variable.builtin"`.
    pub name: String,
    /// Bytes covered by the node.
    pub byte_range: ByteRange,
    /// Grammar kind of the captured node.
    pub node_kind: String,
    /// `#set!` properties of the matching pattern.
    pub properties: HashMap<String, String>,
}

impl Capture {
    /// A capture without node kind or properties.
    pub fn new(name: impl Into<String>, byte_range: ByteRange) -> Self {
        Self {
            name: name.into(),
            byte_range,
            node_kind: String::new(),
            properties: HashMap::new(),
        }
    }

    /// Number of dot-separated components in the name.
    pub fn name_component_count(&self) -> usize {
        self.name.split('.').count()
    }
}

/// Order in which captures are applied: by start, then longer first, then less specific first.
pub fn compare_captures(a: &Capture, b: &Capture) -> Ordering {
    a.byte_range
        .location
        .cmp(&b.byte_range.location)
        .then_with(|| b.byte_range.length.cmp(&a.byte_range.length))
        .then_with(|| a.name_component_count().cmp(&b.name_component_count()))
}

/// Sort captures so that applying them in order lets narrower, more specific captures win.
pub fn sort_captures(captures: &mut [Capture]) {
    captures.sort_by(compare_captures);
}

#[cfg(test)]
mod tests {
    use super::*;
    use synedit_core::ByteCount;

    fn capture(start: usize, length: usize, name: &str) -> Capture {
        Capture::new(name, ByteRange::new(ByteCount(start), ByteCount(length)))
    }

    #[test]
    fn test_sort_order() {
        let mut captures = vec![capture(2, 3, "c"), capture(0, 10, "a.b"), capture(0, 10, "a")];
        sort_captures(&mut captures);
        let names: Vec<&str> = captures.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["a", "a.b", "c"]);
    }

    #[test]
    fn test_longer_capture_first_at_equal_start() {
        let mut captures = vec![capture(4, 2, "inner"), capture(4, 8, "outer")];
        sort_captures(&mut captures);
        assert_eq!(captures[0].name, "outer");
    }
}
