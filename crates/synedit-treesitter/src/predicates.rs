//! Text predicates the tree-sitter binding leaves to the host.
//!
//! The binding evaluates `#eq?`, `#not-eq?`, `#match?`, `#not-match?` and `#any-of?` itself,
//! reading node text through the query's text provider. Any other `#name?` predicate is handed
//! back as a general predicate and evaluated here. A predicate we cannot evaluate filters out
//! the whole match and is logged once per name.

use parking_lot::Mutex;
use regex::Regex;
use std::collections::HashSet;
use tree_sitter::{Query, QueryPredicate, QueryPredicateArg};

/// A parsed general predicate.
#[derive(Debug, Clone)]
pub enum TextPredicate {
    /// `#eq? @capture "string"` and its negation.
    CaptureEqualsString {
        /// Capture index.
        capture: u32,
        /// Expected text.
        value: String,
        /// `false` for the `not-` form.
        is_positive: bool,
    },
    /// `#eq? @lhs @rhs` and its negation.
    CaptureEqualsCapture {
        /// Left capture index.
        lhs: u32,
        /// Right capture index.
        rhs: u32,
        /// `false` for the `not-` form.
        is_positive: bool,
    },
    /// `#match? @capture "regex"`, also `vim-match?` and `lua-match?`, and their negations.
    CaptureMatchesPattern {
        /// Capture index.
        capture: u32,
        /// Compiled pattern.
        pattern: Regex,
        /// `false` for the `not-` form.
        is_positive: bool,
    },
    /// `#contains? @capture "a" "b" ...`: the text contains any of the values.
    CaptureContains {
        /// Capture index.
        capture: u32,
        /// Candidate substrings.
        values: Vec<String>,
        /// `false` for the `not-` form.
        is_positive: bool,
    },
    /// Anything else. Always fails.
    Unsupported {
        /// Operator name, e.g. `"set-lang-from-info-string!"`.
        name: String,
    },
}

impl TextPredicate {
    /// Parse a general predicate reported by the binding.
    pub fn from_query_predicate(predicate: &QueryPredicate) -> Self {
        let operator: &str = &predicate.operator;
        let (base, is_positive) = match operator.strip_prefix("not-") {
            Some(base) => (base, false),
            None => (operator, true),
        };
        let unsupported = || Self::Unsupported {
            name: operator.to_string(),
        };
        match (base, &*predicate.args) {
            ("eq?", [QueryPredicateArg::Capture(capture), QueryPredicateArg::String(value)]) => {
                Self::CaptureEqualsString {
                    capture: *capture,
                    value: value.to_string(),
                    is_positive,
                }
            }
            ("eq?", [QueryPredicateArg::Capture(lhs), QueryPredicateArg::Capture(rhs)]) => {
                Self::CaptureEqualsCapture {
                    lhs: *lhs,
                    rhs: *rhs,
                    is_positive,
                }
            }
            (
                "match?" | "vim-match?" | "lua-match?",
                [QueryPredicateArg::Capture(capture), QueryPredicateArg::String(pattern)],
            ) => match Regex::new(pattern) {
                Ok(pattern) => Self::CaptureMatchesPattern {
                    capture: *capture,
                    pattern,
                    is_positive,
                },
                Err(_) => unsupported(),
            },
            ("contains?", [QueryPredicateArg::Capture(capture), rest @ ..]) if !rest.is_empty() => {
                let values = rest
                    .iter()
                    .map(|arg| match arg {
                        QueryPredicateArg::String(value) => Some(value.to_string()),
                        QueryPredicateArg::Capture(_) => None,
                    })
                    .collect::<Option<Vec<_>>>();
                match values {
                    Some(values) => Self::CaptureContains {
                        capture: *capture,
                        values,
                        is_positive,
                    },
                    None => unsupported(),
                }
            }
            _ => unsupported(),
        }
    }

    /// Evaluate against a match. `text_of` returns the text of a capture index, or `None` when
    /// the match has no node for it, which fails the predicate.
    ///
    /// Returns `None` for [`TextPredicate::Unsupported`].
    pub fn evaluate(&self, text_of: &dyn Fn(u32) -> Option<String>) -> Option<bool> {
        let result = match self {
            Self::CaptureEqualsString {
                capture,
                value,
                is_positive,
            } => text_of(*capture).map(|text| (text == *value) == *is_positive),
            Self::CaptureEqualsCapture {
                lhs,
                rhs,
                is_positive,
            } => match (text_of(*lhs), text_of(*rhs)) {
                (Some(lhs), Some(rhs)) => Some((lhs == rhs) == *is_positive),
                _ => None,
            },
            Self::CaptureMatchesPattern {
                capture,
                pattern,
                is_positive,
            } => text_of(*capture).map(|text| pattern.is_match(&text) == *is_positive),
            Self::CaptureContains {
                capture,
                values,
                is_positive,
            } => text_of(*capture).map(|text| {
                values.iter().any(|value| text.contains(value.as_str())) == *is_positive
            }),
            Self::Unsupported { .. } => return None,
        };
        Some(result.unwrap_or(false))
    }
}

/// Evaluates the general predicates of one query.
#[derive(Debug)]
pub struct TextPredicatesEvaluator {
    patterns: Vec<Vec<TextPredicate>>,
    reported: Mutex<HashSet<String>>,
}

impl TextPredicatesEvaluator {
    /// Parse the general predicates of every pattern in `query`.
    pub fn new(query: &Query) -> Self {
        let patterns = (0..query.pattern_count())
            .map(|index| {
                query
                    .general_predicates(index)
                    .iter()
                    .map(TextPredicate::from_query_predicate)
                    .collect()
            })
            .collect();
        Self {
            patterns,
            reported: Mutex::new(HashSet::new()),
        }
    }

    /// Predicates of a pattern.
    pub fn predicates(&self, pattern_index: usize) -> &[TextPredicate] {
        self.patterns
            .get(pattern_index)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Whether every predicate of `pattern_index` holds.
    pub fn evaluate(&self, pattern_index: usize, text_of: &dyn Fn(u32) -> Option<String>) -> bool {
        self.predicates(pattern_index)
            .iter()
            .all(|predicate| match predicate.evaluate(text_of) {
                Some(result) => result,
                None => {
                    if let TextPredicate::Unsupported { name } = predicate {
                        self.report_unsupported(name);
                    }
                    false
                }
            })
    }

    /// Names of unsupported predicates seen so far.
    pub fn reported_unsupported(&self) -> Vec<String> {
        let mut names: Vec<String> = self.reported.lock().iter().cloned().collect();
        names.sort();
        names
    }

    fn report_unsupported(&self, name: &str) {
        let mut reported = self.reported.lock();
        if reported.insert(name.to_string()) {
            tracing::warn!(
                target: "synedit::predicates",
                predicate = %name,
                "unsupported query predicate; matching captures are ignored"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts<'a>(values: &'a [(u32, &'a str)]) -> impl Fn(u32) -> Option<String> + 'a {
        move |index| {
            values
                .iter()
                .find(|(i, _)| *i == index)
                .map(|(_, text)| text.to_string())
        }
    }

    #[test]
    fn test_capture_equals_capture_compares_both_sides() {
        let predicate = TextPredicate::CaptureEqualsCapture {
            lhs: 0,
            rhs: 1,
            is_positive: true,
        };
        let differing = texts(&[(0, "a"), (1, "b")]);
        let same = texts(&[(0, "a"), (1, "a")]);
        assert_eq!(predicate.evaluate(&differing), Some(false));
        assert_eq!(predicate.evaluate(&same), Some(true));
    }

    #[test]
    fn test_negated_predicates() {
        let predicate = TextPredicate::CaptureEqualsString {
            capture: 0,
            value: "foo".to_string(),
            is_positive: false,
        };
        assert_eq!(predicate.evaluate(&texts(&[(0, "bar")])), Some(true));
        assert_eq!(predicate.evaluate(&texts(&[(0, "foo")])), Some(false));

        let predicate = TextPredicate::CaptureContains {
            capture: 0,
            values: vec!["TODO".to_string(), "FIXME".to_string()],
            is_positive: true,
        };
        assert_eq!(predicate.evaluate(&texts(&[(0, "// FIXME later")])), Some(true));
    }

    #[test]
    fn test_missing_capture_fails() {
        let predicate = TextPredicate::CaptureMatchesPattern {
            capture: 3,
            pattern: Regex::new("^[A-Z]").unwrap(),
            is_positive: false,
        };
        assert_eq!(predicate.evaluate(&texts(&[(0, "x")])), Some(false));
    }

    #[test]
    fn test_unsupported_has_no_result() {
        let predicate = TextPredicate::Unsupported {
            name: "set-lang!".to_string(),
        };
        assert_eq!(predicate.evaluate(&texts(&[])), None);
    }
}
