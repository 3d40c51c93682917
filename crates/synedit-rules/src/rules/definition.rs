use crate::rules::error::RulesError;
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Deserialize)]
/// Raw YAML grammar.
pub struct Grammar {
    /// Human-readable name.
    pub name: String,

    /// Root scope (e.g. `source.ini`).
    pub scope_name: String,

    #[serde(default)]
    /// Top-level rules, tried in order.
    pub patterns: Vec<Rule>,

    #[serde(default)]
    /// Named rules referenced by `include: "#name"`.
    pub repository: HashMap<String, Rule>,
}

impl Grammar {
    /// Parse a grammar from YAML.
    pub fn from_yaml(source: &str) -> Result<Self, RulesError> {
        Ok(serde_yaml::from_str(source)?)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
/// One rule of a grammar, selected by its `type:` key.
pub enum Rule {
    /// Scopes every match of a single-line regex.
    Match {
        /// Scope of the whole match.
        name: String,
        #[serde(rename = "match")]
        /// The regex source string.
        regex: String,
        #[serde(default)]
        /// Scopes of capture groups, keyed by group index.
        captures: HashMap<usize, CaptureDefinition>,
    },

    /// A region opened by `begin` and closed by `end`, possibly on a later line.
    BeginEnd {
        #[serde(default)]
        /// Scope of the whole region, delimiters included.
        name: Option<String>,
        /// Regex opening the region.
        begin: String,
        /// Regex closing the region.
        end: String,
        #[serde(default)]
        /// Rules active inside the region.
        patterns: Vec<Rule>,
        #[serde(default)]
        /// Capture scopes shared by `begin` and `end`.
        captures: HashMap<usize, CaptureDefinition>,
        #[serde(default)]
        /// Capture scopes of `begin`, overriding `captures`.
        begin_captures: HashMap<usize, CaptureDefinition>,
        #[serde(default)]
        /// Capture scopes of `end`, overriding `captures`.
        end_captures: HashMap<usize, CaptureDefinition>,
    },

    /// A reference to a repository rule: `#name`.
    Include {
        /// The reference string.
        include: String,
    },

    /// A group of rules, tried in order.
    Patterns {
        /// The grouped rules.
        patterns: Vec<Rule>,
    },
}

#[derive(Debug, Clone, Deserialize)]
/// Scope of a capture group.
pub struct CaptureDefinition {
    /// Scope applied to the group's text.
    pub name: String,
}
