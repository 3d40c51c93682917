//! Regex rule grammars.
//!
//! A grammar is a list of rules loaded from YAML. Each rule names its kind with a `type:` key:
//!
//! - `match`: scopes every match of a single-line regex;
//! - `begin_end`: scopes a region from `begin` to `end`, which may span lines;
//! - `include`: refers to a rule in the grammar's `repository` as `#name`;
//! - `patterns`: groups rules.
//!
//! [`Grammar::compile`] compiles the regexes with Oniguruma and resolves includes;
//! [`Tokenizer`] then turns lines into scoped [`Token`]s.

mod compiler;
mod definition;
mod error;
mod tokenizer;

pub use compiler::{
    CompiledBeginEndRule, CompiledGrammar, CompiledMatchRule, CompiledRule, RuleId,
};
pub use definition::{CaptureDefinition, Grammar, Rule};
pub use error::RulesError;
pub use tokenizer::{RuleStack, Token, Tokenizer};
