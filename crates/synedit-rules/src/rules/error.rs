use synedit_core::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
/// Errors produced by the rule grammar loader, compiler and tokenizer.
pub enum RulesError {
    #[error("YAML parse error: {0}")]
    /// YAML parsing failed.
    Yaml(#[from] serde_yaml::Error),

    #[error("regex compile error for pattern '{pattern}': {message}")]
    /// A regex pattern failed to compile.
    RegexCompile {
        /// The regex pattern string.
        pattern: String,
        /// The compiler error message.
        message: String,
    },

    #[error("unknown rule '{0}'")]
    /// An `include` names a rule missing from the repository.
    UnknownRule(String),

    #[error("unsupported feature: {0}")]
    /// A grammar feature the tokenizer does not implement.
    Unsupported(&'static str),

    #[error(transparent)]
    /// Reading the document failed.
    Core(#[from] CoreError),
}
