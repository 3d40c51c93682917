use synedit_core::CoreError;

/// Errors produced while building languages or maintaining language layers.
#[derive(Debug)]
pub enum TreeSitterError {
    /// Setting the Tree-sitter language failed.
    Language(String),
    /// Compiling a Tree-sitter query failed.
    Query(String),
    /// A buffer or line lookup failed.
    Core(CoreError),
    /// The parser gave up before producing a tree (cancelled or timed out).
    ParseAborted,
}

impl std::fmt::Display for TreeSitterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Language(msg) => write!(f, "tree-sitter language error: {msg}"),
            Self::Query(msg) => write!(f, "tree-sitter query error: {msg}"),
            Self::Core(err) => write!(f, "text buffer error: {err}"),
            Self::ParseAborted => write!(f, "tree-sitter parse aborted"),
        }
    }
}

impl std::error::Error for TreeSitterError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Core(err) => Some(err),
            _ => None,
        }
    }
}

impl From<CoreError> for TreeSitterError {
    fn from(err: CoreError) -> Self {
        Self::Core(err)
    }
}
