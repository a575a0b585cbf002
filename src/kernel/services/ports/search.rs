use super::sources::{LoadError, SourceId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    Load(LoadError),
    Finder { source_id: SourceId, message: String },
    AbsentSource(SourceId),
}

impl std::fmt::Display for SearchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SearchError::Load(e) => write!(f, "{}", e),
            SearchError::Finder { source_id, message } => {
                write!(f, "match finder failed on {}: {}", source_id, message)
            }
            SearchError::AbsentSource(id) => write!(f, "Source not found: {}", id),
        }
    }
}

impl std::error::Error for SearchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SearchError::Load(e) => Some(e),
            _ => None,
        }
    }
}

impl From<LoadError> for SearchError {
    fn from(e: LoadError) -> Self {
        SearchError::Load(e)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    /// 1-based
    pub line: usize,
    /// 0-based, in chars
    pub column: usize,
    pub match_text: String,
    /// Full text of the matching line, for previews.
    pub value: String,
}

impl Match {
    pub fn new(
        line: usize,
        column: usize,
        match_text: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            line,
            column,
            match_text: match_text.into(),
            value: value.into(),
        }
    }
}

/// Opaque per-source match primitive.
///
/// Errors are scoped to the one source being searched; the batch scheduler
/// skips that source and keeps going.
pub trait MatchFinder: Send + Sync {
    fn find_matches(&self, text: &str, query: &str) -> Result<Vec<Match>, String>;
}

#[cfg(test)]
#[path = "../../../../tests/unit/kernel/services/ports/search.rs"]
mod tests;
