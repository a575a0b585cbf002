use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

const PRETTY_SUFFIX: &str = ":formatted";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceId(String);

impl SourceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SourceId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for SourceId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadState {
    #[default]
    Unloaded,
    Loading,
    Loaded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    pub id: SourceId,
    pub url: String,
    pub text: Option<Arc<str>>,
    pub content_type: Option<String>,
    pub loaded_state: LoadState,
    pub is_third_party: bool,
    pub error: Option<String>,
}

impl Source {
    pub fn new(id: impl Into<SourceId>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            text: None,
            content_type: None,
            loaded_state: LoadState::Unloaded,
            is_third_party: false,
            error: None,
        }
    }

    /// 已有文本的 source（例如宿主直接推送的 inline script）
    pub fn with_text(mut self, text: impl Into<Arc<str>>) -> Self {
        self.text = Some(text.into());
        self.loaded_state = LoadState::Loaded;
        self
    }

    pub fn third_party(mut self, value: bool) -> Self {
        self.is_third_party = value;
        self
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded_state == LoadState::Loaded
    }

    pub fn text(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }
}

pub fn pretty_source_url(url: &str) -> String {
    format!("{url}{PRETTY_SUFFIX}")
}

/// Substring match; empty patterns never match.
pub fn matches_any_pattern(url: &str, patterns: &[String]) -> bool {
    patterns
        .iter()
        .filter(|p| !p.is_empty())
        .any(|p| url.contains(p.as_str()))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadError {
    pub source_id: SourceId,
    pub message: String,
}

impl LoadError {
    pub fn new(source_id: SourceId, message: impl Into<String>) -> Self {
        Self {
            source_id,
            message: message.into(),
        }
    }
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to load source {}: {}", self.source_id, self.message)
    }
}

impl std::error::Error for LoadError {}

pub type LoadFuture<'a> = Pin<Box<dyn Future<Output = Result<Source, LoadError>> + Send + 'a>>;

/// Read/load view over every source the debugger client knows about.
///
/// `list_sources` returns sources in insertion order. `load_text` is
/// idempotent: a source that is already loaded resolves immediately with its
/// current snapshot.
pub trait SourceDirectory: Send + Sync {
    fn list_sources(&self) -> Vec<Source>;

    fn get_source(&self, id: &SourceId) -> Option<Source>;

    fn load_text<'a>(&'a self, id: &'a SourceId) -> LoadFuture<'a>;

    fn is_third_party(&self, source: &Source) -> bool {
        source.is_third_party
    }

    fn has_pretty_variant(&self, id: &SourceId) -> bool;
}

#[cfg(test)]
#[path = "../../../../tests/unit/kernel/services/ports/sources.rs"]
mod tests;
