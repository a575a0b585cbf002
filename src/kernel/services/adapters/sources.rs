//! Source 目录
//!
//! - InMemorySourceDirectory: 按插入顺序保存 source，文本按需加载
//! - FsSourceFetcher: 把 url 当作本地路径读取
//! - collect_workspace_sources: 遍历目录（遵循 .gitignore）生成 source 列表

use crate::kernel::services::ports::{
    matches_any_pattern, pretty_source_url, LoadError, LoadFuture, LoadState, Source,
    SourceDirectory, SourceId,
};
use ignore::WalkBuilder;
use rustc_hash::FxHashMap;
use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceText {
    pub text: String,
    pub content_type: Option<String>,
}

pub type FetchFuture<'a> = Pin<Box<dyn Future<Output = Result<SourceText, String>> + Send + 'a>>;

/// Transport used to pull a source's text from the debuggee.
pub trait SourceFetcher: Send + Sync {
    fn fetch<'a>(&'a self, source: &'a Source) -> FetchFuture<'a>;
}

#[derive(Default)]
struct Registry {
    order: Vec<SourceId>,
    sources: FxHashMap<SourceId, Source>,
    urls: FxHashMap<String, SourceId>,
}

pub struct InMemorySourceDirectory {
    registry: Mutex<Registry>,
    fetcher: Arc<dyn SourceFetcher>,
    third_party_patterns: Vec<String>,
}

impl InMemorySourceDirectory {
    pub fn new(fetcher: Arc<dyn SourceFetcher>) -> Self {
        Self {
            registry: Mutex::new(Registry::default()),
            fetcher,
            third_party_patterns: Vec::new(),
        }
    }

    pub fn with_third_party_patterns(mut self, patterns: Vec<String>) -> Self {
        self.third_party_patterns = patterns;
        self
    }

    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Returns false when a source with the same id is already known.
    pub fn add_source(&self, mut source: Source) -> bool {
        if matches_any_pattern(&source.url, &self.third_party_patterns) {
            source.is_third_party = true;
        }

        let mut registry = self.registry();
        if registry.sources.contains_key(&source.id) {
            return false;
        }
        registry.order.push(source.id.clone());
        registry.urls.insert(source.url.clone(), source.id.clone());
        registry.sources.insert(source.id.clone(), source);
        true
    }

    pub fn add_sources(&self, sources: impl IntoIterator<Item = Source>) -> usize {
        let added = sources
            .into_iter()
            .map(|source| self.add_source(source))
            .filter(|added| *added)
            .count();
        if added > 0 {
            tracing::debug!(added, total = self.len(), "sources added");
        }
        added
    }

    /// Replaces the text of a known source, e.g. when the host pushes it.
    pub fn set_text(&self, id: &SourceId, text: impl Into<Arc<str>>) -> bool {
        let mut registry = self.registry();
        let Some(source) = registry.sources.get_mut(id) else {
            return false;
        };
        source.text = Some(text.into());
        source.loaded_state = LoadState::Loaded;
        source.error = None;
        true
    }

    pub fn len(&self) -> usize {
        self.registry().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn update<F>(&self, id: &SourceId, f: F) -> Option<Source>
    where
        F: FnOnce(&mut Source),
    {
        let mut registry = self.registry();
        let source = registry.sources.get_mut(id)?;
        f(source);
        Some(source.clone())
    }
}

impl SourceDirectory for InMemorySourceDirectory {
    fn list_sources(&self) -> Vec<Source> {
        let registry = self.registry();
        registry
            .order
            .iter()
            .filter_map(|id| registry.sources.get(id).cloned())
            .collect()
    }

    fn get_source(&self, id: &SourceId) -> Option<Source> {
        self.registry().sources.get(id).cloned()
    }

    fn load_text<'a>(&'a self, id: &'a SourceId) -> LoadFuture<'a> {
        Box::pin(async move {
            let source = self
                .get_source(id)
                .ok_or_else(|| LoadError::new(id.clone(), "unknown source"))?;
            if source.is_loaded() {
                return Ok(source);
            }

            self.update(id, |s| s.loaded_state = LoadState::Loading);

            match self.fetcher.fetch(&source).await {
                Ok(SourceText { text, content_type }) => self
                    .update(id, |s| {
                        s.text = Some(Arc::from(text));
                        s.content_type = content_type;
                        s.loaded_state = LoadState::Loaded;
                        s.error = None;
                    })
                    .ok_or_else(|| LoadError::new(id.clone(), "source removed while loading")),
                Err(message) => {
                    self.update(id, |s| {
                        s.loaded_state = LoadState::Unloaded;
                        s.error = Some(message.clone());
                    });
                    Err(LoadError::new(id.clone(), message))
                }
            }
        })
    }

    fn has_pretty_variant(&self, id: &SourceId) -> bool {
        let registry = self.registry();
        let Some(source) = registry.sources.get(id) else {
            return false;
        };
        registry.urls.contains_key(&pretty_source_url(&source.url))
    }
}

fn is_likely_binary(content: &[u8]) -> bool {
    content.iter().take(8192).any(|&b| b == 0)
}

/// Reads `source.url` as a local path. Binary files load as empty text.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsSourceFetcher;

impl SourceFetcher for FsSourceFetcher {
    fn fetch<'a>(&'a self, source: &'a Source) -> FetchFuture<'a> {
        Box::pin(async move {
            let bytes = tokio::fs::read(&source.url)
                .await
                .map_err(|e| e.to_string())?;
            if is_likely_binary(&bytes) {
                return Ok(SourceText {
                    text: String::new(),
                    content_type: Some("application/octet-stream".to_string()),
                });
            }
            Ok(SourceText {
                text: String::from_utf8_lossy(&bytes).into_owned(),
                content_type: Some("text/plain".to_string()),
            })
        })
    }
}

pub fn collect_workspace_sources(root: &Path) -> Vec<Source> {
    let walker = WalkBuilder::new(root)
        .hidden(true)
        .git_ignore(true)
        .git_global(true)
        .git_exclude(true)
        .sort_by_file_path(|a, b| a.cmp(b))
        .build();

    let mut sources = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                tracing::debug!(error = %e, "skip entry");
                continue;
            }
        };
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }
        let id = SourceId::new(format!("source{}", sources.len() + 1));
        sources.push(Source::new(id, entry.path().to_string_lossy().into_owned()));
    }
    sources
}

#[cfg(test)]
#[path = "../../../../tests/unit/kernel/services/adapters/sources.rs"]
mod tests;
