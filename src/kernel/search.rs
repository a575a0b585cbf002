use crate::kernel::action::SearchAction;
use crate::kernel::services::ports::{Match, SourceId};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchStatus {
    #[default]
    Idle,
    Fetching,
    Partial,
    Done,
}

impl SearchStatus {
    pub fn is_active(self) -> bool {
        matches!(self, SearchStatus::Fetching | SearchStatus::Partial)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResult {
    pub source_id: SourceId,
    pub filepath: String,
    pub matches: Vec<Match>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchSnapshot {
    pub query: String,
    pub status: SearchStatus,
    pub open: bool,
    pub total_matches: usize,
    pub results: Vec<SearchResult>,
    pub last_error: Option<String>,
}

/// Project-wide text search state. All mutation goes through [`SearchState::apply`].
#[derive(Debug, Clone, Default)]
pub struct SearchState {
    query: String,
    status: SearchStatus,
    open: bool,
    results: Vec<SearchResult>,
    index: FxHashMap<SourceId, usize>,
    scanned: FxHashSet<SourceId>,
    total_matches: usize,
    last_error: Option<String>,
}

impl SearchState {
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn status(&self) -> SearchStatus {
        self.status
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Insertion order; a replaced entry keeps its original slot.
    pub fn results(&self) -> &[SearchResult] {
        &self.results
    }

    pub fn has_result(&self, id: &SourceId) -> bool {
        self.index.contains_key(id)
    }

    pub fn was_scanned(&self, id: &SourceId) -> bool {
        self.scanned.contains(id) || self.has_result(id)
    }

    pub fn total_matches(&self) -> usize {
        self.total_matches
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn snapshot(&self) -> SearchSnapshot {
        SearchSnapshot {
            query: self.query.clone(),
            status: self.status,
            open: self.open,
            total_matches: self.total_matches,
            results: self.results.clone(),
            last_error: self.last_error.clone(),
        }
    }

    pub fn apply(&mut self, action: SearchAction) -> bool {
        match action {
            SearchAction::AddQuery(query) => {
                if self.query == query {
                    return false;
                }
                self.query = query;
                true
            }
            SearchAction::ClearQuery => {
                if self.query.is_empty() {
                    return false;
                }
                self.query.clear();
                true
            }
            SearchAction::ClearResults => self.clear_results(),
            SearchAction::ClearSearch => {
                let changed = !self.query.is_empty() || self.status != SearchStatus::Idle;
                let cleared = self.clear_results();
                self.query.clear();
                self.status = SearchStatus::Idle;
                changed || cleared
            }
            SearchAction::UpdateStatus(status) => {
                if self.status == status {
                    return false;
                }
                if status == SearchStatus::Fetching {
                    self.last_error = None;
                }
                self.status = status;
                true
            }
            SearchAction::AddResult(result) => {
                if result.matches.is_empty() {
                    return false;
                }
                self.scanned.insert(result.source_id.clone());
                self.total_matches += result.matches.len();
                match self.index.get(&result.source_id) {
                    Some(&i) => {
                        let prev = std::mem::replace(&mut self.results[i], result);
                        self.total_matches -= prev.matches.len();
                    }
                    None => {
                        self.index
                            .insert(result.source_id.clone(), self.results.len());
                        self.results.push(result);
                    }
                }
                true
            }
            SearchAction::MarkScanned(id) => self.scanned.insert(id),
            SearchAction::RecordError(message) => {
                if self.last_error.as_deref() == Some(message.as_str()) {
                    return false;
                }
                self.last_error = Some(message);
                true
            }
            SearchAction::OpenProjectSearch => !std::mem::replace(&mut self.open, true),
            SearchAction::CloseProjectSearch => std::mem::replace(&mut self.open, false),
        }
    }

    fn clear_results(&mut self) -> bool {
        let changed = !self.results.is_empty() || !self.scanned.is_empty();
        self.results.clear();
        self.index.clear();
        self.scanned.clear();
        self.total_matches = 0;
        changed
    }
}

#[cfg(test)]
#[path = "../../tests/unit/kernel/search.rs"]
mod tests;
