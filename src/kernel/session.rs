use crate::kernel::action::SearchAction;
use crate::kernel::candidates::{select_candidates, CandidateMode};
use crate::kernel::scheduler::{ActiveBatch, BatchToken, Pass};
use crate::kernel::search::{SearchResult, SearchSnapshot, SearchState, SearchStatus};
use crate::kernel::services::ports::{
    IdleScheduler, MatchFinder, SearchConfig, SearchError, Source, SourceDirectory, SourceId,
};
use std::collections::VecDeque;
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchOptions {
    /// Only honoured when the query equals the recorded one.
    pub reuse_previous: bool,
}

impl SearchOptions {
    pub fn reuse() -> Self {
        Self {
            reuse_previous: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchEvent {
    Status {
        pass_id: Option<u64>,
        status: SearchStatus,
    },
    Result {
        pass_id: u64,
        source_id: SourceId,
        matches: usize,
    },
    Error {
        pass_id: u64,
        source_id: SourceId,
        message: String,
    },
}

pub(crate) struct SessionInner {
    pub(crate) state: SearchState,
    pub(crate) active: Option<ActiveBatch>,
}

pub(crate) struct SessionShared {
    inner: Mutex<SessionInner>,
    pub(crate) directory: Arc<dyn SourceDirectory>,
    pub(crate) finder: Arc<dyn MatchFinder>,
    pub(crate) idle: Arc<dyn IdleScheduler>,
    pub(crate) config: SearchConfig,
    events: Option<Sender<SearchEvent>>,
}

impl SessionShared {
    pub(crate) fn lock(&self) -> MutexGuard<'_, SessionInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub(crate) fn emit(&self, event: SearchEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event);
        }
    }

    pub(crate) fn set_status(&self, inner: &mut SessionInner, pass_id: u64, status: SearchStatus) {
        self.dispatch_status(inner, Some(pass_id), status);
    }

    fn dispatch_status(&self, inner: &mut SessionInner, pass_id: Option<u64>, status: SearchStatus) {
        if inner.state.apply(SearchAction::UpdateStatus(status)) {
            self.emit(SearchEvent::Status { pass_id, status });
        }
    }

    /// Invalidates the live token and drops its parked continuation, if any.
    fn cancel_active(&self, inner: &mut SessionInner) -> bool {
        let Some(active) = inner.active.take() else {
            return false;
        };
        active.token.cancel();
        if let Some(handle) = active.parked {
            self.idle.cancel(handle);
        }
        tracing::debug!(pass_id = active.token.id(), "search pass cancelled");
        true
    }

    fn release(&self, token: &BatchToken) {
        let mut inner = self.lock();
        if inner
            .active
            .as_ref()
            .is_some_and(|active| active.token.id() == token.id())
        {
            inner.active = None;
        }
    }
}

pub struct SessionBuilder {
    directory: Arc<dyn SourceDirectory>,
    finder: Arc<dyn MatchFinder>,
    idle: Arc<dyn IdleScheduler>,
    config: SearchConfig,
    events: Option<Sender<SearchEvent>>,
}

impl SessionBuilder {
    pub fn config(mut self, config: SearchConfig) -> Self {
        self.config = config;
        self
    }

    pub fn events(mut self, tx: Sender<SearchEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    pub fn build(self) -> SearchSession {
        SearchSession {
            shared: Arc::new(SessionShared {
                inner: Mutex::new(SessionInner {
                    state: SearchState::default(),
                    active: None,
                }),
                directory: self.directory,
                finder: self.finder,
                idle: self.idle,
                config: self.config,
                events: self.events,
            }),
        }
    }
}

/// Entry point for project-wide and single-source text search.
///
/// Cloning yields another handle to the same session. At most one pass is
/// live at a time; starting a search, searching one source or cancelling
/// supersedes whatever was running.
#[derive(Clone)]
pub struct SearchSession {
    shared: Arc<SessionShared>,
}

impl SearchSession {
    pub fn builder(
        directory: Arc<dyn SourceDirectory>,
        finder: Arc<dyn MatchFinder>,
        idle: Arc<dyn IdleScheduler>,
    ) -> SessionBuilder {
        SessionBuilder {
            directory,
            finder,
            idle,
            config: SearchConfig::default(),
            events: None,
        }
    }

    /// Runs the first batch of a new pass before returning. Remaining sources
    /// are continued from the idle scheduler; watch `status()` or the event
    /// channel for `Done`.
    pub async fn start_search(&self, query: &str, options: SearchOptions) -> Result<(), SearchError> {
        let shared = &self.shared;
        let (pass, queue) = {
            let mut inner = shared.lock();
            shared.cancel_active(&mut inner);

            let reuse = options.reuse_previous && inner.state.query() == query;
            if !reuse {
                inner.state.apply(SearchAction::ClearResults);
                inner.state.apply(SearchAction::AddQuery(query.to_string()));
            }
            inner.state.apply(SearchAction::OpenProjectSearch);

            let token = BatchToken::new();
            shared.set_status(&mut inner, token.id(), SearchStatus::Fetching);

            let mode = if reuse {
                CandidateMode::Reuse
            } else {
                CandidateMode::Fresh
            };
            let queue = if query.is_empty() {
                VecDeque::new()
            } else {
                select_candidates(shared.directory.as_ref(), &inner.state, mode)
            };

            tracing::debug!(
                pass_id = token.id(),
                query,
                reuse,
                candidates = queue.len(),
                "search pass started"
            );
            inner.active = Some(ActiveBatch::running(token.clone()));
            (
                Pass {
                    token,
                    query: Arc::from(query),
                },
                queue,
            )
        };

        shared
            .run_batch(pass, queue, shared.config.batch_budget())
            .await
            .map(|_| ())
    }

    /// Searches a single source right away, replacing all results.
    ///
    /// A superseded pass ends in `Done`; otherwise status is left alone.
    /// Unknown ids are ignored.
    pub async fn search_one(&self, source_id: &SourceId, query: &str) -> Result<(), SearchError> {
        let shared = &self.shared;
        if let Err(e) = self.lookup(source_id) {
            tracing::trace!(error = %e, "search_one skipped");
            return Ok(());
        }

        let token = {
            let mut inner = shared.lock();
            let token = BatchToken::new();
            // 被取代的分批不会再恢复，不能停在 Partial
            if shared.cancel_active(&mut inner) && inner.state.status().is_active() {
                shared.set_status(&mut inner, token.id(), SearchStatus::Done);
            }
            inner.state.apply(SearchAction::ClearResults);
            inner.state.apply(SearchAction::AddQuery(query.to_string()));
            inner.active = Some(ActiveBatch::running(token.clone()));
            token
        };

        let result = self.search_one_inner(&token, source_id, query).await;
        shared.release(&token);
        result
    }

    pub fn lookup(&self, source_id: &SourceId) -> Result<Source, SearchError> {
        self.shared
            .directory
            .get_source(source_id)
            .ok_or_else(|| SearchError::AbsentSource(source_id.clone()))
    }

    async fn search_one_inner(
        &self,
        token: &BatchToken,
        source_id: &SourceId,
        query: &str,
    ) -> Result<(), SearchError> {
        let loaded = self.shared.directory.load_text(source_id).await?;
        let matches = self
            .shared
            .finder
            .find_matches(loaded.text(), query)
            .map_err(|message| SearchError::Finder {
                source_id: source_id.clone(),
                message,
            })?;
        self.shared.record(token, &loaded, matches);
        Ok(())
    }

    /// Leaves status and results untouched.
    pub fn cancel(&self) -> bool {
        let mut inner = self.shared.lock();
        self.shared.cancel_active(&mut inner)
    }

    pub fn clear_results(&self) -> bool {
        self.shared.lock().state.apply(SearchAction::ClearResults)
    }

    pub fn clear_query(&self) -> bool {
        self.shared.lock().state.apply(SearchAction::ClearQuery)
    }

    /// Hides the project search; a running pass keeps going until cancelled.
    pub fn close_session(&self) -> bool {
        self.shared
            .lock()
            .state
            .apply(SearchAction::CloseProjectSearch)
    }

    /// Back to the initial state, e.g. after the debuggee navigated.
    pub fn reset(&self) {
        let shared = &self.shared;
        let mut inner = shared.lock();
        shared.cancel_active(&mut inner);
        let was_idle = inner.state.status() == SearchStatus::Idle;
        inner.state.apply(SearchAction::ClearSearch);
        inner.state.apply(SearchAction::CloseProjectSearch);
        if !was_idle {
            shared.emit(SearchEvent::Status {
                pass_id: None,
                status: SearchStatus::Idle,
            });
        }
    }

    pub fn status(&self) -> SearchStatus {
        self.shared.lock().state.status()
    }

    pub fn query(&self) -> String {
        self.shared.lock().state.query().to_string()
    }

    pub fn results(&self) -> Vec<SearchResult> {
        self.shared.lock().state.results().to_vec()
    }

    pub fn snapshot(&self) -> SearchSnapshot {
        self.shared.lock().state.snapshot()
    }

    /// Id of the live pass, if one is running or parked.
    pub fn active_pass(&self) -> Option<u64> {
        self.shared
            .lock()
            .active
            .as_ref()
            .map(|active| active.token.id())
    }

    pub fn is_parked(&self) -> bool {
        self.shared
            .lock()
            .active
            .as_ref()
            .is_some_and(|active| active.parked.is_some())
    }

    pub fn config(&self) -> &SearchConfig {
        &self.shared.config
    }

    #[cfg(test)]
    pub(crate) fn shared(&self) -> &Arc<SessionShared> {
        &self.shared
    }
}

#[cfg(test)]
#[path = "../../tests/unit/kernel/session.rs"]
mod tests;
