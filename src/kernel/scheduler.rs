//! Batch scheduler for project search.
//!
//! A pass walks its candidate queue one source at a time: load, match, record.
//! Once the pass has recorded `budget` matches it parks the rest of the queue
//! on the idle scheduler and returns. The budget is soft: the source that
//! crosses it is recorded in full.
//!
//! Every state mutation re-checks the pass token under the session lock, so a
//! superseded pass never writes after `cancel`/`start_search` returned.

use crate::kernel::action::SearchAction;
use crate::kernel::search::{SearchResult, SearchStatus};
use crate::kernel::services::ports::{IdleHandle, LoadError, Match, SearchError, Source};
use crate::kernel::session::{SearchEvent, SessionInner, SessionShared};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

static BATCH_TOKEN_ID: AtomicU64 = AtomicU64::new(1);

fn next_batch_token_id() -> u64 {
    BATCH_TOKEN_ID.fetch_add(1, Ordering::Relaxed)
}

#[derive(Debug, Clone)]
pub struct BatchToken {
    id: u64,
    cancelled: Arc<AtomicBool>,
}

impl BatchToken {
    pub fn new() -> Self {
        Self {
            id: next_batch_token_id(),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

impl Default for BatchToken {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub(crate) struct ActiveBatch {
    pub(crate) token: BatchToken,
    pub(crate) parked: Option<IdleHandle>,
}

impl ActiveBatch {
    pub(crate) fn running(token: BatchToken) -> Self {
        Self {
            token,
            parked: None,
        }
    }
}

pub(crate) struct Pass {
    pub(crate) token: BatchToken,
    pub(crate) query: Arc<str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchOutcome {
    Completed,
    Parked,
    Superseded,
}

impl SessionInner {
    pub(crate) fn is_live(&self, token: &BatchToken) -> bool {
        !token.is_cancelled()
            && self
                .active
                .as_ref()
                .is_some_and(|active| active.token.id() == token.id())
    }
}

impl SessionShared {
    pub(crate) async fn run_batch(
        self: &Arc<Self>,
        pass: Pass,
        mut queue: VecDeque<Source>,
        budget: usize,
    ) -> Result<BatchOutcome, SearchError> {
        let mut remaining = budget;

        while remaining > 0 {
            if pass.token.is_cancelled() {
                return Ok(BatchOutcome::Superseded);
            }
            let Some(source) = queue.pop_front() else {
                break;
            };

            let loaded = match self.directory.load_text(&source.id).await {
                Ok(loaded) => loaded,
                Err(e) => {
                    return if self.fail(&pass.token, &e) {
                        Err(e.into())
                    } else {
                        Ok(BatchOutcome::Superseded)
                    };
                }
            };

            let matches = match self.finder.find_matches(loaded.text(), &pass.query) {
                Ok(matches) => matches,
                Err(message) => {
                    self.skip_source(&pass.token, &loaded, message);
                    Vec::new()
                }
            };

            match self.record(&pass.token, &loaded, matches) {
                Some(count) => remaining = remaining.saturating_sub(count),
                None => return Ok(BatchOutcome::Superseded),
            }
        }

        if queue.is_empty() {
            if self.finish(&pass.token) {
                Ok(BatchOutcome::Completed)
            } else {
                Ok(BatchOutcome::Superseded)
            }
        } else {
            Ok(self.park(pass, queue))
        }
    }

    fn park(self: &Arc<Self>, pass: Pass, queue: VecDeque<Source>) -> BatchOutcome {
        let mut inner = self.lock();
        if !inner.is_live(&pass.token) {
            return BatchOutcome::Superseded;
        }

        let pass_id = pass.token.id();
        let remaining = queue.len();
        self.set_status(&mut inner, pass_id, SearchStatus::Partial);

        let shared = Arc::clone(self);
        let handle = self
            .idle
            .schedule(Box::pin(async move { shared.resume(pass, queue).await }));
        if let Some(active) = inner.active.as_mut() {
            active.parked = Some(handle);
        }

        tracing::debug!(pass_id, remaining, "search pass parked");
        BatchOutcome::Parked
    }

    async fn resume(self: Arc<Self>, pass: Pass, queue: VecDeque<Source>) {
        let pass_id = pass.token.id();
        {
            let mut inner = self.lock();
            if !inner.is_live(&pass.token) {
                tracing::trace!(pass_id, "stale search continuation dropped");
                return;
            }
            if let Some(active) = inner.active.as_mut() {
                active.parked = None;
            }
        }

        tracing::debug!(pass_id, remaining = queue.len(), "search pass resumed");
        let budget = self.config.batch_budget();
        if let Err(e) = self.run_batch(pass, queue, budget).await {
            tracing::warn!(pass_id, error = %e, "search pass aborted");
        }
    }

    /// Returns the match count, or `None` when the pass was superseded.
    pub(crate) fn record(
        &self,
        token: &BatchToken,
        source: &Source,
        matches: Vec<Match>,
    ) -> Option<usize> {
        let mut inner = self.lock();
        if !inner.is_live(token) {
            return None;
        }

        inner
            .state
            .apply(SearchAction::MarkScanned(source.id.clone()));
        let count = matches.len();
        if count > 0 {
            inner.state.apply(SearchAction::AddResult(SearchResult {
                source_id: source.id.clone(),
                filepath: source.url.clone(),
                matches,
            }));
            self.emit(SearchEvent::Result {
                pass_id: token.id(),
                source_id: source.id.clone(),
                matches: count,
            });
        }
        Some(count)
    }

    fn skip_source(&self, token: &BatchToken, source: &Source, message: String) {
        tracing::warn!(
            pass_id = token.id(),
            source_id = %source.id,
            error = %message,
            "match finder failed, skipping source"
        );
        let inner = self.lock();
        if inner.is_live(token) {
            self.emit(SearchEvent::Error {
                pass_id: token.id(),
                source_id: source.id.clone(),
                message,
            });
        }
    }

    fn fail(&self, token: &BatchToken, err: &LoadError) -> bool {
        let mut inner = self.lock();
        if !inner.is_live(token) {
            return false;
        }

        tracing::warn!(
            pass_id = token.id(),
            source_id = %err.source_id,
            error = %err.message,
            "source load failed, search pass aborted"
        );
        inner.active = None;
        inner.state.apply(SearchAction::RecordError(err.to_string()));
        self.set_status(&mut inner, token.id(), SearchStatus::Done);
        self.emit(SearchEvent::Error {
            pass_id: token.id(),
            source_id: err.source_id.clone(),
            message: err.message.clone(),
        });
        true
    }

    fn finish(&self, token: &BatchToken) -> bool {
        let mut inner = self.lock();
        if !inner.is_live(token) {
            return false;
        }

        inner.active = None;
        self.set_status(&mut inner, token.id(), SearchStatus::Done);
        tracing::debug!(
            pass_id = token.id(),
            results = inner.state.results().len(),
            total_matches = inner.state.total_matches(),
            "search pass done"
        );
        true
    }
}

#[cfg(test)]
#[path = "../../tests/unit/kernel/scheduler.rs"]
mod tests;
