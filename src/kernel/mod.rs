//! Headless search core (state/action/session).

pub mod action;
pub mod candidates;
pub mod scheduler;
pub mod search;
pub mod services;
pub mod session;

pub use action::SearchAction;
pub use candidates::{is_searchable, select_candidates, CandidateMode};
pub use scheduler::{BatchOutcome, BatchToken};
pub use search::{SearchResult, SearchSnapshot, SearchState, SearchStatus};
pub use session::{SearchEvent, SearchOptions, SearchSession, SessionBuilder};

#[cfg(test)]
#[path = "../../tests/unit/kernel/support.rs"]
pub(crate) mod test_support;
