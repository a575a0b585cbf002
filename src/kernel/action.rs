use crate::kernel::search::{SearchResult, SearchStatus};
use crate::kernel::services::ports::SourceId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchAction {
    AddQuery(String),
    ClearQuery,
    ClearResults,
    /// Query, results and status back to initial.
    ClearSearch,
    UpdateStatus(SearchStatus),
    /// Upsert keyed by `source_id`.
    AddResult(SearchResult),
    MarkScanned(SourceId),
    RecordError(String),
    OpenProjectSearch,
    CloseProjectSearch,
}
