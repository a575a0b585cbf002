use crate::kernel::search::SearchState;
use crate::kernel::services::ports::{Source, SourceDirectory};
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateMode {
    /// First-party sources without a pretty-printed twin.
    Fresh,
    /// Same as `Fresh`, minus everything the previous passes for this query
    /// already scanned.
    ///
    /// Third-party and pretty-twinned sources stay excluded here too, rather
    /// than admitting every source without a result.
    Reuse,
}

pub fn is_searchable(directory: &dyn SourceDirectory, source: &Source) -> bool {
    !directory.is_third_party(source) && !directory.has_pretty_variant(&source.id)
}

/// Builds the candidate queue in directory order.
pub fn select_candidates(
    directory: &dyn SourceDirectory,
    state: &SearchState,
    mode: CandidateMode,
) -> VecDeque<Source> {
    directory
        .list_sources()
        .into_iter()
        .filter(|source| is_searchable(directory, source))
        .filter(|source| match mode {
            CandidateMode::Fresh => true,
            CandidateMode::Reuse => !state.was_scanned(&source.id),
        })
        .collect()
}

#[cfg(test)]
#[path = "../../tests/unit/kernel/candidates.rs"]
mod tests;
