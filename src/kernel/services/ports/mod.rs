//! Service ports: traits + data contracts.

pub mod config;
pub mod idle;
pub mod search;
pub mod settings;
pub mod sources;

pub use config::{SearchConfig, DEFAULT_MATCH_BUDGET};
pub use idle::{BoxFuture, IdleHandle, IdleScheduler};
pub use search::{Match, MatchFinder, SearchError};
pub use settings::Settings;
pub use sources::{
    matches_any_pattern, pretty_source_url, LoadError, LoadFuture, LoadState, Source,
    SourceDirectory, SourceId,
};
