//! Service adapters: OS/runtime specific implementations (IO/async).

pub mod idle;
pub mod search;
pub mod settings;
pub mod sources;

pub use idle::{IdleQueue, TokioIdleScheduler};
pub use search::LiteralMatchFinder;
pub use settings::{
    ensure_log_dir, ensure_settings_file, get_log_dir, get_settings_path, load_settings,
    load_settings_from,
};
pub use sources::{
    collect_workspace_sources, FetchFuture, FsSourceFetcher, InMemorySourceDirectory,
    SourceFetcher, SourceText,
};
