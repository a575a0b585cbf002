//! zdbg: 在目录上跑一次项目搜索（与调试器前端相同的分批调度）
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;

use zdbg::kernel::services::adapters::{
    collect_workspace_sources, ensure_settings_file, load_settings, FsSourceFetcher,
    InMemorySourceDirectory, LiteralMatchFinder, TokioIdleScheduler,
};
use zdbg::kernel::services::ports::{SearchConfig, Settings, SourceId};
use zdbg::kernel::{SearchEvent, SearchOptions, SearchSession, SearchSnapshot, SearchStatus};

mod logging;

const USAGE: &str = "usage: zdbg <root> <query> [--budget N] [--case-sensitive] [--json]";

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliArgs {
    root: String,
    query: String,
    budget: Option<usize>,
    case_sensitive: bool,
    json: bool,
}

fn parse_args<I>(args: I) -> Result<CliArgs, String>
where
    I: IntoIterator<Item = String>,
{
    let mut positional = Vec::new();
    let mut budget = None;
    let mut case_sensitive = false;
    let mut json = false;

    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--case-sensitive" => case_sensitive = true,
            "--json" => json = true,
            "--budget" => {
                let value = args.next().ok_or("--budget needs a value")?;
                budget = Some(parse_budget(&value)?);
            }
            _ => {
                if let Some(value) = arg.strip_prefix("--budget=") {
                    budget = Some(parse_budget(value)?);
                } else if arg.starts_with("--") {
                    return Err(format!("unknown flag: {arg}"));
                } else {
                    positional.push(arg);
                }
            }
        }
    }

    let mut positional = positional.into_iter();
    let (Some(root), Some(query), None) = (positional.next(), positional.next(), positional.next())
    else {
        return Err("expected <root> and <query>".to_string());
    };

    Ok(CliArgs {
        root,
        query,
        budget,
        case_sensitive,
        json,
    })
}

fn parse_budget(value: &str) -> Result<usize, String> {
    value
        .parse()
        .map_err(|_| format!("invalid budget: {value}"))
}

fn resolve_search_root(cwd: &Path, arg: &str) -> std::io::Result<PathBuf> {
    let path = Path::new(arg);
    let path = if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    };
    let meta = std::fs::metadata(&path)?;
    if !meta.is_dir() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("not a directory: {}", path.display()),
        ));
    }
    Ok(path)
}

fn search_config(settings: &Settings, args: &CliArgs) -> SearchConfig {
    let mut config = settings.search.clone();
    if let Some(budget) = args.budget {
        config.match_budget = budget;
    }
    if args.case_sensitive {
        config.case_sensitive = true;
    }
    config
}

fn build_runtime() -> std::io::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .or_else(|e| {
            tracing::warn!(error = %e, "multi-thread runtime unavailable, falling back");
            tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
        })
}

/// 阻塞到本次搜索 `Done`，返回被跳过的 source
fn wait_for_done(rx: Receiver<SearchEvent>) -> Vec<(SourceId, String)> {
    let mut skipped = Vec::new();
    while let Ok(event) = rx.recv() {
        match event {
            SearchEvent::Status {
                status: SearchStatus::Done,
                ..
            } => break,
            SearchEvent::Error {
                source_id, message, ..
            } => skipped.push((source_id, message)),
            _ => {}
        }
    }
    skipped
}

fn print_text(snapshot: &SearchSnapshot, skipped: &[(SourceId, String)]) {
    for result in &snapshot.results {
        println!("{}", result.filepath);
        for m in &result.matches {
            println!("  {}:{}: {}", m.line, m.column + 1, m.value.trim_end());
        }
    }
    println!(
        "{} matches in {} files",
        snapshot.total_matches,
        snapshot.results.len()
    );
    if !skipped.is_empty() {
        eprintln!("{} sources skipped", skipped.len());
    }
}

fn run(args: CliArgs) -> Result<(), String> {
    let settings = load_settings().unwrap_or_default();
    let _logging = logging::init(settings.log_filter.as_deref());
    if let Err(e) = ensure_settings_file() {
        tracing::debug!(error = %e, "settings file not created");
    }

    let cwd = std::env::current_dir().map_err(|e| e.to_string())?;
    let root = resolve_search_root(&cwd, &args.root).map_err(|e| format!("{}: {e}", args.root))?;
    let config = search_config(&settings, &args);

    let runtime = build_runtime().map_err(|e| e.to_string())?;
    let directory = Arc::new(
        InMemorySourceDirectory::new(Arc::new(FsSourceFetcher))
            .with_third_party_patterns(config.third_party_patterns.clone()),
    );
    let added = directory.add_sources(collect_workspace_sources(&root));
    tracing::info!(root = %root.display(), sources = added, "workspace collected");

    let idle = Arc::new(TokioIdleScheduler::new(
        runtime.handle().clone(),
        config.idle_delay(),
    ));
    let finder = Arc::new(LiteralMatchFinder::new(config.case_sensitive));
    let (tx, rx) = mpsc::channel();
    let session = SearchSession::builder(directory, finder, idle)
        .config(config)
        .events(tx)
        .build();

    runtime
        .block_on(session.start_search(&args.query, SearchOptions::default()))
        .map_err(|e| e.to_string())?;
    let skipped = runtime
        .block_on(runtime.spawn_blocking(move || wait_for_done(rx)))
        .map_err(|e| e.to_string())?;

    let snapshot = session.snapshot();
    if let Some(err) = &snapshot.last_error {
        return Err(err.clone());
    }

    if args.json {
        let out = serde_json::to_string_pretty(&snapshot).map_err(|e| e.to_string())?;
        println!("{out}");
    } else {
        print_text(&snapshot, &skipped);
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = match parse_args(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("zdbg: {e}");
            eprintln!("{USAGE}");
            return ExitCode::from(2);
        }
    };

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "search failed");
            eprintln!("zdbg: {e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
#[path = "../tests/unit/cli_args.rs"]
mod tests;
