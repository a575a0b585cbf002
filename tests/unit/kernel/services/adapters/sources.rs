use super::*;
use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::tempdir;

fn create_runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .unwrap()
}

#[derive(Default)]
struct MapFetcher {
    texts: FxHashMap<String, String>,
    calls: AtomicUsize,
}

impl MapFetcher {
    fn with(mut self, url: &str, text: &str) -> Self {
        self.texts.insert(url.to_string(), text.to_string());
        self
    }
}

impl SourceFetcher for MapFetcher {
    fn fetch<'a>(&'a self, source: &'a Source) -> FetchFuture<'a> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.texts
                .get(&source.url)
                .map(|text| SourceText {
                    text: text.clone(),
                    content_type: None,
                })
                .ok_or_else(|| format!("404 {}", source.url))
        })
    }
}

#[test]
fn test_add_sources_dedups_by_id_and_keeps_order() {
    let directory = InMemorySourceDirectory::new(Arc::new(MapFetcher::default()));
    let added = directory.add_sources(vec![
        Source::new("b", "http://x/b.js"),
        Source::new("a", "http://x/a.js"),
        Source::new("b", "http://x/other.js"),
    ]);
    assert_eq!(added, 2);

    let ids: Vec<_> = directory
        .list_sources()
        .into_iter()
        .map(|s| s.id.to_string())
        .collect();
    assert_eq!(ids, vec!["b", "a"]);
    assert_eq!(
        directory.get_source(&SourceId::from("b")).unwrap().url,
        "http://x/b.js"
    );
}

#[test]
fn test_third_party_patterns_flag_sources() {
    let directory = InMemorySourceDirectory::new(Arc::new(MapFetcher::default()))
        .with_third_party_patterns(vec!["node_modules".to_string()]);
    directory.add_source(Source::new("lib", "webpack:///node_modules/lodash.js"));
    directory.add_source(Source::new("app", "webpack:///src/app.js"));
    directory.add_source(Source::new("flagged", "http://cdn/x.js").third_party(true));

    let lib = directory.get_source(&"lib".into()).unwrap();
    let app = directory.get_source(&"app".into()).unwrap();
    let flagged = directory.get_source(&"flagged".into()).unwrap();
    assert!(directory.is_third_party(&lib));
    assert!(!directory.is_third_party(&app));
    assert!(directory.is_third_party(&flagged));
}

#[test]
fn test_has_pretty_variant() {
    let directory = InMemorySourceDirectory::new(Arc::new(MapFetcher::default()));
    directory.add_source(Source::new("min", "http://x/app.min.js"));
    assert!(!directory.has_pretty_variant(&"min".into()));

    directory.add_source(Source::new("pretty", "http://x/app.min.js:formatted"));
    assert!(directory.has_pretty_variant(&"min".into()));
    assert!(!directory.has_pretty_variant(&"pretty".into()));
    assert!(!directory.has_pretty_variant(&"missing".into()));
}

#[test]
fn test_load_text_is_idempotent() {
    let rt = create_runtime();
    let fetcher = Arc::new(MapFetcher::default().with("http://x/a.js", "let a = 1;"));
    let directory = InMemorySourceDirectory::new(fetcher.clone());
    directory.add_source(Source::new("a", "http://x/a.js"));
    let id = SourceId::from("a");

    let loaded = rt.block_on(directory.load_text(&id)).unwrap();
    assert_eq!(loaded.loaded_state, LoadState::Loaded);
    assert_eq!(loaded.text(), "let a = 1;");

    let again = rt.block_on(directory.load_text(&id)).unwrap();
    assert_eq!(again.text(), "let a = 1;");
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_preloaded_source_skips_fetch() {
    let rt = create_runtime();
    let fetcher = Arc::new(MapFetcher::default());
    let directory = InMemorySourceDirectory::new(fetcher.clone());
    directory.add_source(Source::new("inline", "inline://1").with_text("inline text"));

    let loaded = rt.block_on(directory.load_text(&"inline".into())).unwrap();
    assert_eq!(loaded.text(), "inline text");
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_load_failure_records_error() {
    let rt = create_runtime();
    let directory = InMemorySourceDirectory::new(Arc::new(MapFetcher::default()));
    directory.add_source(Source::new("gone", "http://x/gone.js"));
    let id = SourceId::from("gone");

    let err = rt.block_on(directory.load_text(&id)).unwrap_err();
    assert_eq!(err.source_id, id);
    assert!(err.message.contains("404"));

    let source = directory.get_source(&id).unwrap();
    assert_eq!(source.loaded_state, LoadState::Unloaded);
    assert!(source.error.is_some());
}

#[test]
fn test_load_unknown_source_fails() {
    let rt = create_runtime();
    let directory = InMemorySourceDirectory::new(Arc::new(MapFetcher::default()));
    let err = rt.block_on(directory.load_text(&"nope".into())).unwrap_err();
    assert_eq!(err.source_id, SourceId::from("nope"));
}

#[test]
fn test_set_text_marks_loaded() {
    let directory = InMemorySourceDirectory::new(Arc::new(MapFetcher::default()));
    directory.add_source(Source::new("a", "http://x/a.js"));
    assert!(directory.set_text(&"a".into(), "pushed"));
    assert!(!directory.set_text(&"b".into(), "pushed"));

    let source = directory.get_source(&"a".into()).unwrap();
    assert!(source.is_loaded());
    assert_eq!(source.text(), "pushed");
}

#[test]
fn test_fs_fetcher_reads_text_and_skips_binary() {
    let rt = create_runtime();
    let dir = tempdir().unwrap();
    let text_file = dir.path().join("a.js");
    let binary_file = dir.path().join("b.bin");
    fs::write(&text_file, "const x = 1;\n").unwrap();
    fs::write(&binary_file, b"abc\x00def").unwrap();

    let fetcher = FsSourceFetcher;
    let text_source = Source::new("a", text_file.to_string_lossy().into_owned());
    let binary_source = Source::new("b", binary_file.to_string_lossy().into_owned());
    let missing = Source::new("c", dir.path().join("c.js").to_string_lossy().into_owned());

    let text = rt.block_on(fetcher.fetch(&text_source)).unwrap();
    assert_eq!(text.text, "const x = 1;\n");
    let binary = rt.block_on(fetcher.fetch(&binary_source)).unwrap();
    assert!(binary.text.is_empty());
    assert!(rt.block_on(fetcher.fetch(&missing)).is_err());
}

#[test]
fn test_collect_workspace_sources_sorted_and_ignoring() {
    let dir = tempdir().unwrap();
    fs::create_dir_all(dir.path().join("src")).unwrap();
    fs::create_dir_all(dir.path().join(".hidden")).unwrap();
    fs::write(dir.path().join("src/b.js"), "b").unwrap();
    fs::write(dir.path().join("src/a.js"), "a").unwrap();
    fs::write(dir.path().join(".hidden/c.js"), "c").unwrap();

    let sources = collect_workspace_sources(dir.path());
    let urls: Vec<_> = sources
        .iter()
        .map(|s| Path::new(&s.url).file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(urls, vec!["a.js", "b.js"]);
    assert_eq!(sources[0].id, SourceId::from("source1"));
    assert_eq!(sources[1].id, SourceId::from("source2"));
}
