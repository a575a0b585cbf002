use super::*;

#[test]
fn test_pretty_source_url_appends_suffix() {
    assert_eq!(
        pretty_source_url("http://x/app.min.js"),
        "http://x/app.min.js:formatted"
    );
}

#[test]
fn test_source_defaults() {
    let source = Source::new("s1", "http://x/a.js");
    assert_eq!(source.id.as_str(), "s1");
    assert_eq!(source.loaded_state, LoadState::Unloaded);
    assert!(!source.is_loaded());
    assert!(!source.is_third_party);
    assert_eq!(source.text(), "");

    let source = source.with_text("abc").third_party(true);
    assert!(source.is_loaded());
    assert!(source.is_third_party);
    assert_eq!(source.text(), "abc");
}

#[test]
fn test_matches_any_pattern_ignores_empty() {
    let patterns = vec![String::new(), "node_modules".to_string()];
    assert!(matches_any_pattern("/app/node_modules/x.js", &patterns));
    assert!(!matches_any_pattern("/app/src/x.js", &patterns));
    assert!(!matches_any_pattern("/app/src/x.js", &[String::new()]));
}

#[test]
fn test_source_id_serializes_transparently() {
    let id = SourceId::from("source7");
    assert_eq!(serde_json::to_string(&id).unwrap(), "\"source7\"");
    assert_eq!(id.to_string(), "source7");
}
