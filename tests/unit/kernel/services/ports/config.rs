use super::*;

#[test]
fn test_default_config() {
    let config = SearchConfig::default();
    assert_eq!(config.match_budget, 500);
    assert_eq!(config.batch_budget(), 500);
    assert!(!config.case_sensitive);
    assert_eq!(
        config.third_party_patterns,
        vec!["node_modules".to_string(), "bower_components".to_string()]
    );
}

#[test]
fn test_zero_budget_still_makes_progress() {
    let config = SearchConfig {
        match_budget: 0,
        ..SearchConfig::default()
    };
    assert_eq!(config.batch_budget(), 1);
}

#[test]
fn test_third_party_url() {
    let config = SearchConfig::default();
    assert!(config.is_third_party_url("webpack:///node_modules/react/index.js"));
    assert!(config.is_third_party_url("http://x/bower_components/jquery.js"));
    assert!(!config.is_third_party_url("http://x/src/app.js"));

    let config = SearchConfig {
        third_party_patterns: vec![String::new()],
        ..SearchConfig::default()
    };
    assert!(!config.is_third_party_url("http://x/src/app.js"));
}

#[test]
fn test_partial_json_keeps_defaults() {
    let parsed: SearchConfig = serde_json::from_str(r#"{ "matchBudget": 50 }"#).unwrap();
    assert_eq!(parsed.match_budget, 50);
    assert_eq!(parsed.idle_delay_ms, 4);
    assert_eq!(parsed.third_party_patterns.len(), 2);

    let parsed: SearchConfig =
        serde_json::from_str(r#"{ "case_sensitive": true, "third_party_patterns": [] }"#).unwrap();
    assert!(parsed.case_sensitive);
    assert!(parsed.third_party_patterns.is_empty());
    assert_eq!(parsed.match_budget, 500);
}
