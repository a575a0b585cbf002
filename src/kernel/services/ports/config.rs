use super::sources::matches_any_pattern;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_MATCH_BUDGET: usize = 500;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    #[serde(alias = "matchBudget")]
    pub match_budget: usize,
    #[serde(alias = "idleDelayMs")]
    pub idle_delay_ms: u64,
    #[serde(alias = "caseSensitive")]
    pub case_sensitive: bool,
    #[serde(alias = "thirdPartyPatterns")]
    pub third_party_patterns: Vec<String>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            match_budget: DEFAULT_MATCH_BUDGET,
            idle_delay_ms: 4,
            case_sensitive: false,
            third_party_patterns: vec![
                "node_modules".to_string(),
                "bower_components".to_string(),
            ],
        }
    }
}

impl SearchConfig {
    /// A zero budget would park forever without making progress.
    pub fn batch_budget(&self) -> usize {
        self.match_budget.max(1)
    }

    pub fn idle_delay(&self) -> Duration {
        Duration::from_millis(self.idle_delay_ms)
    }

    pub fn is_third_party_url(&self, url: &str) -> bool {
        matches_any_pattern(url, &self.third_party_patterns)
    }
}

#[cfg(test)]
#[path = "../../../../tests/unit/kernel/services/ports/config.rs"]
mod tests;
