use super::config::SearchConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default, alias = "logFilter", skip_serializing_if = "Option::is_none")]
    pub log_filter: Option<String>,
}

#[cfg(test)]
#[path = "../../../../tests/unit/kernel/services/ports/settings.rs"]
mod tests;
