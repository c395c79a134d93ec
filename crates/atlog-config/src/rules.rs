//! Transaction rule document location.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

fn default_rules_path() -> PathBuf {
    PathBuf::from("dnLogAtConfig.xml")
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RulesConfig {
    /// Path of the transaction rule XML document.
    #[serde(default = "default_rules_path")]
    pub path: PathBuf,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            path: default_rules_path(),
        }
    }
}
