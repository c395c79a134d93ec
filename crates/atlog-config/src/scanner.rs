//! Embedded record scanner configuration.

use serde::{Deserialize, Serialize};

fn default_record_prefixes() -> Vec<String> {
    vec!["jdd".to_string(), "x3".to_string()]
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScannerConfig {
    /// Basename prefixes (case-insensitive) of embedded configuration records.
    #[serde(default = "default_record_prefixes")]
    pub record_prefixes: Vec<String>,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            record_prefixes: default_record_prefixes(),
        }
    }
}
