//! Categorization engine configuration.

use serde::{Deserialize, Serialize};

const fn default_probe_bytes() -> usize {
    4096
}

const fn default_min_line_hits() -> usize {
    2
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CategorizeConfig {
    /// Bytes read from the head of each file for the content stage.
    #[serde(default = "default_probe_bytes")]
    pub probe_bytes: usize,

    /// Lines that must match a line-shape heuristic before it decides.
    #[serde(default = "default_min_line_hits")]
    pub min_line_hits: usize,
}

impl Default for CategorizeConfig {
    fn default() -> Self {
        Self {
            probe_bytes: default_probe_bytes(),
            min_line_hits: default_min_line_hits(),
        }
    }
}
