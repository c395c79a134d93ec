//! Archive unpacking configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default nesting depth below the root archive that is still expanded.
const fn default_max_depth() -> usize {
    4
}

const fn default_true() -> bool {
    true
}

/// Junk entries dropped before anything reaches disk.
fn default_junk_globs() -> Vec<String> {
    [
        "**/__MACOSX/**",
        "**/.DS_Store",
        "**/Thumbs.db",
        "**/desktop.ini",
        "**/*.tmp",
        "**/~$*",
        "**/.git/**",
        "**/.svn/**",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ArchiveConfig {
    /// Deepest nesting level that is unpacked; deeper archives stay opaque.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Case-insensitive globs for entries that are never written.
    #[serde(default = "default_junk_globs")]
    pub junk_globs: Vec<String>,

    /// When non-empty, only non-archive entries matching one of these are kept.
    #[serde(default)]
    pub include_globs: Vec<String>,

    /// Drop entries whose basename starts with a dot.
    #[serde(default = "default_true")]
    pub skip_hidden: bool,

    /// Drop zero-byte entries.
    #[serde(default = "default_true")]
    pub skip_empty: bool,

    /// Parent directory for session scratch directories. System temp dir when unset.
    #[serde(default)]
    pub scratch_root: Option<PathBuf>,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            junk_globs: default_junk_globs(),
            include_globs: Vec::new(),
            skip_hidden: true,
            skip_empty: true,
            scratch_root: None,
        }
    }
}
