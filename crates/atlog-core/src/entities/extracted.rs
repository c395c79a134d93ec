use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::text::TextEncoding;

/// Why a nested archive was written to disk without being expanded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpaqueReason {
    /// The entry looked like an archive but could not be read as one.
    NestedArchiveCorrupt,
    /// Expanding the entry would exceed the configured nesting depth.
    DepthLimitExceeded,
}

/// A file written into a session scratch directory by the unpacker.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExtractedFile {
    /// Absolute path inside the scratch directory.
    pub path: PathBuf,
    /// Path relative to the session root, stable across runs.
    pub relative_path: PathBuf,
    /// Entry path at every nesting level, outermost first. The last element
    /// is the entry that produced this file.
    pub origin: Vec<String>,
    pub size: u64,
    pub encoding: TextEncoding,
    /// Set when the file is a nested archive kept unexpanded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opaque: Option<OpaqueReason>,
}

impl ExtractedFile {
    /// Base name of the file on disk.
    #[must_use]
    pub fn file_name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default()
    }

    /// Nesting depth: 0 for entries of the root archive.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.origin.len().saturating_sub(1)
    }

    #[must_use]
    pub fn is_opaque(&self) -> bool {
        self.opaque.is_some()
    }

    /// Parent directory names from the nearest to the session root.
    pub fn parent_dirs(&self) -> impl Iterator<Item = &str> {
        self.relative_path
            .parent()
            .into_iter()
            .flat_map(Path::components)
            .filter_map(|component| component.as_os_str().to_str())
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
    }
}
