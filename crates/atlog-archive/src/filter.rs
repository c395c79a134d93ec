//! Junk and include filtering applied before anything reaches disk.

use atlog_config::ArchiveConfig;
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use serde::Serialize;

use crate::error::ArchiveError;

/// Why an archive entry produced no output file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// Matched a junk glob.
    Junk,
    /// Basename starts with a dot.
    Hidden,
    /// Zero-byte entry.
    Empty,
    /// Include globs are set and none matched.
    NotIncluded,
    /// The entry name sanitizes to nothing.
    UnsafePath,
    /// Decompression failed (bad CRC, unsupported method, encrypted, ...).
    Unreadable { detail: String },
}

/// Compiled entry filter.
#[derive(Debug, Clone)]
pub struct EntryFilter {
    junk: GlobSet,
    include: Option<GlobSet>,
    skip_hidden: bool,
    skip_empty: bool,
}

fn build_set(patterns: &[String]) -> Result<GlobSet, ArchiveError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = GlobBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|source| ArchiveError::InvalidPattern {
                pattern: pattern.clone(),
                source,
            })?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|source| ArchiveError::InvalidPattern {
            pattern: patterns.join(","),
            source,
        })
}

impl EntryFilter {
    pub fn from_config(config: &ArchiveConfig) -> Result<Self, ArchiveError> {
        let include = if config.include_globs.is_empty() {
            None
        } else {
            Some(build_set(&config.include_globs)?)
        };
        Ok(Self {
            junk: build_set(&config.junk_globs)?,
            include,
            skip_hidden: config.skip_hidden,
            skip_empty: config.skip_empty,
        })
    }

    /// Decide whether a sanitized entry path is dropped.
    ///
    /// Nested archives are never subject to include globs.
    #[must_use]
    pub fn check(&self, path: &str, size: u64, nested_archive: bool) -> Option<SkipReason> {
        if self.junk.is_match(path) {
            return Some(SkipReason::Junk);
        }
        let basename = path.rsplit('/').next().unwrap_or(path);
        if self.skip_hidden && basename.starts_with('.') {
            return Some(SkipReason::Hidden);
        }
        if self.skip_empty && size == 0 {
            return Some(SkipReason::Empty);
        }
        if !nested_archive {
            if let Some(include) = &self.include {
                if !include.is_match(path) {
                    return Some(SkipReason::NotIncluded);
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn default_filter() -> EntryFilter {
        EntryFilter::from_config(&ArchiveConfig::default()).unwrap()
    }

    #[rstest]
    #[case("__MACOSX/logs/._journal.jrn")]
    #[case("logs/.DS_Store")]
    #[case("THUMBS.DB")]
    #[case("deep/dir/Desktop.ini")]
    #[case("scratch.TMP")]
    #[case("docs/~$report.docx")]
    #[case("repo/.git/HEAD")]
    #[case(".svn/entries")]
    fn default_junk_is_dropped(#[case] path: &str) {
        assert_eq!(default_filter().check(path, 10, false), Some(SkipReason::Junk));
    }

    #[test]
    fn hidden_and_empty_entries_are_dropped() {
        let filter = default_filter();
        assert_eq!(filter.check("logs/.profile", 10, false), Some(SkipReason::Hidden));
        assert_eq!(filter.check("logs/empty.log", 0, false), Some(SkipReason::Empty));
        assert_eq!(filter.check("logs/app.log", 10, false), None);
    }

    #[test]
    fn include_globs_spare_nested_archives() {
        let config = ArchiveConfig {
            include_globs: vec!["**/*.jrn".into()],
            ..ArchiveConfig::default()
        };
        let filter = EntryFilter::from_config(&config).unwrap();
        assert_eq!(filter.check("a/b.JRN", 4, false), None);
        assert_eq!(filter.check("a/b.log", 4, false), Some(SkipReason::NotIncluded));
        assert_eq!(filter.check("a/inner.zip", 4, true), None);
    }

    #[test]
    fn bad_glob_is_reported() {
        let config = ArchiveConfig {
            junk_globs: vec!["[unclosed".into()],
            ..ArchiveConfig::default()
        };
        assert!(matches!(
            EntryFilter::from_config(&config),
            Err(ArchiveError::InvalidPattern { .. })
        ));
    }
}
