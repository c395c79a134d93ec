//! In-memory scan for embedded configuration records.
//!
//! Only central-directory indexes are walked; an entry is decompressed only
//! when its basename marks it as a record or a nested archive. Nothing is
//! written to disk.

use std::borrow::Cow;

use atlog_config::{ArchiveConfig, ScannerConfig};
use atlog_core::{RecordBuffer, RecordKind};
use tracing::{debug, info, warn};

use crate::cancel::CancelToken;
use crate::error::ArchiveError;
use crate::zip::{self, ArchiveEntry, ZipIndex};

/// Finds `jdd*.xml` / `x3*.xml` records and their `.xsd` schemas.
#[derive(Debug, Clone)]
pub struct RecordScanner {
    prefixes: Vec<String>,
    max_depth: usize,
    cancel: CancelToken,
}

impl RecordScanner {
    #[must_use]
    pub fn new(scanner: &ScannerConfig, archive: &ArchiveConfig) -> Self {
        Self {
            prefixes: scanner
                .record_prefixes
                .iter()
                .map(|p| p.trim().to_ascii_lowercase())
                .collect(),
            max_depth: archive.max_depth,
            cancel: CancelToken::new(),
        }
    }

    #[must_use]
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Record kind for an entry basename, if it is one.
    #[must_use]
    pub fn classify(&self, basename: &str) -> Option<RecordKind> {
        let lower = basename.to_ascii_lowercase();
        if !self.prefixes.iter().any(|p| lower.starts_with(p.as_str())) {
            return None;
        }
        if lower.ends_with(".xml") {
            Some(RecordKind::Configuration)
        } else if lower.ends_with(".xsd") {
            Some(RecordKind::SchemaDocumentation)
        } else {
            None
        }
    }

    /// Scan `root` and every nested archive within the depth limit.
    ///
    /// An empty result is not an error.
    pub fn scan(&self, root: &[u8]) -> Result<Vec<RecordBuffer>, ArchiveError> {
        let index = ZipIndex::parse(root).map_err(|e| ArchiveError::UnreadableArchive {
            reason: e.to_string(),
        })?;

        let mut records = Vec::new();
        let mut stack: Vec<(Cow<'_, [u8]>, ZipIndex, Vec<String>, usize)> =
            vec![(Cow::Borrowed(root), index, Vec::new(), 0)];

        while let Some((bytes, index, origin, depth)) = stack.pop() {
            let mut nested = Vec::new();
            for entry in index.entries() {
                if self.cancel.is_cancelled() {
                    return Err(ArchiveError::Cancelled);
                }
                if entry.is_dir() {
                    continue;
                }

                let kind = self.classify(entry.basename());
                if kind.is_none() && !entry.is_nested_archive() {
                    continue;
                }

                let mut chain = origin.clone();
                chain.push(entry.name.clone());

                let Some(data) = read_logged(&bytes, entry) else {
                    continue;
                };

                if let Some(kind) = kind {
                    debug!(entry = %entry.name, %kind, size = data.len(), "embedded record found");
                    records.push(RecordBuffer::new(kind, chain, data));
                    continue;
                }

                let child_depth = depth + 1;
                if child_depth > self.max_depth {
                    info!(entry = %entry.name, depth = child_depth, "nested archive beyond depth limit not scanned");
                    continue;
                }
                match ZipIndex::parse(&data) {
                    Ok(child) => nested.push((Cow::Owned(data), child, chain, child_depth)),
                    Err(err) => {
                        warn!(entry = %entry.name, error = %err, "corrupt nested archive skipped");
                    }
                }
            }
            stack.extend(nested.into_iter().rev());
        }

        info!(records = records.len(), "record scan complete");
        Ok(records)
    }
}

fn read_logged(bytes: &[u8], entry: &ArchiveEntry) -> Option<Vec<u8>> {
    zip::read_entry(bytes, entry)
        .inspect_err(|err| {
            warn!(entry = %entry.name, error = %err, "undecodable entry skipped");
        })
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::ZipBuilder;
    use pretty_assertions::assert_eq;

    fn scanner() -> RecordScanner {
        RecordScanner::new(&ScannerConfig::default(), &ArchiveConfig::default())
    }

    #[test]
    fn classifies_by_prefix_and_extension() {
        let s = scanner();
        assert_eq!(s.classify("JddConfig.XML"), Some(RecordKind::Configuration));
        assert_eq!(s.classify("x3Setup.xsd"), Some(RecordKind::SchemaDocumentation));
        assert_eq!(s.classify("jdd.log"), None);
        assert_eq!(s.classify("config.xml"), None);
    }

    #[test]
    fn finds_records_in_nested_archives() {
        let inner = ZipBuilder::new()
            .deflated("acu/jddConfig.xml", b"<jddConfig/>")
            .stored("acu/jddConfig.xsd", b"<xs:schema/>");
        let root = ZipBuilder::new()
            .stored("x3Main.xml", b"<x3/>")
            .stored("journal.jrn", b"10:00:00 3201")
            .nested("bundle/acu.zip", &inner)
            .build();

        let records = scanner().scan(&root).unwrap();
        let names: Vec<(&str, RecordKind)> = records.iter().map(|r| (r.name(), r.kind)).collect();
        assert_eq!(
            names,
            vec![
                ("x3Main.xml", RecordKind::Configuration),
                ("jddConfig.xml", RecordKind::Configuration),
                ("jddConfig.xsd", RecordKind::SchemaDocumentation),
            ]
        );
        assert_eq!(records[1].origin, vec!["bundle/acu.zip", "acu/jddConfig.xml"]);
        assert_eq!(records[1].bytes, b"<jddConfig/>");
    }

    #[test]
    fn no_records_is_an_empty_list() {
        let root = ZipBuilder::new().stored("readme.txt", b"nothing").build();
        assert!(scanner().scan(&root).unwrap().is_empty());
    }

    #[test]
    fn corrupt_nested_archive_is_skipped() {
        let root = ZipBuilder::new()
            .stored("broken.zip", b"PK\x03\x04 not really")
            .stored("jddA.xml", b"<a/>")
            .build();
        let records = scanner().scan(&root).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn malformed_root_is_unreadable() {
        assert!(matches!(
            scanner().scan(b"garbage"),
            Err(ArchiveError::UnreadableArchive { .. })
        ));
    }
}
