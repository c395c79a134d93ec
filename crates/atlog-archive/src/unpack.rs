//! Recursive archive unpacking into a scratch directory.
//!
//! Traversal is iterative: each archive is a frame on an explicit stack, so
//! nesting depth never grows the call stack. Frames are expanded one at a
//! time; nested archives found in a frame are pushed in entry order and
//! expanded after it.

use std::borrow::Cow;
use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};

use atlog_config::ArchiveConfig;
use atlog_core::{ExtractedFile, OpaqueReason, TextEncoding};
use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::cancel::CancelToken;
use crate::error::ArchiveError;
use crate::filter::{EntryFilter, SkipReason};
use crate::path::{nested_dir, occupied_paths, sanitize_entry_name, unique_dir, unique_path};
use crate::zip::{self, ZipIndex};

/// An entry that produced no output file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedEntry {
    /// Entry path at every nesting level, outermost first.
    pub origin: Vec<String>,
    #[serde(flatten)]
    pub reason: SkipReason,
}

/// Boundary conditions recovered during unpacking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NoticeKind {
    /// A nested archive could not be read; its bytes were kept opaque when available.
    NestedArchiveCorrupt { reason: String },
    /// A nested archive deeper than the limit was kept opaque.
    DepthLimitExceeded { depth: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub origin: Vec<String>,
    #[serde(flatten)]
    pub kind: NoticeKind,
}

/// Everything one unpack pass produced.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UnpackReport {
    /// Extracted files in traversal order.
    pub files: Vec<ExtractedFile>,
    pub skipped: Vec<SkippedEntry>,
    pub notices: Vec<Notice>,
}

struct Frame<'a> {
    bytes: Cow<'a, [u8]>,
    index: ZipIndex,
    /// Output directory relative to the destination root.
    rel_dir: PathBuf,
    origin: Vec<String>,
    depth: usize,
}

/// Expands a root archive and every nested archive within the depth limit.
#[derive(Debug, Clone)]
pub struct Unpacker {
    filter: EntryFilter,
    max_depth: usize,
    cancel: CancelToken,
}

impl Unpacker {
    pub fn new(config: &ArchiveConfig) -> Result<Self, ArchiveError> {
        Ok(Self {
            filter: EntryFilter::from_config(config)?,
            max_depth: config.max_depth,
            cancel: CancelToken::new(),
        })
    }

    #[must_use]
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Unpack `root` into `dest`.
    ///
    /// Only an unreadable root archive, a filesystem failure or cancellation
    /// is an error. Problems below the root end up in the report.
    pub fn unpack(&self, root: &[u8], dest: &Path) -> Result<UnpackReport, ArchiveError> {
        let index = ZipIndex::parse(root).map_err(|e| ArchiveError::UnreadableArchive {
            reason: e.to_string(),
        })?;
        debug!(entries = index.len(), dest = %dest.display(), "unpacking root archive");

        let mut report = UnpackReport::default();
        let mut stack = vec![Frame {
            bytes: Cow::Borrowed(root),
            index,
            rel_dir: PathBuf::new(),
            origin: Vec::new(),
            depth: 0,
        }];

        while let Some(frame) = stack.pop() {
            let mut nested = Vec::new();
            self.unpack_frame(&frame, dest, &mut report, &mut nested)?;
            stack.extend(nested.into_iter().rev());
        }

        info!(
            files = report.files.len(),
            skipped = report.skipped.len(),
            notices = report.notices.len(),
            "unpack complete"
        );
        Ok(report)
    }

    fn unpack_frame<'a>(
        &self,
        frame: &Frame<'a>,
        dest: &Path,
        report: &mut UnpackReport,
        nested: &mut Vec<Frame<'a>>,
    ) -> Result<(), ArchiveError> {
        let mut used = HashSet::new();
        let names: Vec<String> = frame
            .index
            .entries()
            .iter()
            .filter(|entry| !entry.is_dir())
            .filter_map(|entry| sanitize_entry_name(&entry.name))
            .collect();
        // Nested output directories must not shadow any path of this frame.
        let occupied = occupied_paths(names.iter().map(String::as_str));

        for entry in frame.index.entries() {
            if self.cancel.is_cancelled() {
                return Err(ArchiveError::Cancelled);
            }
            if entry.is_dir() {
                continue;
            }

            let mut origin = frame.origin.clone();
            origin.push(entry.name.clone());

            let Some(clean) = sanitize_entry_name(&entry.name) else {
                warn!(entry = %entry.name, "entry name has no usable path component");
                report.skipped.push(SkippedEntry {
                    origin,
                    reason: SkipReason::UnsafePath,
                });
                continue;
            };

            let is_archive = entry.is_nested_archive();
            if let Some(reason) = self.filter.check(&clean, entry.uncompressed_size, is_archive) {
                debug!(entry = %entry.name, ?reason, "entry filtered");
                report.skipped.push(SkippedEntry { origin, reason });
                continue;
            }

            let bytes = match zip::read_entry(&frame.bytes, entry) {
                Ok(bytes) => bytes,
                Err(err) if is_archive => {
                    report.notices.push(Notice {
                        origin: origin.clone(),
                        kind: NoticeKind::NestedArchiveCorrupt {
                            reason: err.to_string(),
                        },
                    });
                    if let Some(salvaged) = zip::salvage_entry(&frame.bytes, entry) {
                        warn!(entry = %entry.name, error = %err, "nested archive unreadable, kept opaque");
                        let rel = frame.rel_dir.join(unique_path(&clean, &mut used));
                        report.files.push(write_file(
                            dest,
                            rel,
                            origin,
                            &salvaged,
                            Some(OpaqueReason::NestedArchiveCorrupt),
                        )?);
                    } else {
                        warn!(entry = %entry.name, error = %err, "skipping unreadable nested archive");
                        report.skipped.push(SkippedEntry {
                            origin,
                            reason: SkipReason::Unreadable {
                                detail: err.to_string(),
                            },
                        });
                    }
                    continue;
                }
                Err(err) => {
                    warn!(entry = %entry.name, error = %err, "skipping unreadable entry");
                    report.skipped.push(SkippedEntry {
                        origin,
                        reason: SkipReason::Unreadable {
                            detail: err.to_string(),
                        },
                    });
                    continue;
                }
            };

            let rel = frame.rel_dir.join(unique_path(&clean, &mut used));

            if !is_archive {
                report.files.push(write_file(dest, rel, origin, &bytes, None)?);
                continue;
            }

            let depth = frame.depth + 1;
            if depth > self.max_depth {
                info!(entry = %entry.name, depth, max_depth = self.max_depth, "nested archive beyond depth limit kept opaque");
                report.notices.push(Notice {
                    origin: origin.clone(),
                    kind: NoticeKind::DepthLimitExceeded { depth },
                });
                report.files.push(write_file(
                    dest,
                    rel,
                    origin,
                    &bytes,
                    Some(OpaqueReason::DepthLimitExceeded),
                )?);
                continue;
            }

            match ZipIndex::parse(&bytes) {
                Ok(index) => {
                    debug!(entry = %entry.name, depth, entries = index.len(), "descending into nested archive");
                    let dir = unique_dir(&nested_dir(&clean, entry.index), &mut used, &occupied);
                    nested.push(Frame {
                        rel_dir: frame.rel_dir.join(dir),
                        bytes: Cow::Owned(bytes),
                        index,
                        origin,
                        depth,
                    });
                }
                Err(err) => {
                    warn!(entry = %entry.name, error = %err, "nested archive corrupt, kept opaque");
                    report.notices.push(Notice {
                        origin: origin.clone(),
                        kind: NoticeKind::NestedArchiveCorrupt {
                            reason: err.to_string(),
                        },
                    });
                    report.files.push(write_file(
                        dest,
                        rel,
                        origin,
                        &bytes,
                        Some(OpaqueReason::NestedArchiveCorrupt),
                    )?);
                }
            }
        }
        Ok(())
    }
}

fn write_file(
    dest: &Path,
    relative_path: PathBuf,
    origin: Vec<String>,
    bytes: &[u8],
    opaque: Option<OpaqueReason>,
) -> Result<ExtractedFile, ArchiveError> {
    let path = dest.join(&relative_path);
    write_atomic(&path, bytes)?;
    Ok(ExtractedFile {
        path,
        relative_path,
        origin,
        size: bytes.len() as u64,
        encoding: TextEncoding::detect(bytes),
        opaque,
    })
}

/// Write through a temporary file in the target directory, then rename.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), ArchiveError> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent).map_err(ArchiveError::io(parent))?;

    let mut tmp = NamedTempFile::new_in(parent).map_err(ArchiveError::io(parent))?;
    tmp.write_all(bytes).map_err(ArchiveError::io(tmp.path()))?;
    tmp.persist(path).map_err(|e| ArchiveError::Io {
        path: path.to_path_buf(),
        source: e.error,
    })?;
    Ok(())
}
