//! Staged categorization of extracted files and in-memory records.

use std::collections::{BTreeMap, HashSet};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use atlog_config::CategorizeConfig;
use atlog_core::{ExtractedFile, FileCategory, RecordBuffer, TextEncoding, text};
use ignore::WalkBuilder;
use serde::Serialize;

use crate::error::CategorizeError;
use crate::table::{PatternRow, PatternTable, Stage};

// ---------------------------------------------------------------------------
// CategorizeMode
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CategorizeMode {
    /// Every stage and every row.
    #[default]
    All,
    /// Only filename-stage registry rows; everything else is unidentified.
    RegistryOnly,
}

impl CategorizeMode {
    fn admits(self, row: &PatternRow) -> bool {
        match self {
            Self::All => true,
            Self::RegistryOnly => {
                row.stage == Stage::Filename && row.category == FileCategory::RegistryFile
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Buckets
// ---------------------------------------------------------------------------

/// One categorized input.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum CategorizedItem {
    File {
        #[serde(flatten)]
        file: ExtractedFile,
        /// Stage that decided; absent for unidentified files.
        #[serde(skip_serializing_if = "Option::is_none")]
        stage: Option<Stage>,
    },
    Record {
        #[serde(flatten)]
        record: RecordBuffer,
    },
}

impl CategorizedItem {
    #[must_use]
    pub const fn as_file(&self) -> Option<&ExtractedFile> {
        match self {
            Self::File { file, .. } => Some(file),
            Self::Record { .. } => None,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::File { file, .. } => file.file_name(),
            Self::Record { record } => record.name(),
        }
    }

    /// Entry path at every nesting level, outermost first.
    #[must_use]
    pub fn origin(&self) -> &[String] {
        match self {
            Self::File { file, .. } => &file.origin,
            Self::Record { record } => &record.origin,
        }
    }
}

/// Category to items. Every category key is present, possibly empty.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct CategoryBuckets {
    buckets: BTreeMap<FileCategory, Vec<CategorizedItem>>,
}

impl Default for CategoryBuckets {
    fn default() -> Self {
        Self {
            buckets: FileCategory::ALL
                .into_iter()
                .map(|category| (category, Vec::new()))
                .collect(),
        }
    }
}

impl CategoryBuckets {
    fn push(&mut self, category: FileCategory, item: CategorizedItem) {
        self.buckets.entry(category).or_default().push(item);
    }

    #[must_use]
    pub fn get(&self, category: FileCategory) -> &[CategorizedItem] {
        self.buckets.get(&category).map_or(&[], Vec::as_slice)
    }

    /// Files of one category (records excluded).
    pub fn files(&self, category: FileCategory) -> impl Iterator<Item = &ExtractedFile> {
        self.get(category).iter().filter_map(CategorizedItem::as_file)
    }

    /// Item names of one category, in insertion order.
    #[must_use]
    pub fn names(&self, category: FileCategory) -> Vec<&str> {
        self.get(category).iter().map(CategorizedItem::name).collect()
    }

    #[must_use]
    pub fn counts(&self) -> BTreeMap<FileCategory, usize> {
        self.buckets
            .iter()
            .map(|(category, items)| (*category, items.len()))
            .collect()
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FileCategory, &[CategorizedItem])> {
        self.buckets
            .iter()
            .map(|(category, items)| (*category, items.as_slice()))
    }
}

// ---------------------------------------------------------------------------
// Categorizer
// ---------------------------------------------------------------------------

/// Outcome of classifying one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub category: FileCategory,
    pub stage: Option<Stage>,
}

impl Decision {
    const UNIDENTIFIED: Self = Self {
        category: FileCategory::Unidentified,
        stage: None,
    };
}

#[derive(Debug, Clone)]
pub struct Categorizer {
    table: Arc<PatternTable>,
    probe_bytes: usize,
    mode: CategorizeMode,
}

impl Categorizer {
    /// Categorizer over the built-in table.
    pub fn new(config: &CategorizeConfig) -> Result<Self, CategorizeError> {
        let table = PatternTable::builtin(config.min_line_hits)?;
        Ok(Self::with_table(Arc::new(table), config.probe_bytes))
    }

    #[must_use]
    pub const fn with_table(table: Arc<PatternTable>, probe_bytes: usize) -> Self {
        Self {
            table,
            probe_bytes,
            mode: CategorizeMode::All,
        }
    }

    #[must_use]
    pub const fn with_mode(mut self, mode: CategorizeMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub const fn mode(&self) -> CategorizeMode {
        self.mode
    }

    /// Classify one file: filename, then directory, then content.
    ///
    /// Opaque nested archives never reach the content stage. A file whose
    /// head cannot be read is left to the earlier stages.
    #[must_use]
    pub fn classify(&self, file: &ExtractedFile) -> Decision {
        let admits = |row: &PatternRow| self.mode.admits(row);

        let name = file.file_name().to_lowercase();
        if let Some(row) = self.table.first_match(Stage::Filename, [name.as_str()], admits) {
            return decided(row);
        }

        let dirs: Vec<String> = file.parent_dirs().map(str::to_lowercase).collect();
        if let Some(row) = self
            .table
            .first_match(Stage::Directory, dirs.iter().map(String::as_str), admits)
        {
            return decided(row);
        }

        if file.is_opaque() || self.mode == CategorizeMode::RegistryOnly {
            return Decision::UNIDENTIFIED;
        }

        match read_head(&file.path, self.probe_bytes) {
            Ok(head) => {
                let probe = text::decode(&head).to_lowercase();
                self.table
                    .first_match(Stage::Content, [probe.as_str()], admits)
                    .map_or(Decision::UNIDENTIFIED, decided)
            }
            Err(error) => {
                tracing::warn!(path = %file.path.display(), %error, "content probe failed");
                Decision::UNIDENTIFIED
            }
        }
    }

    /// Partition files and records into category buckets.
    ///
    /// Every archive entry lands in exactly one bucket. Records go to the
    /// embedded-configuration bucket unless the mode is registry-only. A file
    /// unpacked from the same entry as a record is represented by the record
    /// alone.
    #[must_use]
    pub fn categorize(&self, files: Vec<ExtractedFile>, records: Vec<RecordBuffer>) -> CategoryBuckets {
        let mut buckets = CategoryBuckets::default();
        let recorded: HashSet<&[String]> = records.iter().map(|r| r.origin.as_slice()).collect();

        for file in files {
            if recorded.contains(file.origin.as_slice()) {
                tracing::debug!(file = %file.relative_path.display(), "already held as a record");
                continue;
            }
            let decision = self.classify(&file);
            tracing::debug!(
                file = %file.relative_path.display(),
                category = %decision.category,
                stage = ?decision.stage,
                "categorized"
            );
            buckets.push(
                decision.category,
                CategorizedItem::File {
                    file,
                    stage: decision.stage,
                },
            );
        }

        let record_category = match self.mode {
            CategorizeMode::All => FileCategory::EmbeddedConfigurationRecord,
            CategorizeMode::RegistryOnly => FileCategory::Unidentified,
        };
        for record in records {
            buckets.push(record_category, CategorizedItem::Record { record });
        }

        buckets
    }

    /// Categorize every regular file under an already-extracted directory.
    ///
    /// The walk applies no ignore rules and skips nothing but directories.
    pub fn categorize_dir(&self, root: &Path) -> Result<CategoryBuckets, CategorizeError> {
        let files = collect_files(root, self.probe_bytes)?;
        Ok(self.categorize(files, Vec::new()))
    }
}

const fn decided(row: &PatternRow) -> Decision {
    Decision {
        category: row.category,
        stage: Some(row.stage),
    }
}

fn read_head(path: &Path, limit: usize) -> std::io::Result<Vec<u8>> {
    let mut head = Vec::with_capacity(limit.min(64 * 1024));
    File::open(path)?
        .take(limit as u64)
        .read_to_end(&mut head)?;
    Ok(head)
}

fn collect_files(root: &Path, probe_bytes: usize) -> Result<Vec<ExtractedFile>, CategorizeError> {
    let walker = WalkBuilder::new(root)
        .standard_filters(false)
        .hidden(false)
        .follow_links(false)
        .sort_by_file_name(std::cmp::Ord::cmp)
        .build();

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_some_and(|kind| kind.is_file()) {
            continue;
        }
        let path = entry.path().to_path_buf();
        let relative_path = path.strip_prefix(root).map_or_else(|_| path.clone(), Path::to_path_buf);
        let io_error = |source| CategorizeError::Io {
            path: path.clone(),
            source,
        };
        let size = entry.metadata()?.len();
        let head = read_head(&path, probe_bytes).map_err(io_error)?;

        files.push(ExtractedFile {
            origin: vec![slash_path(&relative_path)],
            encoding: TextEncoding::detect(&head),
            path,
            relative_path,
            size,
            opaque: None,
        });
    }
    Ok(files)
}

fn slash_path(path: &Path) -> String {
    path.components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
