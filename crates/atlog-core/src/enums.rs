//! Closed enums for categories, record kinds, journal kinds and flow states.
//!
//! Category variants serialize to the bucket keys used by downstream
//! consumers (`customer_journals`, `trc_trace`, ...). All other enums use
//! `snake_case` serialization.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// FileCategory
// ---------------------------------------------------------------------------

/// Semantic category of an extracted file or in-memory record.
///
/// The taxonomy is a partition: every input is assigned exactly one variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FileCategory {
    #[serde(rename = "customer_journals")]
    CustomerJournal,
    #[serde(rename = "ui_journals")]
    UiJournal,
    #[serde(rename = "trc_trace")]
    TraceLog,
    #[serde(rename = "registry_files")]
    RegistryFile,
    #[serde(rename = "acu_files")]
    EmbeddedConfigurationRecord,
    #[serde(rename = "unidentified")]
    Unidentified,
}

impl FileCategory {
    /// Every category, in bucket order.
    pub const ALL: [Self; 6] = [
        Self::CustomerJournal,
        Self::UiJournal,
        Self::TraceLog,
        Self::RegistryFile,
        Self::EmbeddedConfigurationRecord,
        Self::Unidentified,
    ];

    /// Bucket key used in serialized output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CustomerJournal => "customer_journals",
            Self::UiJournal => "ui_journals",
            Self::TraceLog => "trc_trace",
            Self::RegistryFile => "registry_files",
            Self::EmbeddedConfigurationRecord => "acu_files",
            Self::Unidentified => "unidentified",
        }
    }

    /// Journal kind for journal categories, `None` for everything else.
    #[must_use]
    pub const fn journal_kind(self) -> Option<JournalKind> {
        match self {
            Self::CustomerJournal => Some(JournalKind::Customer),
            Self::UiJournal => Some(JournalKind::Ui),
            _ => None,
        }
    }
}

impl fmt::Display for FileCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// RecordKind
// ---------------------------------------------------------------------------

/// Kind of an embedded record pulled out of an archive by the scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    /// Structured configuration document (`jdd*.xml`, `x3*.xml`).
    Configuration,
    /// Companion schema carrying element documentation (`*.xsd`).
    SchemaDocumentation,
}

impl RecordKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Configuration => "configuration",
            Self::SchemaDocumentation => "schema_documentation",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// JournalKind
// ---------------------------------------------------------------------------

/// Which family of journal a transaction rule applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JournalKind {
    Customer,
    Ui,
}

impl JournalKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Ui => "ui",
        }
    }

    /// Parse the textual form used in rule documents.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "customer" => Some(Self::Customer),
            "ui" => Some(Self::Ui),
            _ => None,
        }
    }
}

impl fmt::Display for JournalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// FlowStatus
// ---------------------------------------------------------------------------

/// Whether a flow was closed by its end marker.
///
/// ```text
/// open → complete     (end marker seen)
///      → incomplete   (new start for the same type, or end of file)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowStatus {
    Complete,
    Incomplete,
}

impl FlowStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Complete => "complete",
            Self::Incomplete => "incomplete",
        }
    }
}

impl fmt::Display for FlowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// FlowOutcome
// ---------------------------------------------------------------------------

/// Business outcome of a transaction, derived from the rule's outcome patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowOutcome {
    Successful,
    Unsuccessful,
    Unknown,
}

impl FlowOutcome {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Successful => "successful",
            Self::Unsuccessful => "unsuccessful",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for FlowOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// DiffStepKind
// ---------------------------------------------------------------------------

/// Classification of one step in a UI path alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffStepKind {
    /// Present in both paths at aligned positions.
    Matched,
    /// Present only in the left path.
    Deleted,
    /// Present only in the right path.
    Inserted,
}

impl fmt::Display for DiffStepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Matched => "matched",
            Self::Deleted => "deleted",
            Self::Inserted => "inserted",
        })
    }
}
