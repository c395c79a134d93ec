//! The declarative pattern table.
//!
//! Each row is `(stage, matcher, category)`. Rows are evaluated by one
//! generic matcher ([`PatternTable::first_match`]); within a stage the first
//! matching row in table order wins. Subjects are lower-cased by the caller,
//! and every glob and regex is compiled case-insensitive.

use atlog_core::FileCategory;
use globset::{GlobBuilder, GlobMatcher};
use quick_xml::Reader;
use quick_xml::events::Event;
use regex::{Regex, RegexBuilder};
use serde::Serialize;

use crate::error::CategorizeError;

// ---------------------------------------------------------------------------
// Stage
// ---------------------------------------------------------------------------

/// Evaluation stage, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Basename tokens and globs.
    Filename,
    /// Parent directory names, nearest first.
    Directory,
    /// Head of the file content.
    Content,
}

impl Stage {
    pub const ALL: [Self; 3] = [Self::Filename, Self::Directory, Self::Content];
}

// ---------------------------------------------------------------------------
// Matcher
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum Matcher {
    /// Subject contains the token.
    Contains(String),
    /// Subject matches the glob.
    Glob(GlobMatcher),
    /// Subject is XML whose root element name starts with the prefix.
    XmlRoot(String),
    /// At least `min_line_hits` lines of the subject match.
    Lines(Regex),
}

impl Matcher {
    fn glob(pattern: &str) -> Result<Self, CategorizeError> {
        let glob = GlobBuilder::new(pattern)
            .case_insensitive(true)
            .literal_separator(true)
            .build()
            .map_err(|source| CategorizeError::InvalidGlob {
                pattern: pattern.to_string(),
                source,
            })?;
        Ok(Self::Glob(glob.compile_matcher()))
    }

    fn lines(pattern: &str) -> Result<Self, CategorizeError> {
        RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map(Self::Lines)
            .map_err(|source| CategorizeError::InvalidRegex {
                pattern: pattern.to_string(),
                source: Box::new(source),
            })
    }

    fn matches(&self, subject: &str, min_line_hits: usize) -> bool {
        match self {
            Self::Contains(token) => subject.contains(token.as_str()),
            Self::Glob(glob) => glob.is_match(subject),
            Self::XmlRoot(prefix) => xml_root(subject).is_some_and(|root| root.starts_with(prefix.as_str())),
            Self::Lines(regex) => {
                subject
                    .lines()
                    .filter(|line| regex.is_match(line))
                    .take(min_line_hits)
                    .count()
                    >= min_line_hits
            }
        }
    }
}

/// Name of the first element in an XML prefix, if it parses that far.
fn xml_root(text: &str) -> Option<String> {
    let mut reader = Reader::from_str(text.trim_start_matches('\u{feff}'));
    loop {
        match reader.read_event() {
            Ok(Event::Start(e) | Event::Empty(e)) => {
                return Some(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
            }
            Ok(Event::Decl(_) | Event::Comment(_) | Event::DocType(_) | Event::PI(_)) => {}
            Ok(Event::Text(t)) if t.iter().all(u8::is_ascii_whitespace) => {}
            _ => return None,
        }
    }
}

// ---------------------------------------------------------------------------
// PatternTable
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct PatternRow {
    pub stage: Stage,
    pub matcher: Matcher,
    pub category: FileCategory,
}

/// Ordered rows plus the line-hit threshold shared by line matchers.
#[derive(Debug, Clone)]
pub struct PatternTable {
    rows: Vec<PatternRow>,
    min_line_hits: usize,
}

/// `HH:MM:SS id module dir [view] - screen result|action:`
pub const UI_LINE: &str =
    r"^\d{2}:\d{2}:\d{2}\s+\d+\s+\w+\s+[<>*]\s+\[\d+\]\s+-\s+\w+\s+(result|action):";
/// Centisecond timestamp, process id and data marker on one line.
pub const TRC_LINE: &str = r"\d{2}:\d{2}:\d{2}\.\d{2}.*PID:\w+\.\w+.*Data:";
/// Optional `dd/mm/yyyy`, `HH:MM:SS`, then a numeric TID.
pub const CUSTOMER_LINE: &str = r"^(?:\d{2}/\d{2}/\d{4}\s+)?\d{2}:\d{2}:\d{2}\s+\d+\b";

impl PatternTable {
    /// The built-in categorization table.
    pub fn builtin(min_line_hits: usize) -> Result<Self, CategorizeError> {
        use FileCategory::{
            CustomerJournal, EmbeddedConfigurationRecord, RegistryFile, TraceLog, UiJournal,
        };
        use Stage::{Content, Directory, Filename};

        let contains = |token: &str| Matcher::Contains(token.to_string());
        let row = |stage, matcher, category| PatternRow {
            stage,
            matcher,
            category,
        };

        let rows = vec![
            // Registry rows come first; registry-only mode stops after them.
            row(Filename, contains("reg.txt"), RegistryFile),
            row(Filename, Matcher::glob("reg*.txt")?, RegistryFile),
            row(Filename, Matcher::glob("*.reg")?, RegistryFile),
            row(Filename, contains("customerjournal"), CustomerJournal),
            row(Filename, contains("customer_journal"), CustomerJournal),
            row(Filename, contains("uijournal"), UiJournal),
            row(Filename, contains("ui_journal"), UiJournal),
            row(Filename, Matcher::glob("*.trc")?, TraceLog),
            row(Filename, contains("trc_trace"), TraceLog),
            row(Filename, contains("trc_error"), TraceLog),
            row(Filename, Matcher::glob("{jdd,x3}*.{xml,xsd}")?, EmbeddedConfigurationRecord),
            row(Directory, contains("customerjournal"), CustomerJournal),
            row(Directory, contains("customer_journal"), CustomerJournal),
            row(Directory, contains("uijournal"), UiJournal),
            row(Directory, contains("ui_journal"), UiJournal),
            row(Directory, contains("trace"), TraceLog),
            row(Directory, contains("registry"), RegistryFile),
            row(Content, contains("customer journal"), CustomerJournal),
            row(Content, contains("ui journal"), UiJournal),
            row(Content, contains("trc_error"), TraceLog),
            row(Content, contains("trc_trace"), TraceLog),
            row(Content, contains("windows registry editor"), RegistryFile),
            row(Content, contains("regedit4"), RegistryFile),
            row(Content, Matcher::XmlRoot("jdd".into()), EmbeddedConfigurationRecord),
            row(Content, Matcher::XmlRoot("x3".into()), EmbeddedConfigurationRecord),
            row(Content, Matcher::lines(UI_LINE)?, UiJournal),
            row(Content, Matcher::lines(TRC_LINE)?, TraceLog),
            row(Content, Matcher::lines(CUSTOMER_LINE)?, CustomerJournal),
        ];

        Ok(Self::new(rows, min_line_hits))
    }

    #[must_use]
    pub fn new(rows: Vec<PatternRow>, min_line_hits: usize) -> Self {
        Self {
            rows,
            min_line_hits: min_line_hits.max(1),
        }
    }

    #[must_use]
    pub fn rows(&self) -> &[PatternRow] {
        &self.rows
    }

    /// First row of `stage` (table order) matching any subject, subjects in order.
    ///
    /// `filter` restricts which rows take part.
    pub fn first_match<'s>(
        &self,
        stage: Stage,
        subjects: impl IntoIterator<Item = &'s str>,
        filter: impl Fn(&PatternRow) -> bool,
    ) -> Option<&PatternRow> {
        let rows: Vec<&PatternRow> = self
            .rows
            .iter()
            .filter(|row| row.stage == stage && filter(row))
            .collect();
        subjects.into_iter().find_map(|subject| {
            rows.iter()
                .copied()
                .find(|row| row.matcher.matches(subject, self.min_line_hits))
        })
    }
}
