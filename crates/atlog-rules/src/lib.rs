//! # atlog-rules
//!
//! Loads the transaction rule document (XML) into an immutable [`RuleTable`].
//!
//! Loading runs in three steps:
//! 1. quick-xml serde parse into [`RuleDocument`]
//! 2. JSON Schema validation (generated schema plus optional companion
//!    `<stem>.schema.json`)
//! 3. compilation: regexes, duplicate type ids, journal kinds, non-empty table
//!
//! A `<customerJournalParsing>` section of TID lists compiles into a
//! customer-journal rule named [`LEGACY_RULE_TYPE`].

pub mod document;
pub mod error;
mod loader;
pub mod schema;
mod table;

pub use document::RuleDocument;
pub use error::RuleError;
pub use loader::{RuleLoader, load_global, read_rule_file};
pub use table::{
    FieldRule, LEGACY_RULE_TYPE, OutcomeRule, RuleInfo, RuleSummary, RuleTable, TransactionRule,
};
