//! Rule loading error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from loading or compiling a transaction rule document.
///
/// All of these are fatal for flow analysis.
#[derive(Debug, Error)]
pub enum RuleError {
    #[error("rule document not found: {}", path.display())]
    Missing { path: PathBuf },

    #[error("failed to read rule document {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document is not well-formed or does not match the expected layout.
    #[error("malformed rule document: {0}")]
    Xml(#[from] quick_xml::DeError),

    /// The parsed document failed JSON Schema validation.
    #[error("rule document failed schema validation: {errors:?}")]
    SchemaInvalid { errors: Vec<String> },

    #[error("invalid pattern in {context}: {source}")]
    InvalidPattern {
        context: String,
        #[source]
        source: Box<regex::Error>,
    },

    #[error("duplicate transaction type '{0}'")]
    DuplicateType(String),

    #[error("unknown journal kind '{journal}' in rule '{rule}'")]
    UnknownJournal { rule: String, journal: String },

    #[error("rule document defines no transaction rules")]
    Empty,
}
