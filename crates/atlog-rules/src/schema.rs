//! JSON Schema validation of parsed rule documents.
//!
//! The built-in schema is generated from [`RuleDocument`] with
//! [`schemars::schema_for!`]. A companion `<stem>.schema.json` next to the
//! document, when present, is enforced in addition.

use std::path::{Path, PathBuf};

use schemars::schema_for;
use tracing::debug;

use crate::document::RuleDocument;
use crate::error::RuleError;

/// Generated JSON Schema for [`RuleDocument`].
pub fn document_schema() -> Result<serde_json::Value, RuleError> {
    serde_json::to_value(schema_for!(RuleDocument)).map_err(|e| RuleError::SchemaInvalid {
        errors: vec![format!("schema generation: {e}")],
    })
}

/// Path of the optional companion schema for a rule document.
#[must_use]
pub fn companion_schema_path(document: &Path) -> PathBuf {
    document.with_extension("schema.json")
}

/// Validate `doc` against the generated schema and, if given, a companion schema.
pub fn validate(doc: &RuleDocument, companion: Option<&Path>) -> Result<(), RuleError> {
    let instance = serde_json::to_value(doc).map_err(|e| RuleError::SchemaInvalid {
        errors: vec![format!("document serialization: {e}")],
    })?;

    check(&document_schema()?, &instance)?;

    if let Some(path) = companion.filter(|p| p.is_file()) {
        debug!(path = %path.display(), "validating rule document against companion schema");
        let text = std::fs::read_to_string(path).map_err(|source| RuleError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let schema: serde_json::Value =
            serde_json::from_str(&text).map_err(|e| RuleError::SchemaInvalid {
                errors: vec![format!("companion schema {}: {e}", path.display())],
            })?;
        check(&schema, &instance)?;
    }
    Ok(())
}

fn check(schema: &serde_json::Value, instance: &serde_json::Value) -> Result<(), RuleError> {
    let validator = jsonschema::validator_for(schema).map_err(|e| RuleError::SchemaInvalid {
        errors: vec![format!("schema compilation: {e}")],
    })?;

    let errors: Vec<String> = validator
        .iter_errors(instance)
        .map(|e| format!("{e}"))
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(RuleError::SchemaInvalid { errors })
    }
}
