//! Companion-schema checks for embedded configuration records.
//!
//! A configuration record is paired with the schema document of the same
//! stem (`jddConfig.xml` ↔ `jddConfig.xsd`, case-insensitive). When several
//! schemas share the stem, the one whose containing archives match the
//! record's longest wins; ties go to the first in scan order. The check is
//! structural: the record must be well-formed and every element name it
//! uses must be declared by an `xs:element name="…"` in the schema.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use atlog_core::{RecordBuffer, RecordKind};
use quick_xml::Reader;
use quick_xml::events::Event;
use regex::Regex;
use serde::Serialize;
use tracing::debug;

static HTML_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Outcome of validating one configuration record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ValidationStatus {
    Valid,
    /// Element names used by the record but not declared in its schema.
    Undeclared { names: Vec<String> },
    /// The record or its schema is not well-formed XML.
    Malformed { reason: String },
    NoSchema,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordValidation {
    pub record: String,
    pub origin: Vec<String>,
    #[serde(flatten)]
    pub status: ValidationStatus,
}

/// Validate every configuration record against its companion schema.
#[must_use]
pub fn validate_records(records: &[RecordBuffer]) -> Vec<RecordValidation> {
    let schemas: Vec<&RecordBuffer> = records
        .iter()
        .filter(|r| r.kind == RecordKind::SchemaDocumentation)
        .collect();

    records
        .iter()
        .filter(|r| r.kind == RecordKind::Configuration)
        .map(|record| {
            let status = companion_schema(record, &schemas)
                .map_or(ValidationStatus::NoSchema, |schema| {
                    validate_pair(&record.text(), &schema.text())
                });
            debug!(record = record.name(), ?status, "companion validation");
            RecordValidation {
                record: record.name().to_string(),
                origin: record.origin.clone(),
                status,
            }
        })
        .collect()
}

fn companion_schema<'a>(
    record: &RecordBuffer,
    schemas: &[&'a RecordBuffer],
) -> Option<&'a RecordBuffer> {
    let stem = record.stem();
    let mut best: Option<(usize, &RecordBuffer)> = None;
    for &schema in schemas.iter().filter(|schema| schema.stem() == stem) {
        let shared = shared_containers(&record.origin, &schema.origin);
        if best.is_none_or(|(most, _)| shared > most) {
            best = Some((shared, schema));
        }
    }
    best.map(|(_, schema)| schema)
}

/// Number of leading archives two origin chains have in common.
fn shared_containers(a: &[String], b: &[String]) -> usize {
    let containers = |origin: &[String]| origin.len().saturating_sub(1);
    a[..containers(a)]
        .iter()
        .zip(&b[..containers(b)])
        .take_while(|(x, y)| x == y)
        .count()
}

fn validate_pair(record: &str, schema: &str) -> ValidationStatus {
    let declared = match declared_elements(schema) {
        Ok(declared) => declared,
        Err(reason) => {
            return ValidationStatus::Malformed {
                reason: format!("schema: {reason}"),
            };
        }
    };
    let used = match used_elements(record) {
        Ok(used) => used,
        Err(reason) => return ValidationStatus::Malformed { reason },
    };

    let names: Vec<String> = used.difference(&declared).cloned().collect();
    if names.is_empty() {
        ValidationStatus::Valid
    } else {
        ValidationStatus::Undeclared { names }
    }
}

fn local(name: &[u8]) -> String {
    String::from_utf8_lossy(name).into_owned()
}

/// Element local names used in a document, failing on malformed XML.
fn used_elements(xml: &str) -> Result<BTreeSet<String>, String> {
    let mut reader = Reader::from_str(xml);
    let mut used = BTreeSet::new();
    let mut depth = 0usize;
    let mut saw_root = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                used.insert(local(e.local_name().as_ref()));
                depth += 1;
                saw_root = true;
            }
            Ok(Event::Empty(e)) => {
                used.insert(local(e.local_name().as_ref()));
                saw_root = true;
            }
            Ok(Event::End(_)) => depth = depth.saturating_sub(1),
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(format!(
                    "at byte {}: {e}",
                    reader.error_position()
                ));
            }
        }
    }

    if depth > 0 {
        return Err("unexpected end of document".to_string());
    }
    if !saw_root {
        return Err("no root element".to_string());
    }
    Ok(used)
}

/// Names declared by `xs:element name="…"` in a schema document.
fn declared_elements(xsd: &str) -> Result<BTreeSet<String>, String> {
    Ok(schema_docs_inner(xsd)?.into_keys().collect())
}

/// Element name → documentation text from a schema document.
///
/// Elements without documentation map to an empty string. HTML inside
/// `xs:documentation`, escaped or not, is flattened to plain text.
pub fn schema_docs(xsd: &str) -> Result<BTreeMap<String, String>, String> {
    schema_docs_inner(xsd)
}

fn schema_docs_inner(xsd: &str) -> Result<BTreeMap<String, String>, String> {
    let mut reader = Reader::from_str(xsd);
    let mut docs: BTreeMap<String, String> = BTreeMap::new();
    // Innermost-first stack of (local name, declared element name).
    let mut stack: Vec<(String, Option<String>)> = Vec::new();
    let mut doc_depth: Option<usize> = None;

    let element_name = |e: &quick_xml::events::BytesStart<'_>| -> Result<Option<String>, String> {
        if e.local_name().as_ref() != b"element" {
            return Ok(None);
        }
        e.try_get_attribute("name")
            .map_err(|err| err.to_string())?
            .map(|attr| attr.unescape_value().map(|v| v.trim().to_string()))
            .transpose()
            .map_err(|err| err.to_string())
    };

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = element_name(&e)?;
                if let Some(name) = &name {
                    docs.entry(name.clone()).or_default();
                }
                let tag = local(e.local_name().as_ref());
                if tag == "documentation" && doc_depth.is_none() {
                    doc_depth = Some(stack.len());
                }
                stack.push((tag, name));
            }
            Ok(Event::Empty(e)) => {
                if let Some(name) = element_name(&e)? {
                    docs.entry(name).or_default();
                }
            }
            Ok(Event::End(_)) => {
                stack.pop();
                if doc_depth.is_some_and(|d| stack.len() <= d) {
                    doc_depth = None;
                }
            }
            Ok(Event::Text(t)) if doc_depth.is_some() => {
                let text = t.unescape().map_err(|e| e.to_string())?;
                append_doc(&mut docs, &stack, &text);
            }
            Ok(Event::CData(c)) if doc_depth.is_some() => {
                let text = String::from_utf8_lossy(&c.into_inner()).into_owned();
                append_doc(&mut docs, &stack, &text);
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(format!("at byte {}: {e}", reader.error_position())),
        }
    }

    if !stack.is_empty() {
        return Err("unexpected end of document".to_string());
    }
    Ok(docs)
}

fn append_doc(docs: &mut BTreeMap<String, String>, stack: &[(String, Option<String>)], text: &str) {
    let Some(owner) = stack.iter().rev().find_map(|(_, name)| name.as_ref()) else {
        return;
    };
    let plain = HTML_TAG.replace_all(text, " ");
    let plain = WHITESPACE.replace_all(plain.trim(), " ");
    if plain.is_empty() {
        return;
    }
    let slot = docs.entry(owner.clone()).or_default();
    if !slot.is_empty() {
        slot.push(' ');
    }
    slot.push_str(&plain);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const XSD: &str = r#"<?xml version="1.0"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
  <xs:element name="jddConfig">
    <xs:annotation>
      <xs:documentation>Root of the &lt;b&gt;device&lt;/b&gt; configuration.</xs:documentation>
    </xs:annotation>
    <xs:complexType>
      <xs:sequence>
        <xs:element name="dispenser">
          <xs:annotation><xs:documentation><p>Cash   <i>dispenser</i> settings</p></xs:documentation></xs:annotation>
        </xs:element>
        <xs:element name="timeout" type="xs:int"/>
      </xs:sequence>
    </xs:complexType>
  </xs:element>
</xs:schema>"#;

    fn record(kind: RecordKind, name: &str, text: &str) -> RecordBuffer {
        RecordBuffer::new(kind, vec![name.to_string()], text.as_bytes().to_vec())
    }

    #[test]
    fn docs_are_flattened_to_plain_text() {
        let docs = schema_docs(XSD).unwrap();
        assert_eq!(docs["jddConfig"], "Root of the device configuration.");
        assert_eq!(docs["dispenser"], "Cash dispenser settings");
        assert_eq!(docs["timeout"], "");
    }

    #[test]
    fn pairs_records_with_schema_by_stem() {
        let records = vec![
            record(RecordKind::SchemaDocumentation, "JDDCONFIG.xsd", XSD),
            record(
                RecordKind::Configuration,
                "jddConfig.xml",
                "<jddConfig><dispenser/><timeout>30</timeout></jddConfig>",
            ),
            record(
                RecordKind::Configuration,
                "jddconfig.XML",
                "<jddConfig><printer/></jddConfig>",
            ),
            record(RecordKind::Configuration, "x3Other.xml", "<x3/>"),
            record(RecordKind::Configuration, "jddConfig_broken.xml", "<a>"),
        ];

        let results = validate_records(&records);
        let statuses: Vec<&ValidationStatus> = results.iter().map(|r| &r.status).collect();
        assert_eq!(statuses[0], &ValidationStatus::Valid);
        assert_eq!(
            statuses[1],
            &ValidationStatus::Undeclared {
                names: vec!["printer".to_string()]
            }
        );
        assert_eq!(statuses[2], &ValidationStatus::NoSchema);
        assert_eq!(statuses[3], &ValidationStatus::NoSchema);
    }

    #[test]
    fn schema_from_the_same_archive_wins() {
        let nested = |chain: &[&str], kind, text: &str| {
            RecordBuffer::new(
                kind,
                chain.iter().map(ToString::to_string).collect(),
                text.as_bytes().to_vec(),
            )
        };
        let narrow = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
  <xs:element name="jddConfig"/>
</xs:schema>"#;
        let records = vec![
            nested(&["jddConfig.xsd"], RecordKind::SchemaDocumentation, XSD),
            nested(&["inner.zip", "jddConfig.xsd"], RecordKind::SchemaDocumentation, narrow),
            nested(
                &["inner.zip", "jddConfig.xml"],
                RecordKind::Configuration,
                "<jddConfig><dispenser/></jddConfig>",
            ),
            nested(
                &["jddConfig.xml"],
                RecordKind::Configuration,
                "<jddConfig><dispenser/></jddConfig>",
            ),
        ];

        let results = validate_records(&records);
        assert_eq!(
            results[0].status,
            ValidationStatus::Undeclared {
                names: vec!["dispenser".to_string()]
            }
        );
        assert_eq!(results[1].status, ValidationStatus::Valid);
    }

    #[test]
    fn malformed_record_is_reported() {
        let status = validate_pair("<jddConfig><dispenser></jddConfig>", XSD);
        assert!(matches!(status, ValidationStatus::Malformed { .. }));
        let status = validate_pair("<jddConfig>", XSD);
        assert!(matches!(status, ValidationStatus::Malformed { .. }));
    }
}
