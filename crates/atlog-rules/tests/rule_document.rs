//! End-to-end loading of a complete rule document from disk.

use atlog_core::JournalKind;
use atlog_rules::{RuleError, RuleLoader, load_global, read_rule_file};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

const DOCUMENT: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<configuration>
  <transactionList>
    <transaction><key>COUT</key><value>Withdrawal</value></transaction>
    <transaction><key>BAL</key><value>Balance Inquiry</value></transaction>
  </transactionList>
  <rules>
    <rule type="withdrawal" journal="customer">
      <start>^\d{2}:\d{2}:\d{2}\s+3201\b</start>
      <end>^\d{2}:\d{2}:\d{2}\s+3202\b</end>
      <field name="transaction_id" pattern="Transaction no\. '([^']*)'"/>
      <field name="function" pattern="Function\s+'([^']+)'" translate="true"/>
      <outcome success="end-state'[Nn]'" failure="end-state'[EeCc]'"/>
    </rule>
    <rule type="navigation" journal="ui">
      <start>CardInserted</start>
      <end>CardEjected</end>
      <field name="screen" pattern="-\s+(\w+)\s+(?:result|action):"/>
    </rule>
  </rules>
</configuration>
"#;

fn write_document(dir: &TempDir, name: &str, text: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, text).unwrap();
    path
}

#[test]
fn full_document_compiles() {
    let dir = TempDir::new().unwrap();
    let path = write_document(&dir, "dnLogAtConfig.xml", DOCUMENT);

    let table = read_rule_file(&path).unwrap();
    assert_eq!(table.len(), 2);
    assert_eq!(table.translate("BAL"), "Balance Inquiry");

    let withdrawal = table.rule("withdrawal").unwrap();
    assert_eq!(withdrawal.journal, JournalKind::Customer);
    assert_eq!(withdrawal.fields.len(), 2);
    assert!(withdrawal.fields[1].translate);
    assert!(withdrawal.start.is_match("10:15:02 3201 start"));

    let navigation = table.rule("navigation").unwrap();
    assert_eq!(
        navigation.fields[0].extract("10:15:03 7 Ui > [1] - PinEntry action:{}"),
        Some("PinEntry")
    );

    let summary = table.summary();
    assert_eq!(summary.aliases, 2);
    assert_eq!(summary.rules[1].fields, vec!["screen"]);
}

#[test]
fn companion_schema_next_to_document_is_enforced() {
    let dir = TempDir::new().unwrap();
    let path = write_document(&dir, "dnLogAtConfig.xml", DOCUMENT);
    write_document(
        &dir,
        "dnLogAtConfig.schema.json",
        r#"{"type":"object","required":["customerJournalParsing"]}"#,
    );

    let err = RuleLoader::new(&path).load().unwrap_err();
    assert!(matches!(err, RuleError::SchemaInvalid { .. }), "{err}");
}

#[test]
fn global_loader_is_shared() {
    let dir = TempDir::new().unwrap();
    let path = write_document(&dir, "global.xml", DOCUMENT);

    let first = load_global(&path).unwrap();
    let second = load_global(&path).unwrap();
    assert!(std::sync::Arc::ptr_eq(&first, &second));
}
