//! Compiled, immutable transaction rules.

use std::collections::{HashMap, HashSet};

use atlog_core::JournalKind;
use regex::Regex;
use serde::Serialize;

use crate::document::{LegacyParsing, OutcomeSpec, RuleDocument, RuleSpec};
use crate::error::RuleError;

/// Type id of the rule compiled from a `<customerJournalParsing>` section.
pub const LEGACY_RULE_TYPE: &str = "transaction";

/// Record prefix of a customer journal line: `HH:MM:SS` then the TID.
const TID_PREFIX: &str = r"^\d{2}:\d{2}:\d{2}\s+";

const LEGACY_TRANSACTION_ID: &str = r"Transaction no\. '([^']*)'";
const LEGACY_FUNCTION: &str = r"Function\s+'([^']+)'";
const LEGACY_SUCCESS: &str = r"end-state'[Nn]'|state '[Nn]'";
const LEGACY_FAILURE: &str = r"end-state'[EeCc]'|state '[EeCc]'";

/// One field extraction rule.
#[derive(Debug, Clone)]
pub struct FieldRule {
    pub name: String,
    pub pattern: Regex,
    pub translate: bool,
}

impl FieldRule {
    /// First capture group of the first match, or the whole match without groups.
    #[must_use]
    pub fn extract<'t>(&self, text: &'t str) -> Option<&'t str> {
        let captures = self.pattern.captures(text)?;
        captures
            .get(1)
            .or_else(|| captures.get(0))
            .map(|m| m.as_str().trim())
    }
}

#[derive(Debug, Clone, Default)]
pub struct OutcomeRule {
    pub success: Option<Regex>,
    pub failure: Option<Regex>,
}

/// Boundaries and extraction rules for one transaction type.
#[derive(Debug, Clone)]
pub struct TransactionRule {
    pub transaction_type: String,
    pub journal: JournalKind,
    pub start: Regex,
    pub end: Regex,
    pub fields: Vec<FieldRule>,
    pub outcome: Option<OutcomeRule>,
}

/// All transaction rules of one document plus its alias map.
///
/// Immutable once built; shared as `Arc<RuleTable>`.
#[derive(Debug, Clone, Default)]
pub struct RuleTable {
    rules: Vec<TransactionRule>,
    aliases: HashMap<String, String>,
}

/// Serializable description of a compiled table.
#[derive(Debug, Clone, Serialize)]
pub struct RuleSummary {
    pub rules: Vec<RuleInfo>,
    pub aliases: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RuleInfo {
    pub transaction_type: String,
    pub journal: JournalKind,
    pub start: String,
    pub end: String,
    pub fields: Vec<String>,
}

fn compile(pattern: &str, context: impl FnOnce() -> String) -> Result<Regex, RuleError> {
    Regex::new(pattern.trim()).map_err(|source| RuleError::InvalidPattern {
        context: context(),
        source: Box::new(source),
    })
}

fn tid_pattern(tids: &[String]) -> String {
    let alternatives: Vec<String> = tids.iter().map(|tid| regex::escape(tid)).collect();
    format!(r"{TID_PREFIX}(?:{})\b", alternatives.join("|"))
}

impl RuleTable {
    /// Parse, validate and compile rule document text.
    pub fn from_xml(text: &str) -> Result<Self, RuleError> {
        let doc = RuleDocument::from_xml(text)?;
        crate::schema::validate(&doc, None)?;
        Self::from_document(&doc)
    }

    /// Compile an already validated document.
    pub fn from_document(doc: &RuleDocument) -> Result<Self, RuleError> {
        let aliases = doc
            .transaction_list
            .iter()
            .flat_map(|list| &list.entries)
            .map(|entry| (entry.key.trim().to_string(), entry.value.trim().to_string()))
            .collect();

        let mut rules = Vec::new();
        let mut seen = HashSet::new();

        let specs = doc.rules.iter().flat_map(|set| &set.rules);
        for spec in specs {
            let rule = Self::compile_rule(spec)?;
            if !seen.insert(rule.transaction_type.clone()) {
                return Err(RuleError::DuplicateType(rule.transaction_type));
            }
            rules.push(rule);
        }

        if let Some(legacy) = &doc.legacy {
            let rule = Self::compile_legacy(legacy)?;
            if !seen.insert(rule.transaction_type.clone()) {
                return Err(RuleError::DuplicateType(rule.transaction_type));
            }
            rules.push(rule);
        }

        if rules.is_empty() {
            return Err(RuleError::Empty);
        }
        Ok(Self { rules, aliases })
    }

    fn compile_rule(spec: &RuleSpec) -> Result<TransactionRule, RuleError> {
        let name = spec.transaction_type.trim().to_string();
        let journal =
            JournalKind::parse(&spec.journal).ok_or_else(|| RuleError::UnknownJournal {
                rule: name.clone(),
                journal: spec.journal.clone(),
            })?;

        let fields = spec
            .fields
            .iter()
            .map(|field| {
                Ok(FieldRule {
                    name: field.name.trim().to_string(),
                    pattern: compile(&field.pattern, || {
                        format!("rule '{name}' field '{}'", field.name)
                    })?,
                    translate: field.translate,
                })
            })
            .collect::<Result<Vec<_>, RuleError>>()?;

        Ok(TransactionRule {
            start: compile(&spec.start, || format!("rule '{name}' start"))?,
            end: compile(&spec.end, || format!("rule '{name}' end"))?,
            outcome: spec
                .outcome
                .as_ref()
                .map(|outcome| Self::compile_outcome(&name, outcome))
                .transpose()?,
            transaction_type: name,
            journal,
            fields,
        })
    }

    fn compile_outcome(name: &str, spec: &OutcomeSpec) -> Result<OutcomeRule, RuleError> {
        let pattern = |value: Option<&str>, which: &str| {
            value
                .filter(|p| !p.trim().is_empty())
                .map(|p| compile(p, || format!("rule '{name}' outcome {which}")))
                .transpose()
        };
        Ok(OutcomeRule {
            success: pattern(spec.success.as_deref(), "success")?,
            failure: pattern(spec.failure.as_deref(), "failure")?,
        })
    }

    fn compile_legacy(legacy: &LegacyParsing) -> Result<TransactionRule, RuleError> {
        let start_tids = legacy.start_tids();
        let end_tids = legacy.end_tids();
        if start_tids.is_empty() || end_tids.is_empty() {
            return Err(RuleError::SchemaInvalid {
                errors: vec!["customerJournalParsing needs start and end TIDs".to_string()],
            });
        }

        let context = |what: &str| format!("rule '{LEGACY_RULE_TYPE}' {what}");
        Ok(TransactionRule {
            transaction_type: LEGACY_RULE_TYPE.to_string(),
            journal: JournalKind::Customer,
            start: compile(&tid_pattern(&start_tids), || context("start"))?,
            end: compile(&tid_pattern(&end_tids), || context("end"))?,
            fields: vec![
                FieldRule {
                    name: "transaction_id".to_string(),
                    pattern: compile(LEGACY_TRANSACTION_ID, || context("transaction_id"))?,
                    translate: false,
                },
                FieldRule {
                    name: "function".to_string(),
                    pattern: compile(LEGACY_FUNCTION, || context("function"))?,
                    translate: true,
                },
            ],
            outcome: Some(OutcomeRule {
                success: Some(compile(LEGACY_SUCCESS, || context("outcome"))?),
                failure: Some(compile(LEGACY_FAILURE, || context("outcome"))?),
            }),
        })
    }

    #[must_use]
    pub fn rules(&self) -> &[TransactionRule] {
        &self.rules
    }

    /// Rules for one journal kind, in document order.
    pub fn rules_for(&self, journal: JournalKind) -> impl Iterator<Item = &TransactionRule> {
        self.rules.iter().filter(move |rule| rule.journal == journal)
    }

    #[must_use]
    pub fn rule(&self, transaction_type: &str) -> Option<&TransactionRule> {
        self.rules
            .iter()
            .find(|rule| rule.transaction_type == transaction_type)
    }

    /// Alias for a transaction code, or the code itself.
    #[must_use]
    pub fn translate<'a>(&'a self, code: &'a str) -> &'a str {
        self.aliases.get(code).map_or(code, String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    #[must_use]
    pub fn summary(&self) -> RuleSummary {
        RuleSummary {
            rules: self
                .rules
                .iter()
                .map(|rule| RuleInfo {
                    transaction_type: rule.transaction_type.clone(),
                    journal: rule.journal,
                    start: rule.start.as_str().to_string(),
                    end: rule.end.as_str().to_string(),
                    fields: rule.fields.iter().map(|f| f.name.clone()).collect(),
                })
                .collect(),
            aliases: self.aliases.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    const LEGACY: &str = r"<configuration>
        <transactionList>
          <transaction><key>COUT</key><value>Withdrawal</value></transaction>
        </transactionList>
        <customerJournalParsing>
          <starttransaction>3201</starttransaction>
          <endtransaction>3202</endtransaction>
          <chainingtransaction>3207</chainingtransaction>
        </customerJournalParsing>
      </configuration>";

    #[test]
    fn legacy_section_compiles_into_transaction_rule() {
        let table = RuleTable::from_xml(LEGACY).unwrap();
        assert_eq!(table.len(), 1);

        let rule = table.rule(LEGACY_RULE_TYPE).unwrap();
        assert_eq!(rule.journal, JournalKind::Customer);
        assert!(rule.start.is_match("10:15:02 3201 Transaction no. '0042' started"));
        assert!(rule.start.is_match("10:15:02 3207 chained"));
        assert!(!rule.start.is_match("10:15:02 32011 other"));
        assert!(rule.end.is_match("10:16:40 3202 end-state'N'"));
        assert_eq!(table.translate("COUT"), "Withdrawal");
        assert_eq!(table.translate("CIN"), "CIN");
    }

    #[rstest]
    #[case("10:16:40 3202 Transaction end-state'N'", true, false)]
    #[case("10:16:40 3202 Transaction state 'n'", true, false)]
    #[case("10:16:40 3202 Transaction end-state'E'", false, true)]
    #[case("10:16:40 3202 Transaction state 'C'", false, true)]
    #[case("10:16:40 3202 Transaction end-state'X'", false, false)]
    fn legacy_outcome_patterns(#[case] line: &str, #[case] success: bool, #[case] failure: bool) {
        let table = RuleTable::from_xml(LEGACY).unwrap();
        let outcome = table.rules()[0].outcome.as_ref().unwrap();
        assert_eq!(outcome.success.as_ref().unwrap().is_match(line), success);
        assert_eq!(outcome.failure.as_ref().unwrap().is_match(line), failure);
    }

    #[test]
    fn field_extracts_first_group() {
        let table = RuleTable::from_xml(LEGACY).unwrap();
        let fields = &table.rules()[0].fields;
        assert_eq!(
            fields[0].extract("10:15:02 3201 Transaction no. '0042' started"),
            Some("0042")
        );
        assert_eq!(fields[1].extract("10:15:05 3217 Function 'COUT' selected"), Some("COUT"));
        assert_eq!(fields[1].extract("10:15:05 3217 nothing here"), None);
    }

    #[test]
    fn invalid_regex_is_reported_with_context() {
        let err = RuleTable::from_xml(
            r#"<configuration><rules>
                 <rule type="broken" journal="ui"><start>([</start><end>x</end></rule>
               </rules></configuration>"#,
        )
        .unwrap_err();
        match err {
            RuleError::InvalidPattern { context, .. } => assert_eq!(context, "rule 'broken' start"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn duplicate_types_are_rejected() {
        let err = RuleTable::from_xml(
            r#"<configuration><rules>
                 <rule type="a" journal="ui"><start>s</start><end>e</end></rule>
                 <rule type="a" journal="customer"><start>s</start><end>e</end></rule>
               </rules></configuration>"#,
        )
        .unwrap_err();
        assert!(matches!(err, RuleError::DuplicateType(t) if t == "a"));
    }

    #[test]
    fn unknown_journal_is_rejected() {
        let err = RuleTable::from_xml(
            r#"<configuration><rules>
                 <rule type="a" journal="trace"><start>s</start><end>e</end></rule>
               </rules></configuration>"#,
        )
        .unwrap_err();
        assert!(matches!(err, RuleError::UnknownJournal { .. }));
    }

    #[test]
    fn document_without_rules_is_empty() {
        let err = RuleTable::from_xml("<configuration></configuration>").unwrap_err();
        assert!(matches!(err, RuleError::Empty));
    }

    #[test]
    fn rules_for_filters_by_journal_in_order() {
        let table = RuleTable::from_xml(
            r#"<configuration><rules>
                 <rule type="w" journal="customer"><start>s</start><end>e</end></rule>
                 <rule type="nav" journal="ui"><start>s</start><end>e</end></rule>
                 <rule type="d" journal="customer"><start>s</start><end>e</end></rule>
               </rules></configuration>"#,
        )
        .unwrap();
        let names: Vec<&str> = table
            .rules_for(JournalKind::Customer)
            .map(|r| r.transaction_type.as_str())
            .collect();
        assert_eq!(names, vec!["w", "d"]);
    }
}
