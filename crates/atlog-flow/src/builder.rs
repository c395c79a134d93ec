//! Rule-driven reconstruction of transaction flows from journals.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use atlog_core::{
    EventField, FileCategory, FlowOutcome, FlowStatus, JournalKind, TransactionEvent,
    TransactionFlow, text,
};
use atlog_rules::{RuleTable, TransactionRule};

use crate::error::FlowError;
use crate::journal::{JournalRecord, read_records};

/// Field whose value identifies a transaction instance.
pub const TRANSACTION_ID_FIELD: &str = "transaction_id";

/// Builds flows from journals using a shared rule table.
#[derive(Debug, Clone)]
pub struct FlowBuilder {
    rules: Arc<RuleTable>,
}

struct OpenFlow<'r> {
    rule: &'r TransactionRule,
    events: Vec<TransactionEvent>,
}

impl FlowBuilder {
    #[must_use]
    pub const fn new(rules: Arc<RuleTable>) -> Self {
        Self { rules }
    }

    #[must_use]
    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    /// Build flows from a categorized journal file.
    pub fn build(&self, path: &Path, category: FileCategory) -> Result<Vec<TransactionFlow>, FlowError> {
        let kind = category.journal_kind().ok_or_else(|| FlowError::NotAJournal {
            path: path.to_path_buf(),
            category,
        })?;
        let bytes = std::fs::read(path).map_err(|source| FlowError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let source = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |name| name.to_string_lossy().into_owned());
        Ok(self.build_text(&source, &text::decode(&bytes), kind))
    }

    /// Build flows from journal text.
    ///
    /// Flows come back ordered by the line of their start record.
    #[must_use]
    pub fn build_text(&self, source: &str, text: &str, kind: JournalKind) -> Vec<TransactionFlow> {
        let rules: Vec<&TransactionRule> = self.rules.rules_for(kind).collect();
        let mut open: HashMap<&str, OpenFlow<'_>> = HashMap::new();
        let mut done: Vec<TransactionFlow> = Vec::new();

        for record in read_records(source, text) {
            for &rule in &rules {
                let key = rule.transaction_type.as_str();
                let starts = rule.start.is_match(&record.text);

                if let Some(mut flow) = open.remove(key) {
                    if starts {
                        tracing::debug!(source, line = record.line, rule = key, "flow restarted");
                        done.push(close(source, kind, flow, FlowStatus::Incomplete));
                    } else {
                        flow.events.push(self.event(source, rule, &record));
                        if rule.end.is_match(&record.text) {
                            done.push(close(source, kind, flow, FlowStatus::Complete));
                        } else {
                            open.insert(key, flow);
                        }
                        continue;
                    }
                }

                if starts {
                    let flow = OpenFlow {
                        rule,
                        events: vec![self.event(source, rule, &record)],
                    };
                    if rule.end.is_match(&record.text) {
                        done.push(close(source, kind, flow, FlowStatus::Complete));
                    } else {
                        open.insert(key, flow);
                    }
                }
            }
        }

        done.extend(
            open.into_values()
                .map(|flow| close(source, kind, flow, FlowStatus::Incomplete)),
        );
        done.sort_by_key(|flow| flow.events.first().map_or(0, |event| event.line));

        tracing::debug!(source, flows = done.len(), "journal processed");
        done
    }

    fn event(&self, source: &str, rule: &TransactionRule, record: &JournalRecord) -> TransactionEvent {
        let fields = rule
            .fields
            .iter()
            .filter_map(|field| {
                let value = field.extract(&record.text)?;
                let value = if field.translate {
                    self.rules.translate(value)
                } else {
                    value
                };
                Some(EventField {
                    name: field.name.clone(),
                    value: value.to_string(),
                })
            })
            .collect();

        TransactionEvent {
            timestamp: record.timestamp,
            transaction_type: rule.transaction_type.clone(),
            fields,
            source: source.to_string(),
            line: record.line,
            text: record.text.clone(),
        }
    }
}

fn close(source: &str, journal: JournalKind, flow: OpenFlow<'_>, status: FlowStatus) -> TransactionFlow {
    TransactionFlow {
        transaction_id: transaction_id(source, &flow.events),
        transaction_type: flow.rule.transaction_type.clone(),
        journal,
        source: source.to_string(),
        status,
        outcome: outcome_of(flow.rule, &flow.events),
        events: flow.events,
    }
}

/// The last event matching either outcome pattern decides.
fn outcome_of(rule: &TransactionRule, events: &[TransactionEvent]) -> FlowOutcome {
    let Some(outcome) = &rule.outcome else {
        return FlowOutcome::Unknown;
    };
    let hit = |pattern: Option<&regex::Regex>, text: &str| pattern.is_some_and(|p| p.is_match(text));
    events
        .iter()
        .rev()
        .find_map(|event| {
            if hit(outcome.success.as_ref(), &event.text) {
                Some(FlowOutcome::Successful)
            } else if hit(outcome.failure.as_ref(), &event.text) {
                Some(FlowOutcome::Unsuccessful)
            } else {
                None
            }
        })
        .unwrap_or(FlowOutcome::Unknown)
}

/// Extracted `transaction_id`, else `<file stem>_<HHMMSS>` of the start.
fn transaction_id(source: &str, events: &[TransactionEvent]) -> String {
    if let Some(id) = events
        .iter()
        .filter_map(|event| event.field(TRANSACTION_ID_FIELD))
        .find(|id| !id.is_empty())
    {
        return id.to_string();
    }
    let stem = Path::new(source)
        .file_stem()
        .map_or_else(|| source.to_string(), |stem| stem.to_string_lossy().into_owned());
    let start = events
        .first()
        .map(|event| event.timestamp.format("%H%M%S").to_string())
        .unwrap_or_default();
    format!("{stem}_{start}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const RULES: &str = r#"<configuration>
      <transactionList>
        <transaction><key>COUT</key><value>Withdrawal</value></transaction>
      </transactionList>
      <rules>
        <rule type="withdrawal" journal="customer">
          <start>^\d{2}:\d{2}:\d{2}\s+3201\b</start>
          <end>^\d{2}:\d{2}:\d{2}\s+3202\b</end>
          <field name="transaction_id" pattern="Transaction no\. '([^']*)'"/>
          <field name="function" pattern="Function\s+'([^']+)'" translate="true"/>
          <outcome success="end-state'[Nn]'" failure="end-state'[EeCc]'"/>
        </rule>
        <rule type="door" journal="customer">
          <start>SAFE DOOR OPEN</start>
          <end>SAFE DOOR CLOSED</end>
        </rule>
      </rules>
    </configuration>"#;

    fn builder() -> FlowBuilder {
        FlowBuilder::new(Arc::new(RuleTable::from_xml(RULES).unwrap()))
    }

    #[test]
    fn complete_flow_with_fields_and_outcome() {
        let text = "10:00:00 3201 CARD INSERTED\n\
                    10:00:05 3205 Transaction no. '0042'\n\
                    10:00:06 3206 Function 'COUT'\n\
                    10:00:20 3210 end-state'N'\n\
                    10:00:21 3202 CARD TAKEN\n";
        let flows = builder().build_text("20240301.jrn", text, JournalKind::Customer);

        assert_eq!(flows.len(), 1);
        let flow = &flows[0];
        assert_eq!(flow.status, FlowStatus::Complete);
        assert_eq!(flow.outcome, FlowOutcome::Successful);
        assert_eq!(flow.transaction_id, "0042");
        assert_eq!(flow.events.len(), 5);
        assert_eq!(flow.events[2].field("function"), Some("Withdrawal"));
        assert_eq!(flow.duration().map(|d| d.num_seconds()), Some(21));
    }

    #[test]
    fn restart_closes_previous_flow_as_incomplete() {
        let text = "10:00:00 3201 CARD INSERTED\n\
                    10:00:10 3201 CARD INSERTED\n\
                    10:00:20 3202 CARD TAKEN\n";
        let flows = builder().build_text("20240301.jrn", text, JournalKind::Customer);

        let statuses: Vec<_> = flows.iter().map(|f| f.status).collect();
        assert_eq!(statuses, vec![FlowStatus::Incomplete, FlowStatus::Complete]);
        assert_eq!(flows[0].events.len(), 1);
        assert_eq!(flows[0].transaction_id, "20240301_100000");
        assert_eq!(flows[1].transaction_id, "20240301_100010");
    }

    #[test]
    fn unterminated_flow_is_incomplete_at_end_of_file() {
        let text = "10:00:00 3201 CARD INSERTED\n10:00:30 3210 end-state'E'\n";
        let flows = builder().build_text("j.jrn", text, JournalKind::Customer);
        assert_eq!(flows[0].status, FlowStatus::Incomplete);
        assert_eq!(flows[0].outcome, FlowOutcome::Unsuccessful);
    }

    #[test]
    fn records_before_any_start_are_ignored() {
        let text = "09:00:00 3202 CARD TAKEN\n09:00:01 1 noise\n";
        assert!(builder().build_text("j.jrn", text, JournalKind::Customer).is_empty());
    }

    #[test]
    fn ui_journals_use_only_ui_rules() {
        let text = "10:00:00 3201 CARD INSERTED\n10:00:21 3202 CARD TAKEN\n";
        assert!(builder().build_text("j.jrn", text, JournalKind::Ui).is_empty());
    }

    #[test]
    fn non_journal_category_is_rejected() {
        let err = builder()
            .build(Path::new("diag.trc"), FileCategory::TraceLog)
            .unwrap_err();
        assert!(matches!(err, FlowError::NotAJournal { category: FileCategory::TraceLog, .. }));
    }

    #[test]
    fn build_reads_and_decodes_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("CustomerJournal_20240301.jrn");
        std::fs::write(&path, "10:00:00 3201 CARD INSERTED\n10:00:21 3202 CARD TAKEN\n").unwrap();

        let flows = builder().build(&path, FileCategory::CustomerJournal).unwrap();
        assert_eq!(flows[0].source, "CustomerJournal_20240301.jrn");
        assert_eq!(flows[0].start().map(|t| t.date().to_string()), Some("2024-03-01".into()));
    }
}
