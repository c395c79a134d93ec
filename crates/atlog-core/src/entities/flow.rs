use chrono::{NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};

use crate::enums::{FlowOutcome, FlowStatus, JournalKind};

/// Field name whose values form the UI navigation path of a flow.
pub const UI_STEP_FIELD: &str = "screen";

/// One extracted field of a transaction event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventField {
    pub name: String,
    pub value: String,
}

/// One journal record attributed to a transaction flow.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransactionEvent {
    pub timestamp: NaiveDateTime,
    pub transaction_type: String,
    /// Extracted fields in rule order.
    pub fields: Vec<EventField>,
    /// Source journal file.
    pub source: String,
    /// 1-based line number in the source journal.
    pub line: usize,
    /// Raw record text.
    pub text: String,
}

impl TransactionEvent {
    /// First value extracted for `name`, if any.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|field| field.name == name)
            .map(|field| field.value.as_str())
    }
}

/// One bounded transaction instance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransactionFlow {
    pub transaction_id: String,
    pub transaction_type: String,
    pub journal: JournalKind,
    pub source: String,
    pub status: FlowStatus,
    pub outcome: FlowOutcome,
    /// Events in file order; timestamps are non-decreasing.
    pub events: Vec<TransactionEvent>,
}

impl TransactionFlow {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.status == FlowStatus::Complete
    }

    #[must_use]
    pub fn start(&self) -> Option<NaiveDateTime> {
        self.events.first().map(|event| event.timestamp)
    }

    #[must_use]
    pub fn end(&self) -> Option<NaiveDateTime> {
        self.events.last().map(|event| event.timestamp)
    }

    #[must_use]
    pub fn duration(&self) -> Option<TimeDelta> {
        Some(self.end()? - self.start()?)
    }

    /// Screens visited by this flow, consecutive repeats collapsed.
    #[must_use]
    pub fn ui_path(&self) -> Vec<String> {
        let mut path: Vec<String> = Vec::new();
        for screen in self.events.iter().filter_map(|e| e.field(UI_STEP_FIELD)) {
            if path.last().is_none_or(|last| last != screen) {
                path.push(screen.to_string());
            }
        }
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn event(second: u32, screen: Option<&str>) -> TransactionEvent {
        let timestamp = NaiveDate::from_ymd_opt(2024, 3, 1)
            .and_then(|d| d.and_hms_opt(10, 0, second))
            .unwrap();
        TransactionEvent {
            timestamp,
            transaction_type: "withdrawal".into(),
            fields: screen
                .map(|s| {
                    vec![EventField {
                        name: UI_STEP_FIELD.into(),
                        value: s.into(),
                    }]
                })
                .unwrap_or_default(),
            source: "ui.jrn".into(),
            line: second as usize,
            text: String::new(),
        }
    }

    #[test]
    fn ui_path_collapses_repeats_and_skips_missing() {
        let flow = TransactionFlow {
            transaction_id: "t1".into(),
            transaction_type: "withdrawal".into(),
            journal: JournalKind::Ui,
            source: "ui.jrn".into(),
            status: FlowStatus::Complete,
            outcome: FlowOutcome::Unknown,
            events: vec![
                event(1, Some("Welcome")),
                event(2, Some("Welcome")),
                event(3, None),
                event(4, Some("PinEntry")),
                event(5, Some("Welcome")),
            ],
        };
        assert_eq!(flow.ui_path(), vec!["Welcome", "PinEntry", "Welcome"]);
        assert_eq!(flow.duration(), Some(TimeDelta::seconds(4)));
    }
}
