use std::collections::BTreeSet;

use atlog_core::{FlowOutcome, FlowStatus, TransactionFlow};
use serde::Serialize;

/// Counts over a set of flows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FlowSummary {
    pub total: usize,
    pub complete: usize,
    pub incomplete: usize,
    pub successful: usize,
    pub unsuccessful: usize,
    /// Distinct transaction types, sorted.
    pub transaction_types: Vec<String>,
}

impl FlowSummary {
    #[must_use]
    pub fn from_flows(flows: &[TransactionFlow]) -> Self {
        let count = |pred: fn(&TransactionFlow) -> bool| flows.iter().filter(|f| pred(f)).count();
        let types: BTreeSet<&str> = flows.iter().map(|f| f.transaction_type.as_str()).collect();
        Self {
            total: flows.len(),
            complete: count(|f| f.status == FlowStatus::Complete),
            incomplete: count(|f| f.status == FlowStatus::Incomplete),
            successful: count(|f| f.outcome == FlowOutcome::Successful),
            unsuccessful: count(|f| f.outcome == FlowOutcome::Unsuccessful),
            transaction_types: types.into_iter().map(str::to_string).collect(),
        }
    }
}
