use serde::{Deserialize, Serialize};

use crate::enums::DiffStepKind;

/// One aligned step of a UI path comparison.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DiffStep {
    pub kind: DiffStepKind,
    pub step: String,
    /// Index in the left path (matched and deleted steps).
    pub left: Option<usize>,
    /// Index in the right path (matched and inserted steps).
    pub right: Option<usize>,
}

/// Alignment of two UI paths, in alignment order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UiPathDiff {
    pub steps: Vec<DiffStep>,
}

impl UiPathDiff {
    fn of_kind(&self, kind: DiffStepKind) -> Vec<&str> {
        self.steps
            .iter()
            .filter(|step| step.kind == kind)
            .map(|step| step.step.as_str())
            .collect()
    }

    #[must_use]
    pub fn matched(&self) -> Vec<&str> {
        self.of_kind(DiffStepKind::Matched)
    }

    #[must_use]
    pub fn deleted(&self) -> Vec<&str> {
        self.of_kind(DiffStepKind::Deleted)
    }

    #[must_use]
    pub fn inserted(&self) -> Vec<&str> {
        self.of_kind(DiffStepKind::Inserted)
    }

    /// `2 * matched / (left + right)`, 1.0 for two empty paths.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn similarity(&self) -> f64 {
        let total = self.steps.len() + self.matched().len();
        if total == 0 {
            return 1.0;
        }
        (2 * self.matched().len()) as f64 / total as f64
    }
}
