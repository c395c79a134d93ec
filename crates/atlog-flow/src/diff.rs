//! LCS alignment of UI paths.

use atlog_core::{DiffStep, DiffStepKind, TransactionFlow, UiPathDiff};

use crate::timeline::{UiTimeline, ui_path_for};

/// Align two screen paths.
///
/// `suffix[i][j]` holds the LCS length of `left[i..]` and `right[j..]`. The
/// walk is forward: equal heads are matched at once, so ties favor the
/// earliest match. Otherwise the left element is deleted whenever that keeps
/// the optimum, else the right element is inserted.
#[must_use]
pub fn diff_paths<S: AsRef<str>>(left: &[S], right: &[S]) -> UiPathDiff {
    let (n, m) = (left.len(), right.len());
    let eq = |i: usize, j: usize| left[i].as_ref() == right[j].as_ref();

    let mut suffix = vec![vec![0usize; m + 1]; n + 1];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            suffix[i][j] = if eq(i, j) {
                suffix[i + 1][j + 1] + 1
            } else {
                suffix[i + 1][j].max(suffix[i][j + 1])
            };
        }
    }

    let step = |kind, text: &S, left, right| DiffStep {
        kind,
        step: text.as_ref().to_string(),
        left,
        right,
    };

    let mut steps = Vec::with_capacity(n + m);
    let (mut i, mut j) = (0, 0);
    while i < n && j < m {
        if eq(i, j) {
            steps.push(step(DiffStepKind::Matched, &left[i], Some(i), Some(j)));
            i += 1;
            j += 1;
        } else if suffix[i + 1][j] >= suffix[i][j + 1] {
            steps.push(step(DiffStepKind::Deleted, &left[i], Some(i), None));
            i += 1;
        } else {
            steps.push(step(DiffStepKind::Inserted, &right[j], None, Some(j)));
            j += 1;
        }
    }
    steps.extend((i..n).map(|i| step(DiffStepKind::Deleted, &left[i], Some(i), None)));
    steps.extend((j..m).map(|j| step(DiffStepKind::Inserted, &right[j], None, Some(j))));

    UiPathDiff { steps }
}

/// Align the UI paths of two flows, falling back to UI timelines for flows
/// without screen fields.
#[must_use]
pub fn diff_flows(left: &TransactionFlow, right: &TransactionFlow, timelines: &[UiTimeline]) -> UiPathDiff {
    diff_paths(&ui_path_for(left, timelines), &ui_path_for(right, timelines))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn kinds(diff: &UiPathDiff) -> Vec<(DiffStepKind, &str)> {
        diff.steps.iter().map(|s| (s.kind, s.step.as_str())).collect()
    }

    #[test]
    fn dropped_middle_screen_is_a_deletion() {
        let diff = diff_paths(&["A", "B", "C", "D"], &["A", "C", "D"]);
        assert_eq!(
            kinds(&diff),
            vec![
                (DiffStepKind::Matched, "A"),
                (DiffStepKind::Deleted, "B"),
                (DiffStepKind::Matched, "C"),
                (DiffStepKind::Matched, "D"),
            ]
        );
        assert_eq!(diff.steps[2].left, Some(2));
        assert_eq!(diff.steps[2].right, Some(1));
    }

    #[test]
    fn deletion_preferred_over_insertion_on_ties() {
        let diff = diff_paths(&["A", "X"], &["A", "Y"]);
        assert_eq!(
            kinds(&diff),
            vec![
                (DiffStepKind::Matched, "A"),
                (DiffStepKind::Deleted, "X"),
                (DiffStepKind::Inserted, "Y"),
            ]
        );
    }

    #[test]
    fn earliest_match_wins() {
        let diff = diff_paths(&["A"], &["A", "A"]);
        assert_eq!(diff.steps[0].right, Some(0));
        assert_eq!(diff.inserted(), vec!["A"]);
    }

    #[rstest]
    #[case(&[], &[], 0, 0, 0)]
    #[case(&["A", "B"], &[], 0, 2, 0)]
    #[case(&[], &["A"], 0, 0, 1)]
    #[case(&["W", "P", "A", "R"], &["W", "A", "P", "R"], 3, 1, 1)]
    fn step_counts(
        #[case] left: &[&str],
        #[case] right: &[&str],
        #[case] matched: usize,
        #[case] deleted: usize,
        #[case] inserted: usize,
    ) {
        let diff = diff_paths(left, right);
        assert_eq!(diff.matched().len(), matched);
        assert_eq!(diff.deleted().len(), deleted);
        assert_eq!(diff.inserted().len(), inserted);
        assert_eq!(diff.steps.len(), matched + deleted + inserted);
    }

    #[test]
    fn similarity_of_partial_overlap() {
        let diff = diff_paths(&["A", "B", "C", "D"], &["A", "C", "D"]);
        assert!((diff.similarity() - 6.0 / 7.0).abs() < 1e-9);
    }
}
