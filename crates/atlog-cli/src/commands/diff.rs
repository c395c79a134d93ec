use anyhow::Context;
use atlog_core::{TransactionFlow, UiPathDiff};
use atlog_flow::{diff_paths, ui_path_for};
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::DiffArgs;
use crate::commands::flows::rules_path;
use crate::output::output;
use crate::pipeline::{Pipeline, load_rules, run_blocking};

#[derive(Debug, Serialize)]
struct DiffResponse {
    left: String,
    right: String,
    left_path: Vec<String>,
    right_path: Vec<String>,
    similarity: f64,
    diff: UiPathDiff,
}

fn find<'a>(flows: &'a [TransactionFlow], id: &str) -> anyhow::Result<&'a TransactionFlow> {
    flows
        .iter()
        .find(|flow| flow.transaction_id == id)
        .with_context(|| format!("no transaction with id '{id}'"))
}

/// Handle `atl diff`.
pub async fn handle(args: DiffArgs, pipeline: Pipeline, flags: &GlobalFlags) -> anyhow::Result<()> {
    let rules = rules_path(args.rules.as_deref(), &pipeline);
    let response = run_blocking(move || {
        let rules = load_rules(&rules)?;
        let analysis = pipeline.analyze(&args.archive, None)?;
        let flows = analysis.flows(rules)?;
        let timelines = analysis.timelines()?;

        let left_path = ui_path_for(find(&flows, &args.left)?, &timelines);
        let right_path = ui_path_for(find(&flows, &args.right)?, &timelines);
        let diff = diff_paths(&left_path, &right_path);
        Ok(DiffResponse {
            left: args.left,
            right: args.right,
            similarity: diff.similarity(),
            left_path,
            right_path,
            diff,
        })
    })
    .await?;
    output(&response, flags.format)
}
