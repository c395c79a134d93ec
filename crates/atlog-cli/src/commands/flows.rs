use std::path::{Path, PathBuf};

use atlog_core::TransactionFlow;
use atlog_flow::FlowSummary;
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::FlowsArgs;
use crate::output::output;
use crate::pipeline::{Pipeline, load_rules, run_blocking};

#[derive(Debug, Serialize)]
struct FlowsResponse {
    archive: PathBuf,
    summary: FlowSummary,
    flows: Vec<TransactionFlow>,
}

/// Rule document from the flag, else from configuration.
pub fn rules_path(flag: Option<&Path>, pipeline: &Pipeline) -> PathBuf {
    flag.map_or_else(|| pipeline.config().rules.path.clone(), Path::to_path_buf)
}

/// Handle `atl flows`.
pub async fn handle(args: FlowsArgs, pipeline: Pipeline, flags: &GlobalFlags) -> anyhow::Result<()> {
    let rules = rules_path(args.rules.as_deref(), &pipeline);
    let response = run_blocking(move || {
        let rules = load_rules(&rules)?;
        let analysis = pipeline.analyze(&args.archive, None)?;
        let flows = analysis.flows(rules)?;
        Ok(FlowsResponse {
            archive: args.archive,
            summary: FlowSummary::from_flows(&flows),
            flows,
        })
    })
    .await?;
    output(&response, flags.format)
}
