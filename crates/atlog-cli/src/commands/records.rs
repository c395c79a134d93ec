use std::path::PathBuf;

use atlog_archive::companion::{RecordValidation, validate_records};
use atlog_core::RecordBuffer;
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::RecordsArgs;
use crate::output::output;
use crate::pipeline::{Pipeline, run_blocking};

#[derive(Debug, Serialize)]
struct RecordsResponse {
    archive: PathBuf,
    records: Vec<RecordBuffer>,
    validation: Vec<RecordValidation>,
}

/// Handle `atl records`.
pub async fn handle(args: RecordsArgs, pipeline: Pipeline, flags: &GlobalFlags) -> anyhow::Result<()> {
    let response = run_blocking(move || {
        let records = pipeline.records(&args.archive)?;
        let validation = validate_records(&records);
        Ok(RecordsResponse {
            archive: args.archive,
            records,
            validation,
        })
    })
    .await?;
    output(&response, flags.format)
}
