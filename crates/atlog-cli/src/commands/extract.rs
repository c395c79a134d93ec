use std::path::PathBuf;

use atlog_archive::{Notice, SkippedEntry};
use atlog_categorize::{CategorizeMode, CategoryBuckets};
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::ExtractArgs;
use crate::output::output;
use crate::pipeline::{Pipeline, run_blocking};

#[derive(Debug, Serialize)]
struct ExtractResponse {
    archive: PathBuf,
    /// Scratch directory, when kept.
    #[serde(skip_serializing_if = "Option::is_none")]
    scratch: Option<PathBuf>,
    skipped: Vec<SkippedEntry>,
    notices: Vec<Notice>,
    buckets: CategoryBuckets,
}

/// Handle `atl extract`.
///
/// Each archive gets its own session on the blocking pool.
pub async fn handle(args: ExtractArgs, pipeline: Pipeline, flags: &GlobalFlags) -> anyhow::Result<()> {
    let mode = if args.registry_only {
        CategorizeMode::RegistryOnly
    } else {
        CategorizeMode::All
    };
    let pipeline = pipeline.with_mode(mode);

    let tasks: Vec<_> = args
        .archives
        .into_iter()
        .map(|archive| {
            let pipeline = pipeline.clone();
            let keep = args.keep.clone();
            tokio::spawn(run_blocking(move || {
                let analysis = pipeline.analyze(&archive, keep.as_deref())?;
                let scratch = keep.is_some().then(|| analysis.session.keep());
                Ok(ExtractResponse {
                    archive,
                    scratch,
                    skipped: analysis.skipped,
                    notices: analysis.notices,
                    buckets: analysis.buckets,
                })
            }))
        })
        .collect();

    let mut responses = Vec::with_capacity(tasks.len());
    for task in tasks {
        responses.push(task.await??);
    }
    output(&responses, flags.format)
}
