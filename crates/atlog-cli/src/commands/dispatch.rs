use atlog_archive::CancelToken;
use atlog_config::AtlogConfig;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::Commands;
use crate::commands;
use crate::pipeline::Pipeline;

/// Dispatch a parsed command to the corresponding handler module.
pub async fn dispatch(
    command: Commands,
    config: AtlogConfig,
    cancel: CancelToken,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    if let Commands::Rules { action } = &command {
        return commands::rules::handle(action, flags).await;
    }

    let pipeline = Pipeline::new(config, cancel)?;
    match command {
        Commands::Extract(args) => commands::extract::handle(args, pipeline, flags).await,
        Commands::Records(args) => commands::records::handle(args, pipeline, flags).await,
        Commands::Flows(args) => commands::flows::handle(args, pipeline, flags).await,
        Commands::Diff(args) => commands::diff::handle(args, pipeline, flags).await,
        Commands::Rules { .. } => unreachable!("rules is dispatched before the pipeline is built"),
    }
}
