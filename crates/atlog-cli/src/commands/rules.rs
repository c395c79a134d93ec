use anyhow::Context;
use atlog_rules::read_rule_file;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::RulesCommands;
use crate::output::output;
use crate::pipeline::run_blocking;

/// Handle `atl rules`.
pub async fn handle(action: &RulesCommands, flags: &GlobalFlags) -> anyhow::Result<()> {
    match action {
        RulesCommands::Check { file } => {
            let file = file.clone();
            let summary = run_blocking(move || {
                read_rule_file(&file)
                    .map(|table| table.summary())
                    .with_context(|| format!("invalid rule document {}", file.display()))
            })
            .await?;
            output(&summary, flags.format)
        }
    }
}
