use std::path::PathBuf;

use clap::Subcommand;

/// Transaction rule documents.
#[derive(Clone, Debug, Subcommand)]
pub enum RulesCommands {
    /// Parse, validate and compile a rule document, then print its summary.
    Check {
        /// Rule XML document.
        file: PathBuf,
    },
}
