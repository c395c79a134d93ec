use std::path::PathBuf;

use clap::Parser;

pub mod global;
pub mod root_commands;
pub mod subcommands;

pub use global::{GlobalFlags, OutputFormat};
pub use root_commands::Commands;

/// Top-level CLI parser for the `atl` binary.
#[derive(Debug, Parser)]
#[command(name = "atl", version, about = "atlog - ATM diagnostic bundle analysis")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format: json, raw
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Project directory whose `.atlog/config.toml` is layered in
    #[arg(long, global = true, value_name = "DIR")]
    pub config_dir: Option<PathBuf>,
}

impl Cli {
    /// Extract ergonomic global flags struct for command handlers.
    #[must_use]
    pub fn global_flags(&self) -> GlobalFlags {
        GlobalFlags {
            format: self.format,
            config_dir: self.config_dir.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use clap::{CommandFactory, Parser};

    use super::{Cli, Commands, OutputFormat};
    use crate::cli::subcommands::RulesCommands;

    #[test]
    fn clap_command_tree_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_parse_before_subcommand() {
        let cli = Cli::try_parse_from(["atl", "--format", "raw", "--verbose", "records", "b.zip"])
            .expect("cli should parse");

        assert_eq!(cli.format, OutputFormat::Raw);
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Records(_)));
    }

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = Cli::try_parse_from(["atl", "records", "b.zip", "--quiet", "--config-dir", "/srv/atm"])
            .expect("cli should parse");

        assert!(cli.quiet);
        assert_eq!(cli.global_flags().config_dir.as_deref(), Some(Path::new("/srv/atm")));
    }

    #[test]
    fn output_format_rejects_invalid_value() {
        assert!(Cli::try_parse_from(["atl", "--format", "table", "records", "b.zip"]).is_err());
    }

    #[test]
    fn extract_takes_many_archives_and_keep_dir() {
        let cli = Cli::try_parse_from(["atl", "extract", "a.zip", "b.zip", "--keep", "out"])
            .expect("cli should parse");
        let Commands::Extract(args) = cli.command else {
            panic!("expected extract");
        };
        assert_eq!(args.archives.len(), 2);
        assert_eq!(args.keep.as_deref(), Some(Path::new("out")));
        assert!(!args.registry_only);
    }

    #[test]
    fn extract_requires_an_archive() {
        assert!(Cli::try_parse_from(["atl", "extract"]).is_err());
    }

    #[test]
    fn diff_requires_both_ids() {
        assert!(Cli::try_parse_from(["atl", "diff", "b.zip", "--left", "1"]).is_err());
        let cli = Cli::try_parse_from([
            "atl", "diff", "b.zip", "--left", "1", "--right", "2", "--rules", "r.xml",
        ])
        .expect("cli should parse");
        let Commands::Diff(args) = cli.command else {
            panic!("expected diff");
        };
        assert_eq!((args.left.as_str(), args.right.as_str()), ("1", "2"));
        assert_eq!(args.rules.as_deref(), Some(Path::new("r.xml")));
    }

    #[test]
    fn rules_check_parses_file() {
        let cli = Cli::try_parse_from(["atl", "rules", "check", "dnLogAtConfig.xml"])
            .expect("cli should parse");
        assert!(matches!(
            cli.command,
            Commands::Rules {
                action: RulesCommands::Check { .. }
            }
        ));
    }
}
