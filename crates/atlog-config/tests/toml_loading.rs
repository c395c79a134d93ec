//! Integration tests for TOML configuration loading.
//!
//! Uses `figment::Jail` for sandboxed files and env vars.

use atlog_config::AtlogConfig;
use figment::{
    Figment, Jail,
    providers::{Format, Serialized, Toml},
};
use pretty_assertions::assert_eq;
use std::path::{Path, PathBuf};

#[test]
fn loads_archive_config_from_toml() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
[archive]
max_depth = 2
junk_globs = ["**/*.bak"]
include_globs = ["**/*.jrn", "**/*.trc"]
skip_hidden = false
scratch_root = "/var/tmp/atlog"
"#,
        )?;

        let config: AtlogConfig = Figment::from(Serialized::defaults(AtlogConfig::default()))
            .merge(Toml::file("config.toml"))
            .extract()?;

        assert_eq!(config.archive.max_depth, 2);
        assert_eq!(config.archive.junk_globs, vec!["**/*.bak"]);
        assert_eq!(config.archive.include_globs.len(), 2);
        assert!(!config.archive.skip_hidden);
        assert!(config.archive.skip_empty);
        assert_eq!(
            config.archive.scratch_root,
            Some(PathBuf::from("/var/tmp/atlog"))
        );
        Ok(())
    });
}

#[test]
fn project_config_is_picked_up_from_root() {
    Jail::expect_with(|jail| {
        jail.create_dir(".atlog")?;
        jail.create_file(
            ".atlog/config.toml",
            r#"
[scanner]
record_prefixes = ["jdd"]

[rules]
path = "conf/rules.xml"
"#,
        )?;

        let config = AtlogConfig::load_from(Path::new(".")).expect("config loads");
        assert_eq!(config.scanner.record_prefixes, vec!["jdd"]);
        assert_eq!(config.rules.path, PathBuf::from("conf/rules.xml"));
        assert_eq!(config.archive.max_depth, 4);
        Ok(())
    });
}

#[test]
fn invalid_project_value_fails_validation() {
    Jail::expect_with(|jail| {
        jail.create_dir(".atlog")?;
        jail.create_file(
            ".atlog/config.toml",
            "[categorize]\nmin_line_hits = 0\n",
        )?;

        assert!(AtlogConfig::load_from(Path::new(".")).is_err());
        Ok(())
    });
}
