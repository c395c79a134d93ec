//! # atlog-config
//!
//! Layered configuration loading for atlog using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`ATLOG_*` prefix, `__` as separator)
//! 2. Project-level `.atlog/config.toml`
//! 3. User-level `~/.config/atlog/config.toml`
//! 4. Built-in defaults
//!
//! `ATLOG_ARCHIVE__MAX_DEPTH=2` maps to `archive.max_depth`.

mod archive;
mod categorize;
mod error;
mod rules;
mod scanner;

pub use archive::ArchiveConfig;
pub use categorize::CategorizeConfig;
pub use error::ConfigError;
pub use rules::RulesConfig;
pub use scanner::ScannerConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Directory, relative to the project root, holding the project config.
pub const PROJECT_CONFIG_DIR: &str = ".atlog";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AtlogConfig {
    #[serde(default)]
    pub archive: ArchiveConfig,
    #[serde(default)]
    pub scanner: ScannerConfig,
    #[serde(default)]
    pub categorize: CategorizeConfig,
    #[serde(default)]
    pub rules: RulesConfig,
}

impl AtlogConfig {
    /// Load configuration from all sources, with the current directory as project root.
    ///
    /// Does NOT call `dotenvy`; use [`Self::load_with_dotenv`] for `.env` support.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Path::new("."))
    }

    /// Load configuration with `<project_root>/.atlog/config.toml` as the project layer.
    pub fn load_from(project_root: &Path) -> Result<Self, ConfigError> {
        let config: Self = Self::figment_at(project_root).extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration after reading `.env` from the current directory.
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::load()
    }

    /// Build the figment provider chain rooted at the current directory.
    pub fn figment() -> Figment {
        Self::figment_at(Path::new("."))
    }

    /// Build the figment provider chain for a given project root.
    pub fn figment_at(project_root: &Path) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                figment = figment.merge(Toml::file(global_path));
            }
        }

        let local_path = project_root.join(PROJECT_CONFIG_DIR).join("config.toml");
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        figment.merge(Env::prefixed("ATLOG_").split("__"))
    }

    /// Reject values the engine cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scanner.record_prefixes.iter().any(|p| p.trim().is_empty()) {
            return Err(ConfigError::invalid(
                "scanner.record_prefixes",
                "prefixes must not be empty",
            ));
        }
        if self.categorize.probe_bytes == 0 {
            return Err(ConfigError::invalid(
                "categorize.probe_bytes",
                "must be greater than zero",
            ));
        }
        if self.categorize.min_line_hits == 0 {
            return Err(ConfigError::invalid(
                "categorize.min_line_hits",
                "must be greater than zero",
            ));
        }
        Ok(())
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("atlog").join("config.toml"))
    }
}
