use std::path::Path;

use anyhow::Context;
use atlog_config::AtlogConfig;

use crate::cli::GlobalFlags;

/// Load `.env` and the layered configuration for this invocation.
pub fn load_config(flags: &GlobalFlags) -> anyhow::Result<AtlogConfig> {
    let root = flags.config_dir.as_deref().unwrap_or_else(|| Path::new("."));
    load_dotenv(root);
    AtlogConfig::load_from(root)
        .with_context(|| format!("failed to load configuration from {}", root.display()))
}

fn load_dotenv(root: &Path) {
    let path = root.join(".env");
    if path.exists() {
        if let Err(error) = dotenvy::from_path(&path) {
            tracing::warn!(path = %path.display(), %error, "failed to read .env");
        }
    }
}
