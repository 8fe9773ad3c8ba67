use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::debug;

use spendwatch_core::{AlertConfig, Language};

use crate::cli::CliArgs;

/// Return the default store path: <data dir>/spendwatch/alerts.json
pub fn default_store_path() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
        .context("could not determine user data directory")?
        .join("spendwatch");
    Ok(data_dir.join("alerts.json"))
}

/// Environment config with command-line overrides applied. Always resolves
/// a store path so the CLI persists between runs.
pub fn resolve(args: &CliArgs) -> Result<AlertConfig> {
    let mut config = AlertConfig::from_env();
    if let Some(lang) = &args.lang {
        config = config.with_language(Language::from_code(lang));
    }
    let store_path = match (&args.store, &config.store_path) {
        (Some(path), _) => path.clone(),
        (None, Some(path)) => path.clone(),
        (None, None) => default_store_path()?,
    };
    debug!(path = %store_path.display(), "Resolved alert store path");
    Ok(config.with_store_path(store_path))
}
