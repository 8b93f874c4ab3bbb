pub mod completion;
pub mod config;
pub mod install;
pub mod module;
pub mod repo;
pub mod version;

use std::path::PathBuf;

use anyhow::{Context as _, Result};

use crate::cli::GlobalOpts;
use crate::config::{Config, DEFAULT_CONFIG_FILE};
use crate::logging::Logger;
use crate::platform::Platform;

/// Resolve the configuration path from `--config` / `DOTM_CONFIG`, falling
/// back to `./dotm.toml`.
#[must_use]
pub fn config_path(global: &GlobalOpts) -> PathBuf {
    global
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}

/// The `--platform` override, or the detected host platform.
#[must_use]
pub fn resolve_platform(global: &GlobalOpts) -> Platform {
    global
        .platform
        .as_deref()
        .map_or_else(Platform::detect, Platform::from_key)
}

/// Load the configuration named by `global`.
///
/// # Errors
///
/// Returns an error if the file is missing or cannot be parsed.
pub fn load_config(global: &GlobalOpts, log: &Logger) -> Result<(PathBuf, Config)> {
    let path = config_path(global);
    log.debug(&format!("loading configuration from {}", path.display()));
    let config = Config::load(&path)
        .with_context(|| format!("loading configuration from {}", path.display()))?;
    log.debug(&format!("{} module(s) defined", config.modules.len()));
    Ok((path, config))
}

/// Print the summary and fail if any entry was recorded as failed.
///
/// # Errors
///
/// Returns an error naming the number of failures.
pub fn finish(log: &Logger, what: &str) -> Result<()> {
    log.print_summary();
    let count = log.failure_count();
    if count > 0 {
        anyhow::bail!("{count} {what} failed");
    }
    Ok(())
}
