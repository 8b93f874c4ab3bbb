//! Command: export, show, validate, template and copy the configuration.
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};

use super::{config_path, load_config};
use crate::cli::{ConfigCommand, GlobalOpts};
use crate::config::summary::{render_module_details, render_summary};
use crate::config::template::{config_template, module_template};
use crate::config::validation::validate;
use crate::logging::Logger;

/// Run a `config` subcommand.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded, a file cannot be
/// written, or validation finds problems.
pub fn run(global: &GlobalOpts, command: &ConfigCommand, log: &Logger) -> Result<()> {
    match command {
        ConfigCommand::Export { destination } => export(global, destination.as_deref(), log),
        ConfigCommand::Show { module } => {
            let (_, config) = load_config(global, log)?;
            match module {
                Some(name) => print!("{}", render_module_details(name, config.module(name)?)),
                None => print!("{}", render_summary(&config)),
            }
            Ok(())
        }
        ConfigCommand::Validate => {
            let (path, config) = load_config(global, log)?;
            let problems = validate(&config);
            if problems.is_empty() {
                log.info(&format!(
                    "{} is valid ({} module(s))",
                    path.display(),
                    config.modules.len()
                ));
                return Ok(());
            }
            log.error(&format!(
                "{} has {} problem(s):",
                path.display(),
                problems.len()
            ));
            for (i, problem) in problems.iter().enumerate() {
                log.error(&format!("  {}. {problem}", i + 1));
            }
            anyhow::bail!("configuration validation failed");
        }
        ConfigCommand::Template { module } => {
            match module {
                Some(name) => print!("{}", module_template(name)),
                None => print!("{}", config_template()),
            }
            Ok(())
        }
        ConfigCommand::Copy {
            source,
            destination,
        } => {
            let source = source.clone().unwrap_or_else(|| config_path(global));
            let destination = destination
                .clone()
                .unwrap_or_else(|| backup_path(&source));
            copy(&source, &destination, global.dry_run, log)
        }
    }
}

/// Re-serialise the configuration to `destination`, or stdout.
///
/// # Errors
///
/// Returns an error if loading, serialising or writing fails.
pub fn export(global: &GlobalOpts, destination: Option<&Path>, log: &Logger) -> Result<()> {
    let (_, config) = load_config(global, log)?;
    let text = config.to_toml()?;
    let Some(dest) = destination else {
        print!("{text}");
        return Ok(());
    };
    if global.dry_run {
        log.dry_run(&format!("would export configuration to {}", dest.display()));
        return Ok(());
    }
    std::fs::write(dest, text).with_context(|| format!("writing {}", dest.display()))?;
    log.info(&format!("configuration exported to {}", dest.display()));
    Ok(())
}

/// `<path>.backup`, keeping the original extension.
#[must_use]
pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".backup");
    PathBuf::from(name)
}

fn copy(source: &Path, destination: &Path, dry_run: bool, log: &Logger) -> Result<()> {
    if dry_run {
        log.dry_run(&format!(
            "would copy {} to {}",
            source.display(),
            destination.display()
        ));
        return Ok(());
    }
    std::fs::copy(source, destination).with_context(|| {
        format!(
            "copying {} to {}",
            source.display(),
            destination.display()
        )
    })?;
    log.info(&format!(
        "configuration copied from {} to {}",
        source.display(),
        destination.display()
    ));
    Ok(())
}
