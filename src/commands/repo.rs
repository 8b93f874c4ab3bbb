//! Command: synchronise the bare dotfiles repository.
use std::path::Path;

use anyhow::{Context as _, Result};

use crate::cli::{GlobalOpts, RepoCommand, SyncOpts};
use crate::exec::{Executor, Runner, SystemExecutor};
use crate::logging::Logger;
use crate::paths::home_dir;
use crate::sync::conflicts::GitConflictDetector;
use crate::sync::{SyncOptions, SyncReport, sync};

/// Run a `repo` subcommand.
///
/// # Errors
///
/// Returns an error if the home directory is unknown or synchronisation fails.
pub fn run(global: &GlobalOpts, command: &RepoCommand, log: &Logger) -> Result<()> {
    match command {
        RepoCommand::Sync(opts) => {
            let home = home_dir().context("cannot determine home directory")?;
            run_sync(global, &sync_options(opts, &home), &SystemExecutor, log).map(|_| ())
        }
    }
}

/// Fill in the default repository and backup locations under `home`.
#[must_use]
pub fn sync_options(opts: &SyncOpts, home: &Path) -> SyncOptions {
    SyncOptions {
        url: opts.url.clone(),
        repo_dir: opts.dir.clone().unwrap_or_else(|| home.join(".dotfiles")),
        home: home.to_path_buf(),
        backup_root: opts
            .backup_dir
            .clone()
            .unwrap_or_else(|| home.join(".dotfiles-backup")),
        pull: opts.pull,
    }
}

/// Synchronise with a specific executor and print the summary.
///
/// # Errors
///
/// Returns the synchronisation error with context.
pub fn run_sync(
    global: &GlobalOpts,
    options: &SyncOptions,
    executor: &dyn Executor,
    log: &Logger,
) -> Result<SyncReport> {
    log.stage("Syncing dotfiles repository");
    log.info(&format!(
        "{} -> {} (work tree {})",
        options.url,
        options.repo_dir.display(),
        options.home.display()
    ));
    let runner = Runner::new(executor, log, global.dry_run);
    let result = sync(&runner, &GitConflictDetector, options);
    log.print_summary();
    let report = result.context("repository sync failed")?;
    if let Some(dir) = &report.backup_dir {
        log.warn(&format!(
            "{} existing file(s) were moved to {}",
            report.backed_up,
            dir.display()
        ));
    }
    Ok(report)
}
