//! Command: install modules.
use anyhow::Result;

use super::{finish, load_config, resolve_platform};
use crate::cli::{GlobalOpts, InstallOpts};
use crate::exec::{Executor, Runner, SystemExecutor};
use crate::installer::{Installer, RunState};
use crate::logging::{Logger, TaskStatus};
use crate::paths::home_dir;

/// Run the install command.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded or any requested
/// module fails.
pub fn run(global: &GlobalOpts, opts: &InstallOpts, log: &Logger) -> Result<()> {
    run_with(global, opts, &SystemExecutor, log)
}

/// Run the install command against a specific executor.
///
/// Every requested module is attempted, sharing one [`RunState`], before the
/// summary is printed.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded or any requested
/// module fails.
pub fn run_with(
    global: &GlobalOpts,
    opts: &InstallOpts,
    executor: &dyn Executor,
    log: &Logger,
) -> Result<()> {
    log.info(&format!("dotm {}", super::version::version()));
    log.stage("Loading configuration");
    let (_, config) = load_config(global, log)?;
    let platform = resolve_platform(global);
    log.info(&format!("platform: {platform}"));

    let home = home_dir();
    let runner = Runner::new(executor, log, global.dry_run);
    let installer = Installer::new(&config, &runner, &platform, home.as_deref());
    let mut state = RunState::new();

    for name in &opts.modules {
        if let Err(e) = installer.install(name, &mut state) {
            let err = anyhow::Error::from(e);
            log.error(&format!("{name}: {err:#}"));
            log.record_task(name, TaskStatus::Failed, Some(&err.to_string()));
        }
    }

    finish(log, "module(s)")
}
