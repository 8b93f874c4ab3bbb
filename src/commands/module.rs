//! Command: add, remove and list modules in the configuration file.
use anyhow::{Context as _, Result};

use super::{config_path, load_config};
use crate::cli::{GlobalOpts, ModuleAddOpts, ModuleCommand};
use crate::config::summary::render_module_list;
use crate::config::{Config, Module};
use crate::logging::Logger;

/// Run a `module` subcommand.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded or saved, or the
/// module name is unknown (remove) or already taken (add).
pub fn run(global: &GlobalOpts, command: &ModuleCommand, log: &Logger) -> Result<()> {
    match command {
        ModuleCommand::List => {
            let (_, config) = load_config(global, log)?;
            print!("{}", render_module_list(&config));
            Ok(())
        }
        ModuleCommand::Add(opts) => add(global, opts, log),
        ModuleCommand::Remove { name } => remove(global, name, log),
    }
}

/// Build the module described by `module add` flags.
#[must_use]
pub fn module_from_opts(opts: &ModuleAddOpts) -> Module {
    let mut module = Module {
        description: opts.description.clone(),
        dependencies: opts.dependencies.clone(),
        check: opts.check.clone().filter(|c| !c.trim().is_empty()),
        ..Module::default()
    };
    for (key, commands) in [
        ("debian", &opts.install_debian),
        ("macos", &opts.install_macos),
        ("arch", &opts.install_arch),
        ("default", &opts.install_default),
    ] {
        if !commands.is_empty() {
            module.install.insert(key.to_string(), commands.clone());
        }
    }
    module
}

/// Add a module, creating the configuration file if it does not exist yet.
///
/// # Errors
///
/// Fails on any load error other than a missing file, on a duplicate name,
/// or if the file cannot be written.
pub fn add(global: &GlobalOpts, opts: &ModuleAddOpts, log: &Logger) -> Result<()> {
    let path = config_path(global);
    let mut config = Config::load_or_default(&path)
        .with_context(|| format!("loading configuration from {}", path.display()))?;
    config.add_module(&opts.name, module_from_opts(opts))?;
    if global.dry_run {
        log.dry_run(&format!("would add module '{}' to {}", opts.name, path.display()));
        return Ok(());
    }
    config.save(&path)?;
    log.info(&format!("added module '{}'", opts.name));
    Ok(())
}

/// Remove a module from the configuration file.
///
/// # Errors
///
/// Fails if the file cannot be loaded or written, or the module is unknown.
pub fn remove(global: &GlobalOpts, name: &str, log: &Logger) -> Result<()> {
    let (path, mut config) = load_config(global, log)?;
    config.remove_module(name)?;
    if global.dry_run {
        log.dry_run(&format!("would remove module '{name}' from {}", path.display()));
        return Ok(());
    }
    config.save(&path)?;
    log.info(&format!("removed module '{name}'"));
    Ok(())
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn only_non_empty_install_lists_are_kept() {
        let opts = ModuleAddOpts {
            name: "fzf".to_string(),
            description: "Fuzzy finder".to_string(),
            install_macos: vec!["brew install fzf".to_string()],
            ..ModuleAddOpts::default()
        };
        let module = module_from_opts(&opts);
        assert_eq!(module.install.len(), 1);
        assert_eq!(module.install["macos"], vec!["brew install fzf"]);
        assert_eq!(module.check, None);
    }

    #[test]
    fn blank_check_flag_is_dropped() {
        let opts = ModuleAddOpts {
            check: Some("  ".to_string()),
            ..ModuleAddOpts::default()
        };
        assert_eq!(module_from_opts(&opts).check, None);
    }
}
