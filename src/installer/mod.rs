//! Dependency-ordered module installation.
pub mod state;

use std::path::Path;

pub use self::state::{RunState, VisitState};
use crate::config::{ApplyStep, Config, Module};
use crate::error::{InstallError, ResourceError};
use crate::exec::Runner;
use crate::logging::{Log, TaskStatus};
use crate::platform::Platform;
use crate::resources::line::{LineResource, Strategy};
use crate::resources::process_resource;

/// How a module request was satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallOutcome {
    /// Already handled earlier in this run; nothing was executed.
    AlreadyDone,
    /// The installed-check passed, so only configuration was applied.
    AlreadyInstalled,
    /// Install commands ran (or were reported in dry-run).
    Installed,
}

/// Installs modules from a [`Config`] through a [`Runner`].
pub struct Installer<'a> {
    config: &'a Config,
    runner: &'a Runner<'a>,
    platform: &'a Platform,
    home: Option<&'a Path>,
}

impl std::fmt::Debug for Installer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Installer")
            .field("modules", &self.config.modules.len())
            .field("platform", &self.platform)
            .field("home", &self.home)
            .finish_non_exhaustive()
    }
}

impl<'a> Installer<'a> {
    /// `home` is used to expand `~` in apply-step targets.
    #[must_use]
    pub const fn new(
        config: &'a Config,
        runner: &'a Runner<'a>,
        platform: &'a Platform,
        home: Option<&'a Path>,
    ) -> Self {
        Self {
            config,
            runner,
            platform,
            home,
        }
    }

    fn log(&self) -> &'a dyn Log {
        self.runner.log()
    }

    /// Install `name` and, first, everything it depends on.
    ///
    /// Modules already done in `state` are skipped without running anything.
    ///
    /// # Errors
    ///
    /// - [`InstallError::UnknownModule`] if `name` is not configured
    /// - [`InstallError::CyclicDependency`] when `name` is reached again while
    ///   its own dependencies are still being installed
    /// - [`InstallError::Dependency`] wrapping any dependency failure
    /// - [`InstallError::UnsupportedPlatform`], [`InstallError::InstallCommand`]
    ///   or [`InstallError::Apply`] for the module's own steps
    pub fn install(&self, name: &str, state: &mut RunState) -> Result<InstallOutcome, InstallError> {
        match state.get(name) {
            Some(VisitState::Done) => {
                self.log().debug(&format!("{name}: already processed in this run"));
                return Ok(InstallOutcome::AlreadyDone);
            }
            Some(VisitState::InProgress) => {
                return Err(InstallError::CyclicDependency {
                    chain: state.chain_to(name),
                });
            }
            None => {}
        }
        let module = self
            .config
            .modules
            .get(name)
            .ok_or_else(|| InstallError::UnknownModule(name.to_string()))?;

        state.begin(name);
        match self.install_module(name, module, state) {
            Ok(outcome) => {
                state.finish(name);
                self.record(name, outcome);
                Ok(outcome)
            }
            Err(e) => {
                state.abandon(name);
                Err(e)
            }
        }
    }

    fn install_module(
        &self,
        name: &str,
        module: &Module,
        state: &mut RunState,
    ) -> Result<InstallOutcome, InstallError> {
        for dep in &module.dependencies {
            self.install(dep, state)
                .map_err(|source| InstallError::Dependency {
                    dependency: dep.clone(),
                    module: name.to_string(),
                    source: Box::new(source),
                })?;
        }

        self.log().stage(&format!("Installing {name}"));

        if let Some(check) = module.check_command() {
            match self.runner.shell(check) {
                Ok(_) => {
                    self.log().info(&format!("{name} is already installed"));
                    self.apply_all(name, module)?;
                    return Ok(InstallOutcome::AlreadyInstalled);
                }
                Err(e) => self.log().debug(&format!("{name} needs installing: {e}")),
            }
        }

        let commands = module.install_commands(self.platform).ok_or_else(|| {
            InstallError::UnsupportedPlatform {
                module: name.to_string(),
                platform: self.platform.to_string(),
            }
        })?;
        for command in commands {
            self.runner
                .shell(command)
                .map_err(|source| InstallError::InstallCommand {
                    module: name.to_string(),
                    command: command.clone(),
                    source,
                })?;
        }

        self.apply_all(name, module)?;
        Ok(InstallOutcome::Installed)
    }

    fn apply_all(&self, name: &str, module: &Module) -> Result<(), InstallError> {
        for step in &module.apply {
            self.apply_step(step)
                .map_err(|source| InstallError::Apply {
                    module: name.to_string(),
                    target: step.target.clone(),
                    source,
                })?;
        }
        Ok(())
    }

    fn apply_step(&self, step: &ApplyStep) -> Result<(), ResourceError> {
        match step.strategy.parse::<Strategy>()? {
            Strategy::Inject => {
                let resource = LineResource::for_target(&step.target, step.line.as_str(), self.home)?;
                process_resource(&resource, self.runner.dry_run(), self.log())?;
            }
        }
        Ok(())
    }

    fn record(&self, name: &str, outcome: InstallOutcome) {
        let (status, message) = match outcome {
            InstallOutcome::AlreadyDone => return,
            InstallOutcome::AlreadyInstalled => (TaskStatus::Skipped, Some("already installed")),
            InstallOutcome::Installed if self.runner.dry_run() => (TaskStatus::DryRun, None),
            InstallOutcome::Installed => (TaskStatus::Ok, None),
        };
        self.log().record_task(name, status, message);
    }
}

#[cfg(test)]
#[allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use std::error::Error as _;

    use super::*;
    use crate::config::test_helpers::{config, inject, module};
    use crate::exec::test_helpers::ScriptedExecutor;
    use crate::logging::test_helpers::RecordingLog;

    fn installer<'a>(
        cfg: &'a Config,
        runner: &'a Runner<'a>,
        platform: &'a Platform,
    ) -> Installer<'a> {
        Installer::new(cfg, runner, platform, None)
    }

    #[test]
    fn dependencies_install_before_dependents() {
        let cfg = config(vec![
            ("git", module(&[], &["install git"])),
            ("nvim", module(&["git"], &["install nvim"])),
        ]);
        let exec = ScriptedExecutor::always(true, "", 2);
        let log = RecordingLog::default();
        let runner = Runner::new(&exec, &log, false);
        let mut state = RunState::new();

        let outcome = installer(&cfg, &runner, &Platform::Debian)
            .install("nvim", &mut state)
            .unwrap();

        assert_eq!(outcome, InstallOutcome::Installed);
        assert_eq!(
            exec.calls(),
            vec!["sh -c install git", "sh -c install nvim"]
        );
        assert!(state.is_done("git"));
        assert!(state.is_done("nvim"));
        assert_eq!(
            log.tasks(),
            vec![
                ("git".to_string(), TaskStatus::Ok),
                ("nvim".to_string(), TaskStatus::Ok)
            ]
        );
    }

    #[test]
    fn shared_dependency_runs_once() {
        let cfg = config(vec![
            ("git", module(&[], &["install git"])),
            ("a", module(&["git"], &["install a"])),
            ("b", module(&["git"], &["install b"])),
        ]);
        let exec = ScriptedExecutor::always(true, "", 3);
        let log = RecordingLog::default();
        let runner = Runner::new(&exec, &log, false);
        let inst = installer(&cfg, &runner, &Platform::Debian);
        let mut state = RunState::new();

        inst.install("a", &mut state).unwrap();
        inst.install("b", &mut state).unwrap();

        assert_eq!(exec.call_count(), 3);
    }

    #[test]
    fn already_done_module_runs_nothing() {
        let mut m = module(&[], &["install zsh"]);
        m.check = Some("command -v zsh".to_string());
        let cfg = config(vec![("zsh", m)]);
        let exec = ScriptedExecutor::new(vec![]);
        let log = RecordingLog::default();
        let runner = Runner::new(&exec, &log, false);
        let mut state = RunState::new();
        state.begin("zsh");
        state.finish("zsh");

        let outcome = installer(&cfg, &runner, &Platform::Debian)
            .install("zsh", &mut state)
            .unwrap();

        assert_eq!(outcome, InstallOutcome::AlreadyDone);
        assert_eq!(exec.call_count(), 0);
    }

    #[test]
    fn cycle_fails_fast_with_chain() {
        let cfg = config(vec![
            ("a", module(&["b"], &["install a"])),
            ("b", module(&["a"], &["install b"])),
        ]);
        let exec = ScriptedExecutor::new(vec![]);
        let log = RecordingLog::default();
        let runner = Runner::new(&exec, &log, false);
        let mut state = RunState::new();

        let err = installer(&cfg, &runner, &Platform::Debian)
            .install("a", &mut state)
            .unwrap_err();

        let InstallError::Dependency { dependency, source, .. } = err else {
            panic!("expected dependency wrapper, got {err:?}");
        };
        assert_eq!(dependency, "b");
        let InstallError::Dependency { source: inner, .. } = *source else {
            panic!("expected nested dependency wrapper");
        };
        match *inner {
            InstallError::CyclicDependency { chain } => assert_eq!(chain, vec!["a", "b", "a"]),
            other => panic!("expected cycle, got {other:?}"),
        }
        assert_eq!(exec.call_count(), 0);
        assert_eq!(state.get("a"), None);
    }

    #[test]
    fn successful_check_skips_install_but_applies_config() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join(".zshrc");
        let mut m = module(&[], &["install zsh"]);
        m.check = Some("command -v zsh".to_string());
        m.apply.push(inject(&target.to_string_lossy(), "export EDITOR=nvim"));
        let cfg = config(vec![("zsh", m)]);
        let exec = ScriptedExecutor::new(vec![(true, "/usr/bin/zsh")]);
        let log = RecordingLog::default();
        let runner = Runner::new(&exec, &log, false);

        let outcome = installer(&cfg, &runner, &Platform::Debian)
            .install("zsh", &mut RunState::new())
            .unwrap();

        assert_eq!(outcome, InstallOutcome::AlreadyInstalled);
        assert_eq!(exec.calls(), vec!["sh -c command -v zsh"]);
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "export EDITOR=nvim\n");
        assert_eq!(
            log.tasks(),
            vec![("zsh".to_string(), TaskStatus::Skipped)]
        );
    }

    #[test]
    fn failed_check_proceeds_to_install() {
        let mut m = module(&[], &["install zsh"]);
        m.check = Some("command -v zsh".to_string());
        let cfg = config(vec![("zsh", m)]);
        let exec = ScriptedExecutor::new(vec![(false, ""), (true, "")]);
        let log = RecordingLog::default();
        let runner = Runner::new(&exec, &log, false);

        let outcome = installer(&cfg, &runner, &Platform::Debian)
            .install("zsh", &mut RunState::new())
            .unwrap();

        assert_eq!(outcome, InstallOutcome::Installed);
        assert_eq!(exec.call_count(), 2);
        assert!(log.warnings().is_empty());
    }

    #[test]
    fn platform_list_preferred_over_default() {
        let mut m = module(&[], &["generic"]);
        m.install
            .insert("macos".to_string(), vec!["brew install fzf".to_string()]);
        let cfg = config(vec![("fzf", m)]);
        let exec = ScriptedExecutor::always(true, "", 1);
        let log = RecordingLog::default();
        let runner = Runner::new(&exec, &log, false);

        installer(&cfg, &runner, &Platform::Macos)
            .install("fzf", &mut RunState::new())
            .unwrap();

        assert_eq!(exec.calls(), vec!["sh -c brew install fzf"]);
    }

    #[test]
    fn falls_back_to_default_list() {
        let cfg = config(vec![("fzf", module(&[], &["git clone fzf"]))]);
        let exec = ScriptedExecutor::always(true, "", 1);
        let log = RecordingLog::default();
        let runner = Runner::new(&exec, &log, false);

        installer(&cfg, &runner, &Platform::Arch)
            .install("fzf", &mut RunState::new())
            .unwrap();

        assert_eq!(exec.calls(), vec!["sh -c git clone fzf"]);
    }

    #[test]
    fn unsupported_platform_names_module_and_platform() {
        let mut m = Module::default();
        m.install
            .insert("macos".to_string(), vec!["brew install x".to_string()]);
        let cfg = config(vec![("x", m)]);
        let exec = ScriptedExecutor::new(vec![]);
        let log = RecordingLog::default();
        let runner = Runner::new(&exec, &log, false);
        let platform = Platform::Other("freebsd".to_string());

        let err = installer(&cfg, &runner, &platform)
            .install("x", &mut RunState::new())
            .unwrap_err();

        assert!(matches!(
            err,
            InstallError::UnsupportedPlatform { ref module, ref platform }
                if module == "x" && platform == "freebsd"
        ));
    }

    #[test]
    fn first_failing_command_aborts() {
        let cfg = config(vec![("x", module(&[], &["step one", "step two", "step three"]))]);
        let exec = ScriptedExecutor::new(vec![(true, ""), (false, "boom")]);
        let log = RecordingLog::default();
        let runner = Runner::new(&exec, &log, false);
        let mut state = RunState::new();

        let err = installer(&cfg, &runner, &Platform::Debian)
            .install("x", &mut state)
            .unwrap_err();

        match &err {
            InstallError::InstallCommand { command, source, .. } => {
                assert_eq!(command, "step two");
                assert_eq!(source.output(), "boom");
            }
            other => panic!("expected InstallCommand, got {other:?}"),
        }
        assert_eq!(exec.call_count(), 2);
        assert_eq!(state.get("x"), None);
    }

    #[test]
    fn dependency_failure_names_both_modules() {
        let cfg = config(vec![
            ("git", module(&[], &["install git"])),
            ("nvim", module(&["git"], &["install nvim"])),
        ]);
        let exec = ScriptedExecutor::new(vec![(false, "")]);
        let log = RecordingLog::default();
        let runner = Runner::new(&exec, &log, false);

        let err = installer(&cfg, &runner, &Platform::Debian)
            .install("nvim", &mut RunState::new())
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "failed to install dependency 'git' of module 'nvim'"
        );
        assert!(matches!(
            err,
            InstallError::Dependency { ref source, .. }
                if matches!(**source, InstallError::InstallCommand { .. })
        ));
        assert!(err.source().is_some());
        assert_eq!(exec.call_count(), 1);
    }

    #[test]
    fn unknown_dependency_is_reported_not_panicked() {
        let cfg = config(vec![("nvim", module(&["ghost"], &["install nvim"]))]);
        let exec = ScriptedExecutor::new(vec![]);
        let log = RecordingLog::default();
        let runner = Runner::new(&exec, &log, false);

        let err = installer(&cfg, &runner, &Platform::Debian)
            .install("nvim", &mut RunState::new())
            .unwrap_err();

        assert!(matches!(
            err,
            InstallError::Dependency { ref source, .. }
                if matches!(**source, InstallError::UnknownModule(ref n) if n == "ghost")
        ));
    }

    #[test]
    fn unknown_strategy_fails_explicitly() {
        let mut m = module(&[], &["install x"]);
        m.apply.push(ApplyStep {
            strategy: "symlink".to_string(),
            target: "/tmp/x".to_string(),
            line: String::new(),
        });
        let cfg = config(vec![("x", m)]);
        let exec = ScriptedExecutor::always(true, "", 1);
        let log = RecordingLog::default();
        let runner = Runner::new(&exec, &log, false);

        let err = installer(&cfg, &runner, &Platform::Debian)
            .install("x", &mut RunState::new())
            .unwrap_err();

        assert!(matches!(
            err,
            InstallError::Apply { ref target, source: ResourceError::UnknownStrategy(_), .. }
                if target == "/tmp/x"
        ));
    }

    #[test]
    fn tilde_target_expands_against_home() {
        let home = tempfile::tempdir().unwrap();
        let mut m = module(&[], &["install x"]);
        m.apply.push(inject("~/.config/x/rc", "enable=1"));
        let cfg = config(vec![("x", m)]);
        let exec = ScriptedExecutor::always(true, "", 1);
        let log = RecordingLog::default();
        let runner = Runner::new(&exec, &log, false);

        Installer::new(&cfg, &runner, &Platform::Debian, Some(home.path()))
            .install("x", &mut RunState::new())
            .unwrap();

        assert_eq!(
            std::fs::read_to_string(home.path().join(".config/x/rc")).unwrap(),
            "enable=1\n"
        );
    }

    #[test]
    fn dry_run_walks_install_path_without_side_effects() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join(".zshrc");
        let mut m = module(&[], &["sudo apt-get install -y zsh"]);
        m.check = Some("command -v zsh".to_string());
        m.apply.push(inject(&target.to_string_lossy(), "export EDITOR=nvim"));
        let cfg = config(vec![("zsh", m)]);
        let exec = ScriptedExecutor::new(vec![]);
        let log = RecordingLog::default();
        let runner = Runner::new(&exec, &log, true);

        let outcome = installer(&cfg, &runner, &Platform::Debian)
            .install("zsh", &mut RunState::new())
            .unwrap();

        assert_eq!(outcome, InstallOutcome::Installed);
        assert_eq!(exec.call_count(), 0);
        assert!(!target.exists());
        let dry = log.dry_runs();
        assert_eq!(dry.len(), 3, "{dry:?}");
        assert!(dry[0].contains("command -v zsh"));
        assert!(dry[1].contains("apt-get install"));
        assert!(dry[2].contains("export EDITOR=nvim"));
        assert_eq!(log.tasks(), vec![("zsh".to_string(), TaskStatus::DryRun)]);
    }

    #[test]
    fn unknown_module_is_reported() {
        let cfg = Config::default();
        let exec = ScriptedExecutor::new(vec![]);
        let log = RecordingLog::default();
        let runner = Runner::new(&exec, &log, false);
        let err = installer(&cfg, &runner, &Platform::Debian)
            .install("nope", &mut RunState::new())
            .unwrap_err();
        assert!(matches!(err, InstallError::UnknownModule(ref n) if n == "nope"));
    }
}
