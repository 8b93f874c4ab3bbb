//! Conflict-safe synchronisation of a bare dotfiles repository into `$HOME`.
//!
//! The flow is clone (when absent), configure, then checkout and an optional
//! fast-forward pull. Checkout and pull share one retry loop: when git refuses
//! to overwrite existing files, those files are moved into a timestamped
//! backup directory and the step is tried again.
pub mod backup;
pub mod conflicts;

use std::fmt;
use std::path::PathBuf;

use self::backup::{BackupEngine, create_backup_dir};
use self::conflicts::{ConflictDetector, Conflicts};
use crate::error::{CommandError, SyncError};
use crate::exec::Runner;
use crate::logging::{Log, TaskStatus};

/// Upper bound on attempts for one checkout or pull step.
pub const MAX_SYNC_ATTEMPTS: usize = 5;

/// Default remote for `repo sync`.
pub const DEFAULT_REPO_URL: &str = "git@github.com:w31r4/dotfiles.git";

/// A stage of the synchronisation flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStep {
    Clone,
    Configure,
    Checkout,
    Pull,
}

impl fmt::Display for SyncStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Clone => "clone",
            Self::Configure => "configure",
            Self::Checkout => "checkout",
            Self::Pull => "pull",
        })
    }
}

/// Inputs for one synchronisation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOptions {
    pub url: String,
    /// Location of the bare repository.
    pub repo_dir: PathBuf,
    /// Work tree, normally the home directory.
    pub home: PathBuf,
    /// Parent of the per-run timestamped backup directories.
    pub backup_root: PathBuf,
    /// Run `pull --ff-only` after the checkout.
    pub pull: bool,
}

/// What a successful run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub cloned: bool,
    /// Backup directory used by this run, if any conflict was hit.
    pub backup_dir: Option<PathBuf>,
    /// Number of files moved (or, in dry-run, that would be moved).
    pub backed_up: usize,
}

/// Run the full synchronisation flow.
///
/// # Errors
///
/// Returns [`SyncError::GitNotFound`] when git is unavailable, clone and
/// configure failures as-is, [`SyncError::Command`] for a checkout or pull
/// failure unrelated to conflicts, [`SyncError::RetriesExhausted`] when
/// conflicts persist for [`MAX_SYNC_ATTEMPTS`] attempts, and
/// [`SyncError::Backup`] if relocating a file fails.
pub fn sync(
    runner: &Runner<'_>,
    detector: &dyn ConflictDetector,
    opts: &SyncOptions,
) -> Result<SyncReport, SyncError> {
    if !runner.which("git") {
        return Err(SyncError::GitNotFound);
    }
    let mut run = SyncRun {
        runner,
        detector,
        opts,
        report: SyncReport::default(),
    };
    run.clone_if_missing()?;
    run.configure()?;
    run.with_backup(SyncStep::Checkout, &["checkout"])?;
    if opts.pull {
        run.with_backup(SyncStep::Pull, &["pull", "--ff-only"])?;
    }
    Ok(run.report)
}

struct SyncRun<'r, 'a> {
    runner: &'r Runner<'a>,
    detector: &'r dyn ConflictDetector,
    opts: &'r SyncOptions,
    report: SyncReport,
}

impl<'a> SyncRun<'_, 'a> {
    fn log(&self) -> &'a dyn Log {
        self.runner.log()
    }

    fn record(&self, step: SyncStep, ok: bool, message: Option<&str>) {
        let status = match (ok, self.runner.dry_run()) {
            (false, _) => TaskStatus::Failed,
            (true, true) => TaskStatus::DryRun,
            (true, false) => TaskStatus::Ok,
        };
        self.log().record_task(&step.to_string(), status, message);
    }

    fn git_dir_args(&self) -> [String; 2] {
        [
            format!("--git-dir={}", self.opts.repo_dir.display()),
            format!("--work-tree={}", self.opts.home.display()),
        ]
    }

    fn clone_if_missing(&mut self) -> Result<(), SyncError> {
        if self.opts.repo_dir.exists() {
            self.log().info(&format!(
                "repository already present at {}, skipping clone",
                self.opts.repo_dir.display()
            ));
            self.log()
                .record_task("clone", TaskStatus::Skipped, Some("already present"));
            return Ok(());
        }

        self.log().stage("Cloning dotfiles repository");
        let dir = self.opts.repo_dir.to_string_lossy();
        let result = self
            .runner
            .run("git", &["clone", "--bare", self.opts.url.as_str(), dir.as_ref()]);
        self.record(SyncStep::Clone, result.is_ok(), None);
        result.map_err(|source| SyncError::Clone {
            url: self.opts.url.clone(),
            source,
        })?;
        self.report.cloned = true;
        Ok(())
    }

    fn configure(&self) -> Result<(), SyncError> {
        let [git_dir, work_tree] = self.git_dir_args();
        let args = [
            git_dir.as_str(),
            work_tree.as_str(),
            "config",
            "--local",
            "status.showUntrackedFiles",
            "no",
        ];
        self.runner
            .run("git", &args)
            .map(|_| ())
            .map_err(|source| SyncError::Configure {
                repo: self.opts.repo_dir.clone(),
                source,
            })
    }

    /// Run `git <git_args>` against the bare repo as `step`, moving
    /// conflicting files aside and retrying until it succeeds or
    /// [`MAX_SYNC_ATTEMPTS`] is reached.
    fn with_backup(&mut self, step: SyncStep, git_args: &[&str]) -> Result<(), SyncError> {
        self.log().stage(&format!("Running git {step}"));
        let [git_dir, work_tree] = self.git_dir_args();
        let mut args = vec![git_dir.as_str(), work_tree.as_str()];
        args.extend_from_slice(git_args);

        let mut attempt = 1;
        loop {
            let err = match self.runner.run("git", &args) {
                Ok(_) => {
                    self.record(step, true, None);
                    return Ok(());
                }
                Err(err) => err,
            };
            let Conflicts::Paths(paths) = self.detector.detect(err.output()) else {
                self.record(step, false, Some("not caused by conflicting files"));
                return Err(SyncError::Command { step, source: err });
            };
            if attempt >= MAX_SYNC_ATTEMPTS {
                self.record(step, false, Some("conflicts persist"));
                return Err(SyncError::RetriesExhausted {
                    step,
                    attempts: attempt,
                    source: err,
                });
            }
            self.log().warn(&format!(
                "{step} blocked by {} existing file(s) (attempt {attempt}/{MAX_SYNC_ATTEMPTS})",
                paths.len()
            ));
            self.back_up(&paths, &err)?;
            attempt += 1;
        }
    }

    fn back_up(&mut self, paths: &[String], cause: &CommandError) -> Result<(), SyncError> {
        self.log().debug(&format!("conflict reported by: {cause}"));
        let dir = match &self.report.backup_dir {
            Some(dir) => dir.clone(),
            None => {
                let dir = create_backup_dir(
                    &self.opts.backup_root,
                    self.runner.dry_run(),
                    self.log(),
                )?;
                self.report.backup_dir = Some(dir.clone());
                dir
            }
        };
        let engine = BackupEngine::new(&self.opts.home, self.log(), self.runner.dry_run());
        let moved = engine.relocate(&dir, paths)?;
        self.report.backed_up += moved;
        Ok(())
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
    use super::conflicts::{GitConflictDetector, MockConflictDetector};
    use super::*;
    use crate::exec::test_helpers::ScriptedExecutor;
    use crate::logging::test_helpers::RecordingLog;

    const CONFLICT: &str = "error: The following untracked working tree files would be overwritten by checkout:\n\
                            \t.bashrc\n\
                            Please move or remove them before you switch branches.\n\
                            Aborting\n";

    struct Fixture {
        home: tempfile::TempDir,
        opts: SyncOptions,
    }

    impl Fixture {
        fn new(repo_exists: bool, pull: bool) -> Self {
            let home = tempfile::tempdir().unwrap();
            let repo_dir = home.path().join(".dotfiles");
            if repo_exists {
                std::fs::create_dir_all(&repo_dir).unwrap();
            }
            let opts = SyncOptions {
                url: "https://example.com/dotfiles.git".to_string(),
                repo_dir,
                home: home.path().to_path_buf(),
                backup_root: home.path().join(".dotfiles-backup"),
                pull,
            };
            Self { home, opts }
        }
    }

    #[test]
    fn step_display_names() {
        assert_eq!(SyncStep::Checkout.to_string(), "checkout");
        assert_eq!(SyncStep::Pull.to_string(), "pull");
    }

    #[test]
    fn clean_sync_clones_configures_and_checks_out() {
        let fx = Fixture::new(false, false);
        let exec = ScriptedExecutor::always(true, "", 3);
        let log = RecordingLog::default();
        let runner = Runner::new(&exec, &log, false);

        let report = sync(&runner, &GitConflictDetector, &fx.opts).unwrap();

        assert!(report.cloned);
        assert_eq!(report.backup_dir, None);
        let calls = exec.calls();
        assert_eq!(calls.len(), 3);
        assert!(calls[0].starts_with("git clone --bare https://example.com/dotfiles.git"));
        assert!(calls[1].ends_with("config --local status.showUntrackedFiles no"));
        assert!(calls[2].ends_with("checkout"));
        assert!(calls[2].contains("--work-tree="));
    }

    #[test]
    fn existing_repo_skips_clone() {
        let fx = Fixture::new(true, false);
        let exec = ScriptedExecutor::always(true, "", 2);
        let log = RecordingLog::default();
        let runner = Runner::new(&exec, &log, false);

        let report = sync(&runner, &GitConflictDetector, &fx.opts).unwrap();

        assert!(!report.cloned);
        assert_eq!(exec.call_count(), 2);
        assert!(log.tasks().contains(&("clone".to_string(), TaskStatus::Skipped)));
    }

    #[test]
    fn missing_git_fails_before_running_anything() {
        let fx = Fixture::new(true, false);
        let exec = ScriptedExecutor::new(vec![]).with_which(false);
        let log = RecordingLog::default();
        let runner = Runner::new(&exec, &log, false);

        let err = sync(&runner, &GitConflictDetector, &fx.opts).unwrap_err();
        assert!(matches!(err, SyncError::GitNotFound));
        assert_eq!(exec.call_count(), 0);
    }

    #[test]
    fn clone_failure_is_fatal() {
        let fx = Fixture::new(false, false);
        let exec = ScriptedExecutor::new(vec![(false, "fatal: repository not found")]);
        let log = RecordingLog::default();
        let runner = Runner::new(&exec, &log, false);

        let err = sync(&runner, &GitConflictDetector, &fx.opts).unwrap_err();
        assert!(matches!(err, SyncError::Clone { .. }));
        assert_eq!(exec.call_count(), 1);
    }

    #[test]
    fn configure_failure_is_fatal() {
        let fx = Fixture::new(true, false);
        let exec = ScriptedExecutor::new(vec![(false, "error: could not lock config file")]);
        let log = RecordingLog::default();
        let runner = Runner::new(&exec, &log, false);

        let err = sync(&runner, &GitConflictDetector, &fx.opts).unwrap_err();
        assert!(matches!(err, SyncError::Configure { .. }));
    }

    #[test]
    fn conflict_is_backed_up_then_retried() {
        let fx = Fixture::new(true, false);
        std::fs::write(fx.home.path().join(".bashrc"), "local").unwrap();
        let exec = ScriptedExecutor::new(vec![(true, ""), (false, CONFLICT), (true, "")]);
        let log = RecordingLog::default();
        let runner = Runner::new(&exec, &log, false);

        let report = sync(&runner, &GitConflictDetector, &fx.opts).unwrap();

        let backup_dir = report.backup_dir.expect("backup directory was created");
        assert!(backup_dir.starts_with(&fx.opts.backup_root));
        assert_eq!(
            std::fs::read_to_string(backup_dir.join(".bashrc")).unwrap(),
            "local"
        );
        assert!(!fx.home.path().join(".bashrc").exists());
        assert_eq!(report.backed_up, 1);
        assert_eq!(exec.call_count(), 3);
    }

    #[test]
    fn persistent_conflict_exhausts_after_five_attempts() {
        let fx = Fixture::new(true, false);
        let mut script = vec![(true, "")];
        script.extend(std::iter::repeat_n((false, CONFLICT), 10));
        let exec = ScriptedExecutor::new(script);
        let log = RecordingLog::default();
        let runner = Runner::new(&exec, &log, false);

        let err = sync(&runner, &GitConflictDetector, &fx.opts).unwrap_err();

        match err {
            SyncError::RetriesExhausted { step, attempts, .. } => {
                assert_eq!(step, SyncStep::Checkout);
                assert_eq!(attempts, MAX_SYNC_ATTEMPTS);
            }
            other => panic!("expected RetriesExhausted, got {other:?}"),
        }
        assert_eq!(exec.call_count(), 1 + MAX_SYNC_ATTEMPTS);
    }

    #[test]
    fn non_conflict_failure_stops_after_one_attempt() {
        let fx = Fixture::new(true, false);
        let exec = ScriptedExecutor::new(vec![
            (true, ""),
            (false, "fatal: unable to read tree"),
            (true, ""),
        ]);
        let log = RecordingLog::default();
        let runner = Runner::new(&exec, &log, false);

        let err = sync(&runner, &GitConflictDetector, &fx.opts).unwrap_err();

        assert!(matches!(
            err,
            SyncError::Command {
                step: SyncStep::Checkout,
                ..
            }
        ));
        assert_eq!(exec.call_count(), 2);
        assert!(!fx.opts.backup_root.exists());
    }

    #[test]
    fn backup_dir_is_reused_across_retries() {
        let fx = Fixture::new(true, false);
        std::fs::write(fx.home.path().join(".a"), "a").unwrap();
        std::fs::write(fx.home.path().join(".b"), "b").unwrap();
        let exec = ScriptedExecutor::new(vec![
            (true, ""),
            (false, "x"),
            (false, "x"),
            (true, ""),
        ]);
        let mut detector = MockConflictDetector::new();
        let mut seq = mockall::Sequence::new();
        detector
            .expect_detect()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Conflicts::Paths(vec![".a".to_string()]));
        detector
            .expect_detect()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Conflicts::Paths(vec![".b".to_string()]));
        let log = RecordingLog::default();
        let runner = Runner::new(&exec, &log, false);

        let report = sync(&runner, &detector, &fx.opts).unwrap();

        let dir = report.backup_dir.unwrap();
        assert!(dir.join(".a").exists());
        assert!(dir.join(".b").exists());
        assert_eq!(std::fs::read_dir(&fx.opts.backup_root).unwrap().count(), 1);
    }

    #[test]
    fn pull_runs_after_checkout_with_same_retry_loop() {
        let fx = Fixture::new(true, true);
        let merge = "error: Your local changes to the following files would be overwritten by merge:\n\
                     \t.vimrc\n\
                     Please commit your changes or stash them before you merge.\n\
                     Aborting\n";
        std::fs::write(fx.home.path().join(".vimrc"), "v").unwrap();
        let exec = ScriptedExecutor::new(vec![
            (true, ""),
            (true, ""),
            (false, merge),
            (true, ""),
        ]);
        let log = RecordingLog::default();
        let runner = Runner::new(&exec, &log, false);

        let report = sync(&runner, &GitConflictDetector, &fx.opts).unwrap();

        let calls = exec.calls();
        assert!(calls[2].ends_with("pull --ff-only"));
        assert!(report.backup_dir.unwrap().join(".vimrc").exists());
    }

    #[test]
    fn dry_run_spawns_nothing_and_touches_nothing() {
        let fx = Fixture::new(false, true);
        let exec = ScriptedExecutor::new(vec![]);
        let log = RecordingLog::default();
        let runner = Runner::new(&exec, &log, true);

        let report = sync(&runner, &GitConflictDetector, &fx.opts).unwrap();

        assert_eq!(exec.call_count(), 0);
        assert!(!fx.opts.repo_dir.exists());
        assert_eq!(report.backup_dir, None);
        assert_eq!(log.dry_runs().len(), 4);
    }

    #[test]
    fn detector_is_not_consulted_on_success() {
        let fx = Fixture::new(true, false);
        let exec = ScriptedExecutor::always(true, "", 2);
        let mut detector = MockConflictDetector::new();
        detector.expect_detect().never();
        let log = RecordingLog::default();
        let runner = Runner::new(&exec, &log, false);

        sync(&runner, &detector, &fx.opts).unwrap();
    }
}
