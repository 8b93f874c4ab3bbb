//! Relocation of conflicting home-directory files into a backup tree.
use std::path::{Path, PathBuf};

use crate::error::BackupError;
use crate::logging::Log;
use crate::paths::safe_relative_path;
use crate::resources::fs::{ensure_parent_dir, move_path};

/// Name for a new backup directory: local time with nanosecond precision,
/// e.g. `20250301-142233.123456789`.
#[must_use]
pub fn backup_timestamp() -> String {
    chrono::Local::now().format("%Y%m%d-%H%M%S%.9f").to_string()
}

/// Create `<root>/<timestamp>` and return its path.
///
/// In dry-run mode the path is chosen and reported but not created.
///
/// # Errors
///
/// Returns [`BackupError::CreateDir`] if the directory cannot be created.
pub fn create_backup_dir(root: &Path, dry_run: bool, log: &dyn Log) -> Result<PathBuf, BackupError> {
    let dir = root.join(backup_timestamp());
    if dry_run {
        log.dry_run(&format!("would create backup directory {}", dir.display()));
        return Ok(dir);
    }
    std::fs::create_dir_all(&dir).map_err(|source| BackupError::CreateDir {
        path: dir.clone(),
        source,
    })?;
    log.info(&format!("backing up conflicting files to {}", dir.display()));
    Ok(dir)
}

/// Moves conflicting files out of the home directory.
pub struct BackupEngine<'a> {
    home: &'a Path,
    log: &'a dyn Log,
    dry_run: bool,
}

impl std::fmt::Debug for BackupEngine<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackupEngine")
            .field("home", &self.home)
            .field("dry_run", &self.dry_run)
            .finish_non_exhaustive()
    }
}

impl<'a> BackupEngine<'a> {
    #[must_use]
    pub const fn new(home: &'a Path, log: &'a dyn Log, dry_run: bool) -> Self {
        Self { home, log, dry_run }
    }

    /// Move every path in `conflicts` from the home directory to the same
    /// relative location under `backup_dir`. Returns how many entries moved.
    ///
    /// Paths whose source no longer exists are skipped. An entry already
    /// backed up under the same name is kept and the newcomer gets the first
    /// free `<name>.N` sibling. Processing stops at the first invalid path;
    /// moves already made are kept.
    ///
    /// # Errors
    ///
    /// Returns [`BackupError::InvalidPath`] for an unsafe path, and
    /// [`BackupError::CreateDir`] or [`BackupError::Move`] on I/O failure.
    pub fn relocate(&self, backup_dir: &Path, conflicts: &[String]) -> Result<usize, BackupError> {
        let mut moved = 0;
        for candidate in conflicts {
            let rel = safe_relative_path(candidate)?;
            let from = self.home.join(&rel);
            if from.symlink_metadata().is_err() {
                self.log
                    .debug(&format!("nothing to back up at {}", from.display()));
                continue;
            }
            let to = vacant_destination(backup_dir.join(&rel));
            if self.dry_run {
                self.log
                    .dry_run(&format!("would move {} -> {}", from.display(), to.display()));
                moved += 1;
                continue;
            }

            ensure_parent_dir(&to).map_err(|source| BackupError::CreateDir {
                path: to.parent().map_or_else(|| to.clone(), Path::to_path_buf),
                source,
            })?;
            move_path(&from, &to).map_err(|source| BackupError::Move {
                from: from.clone(),
                to: to.clone(),
                source,
            })?;
            self.log.info(&format!("backed up {}", rel.display()));
            moved += 1;
        }
        Ok(moved)
    }
}

/// `to` itself when nothing is there, otherwise the first of `to.1`,
/// `to.2`, ... that does not exist.
fn vacant_destination(to: PathBuf) -> PathBuf {
    if to.symlink_metadata().is_err() {
        return to;
    }
    let base = to.as_os_str().to_os_string();
    (1_u32..)
        .map(|n| {
            let mut name = base.clone();
            name.push(format!(".{n}"));
            PathBuf::from(name)
        })
        .find(|candidate| candidate.symlink_metadata().is_err())
        .unwrap_or(to)
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::logging::test_helpers::RecordingLog;

    fn paths(list: &[&str]) -> Vec<String> {
        list.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn timestamp_has_nanosecond_suffix() {
        let ts = backup_timestamp();
        let (stamp, nanos) = ts.split_once('.').unwrap();
        assert_eq!(stamp.len(), 15, "{ts}");
        assert_eq!(stamp.as_bytes()[8], b'-');
        assert_eq!(nanos.len(), 9, "{ts}");
        assert!(nanos.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn relocates_preserving_relative_layout() {
        let home = tempfile::tempdir().unwrap();
        let backup = tempfile::tempdir().unwrap();
        std::fs::write(home.path().join(".bashrc"), "a").unwrap();
        std::fs::create_dir_all(home.path().join(".config/nvim")).unwrap();
        std::fs::write(home.path().join(".config/nvim/init.vim"), "b").unwrap();
        let log = RecordingLog::default();

        let moved = BackupEngine::new(home.path(), &log, false)
            .relocate(backup.path(), &paths(&[".bashrc", ".config/nvim/init.vim"]))
            .unwrap();

        assert_eq!(moved, 2);
        assert!(!home.path().join(".bashrc").exists());
        assert_eq!(
            std::fs::read_to_string(backup.path().join(".config/nvim/init.vim")).unwrap(),
            "b"
        );
    }

    #[test]
    fn missing_source_is_a_no_op() {
        let home = tempfile::tempdir().unwrap();
        let backup = tempfile::tempdir().unwrap();
        let log = RecordingLog::default();

        let moved = BackupEngine::new(home.path(), &log, false)
            .relocate(backup.path(), &paths(&[".gone", ".also/gone"]))
            .unwrap();

        assert_eq!(moved, 0);
        assert!(std::fs::read_dir(backup.path()).unwrap().next().is_none());
    }

    #[test]
    fn invalid_path_stops_after_earlier_moves() {
        let home = tempfile::tempdir().unwrap();
        let backup = tempfile::tempdir().unwrap();
        std::fs::write(home.path().join(".a"), "a").unwrap();
        std::fs::write(home.path().join(".b"), "b").unwrap();
        let log = RecordingLog::default();

        let err = BackupEngine::new(home.path(), &log, false)
            .relocate(backup.path(), &paths(&[".a", "../evil", ".b"]))
            .unwrap_err();

        assert!(matches!(err, BackupError::InvalidPath(_)));
        assert!(backup.path().join(".a").exists());
        assert!(home.path().join(".b").exists());
    }

    #[test]
    fn absolute_path_is_rejected() {
        let home = tempfile::tempdir().unwrap();
        let backup = tempfile::tempdir().unwrap();
        let log = RecordingLog::default();
        let err = BackupEngine::new(home.path(), &log, false)
            .relocate(backup.path(), &paths(&["/etc/passwd"]))
            .unwrap_err();
        assert!(err.to_string().contains("absolute"));
    }

    #[test]
    fn dry_run_reports_without_moving() {
        let home = tempfile::tempdir().unwrap();
        let backup = tempfile::tempdir().unwrap();
        std::fs::write(home.path().join(".zshrc"), "z").unwrap();
        let log = RecordingLog::default();

        let moved = BackupEngine::new(home.path(), &log, true)
            .relocate(&backup.path().join("ts"), &paths(&[".zshrc"]))
            .unwrap();

        assert_eq!(moved, 1);
        assert!(home.path().join(".zshrc").exists());
        assert!(!backup.path().join("ts").exists());
        assert_eq!(log.dry_runs().len(), 1);
        assert!(log.dry_runs()[0].contains(".zshrc"));
    }

    #[test]
    fn second_relocation_keeps_earlier_backup() {
        let home = tempfile::tempdir().unwrap();
        let backup = tempfile::tempdir().unwrap();
        let log = RecordingLog::default();
        let engine = BackupEngine::new(home.path(), &log, false);

        std::fs::write(home.path().join(".bashrc"), "original").unwrap();
        assert_eq!(engine.relocate(backup.path(), &paths(&[".bashrc"])).unwrap(), 1);
        std::fs::write(home.path().join(".bashrc"), "recreated").unwrap();
        assert_eq!(engine.relocate(backup.path(), &paths(&[".bashrc"])).unwrap(), 1);
        std::fs::write(home.path().join(".bashrc"), "third").unwrap();
        assert_eq!(engine.relocate(backup.path(), &paths(&[".bashrc"])).unwrap(), 1);

        let read = |name: &str| std::fs::read_to_string(backup.path().join(name)).unwrap();
        assert_eq!(read(".bashrc"), "original");
        assert_eq!(read(".bashrc.1"), "recreated");
        assert_eq!(read(".bashrc.2"), "third");
        assert!(!home.path().join(".bashrc").exists());
    }

    #[test]
    fn colliding_directory_gets_numbered_sibling() {
        let home = tempfile::tempdir().unwrap();
        let backup = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(backup.path().join(".config/nvim")).unwrap();
        std::fs::write(backup.path().join(".config/nvim/init.vim"), "kept").unwrap();
        std::fs::create_dir_all(home.path().join(".config/nvim")).unwrap();
        std::fs::write(home.path().join(".config/nvim/init.vim"), "new").unwrap();
        let log = RecordingLog::default();

        BackupEngine::new(home.path(), &log, false)
            .relocate(backup.path(), &paths(&[".config/nvim"]))
            .unwrap();

        let base = backup.path().join(".config");
        assert_eq!(std::fs::read_to_string(base.join("nvim/init.vim")).unwrap(), "kept");
        assert_eq!(std::fs::read_to_string(base.join("nvim.1/init.vim")).unwrap(), "new");
    }

    #[test]
    fn create_backup_dir_creates_timestamped_child() {
        let root = tempfile::tempdir().unwrap();
        let log = RecordingLog::default();
        let dir = create_backup_dir(&root.path().join("backups"), false, &log).unwrap();
        assert!(dir.is_dir());
        assert_eq!(dir.parent().unwrap(), root.path().join("backups"));
    }

    #[test]
    fn create_backup_dir_dry_run_creates_nothing() {
        let root = tempfile::tempdir().unwrap();
        let log = RecordingLog::default();
        let dir = create_backup_dir(root.path(), true, &log).unwrap();
        assert!(!dir.exists());
        assert_eq!(log.dry_runs().len(), 1);
    }
}
