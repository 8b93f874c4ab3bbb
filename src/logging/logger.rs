//! Console/file logger that also collects the end-of-run summary.
use std::path::PathBuf;
use std::sync::Mutex;

use super::types::{Channel, Log, TaskEntry, TaskStatus};
use super::utils::log_file_path;

const RESET: &str = "\x1b[0m";

/// Per-status counts for the summary footer.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct Tally {
    ok: usize,
    skipped: usize,
    dry_run: usize,
    failed: usize,
}

impl Tally {
    fn of(entries: &[TaskEntry]) -> Self {
        entries.iter().fold(Self::default(), |mut t, e| {
            match e.status {
                TaskStatus::Ok => t.ok += 1,
                TaskStatus::Skipped => t.skipped += 1,
                TaskStatus::DryRun => t.dry_run += 1,
                TaskStatus::Failed => t.failed += 1,
            }
            t
        })
    }

    const fn total(self) -> usize {
        self.ok + self.skipped + self.dry_run + self.failed
    }

    fn footer(self) -> String {
        let part = |status: TaskStatus, n: usize| {
            format!("{}{n} {}{RESET}", status.colour(), status.label())
        };
        format!(
            "{} total: {}, {}, {}, {}",
            self.total(),
            part(TaskStatus::Ok, self.ok),
            part(TaskStatus::Skipped, self.skipped),
            part(TaskStatus::DryRun, self.dry_run),
            part(TaskStatus::Failed, self.failed),
        )
    }
}

fn entry_line(entry: &TaskEntry) -> String {
    let detail = entry
        .message
        .as_deref()
        .map_or_else(String::new, |m| format!(" ({m})"));
    format!(
        "{}{} {}{detail}{RESET}",
        entry.status.colour(),
        entry.status.icon(),
        entry.name
    )
}

/// Logger backed by the global tracing subscriber.
#[derive(Debug)]
pub struct Logger {
    entries: Mutex<Vec<TaskEntry>>,
    log_file: Option<PathBuf>,
}

impl Logger {
    /// Logger for `command`; the summary points at that command's log file.
    #[must_use]
    pub fn new(command: &str) -> Self {
        Self::with_log_file(log_file_path(command))
    }

    #[must_use]
    pub const fn with_log_file(log_file: Option<PathBuf>) -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            log_file,
        }
    }

    /// Snapshot of everything recorded so far.
    #[must_use]
    pub fn entries(&self) -> Vec<TaskEntry> {
        self.entries.lock().map_or_else(|_| Vec::new(), |g| g.clone())
    }

    pub fn error(&self, msg: &str) {
        tracing::error!("{msg}");
    }

    pub fn warn(&self, msg: &str) {
        tracing::warn!("{msg}");
    }

    pub fn stage(&self, msg: &str) {
        tracing::info!(target: Channel::STAGE_TARGET, "{msg}");
    }

    pub fn info(&self, msg: &str) {
        tracing::info!("{msg}");
    }

    pub fn debug(&self, msg: &str) {
        tracing::debug!("{msg}");
    }

    pub fn dry_run(&self, msg: &str) {
        tracing::info!(target: Channel::DRY_RUN_TARGET, "{msg}");
    }

    pub fn record_task(&self, name: &str, status: TaskStatus, message: Option<&str>) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(TaskEntry {
                name: name.to_string(),
                status,
                message: message.map(str::to_string),
            });
        }
    }

    #[must_use]
    pub fn failure_count(&self) -> usize {
        Tally::of(&self.entries()).failed
    }

    /// Log one line per recorded entry, then the totals. Does nothing when
    /// nothing was recorded.
    pub fn print_summary(&self) {
        let entries = self.entries();
        if entries.is_empty() {
            return;
        }
        self.stage("Summary");
        for entry in &entries {
            self.info(&entry_line(entry));
        }
        self.info(&Tally::of(&entries).footer());
        if let Some(path) = &self.log_file {
            self.info(&format!("\x1b[2mlog: {}{RESET}", path.display()));
        }
    }
}

impl Log for Logger {
    fn stage(&self, msg: &str) {
        Self::stage(self, msg);
    }
    fn info(&self, msg: &str) {
        Self::info(self, msg);
    }
    fn debug(&self, msg: &str) {
        Self::debug(self, msg);
    }
    fn warn(&self, msg: &str) {
        Self::warn(self, msg);
    }
    fn error(&self, msg: &str) {
        Self::error(self, msg);
    }
    fn dry_run(&self, msg: &str) {
        Self::dry_run(self, msg);
    }
    fn record_task(&self, name: &str, status: TaskStatus, message: Option<&str>) {
        Self::record_task(self, name, status, message);
    }
}
