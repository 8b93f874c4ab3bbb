//! Core logging types: summary entries, status, output channels and the
//! [`Log`] trait.

/// One line of the end-of-run summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskEntry {
    /// Module name or sync step.
    pub name: String,
    pub status: TaskStatus,
    /// Skip reason or error chain.
    pub message: Option<String>,
}

/// Outcome of a module install or sync step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    /// Completed and changed something.
    Ok,
    /// Nothing needed doing (the installed check passed, the clone exists).
    Skipped,
    /// Walked in simulate mode; nothing was changed.
    DryRun,
    Failed,
}

impl TaskStatus {
    /// Summary glyph for this status.
    #[must_use]
    pub const fn icon(self) -> &'static str {
        match self {
            Self::Ok => "✓",
            Self::Skipped => "○",
            Self::DryRun => "~",
            Self::Failed => "✗",
        }
    }

    /// ANSI colour used for the glyph and the total.
    #[must_use]
    pub const fn colour(self) -> &'static str {
        match self {
            Self::Ok => "\x1b[32m",
            Self::Skipped => "\x1b[33m",
            Self::DryRun => "\x1b[37m",
            Self::Failed => "\x1b[31m",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Skipped => "skipped",
            Self::DryRun => "dry-run",
            Self::Failed => "failed",
        }
    }
}

/// Tracing target an INFO event is emitted under, deciding how it is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    /// `==>` section header.
    Stage,
    /// Action that simulate mode skipped.
    DryRun,
    /// A line echoed from a child process.
    Output,
    Plain,
}

impl Channel {
    pub const STAGE_TARGET: &'static str = "dotm::stage";
    pub const DRY_RUN_TARGET: &'static str = "dotm::dry_run";
    pub const OUTPUT_TARGET: &'static str = "dotm::output";

    #[must_use]
    pub fn from_target(target: &str) -> Self {
        match target {
            Self::STAGE_TARGET => Self::Stage,
            Self::DRY_RUN_TARGET => Self::DryRun,
            Self::OUTPUT_TARGET => Self::Output,
            _ => Self::Plain,
        }
    }
}

/// Abstraction over logging backends.
///
/// The installer and the sync orchestrator log only through this trait so
/// tests can capture output without installing a tracing subscriber.
pub trait Log: Send + Sync {
    fn stage(&self, msg: &str);
    fn info(&self, msg: &str);
    /// Shown on the console only with `--verbose`.
    fn debug(&self, msg: &str);
    fn warn(&self, msg: &str);
    fn error(&self, msg: &str);
    /// Report an action simulate mode did not perform.
    fn dry_run(&self, msg: &str);
    /// Record a result for the summary.
    fn record_task(&self, name: &str, status: TaskStatus, message: Option<&str>);
}
