//! Idempotent edits applied after a module installs: each resource can
//! report its current state and converge to the desired one.
pub mod fs;
pub mod line;

use crate::error::ResourceError;
use crate::logging::Log;

/// Minimal interface for resources that can be described and applied.
pub trait Applicable {
    /// Shown in log lines, e.g. `~/.zshrc ∋ export X=1`.
    fn description(&self) -> String;

    /// Converge to the desired state, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// I/O failures and unresolvable paths.
    fn apply(&self) -> Result<ResourceChange, ResourceError>;
}

/// State of a resource before it is applied.
///
/// # Examples
///
/// ```
/// use dotm::resources::ResourceState;
///
/// let missing = ResourceState::Missing;
/// let wrong = ResourceState::Incorrect { current: "line absent".into() };
///
/// assert_ne!(missing, ResourceState::Correct);
/// assert_ne!(wrong, ResourceState::Correct);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceState {
    /// Resource does not exist at all.
    Missing,
    /// Resource exists and matches the desired state.
    Correct,
    /// Resource exists but does not match the desired state.
    Incorrect {
        /// Description of what is there now.
        current: String,
    },
}

/// Result of applying a resource change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceChange {
    /// Resource was created or updated.
    Applied,
    /// Resource was already correct (no change needed).
    AlreadyCorrect,
    /// Change was reported but not performed (dry run).
    Simulated,
}

/// Resources that can determine their own state before applying.
pub trait Resource: Applicable {
    /// Check the current state of the resource.
    ///
    /// # Errors
    ///
    /// Returns an error if the state cannot be determined.
    fn current_state(&self) -> Result<ResourceState, ResourceError>;

    /// Whether applying would change anything.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`current_state`](Self::current_state).
    fn needs_change(&self) -> Result<bool, ResourceError> {
        Ok(self.current_state()? != ResourceState::Correct)
    }
}

/// Check `resource` and apply it if needed, honouring `dry_run`.
///
/// # Errors
///
/// Propagates state-check and apply failures.
pub fn process_resource<R: Resource + ?Sized>(
    resource: &R,
    dry_run: bool,
    log: &dyn Log,
) -> Result<ResourceChange, ResourceError> {
    let desc = resource.description();
    match resource.current_state()? {
        ResourceState::Correct => {
            log.debug(&format!("ok: {desc}"));
            Ok(ResourceChange::AlreadyCorrect)
        }
        state if dry_run => {
            let msg = match state {
                ResourceState::Incorrect { current } => {
                    format!("would apply {desc} (currently {current})")
                }
                _ => format!("would apply: {desc}"),
            };
            log.dry_run(&msg);
            Ok(ResourceChange::Simulated)
        }
        _ => {
            let change = resource.apply()?;
            if change == ResourceChange::Applied {
                log.info(&format!("applied: {desc}"));
            }
            Ok(change)
        }
    }
}
