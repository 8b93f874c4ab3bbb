//! Per-invocation record of which modules have been visited.
use std::collections::HashMap;

/// Progress of one module within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitState {
    /// Dependencies are still being installed.
    InProgress,
    /// Installed and configured during this run.
    Done,
}

/// Traversal state threaded through the installer.
///
/// Owned by the caller so separate runs never share progress.
#[derive(Debug, Default, Clone)]
pub struct RunState {
    visits: HashMap<String, VisitState>,
    path: Vec<String>,
}

impl RunState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<VisitState> {
        self.visits.get(name).copied()
    }

    #[must_use]
    pub fn is_done(&self, name: &str) -> bool {
        self.get(name) == Some(VisitState::Done)
    }

    /// Mark `name` as in progress and push it on the current path.
    pub fn begin(&mut self, name: &str) {
        self.visits.insert(name.to_string(), VisitState::InProgress);
        self.path.push(name.to_string());
    }

    /// Mark `name` as done.
    pub fn finish(&mut self, name: &str) {
        self.pop(name);
        self.visits.insert(name.to_string(), VisitState::Done);
    }

    /// Forget an in-progress visit after a failure so a later request can
    /// try again.
    pub fn abandon(&mut self, name: &str) {
        self.pop(name);
        self.visits.remove(name);
    }

    /// The current path from the first visit of `name` back to `name`.
    #[must_use]
    pub fn chain_to(&self, name: &str) -> Vec<String> {
        let start = self.path.iter().position(|n| n == name).unwrap_or(0);
        let mut chain: Vec<String> = self.path.iter().skip(start).cloned().collect();
        chain.push(name.to_string());
        chain
    }

    fn pop(&mut self, name: &str) {
        if self.path.last().is_some_and(|last| last == name) {
            self.path.pop();
        }
    }
}
