//! Extraction of "would be overwritten" paths from git's error output.
//!
//! git reports blocking files as an indented list under a marker line and
//! closes the list with an instruction or abort notice. Anything else in the
//! output is ignored, so unrecognised text yields no conflicts.

/// Phrases that open a list of blocking paths.
const MARKERS: &[&str] = &[
    "would be overwritten by checkout:",
    "would be overwritten by merge:",
];

/// Line prefixes that close a list of blocking paths.
const TERMINATORS: &[&str] = &[
    "Please move or remove",
    "Please commit your changes",
    "Please stash",
    "Aborting",
    "hint:",
    "error:",
    "fatal:",
];

/// Outcome of inspecting a failed synchronisation command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conflicts {
    /// The failure was not caused by existing files.
    None,
    /// Repository-relative paths that blocked the operation, in report order.
    Paths(Vec<String>),
}

impl Conflicts {
    #[must_use]
    pub fn from_paths(paths: Vec<String>) -> Self {
        if paths.is_empty() {
            Self::None
        } else {
            Self::Paths(paths)
        }
    }
}

/// Decides whether a failed command's output describes file conflicts.
#[cfg_attr(test, mockall::automock)]
pub trait ConflictDetector {
    fn detect(&self, output: &str) -> Conflicts;
}

/// [`ConflictDetector`] for git checkout and merge output.
#[derive(Debug, Default, Clone, Copy)]
pub struct GitConflictDetector;

impl ConflictDetector for GitConflictDetector {
    fn detect(&self, output: &str) -> Conflicts {
        Conflicts::from_paths(parse_overwritten_paths(output))
    }
}

/// Collect the paths listed under every "would be overwritten" block.
///
/// Adjacent duplicates are collapsed; repeats further apart are kept.
#[must_use]
pub fn parse_overwritten_paths(output: &str) -> Vec<String> {
    let mut paths: Vec<String> = Vec::new();
    let mut collecting = false;

    for line in output.lines() {
        if MARKERS.iter().any(|m| line.contains(m)) {
            collecting = true;
            continue;
        }
        if !collecting {
            continue;
        }
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if TERMINATORS.iter().any(|t| trimmed.starts_with(t)) {
            collecting = false;
            continue;
        }
        if paths.last().is_none_or(|last| last != trimmed) {
            paths.push(trimmed.to_string());
        }
    }
    paths
}
