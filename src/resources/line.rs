//! Line injection: make sure a dotfile contains a given line.
use std::fmt;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use super::fs::ensure_parent_dir;
use super::{Applicable, Resource, ResourceChange, ResourceState};
use crate::error::ResourceError;
use crate::paths::expand_home;

/// Recognised apply-step strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Append a line unless an equivalent one is already present.
    Inject,
}

impl FromStr for Strategy {
    type Err = ResourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "inject" => Ok(Self::Inject),
            other => Err(ResourceError::UnknownStrategy(other.to_string())),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inject => f.write_str("inject"),
        }
    }
}

/// A line that must be present in a file.
///
/// Lines are compared after trimming surrounding whitespace on both sides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineResource {
    pub path: PathBuf,
    pub line: String,
}

impl LineResource {
    #[must_use]
    pub fn new(path: PathBuf, line: impl Into<String>) -> Self {
        Self {
            path,
            line: line.into(),
        }
    }

    /// Resolve an apply-step target, expanding a leading `~`.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::HomeUnknown`] if the target uses `~` and no
    /// home directory is available.
    pub fn for_target(
        target: &str,
        line: impl Into<String>,
        home: Option<&Path>,
    ) -> Result<Self, ResourceError> {
        let path = if target.starts_with('~') {
            let home = home.ok_or_else(|| ResourceError::HomeUnknown {
                path: target.to_string(),
            })?;
            expand_home(target, home)
        } else {
            PathBuf::from(target)
        };
        Ok(Self::new(path, line))
    }

    fn io_err(&self) -> impl FnOnce(std::io::Error) -> ResourceError + '_ {
        |source| ResourceError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn contains_line(&self, content: &str) -> bool {
        let wanted = self.line.trim();
        content.lines().any(|l| l.trim() == wanted)
    }
}

impl Applicable for LineResource {
    fn description(&self) -> String {
        format!("{} ∋ {}", self.path.display(), self.line.trim())
    }

    fn apply(&self) -> Result<ResourceChange, ResourceError> {
        let existing = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(self.io_err()(e)),
        };
        if self.contains_line(&existing) {
            return Ok(ResourceChange::AlreadyCorrect);
        }

        ensure_parent_dir(&self.path).map_err(self.io_err())?;
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(self.io_err())?;
        let mut text = String::new();
        if !existing.is_empty() {
            text.push('\n');
        }
        text.push_str(&self.line);
        text.push('\n');
        file.write_all(text.as_bytes()).map_err(self.io_err())?;
        Ok(ResourceChange::Applied)
    }
}

impl Resource for LineResource {
    fn current_state(&self) -> Result<ResourceState, ResourceError> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) if self.contains_line(&content) => Ok(ResourceState::Correct),
            Ok(_) => Ok(ResourceState::Incorrect {
                current: "line absent".to_string(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ResourceState::Missing),
            Err(e) => Err(self.io_err()(e)),
        }
    }
}
