//! Path safety checks and home-directory helpers.
use std::path::{Component, Path, PathBuf};

use crate::error::PathError;

/// Validate and lexically normalise a repository-relative path.
///
/// Surrounding whitespace is trimmed, `.` segments and repeated separators
/// are dropped and `name/..` pairs are collapsed. The result must still be a
/// non-empty relative path that stays inside its base directory; anything
/// else is rejected. Conflict paths scraped from git output pass through here
/// before any file is moved, so this is the only guard against a crafted
/// entry reaching outside the home or backup directory.
///
/// # Errors
///
/// Returns [`PathError::InvalidPath`] for empty, absolute or escaping paths.
pub fn safe_relative_path(candidate: &str) -> Result<PathBuf, PathError> {
    let invalid = |reason| PathError::InvalidPath {
        path: candidate.to_string(),
        reason,
    };

    let trimmed = candidate.trim();
    if trimmed.is_empty() {
        return Err(invalid("path is empty"));
    }

    let path = Path::new(trimmed);
    if path.has_root() || path.is_absolute() {
        return Err(invalid("absolute paths are not allowed"));
    }

    let mut cleaned: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match cleaned.last() {
                Some(Component::Normal(_)) => {
                    cleaned.pop();
                }
                _ => cleaned.push(component),
            },
            Component::Normal(_) => cleaned.push(component),
            Component::RootDir | Component::Prefix(_) => {
                return Err(invalid("absolute paths are not allowed"));
            }
        }
    }

    match cleaned.first() {
        None => Err(invalid("path resolves to the current directory")),
        Some(Component::ParentDir) => Err(invalid("path escapes the base directory")),
        Some(_) => Ok(cleaned.iter().collect()),
    }
}

/// Return the user's home directory from `HOME` (or `USERPROFILE` on Windows).
#[must_use]
pub fn home_dir() -> Option<PathBuf> {
    let var = if cfg!(target_os = "windows") {
        std::env::var_os("USERPROFILE").or_else(|| std::env::var_os("HOME"))
    } else {
        std::env::var_os("HOME")
    };
    var.filter(|v| !v.is_empty()).map(PathBuf::from)
}

/// Expand a leading `~` in `path` against `home`.
///
/// Only a bare `~` or a `~/` prefix is expanded; `~user` forms are left as
/// they are.
#[must_use]
pub fn expand_home(path: &str, home: &Path) -> PathBuf {
    if path == "~" {
        return home.to_path_buf();
    }
    path.strip_prefix("~/")
        .map_or_else(|| PathBuf::from(path), |rest| home.join(rest))
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_dotfile_unchanged() {
        assert_eq!(safe_relative_path(".zshrc").unwrap(), PathBuf::from(".zshrc"));
    }

    #[test]
    fn accepts_nested_path() {
        assert_eq!(
            safe_relative_path(".config/nvim/init.vim").unwrap(),
            PathBuf::from(".config/nvim/init.vim")
        );
    }

    #[test]
    fn trims_and_normalises() {
        assert_eq!(
            safe_relative_path("  ./.config//nvim/./init.vim \t").unwrap(),
            PathBuf::from(".config/nvim/init.vim")
        );
    }

    #[test]
    fn collapses_inner_parent_segments() {
        assert_eq!(
            safe_relative_path(".config/tmp/../nvim").unwrap(),
            PathBuf::from(".config/nvim")
        );
    }

    #[test]
    fn rejects_parent_traversal() {
        let err = safe_relative_path("../evil").unwrap_err();
        assert!(err.to_string().contains("escapes"), "{err}");
    }

    #[test]
    fn rejects_bare_parent_marker() {
        assert!(safe_relative_path("..").is_err());
    }

    #[test]
    fn rejects_traversal_hidden_behind_normal_segment() {
        assert!(safe_relative_path("a/../../evil").is_err());
    }

    #[test]
    fn rejects_absolute_path() {
        let err = safe_relative_path("/etc/passwd").unwrap_err();
        assert!(err.to_string().contains("absolute"), "{err}");
    }

    #[test]
    fn rejects_whitespace_only() {
        let err = safe_relative_path("   ").unwrap_err();
        assert!(err.to_string().contains("empty"), "{err}");
    }

    #[test]
    fn rejects_current_directory() {
        assert!(safe_relative_path(".").is_err());
        assert!(safe_relative_path("a/..").is_err());
    }

    #[test]
    fn expand_home_handles_tilde_prefix() {
        let home = Path::new("/home/test");
        assert_eq!(expand_home("~/.zshrc", home), PathBuf::from("/home/test/.zshrc"));
        assert_eq!(expand_home("~", home), PathBuf::from("/home/test"));
    }

    #[test]
    fn expand_home_leaves_other_paths_alone() {
        let home = Path::new("/home/test");
        assert_eq!(expand_home("/etc/hosts", home), PathBuf::from("/etc/hosts"));
        assert_eq!(expand_home("~other/x", home), PathBuf::from("~other/x"));
    }
}
