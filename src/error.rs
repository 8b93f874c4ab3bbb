//! Domain-specific error types for dotm.
//!
//! Internal layers return the typed errors below; command handlers at the CLI
//! boundary convert them to [`anyhow::Error`] via `?` and add context there.
//!
//! # Error hierarchy
//!
//! ```text
//! DotmError
//! ├── Config(ConfigError)     loading, saving, module lookup
//! ├── Install(InstallError)   dependency walk, install and apply steps
//! ├── Sync(SyncError)         clone, configure, checkout/pull retries
//! └── Command(CommandError)   external process failures
//! ```

use std::path::PathBuf;

use thiserror::Error;

use crate::sync::SyncStep;

/// Top-level error type for dotm.
#[derive(Error, Debug)]
pub enum DotmError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Install error: {0}")]
    Install(#[from] InstallError),

    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),

    #[error("Command error: {0}")]
    Command(#[from] CommandError),
}

/// Errors that arise from loading and saving the module configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file does not exist.
    #[error("configuration file not found: {}", .path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read configuration file {}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse configuration file {}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("failed to serialize configuration")]
    Serialize(#[from] toml::ser::Error),

    #[error("failed to write configuration file {}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("module '{0}' not found in configuration")]
    UnknownModule(String),

    #[error("module '{0}' already exists")]
    DuplicateModule(String),
}

impl ConfigError {
    /// Whether this error means the file is simply absent.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// A repository-relative path that failed the safety check.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: &'static str },
}

/// Errors from running an external command.
#[derive(Error, Debug)]
pub enum CommandError {
    /// The process could not be started at all.
    #[error("failed to execute '{command}'")]
    Spawn {
        command: String,
        source: std::io::Error,
    },

    /// The process ran and exited non-zero. `output` holds the combined
    /// stdout and stderr text.
    #[error("command '{command}' failed (exit {code})")]
    Failed {
        command: String,
        code: i32,
        output: String,
    },

    /// Dry-run stand-in for an installed-check command.
    #[error("simulated failure for '{command}' (dry run)")]
    Simulated { command: String },
}

impl CommandError {
    /// Captured output of a failed command, empty for other variants.
    #[must_use]
    pub fn output(&self) -> &str {
        match self {
            Self::Failed { output, .. } => output,
            Self::Spawn { .. } | Self::Simulated { .. } => "",
        }
    }
}

/// Errors from idempotent resource edits such as line injection.
#[derive(Error, Debug)]
pub enum ResourceError {
    #[error("cannot expand '~' in {path}: home directory is unknown")]
    HomeUnknown { path: String },

    #[error("I/O error on {}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("unrecognized apply strategy '{0}'")]
    UnknownStrategy(String),
}

/// Errors raised by the module installer.
#[derive(Error, Debug)]
pub enum InstallError {
    #[error("module '{0}' not found in configuration")]
    UnknownModule(String),

    /// A module was revisited while its own dependencies were still being
    /// installed.
    #[error("circular dependency detected: {}", .chain.join(" -> "))]
    CyclicDependency { chain: Vec<String> },

    #[error("failed to install dependency '{dependency}' of module '{module}'")]
    Dependency {
        dependency: String,
        module: String,
        source: Box<Self>,
    },

    #[error("module '{module}' has no install commands for platform '{platform}' and no default")]
    UnsupportedPlatform { module: String, platform: String },

    #[error("module '{module}': install command '{command}' failed")]
    InstallCommand {
        module: String,
        command: String,
        source: CommandError,
    },

    #[error("module '{module}': failed to apply configuration to {target}")]
    Apply {
        module: String,
        target: String,
        source: ResourceError,
    },
}

/// Errors raised while relocating conflicting files.
#[derive(Error, Debug)]
pub enum BackupError {
    #[error(transparent)]
    InvalidPath(#[from] PathError),

    #[error("failed to move {} to {}", .from.display(), .to.display())]
    Move {
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to create directory {}", .path.display())]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Errors raised by the repository synchronisation flow.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("git is not installed or not on PATH")]
    GitNotFound,

    #[error("failed to clone {url}")]
    Clone { url: String, source: CommandError },

    #[error("failed to configure repository {}", .repo.display())]
    Configure {
        repo: PathBuf,
        source: CommandError,
    },

    /// The step failed for a reason unrelated to conflicting files.
    #[error("{step} failed")]
    Command { step: SyncStep, source: CommandError },

    #[error("{step} still failing after {attempts} attempts")]
    RetriesExhausted {
        step: SyncStep,
        attempts: usize,
        source: CommandError,
    },

    #[error("failed to back up conflicting files")]
    Backup(#[from] BackupError),
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use std::error::Error as StdError;
    use std::io;

    // -----------------------------------------------------------------------
    // ConfigError
    // -----------------------------------------------------------------------

    #[test]
    fn config_not_found_is_distinguishable() {
        let e = ConfigError::NotFound {
            path: PathBuf::from("dotm.toml"),
        };
        assert!(e.is_not_found());
        assert_eq!(e.to_string(), "configuration file not found: dotm.toml");

        let read = ConfigError::Read {
            path: PathBuf::from("dotm.toml"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(!read.is_not_found());
        assert!(read.source().is_some());
    }

    #[test]
    fn config_unknown_module_display() {
        let e = ConfigError::UnknownModule("fzf".to_string());
        assert_eq!(e.to_string(), "module 'fzf' not found in configuration");
    }

    // -----------------------------------------------------------------------
    // CommandError
    // -----------------------------------------------------------------------

    #[test]
    fn command_failed_display_and_output() {
        let e = CommandError::Failed {
            command: "git checkout".to_string(),
            code: 1,
            output: "error: boom".to_string(),
        };
        assert_eq!(e.to_string(), "command 'git checkout' failed (exit 1)");
        assert_eq!(e.output(), "error: boom");
    }

    #[test]
    fn simulated_has_no_output() {
        let e = CommandError::Simulated {
            command: "command -v zsh".to_string(),
        };
        assert!(e.output().is_empty());
        assert!(e.to_string().contains("dry run"));
    }

    // -----------------------------------------------------------------------
    // InstallError
    // -----------------------------------------------------------------------

    #[test]
    fn cyclic_dependency_lists_chain() {
        let e = InstallError::CyclicDependency {
            chain: vec!["a".to_string(), "b".to_string(), "a".to_string()],
        };
        assert_eq!(e.to_string(), "circular dependency detected: a -> b -> a");
    }

    #[test]
    fn dependency_error_names_both_modules_and_keeps_source() {
        let e = InstallError::Dependency {
            dependency: "git".to_string(),
            module: "nvim".to_string(),
            source: Box::new(InstallError::UnknownModule("git".to_string())),
        };
        let msg = e.to_string();
        assert!(msg.contains("'git'"));
        assert!(msg.contains("'nvim'"));
        let source = e.source().expect("dependency error has a source");
        assert!(source.to_string().contains("not found"));
    }

    #[test]
    fn unsupported_platform_display() {
        let e = InstallError::UnsupportedPlatform {
            module: "zsh".to_string(),
            platform: "windows".to_string(),
        };
        assert!(e.to_string().contains("'zsh'"));
        assert!(e.to_string().contains("'windows'"));
    }

    // -----------------------------------------------------------------------
    // SyncError
    // -----------------------------------------------------------------------

    #[test]
    fn retries_exhausted_names_step_and_attempts() {
        let e = SyncError::RetriesExhausted {
            step: SyncStep::Checkout,
            attempts: 5,
            source: CommandError::Failed {
                command: "git checkout".to_string(),
                code: 1,
                output: String::new(),
            },
        };
        assert_eq!(e.to_string(), "checkout still failing after 5 attempts");
        assert!(e.source().is_some());
    }

    #[test]
    fn backup_error_wraps_path_error_transparently() {
        let e: BackupError = PathError::InvalidPath {
            path: "../evil".to_string(),
            reason: "escapes the base directory",
        }
        .into();
        assert_eq!(
            e.to_string(),
            "invalid path '../evil': escapes the base directory"
        );
    }

    // -----------------------------------------------------------------------
    // Conversions and bounds
    // -----------------------------------------------------------------------

    #[test]
    fn dotm_error_from_install_error() {
        let e: DotmError = InstallError::UnknownModule("x".to_string()).into();
        assert!(e.to_string().starts_with("Install error"));
    }

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn all_error_types_are_send_sync() {
        assert_send_sync::<DotmError>();
        assert_send_sync::<ConfigError>();
        assert_send_sync::<CommandError>();
        assert_send_sync::<InstallError>();
        assert_send_sync::<SyncError>();
        assert_send_sync::<BackupError>();
    }

    #[test]
    fn errors_convert_to_anyhow() {
        let _a: anyhow::Error = SyncError::Backup(BackupError::InvalidPath(
            PathError::InvalidPath {
                path: String::new(),
                reason: "empty",
            },
        ))
        .into();
        let _b: anyhow::Error = ConfigError::DuplicateModule("x".to_string()).into();
    }
}
