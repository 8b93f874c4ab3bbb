//! Module configuration: data model, TOML loading and saving.
pub mod summary;
pub mod template;
pub mod validation;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::platform::{DEFAULT_PLATFORM_KEY, Platform};

/// Default configuration file name, resolved against the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "dotm.toml";

/// The whole configuration document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Modules keyed by identifier, kept sorted.
    pub modules: BTreeMap<String, Module>,
}

/// A named installable unit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Module {
    pub description: String,
    /// Identifiers of modules that must be installed first.
    pub dependencies: Vec<String>,
    /// Shell command whose zero exit means "already installed".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check: Option<String>,
    /// Install commands keyed by platform (`debian`, `macos`, `arch`, `default`).
    pub install: BTreeMap<String, Vec<String>>,
    /// Post-install configuration edits.
    pub apply: Vec<ApplyStep>,
}

/// One idempotent dotfile edit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplyStep {
    /// Strategy name; only `inject` is recognised.
    pub strategy: String,
    /// Target file, may start with `~/`.
    pub target: String,
    /// Line that must be present in the target.
    pub line: String,
}

impl Module {
    /// The installed-check command, ignoring an empty string.
    #[must_use]
    pub fn check_command(&self) -> Option<&str> {
        self.check.as_deref().map(str::trim).filter(|c| !c.is_empty())
    }

    /// Install commands for `platform`, falling back to the `default` list.
    ///
    /// Returns `None` when neither list exists.
    #[must_use]
    pub fn install_commands(&self, platform: &Platform) -> Option<&[String]> {
        self.install
            .get(platform.key())
            .or_else(|| self.install.get(DEFAULT_PLATFORM_KEY))
            .map(Vec::as_slice)
    }
}

impl Config {
    /// Load the configuration document at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotFound`] if the file does not exist, and
    /// [`ConfigError::Read`] or [`ConfigError::Parse`] for any other failure.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound {
                    path: path.to_path_buf(),
                }
            } else {
                ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;
        Self::parse(&content, path)
    }

    /// Load `path`, or start from an empty configuration if it does not exist.
    ///
    /// # Errors
    ///
    /// Any load error other than [`ConfigError::NotFound`].
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        match Self::load(path) {
            Err(e) if e.is_not_found() => Ok(Self::default()),
            other => other,
        }
    }

    /// Parse a TOML document; `origin` is only used in error messages.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] on malformed input.
    pub fn parse(content: &str, origin: &Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })
    }

    /// Serialise to a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Serialize`] if serialisation fails.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Write the configuration to `path` atomically.
    ///
    /// The document goes to a sibling temp file first and is then renamed
    /// over the destination.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Serialize`] or [`ConfigError::Write`].
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = self.to_toml()?;
        let tmp = temp_sibling(path);
        let write_err = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };
        std::fs::write(&tmp, content).map_err(write_err)?;
        std::fs::rename(&tmp, path).map_err(|source| {
            std::fs::remove_file(&tmp).ok();
            write_err(source)
        })
    }

    /// Look up a module by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownModule`] if it is not defined.
    pub fn module(&self, name: &str) -> Result<&Module, ConfigError> {
        self.modules
            .get(name)
            .ok_or_else(|| ConfigError::UnknownModule(name.to_string()))
    }

    /// Add a new module.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::DuplicateModule`] if the name is taken.
    pub fn add_module(&mut self, name: &str, module: Module) -> Result<(), ConfigError> {
        if self.modules.contains_key(name) {
            return Err(ConfigError::DuplicateModule(name.to_string()));
        }
        self.modules.insert(name.to_string(), module);
        Ok(())
    }

    /// Remove a module and return it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownModule`] if it is not defined.
    pub fn remove_module(&mut self, name: &str) -> Result<Module, ConfigError> {
        self.modules
            .remove(name)
            .ok_or_else(|| ConfigError::UnknownModule(name.to_string()))
    }
}

fn temp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map_or_else(|| "config".into(), |n| n.to_string_lossy().into_owned());
    path.with_file_name(format!(".{name}.tmp"))
}
