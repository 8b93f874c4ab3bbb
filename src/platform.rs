use std::fmt;

/// Install-map key used when a module has no list for the host platform.
pub const DEFAULT_PLATFORM_KEY: &str = "default";

/// Platform identifier used to pick a module's install commands.
///
/// Every Linux host is reported as [`Platform::Debian`]; Arch users select
/// their list explicitly with `--platform arch`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Platform {
    Debian,
    Macos,
    Arch,
    /// Any other host, keyed by its Rust target OS name (e.g. `"windows"`).
    Other(String),
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl Platform {
    /// Detect the current platform.
    #[must_use]
    pub fn detect() -> Self {
        Self::from_os(std::env::consts::OS)
    }

    /// Map a Rust target OS name onto an install-map key.
    #[must_use]
    pub fn from_os(os: &str) -> Self {
        match os {
            "linux" => Self::Debian,
            "macos" => Self::Macos,
            other => Self::Other(other.to_string()),
        }
    }

    /// Parse an explicit `--platform` value.
    #[must_use]
    pub fn from_key(key: &str) -> Self {
        match key.trim().to_ascii_lowercase().as_str() {
            "debian" => Self::Debian,
            "macos" => Self::Macos,
            "arch" => Self::Arch,
            other => Self::Other(other.to_string()),
        }
    }

    /// The install-map key for this platform.
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            Self::Debian => "debian",
            Self::Macos => "macos",
            Self::Arch => "arch",
            Self::Other(name) => name,
        }
    }
}
