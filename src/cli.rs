use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

use crate::sync::DEFAULT_REPO_URL;

/// Top-level CLI entry point for the environment bootstrapper.
#[derive(Parser, Debug)]
#[command(
    name = "dotm",
    about = "Declarative environment bootstrapper",
    long_about = "dotm installs the tools described in a TOML module file, applies their \
                  dotfile edits, and syncs a bare dotfiles repository into $HOME without \
                  losing existing files.",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub global: GlobalOpts,
}

/// Options shared across all subcommands.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalOpts {
    /// Module configuration file (default: ./dotm.toml)
    #[arg(long, global = true, env = "DOTM_CONFIG")]
    pub config: Option<PathBuf>,

    /// Preview changes without applying
    #[arg(short = 'd', long, global = true)]
    pub dry_run: bool,

    /// Override platform detection (debian, macos, arch, ...)
    #[arg(long, global = true)]
    pub platform: Option<String>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Install modules and their dependencies
    Install(InstallOpts),
    /// Manage modules in the configuration file
    #[command(subcommand)]
    Module(ModuleCommand),
    /// Export, inspect and validate the configuration file
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Manage the dotfiles repository
    #[command(subcommand)]
    Repo(RepoCommand),
    /// Generate a shell completion script
    Completion(CompletionOpts),
    /// Print version information
    Version,
}

impl Command {
    /// Short name used for the per-command log file.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Install(_) => "install",
            Self::Module(_) => "module",
            Self::Config(_) => "config",
            Self::Repo(_) => "repo",
            Self::Completion(_) => "completion",
            Self::Version => "version",
        }
    }
}

/// Options for the `install` subcommand.
#[derive(Args, Debug, Clone)]
pub struct InstallOpts {
    /// Modules to install
    #[arg(required = true, value_name = "MODULE")]
    pub modules: Vec<String>,
}

/// `module` subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum ModuleCommand {
    /// List all available modules
    List,
    /// Add a new module to the configuration file
    Add(ModuleAddOpts),
    /// Remove a module from the configuration file
    Remove {
        /// Module to remove
        name: String,
    },
}

/// Options for `module add`.
#[derive(Args, Debug, Clone, Default)]
pub struct ModuleAddOpts {
    /// Module name
    pub name: String,

    /// Module description
    #[arg(long, default_value = "")]
    pub description: String,

    /// Command whose success means the module is already installed
    #[arg(long)]
    pub check: Option<String>,

    /// Comma-separated list of dependencies
    #[arg(long, value_delimiter = ',')]
    pub dependencies: Vec<String>,

    /// Install command(s) for Debian/Ubuntu
    #[arg(long, value_delimiter = ',')]
    pub install_debian: Vec<String>,

    /// Install command(s) for macOS
    #[arg(long, value_delimiter = ',')]
    pub install_macos: Vec<String>,

    /// Install command(s) for Arch Linux
    #[arg(long, value_delimiter = ',')]
    pub install_arch: Vec<String>,

    /// Default install command(s)
    #[arg(long, value_delimiter = ',')]
    pub install_default: Vec<String>,
}

/// `config` subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommand {
    /// Export the configuration to a file or stdout
    #[command(visible_alias = "download")]
    Export {
        /// Destination file (stdout when omitted)
        destination: Option<PathBuf>,
    },
    /// Show a summary of all modules, or details of one
    Show {
        /// Module to show
        module: Option<String>,
    },
    /// Check the configuration for problems
    Validate,
    /// Print a starter configuration or module block
    Template {
        /// Module name to generate a block for
        module: Option<String>,
    },
    /// Copy the configuration file
    Copy {
        /// Source file (default: the configured path)
        source: Option<PathBuf>,
        /// Destination file (default: <source>.backup)
        destination: Option<PathBuf>,
    },
}

/// `repo` subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum RepoCommand {
    /// Clone the bare dotfiles repository and check it out into $HOME
    Sync(SyncOpts),
}

/// Options for `repo sync`.
#[derive(Args, Debug, Clone)]
pub struct SyncOpts {
    /// Repository URL
    #[arg(long, default_value = DEFAULT_REPO_URL)]
    pub url: String,

    /// Bare repository location (default: ~/.dotfiles)
    #[arg(long)]
    pub dir: Option<PathBuf>,

    /// Root for timestamped backups of conflicting files (default: ~/.dotfiles-backup)
    #[arg(long)]
    pub backup_dir: Option<PathBuf>,

    /// Fast-forward pull after checkout
    #[arg(long)]
    pub pull: bool,
}

/// Options for `completion`.
#[derive(Args, Debug, Clone)]
pub struct CompletionOpts {
    /// Target shell
    #[arg(value_enum)]
    pub shell: Shell,
}

#[cfg(test)]
#[allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_install_multiple_modules() {
        let cli = Cli::parse_from(["dotm", "install", "zsh", "fzf"]);
        let Command::Install(opts) = cli.command else {
            panic!("expected install");
        };
        assert_eq!(opts.modules, vec!["zsh", "fzf"]);
    }

    #[test]
    fn install_requires_a_module() {
        assert!(Cli::try_parse_from(["dotm", "install"]).is_err());
    }

    #[test]
    fn parse_global_flags_after_subcommand() {
        let cli = Cli::parse_from([
            "dotm",
            "install",
            "zsh",
            "-d",
            "-v",
            "--config",
            "my.toml",
            "--platform",
            "arch",
        ]);
        assert!(cli.global.dry_run);
        assert!(cli.verbose);
        assert_eq!(cli.global.config, Some(PathBuf::from("my.toml")));
        assert_eq!(cli.global.platform.as_deref(), Some("arch"));
    }

    #[test]
    fn parse_module_add_with_lists() {
        let cli = Cli::parse_from([
            "dotm",
            "module",
            "add",
            "nvim",
            "--description",
            "Neovim",
            "--dependencies",
            "git,ripgrep",
            "--install-macos",
            "brew install neovim",
        ]);
        let Command::Module(ModuleCommand::Add(opts)) = cli.command else {
            panic!("expected module add");
        };
        assert_eq!(opts.name, "nvim");
        assert_eq!(opts.dependencies, vec!["git", "ripgrep"]);
        assert_eq!(opts.install_macos, vec!["brew install neovim"]);
        assert!(opts.install_debian.is_empty());
    }

    #[test]
    fn download_is_alias_for_export() {
        let cli = Cli::parse_from(["dotm", "config", "download", "out.toml"]);
        assert!(matches!(
            cli.command,
            Command::Config(ConfigCommand::Export { destination: Some(_) })
        ));
    }

    #[test]
    fn repo_sync_defaults() {
        let cli = Cli::parse_from(["dotm", "repo", "sync"]);
        let Command::Repo(RepoCommand::Sync(opts)) = cli.command else {
            panic!("expected repo sync");
        };
        assert_eq!(opts.url, DEFAULT_REPO_URL);
        assert!(opts.dir.is_none());
        assert!(!opts.pull);
    }

    #[test]
    fn parse_completion_shell() {
        let cli = Cli::parse_from(["dotm", "completion", "zsh"]);
        assert!(matches!(
            cli.command,
            Command::Completion(CompletionOpts { shell: Shell::Zsh })
        ));
        assert!(Cli::try_parse_from(["dotm", "completion", "tcsh"]).is_err());
    }

    #[test]
    fn command_names_match_subcommands() {
        assert_eq!(Cli::parse_from(["dotm", "repo", "sync"]).command.name(), "repo");
        assert_eq!(Cli::parse_from(["dotm", "install", "x"]).command.name(), "install");
    }

    #[test]
    fn parse_version() {
        let cli = Cli::parse_from(["dotm", "version"]);
        assert!(matches!(cli.command, Command::Version));
    }
}
