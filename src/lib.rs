//! Declarative environment bootstrapper.
//!
//! dotm installs the tools described in a TOML module file, in dependency
//! order and with per-platform install commands, then applies each module's
//! dotfile edits. It also syncs a bare dotfiles repository into `$HOME`,
//! moving aside any untracked files that would block the checkout.
//!
//! The public API is organised into these layers:
//!
//! - **[`config`]**: load, edit, validate and render the module file
//! - **[`resources`]**: idempotent `check + apply` primitives (line injection)
//! - **[`installer`]**: dependency-ordered module installation
//! - **[`sync`]**: bare-repository clone, checkout and conflict backup
//! - **[`commands`]**: top-level subcommand orchestration
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod exec;
pub mod installer;
pub mod logging;
pub mod paths;
pub mod platform;
pub mod resources;
pub mod sync;
