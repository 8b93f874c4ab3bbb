// Shared helpers for integration tests.
//
// Provides a temporary-directory-backed workspace holding a `dotm.toml`, and
// a scripted executor so command handlers can run end to end without
// spawning real processes.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use dotm::cli::GlobalOpts;
use dotm::config::Config;
use dotm::error::CommandError;
use dotm::exec::{ExecResult, Executor};

/// An isolated workspace backed by a [`tempfile::TempDir`].
pub struct IntegrationTestContext {
    pub root: tempfile::TempDir,
}

impl IntegrationTestContext {
    /// Create a workspace whose `dotm.toml` holds `config`.
    pub fn with_config(config: &str) -> Self {
        let root = tempfile::tempdir().expect("create temp dir");
        std::fs::write(root.path().join("dotm.toml"), config).expect("write dotm.toml");
        Self { root }
    }

    /// Create a workspace with no configuration file.
    pub fn empty() -> Self {
        Self {
            root: tempfile::tempdir().expect("create temp dir"),
        }
    }

    pub fn root_path(&self) -> &Path {
        self.root.path()
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.path().join("dotm.toml")
    }

    /// Global options pointing at this workspace's configuration.
    pub fn global(&self, platform: &str) -> GlobalOpts {
        GlobalOpts {
            config: Some(self.config_path()),
            dry_run: false,
            platform: Some(platform.to_string()),
        }
    }

    /// Re-read the configuration file from disk.
    pub fn load_config(&self) -> Config {
        Config::load(&self.config_path()).expect("load config")
    }

    pub fn read(&self, relative: &str) -> String {
        std::fs::read_to_string(self.root.path().join(relative)).expect("read file")
    }
}

/// Executor that answers each command from a script.
///
/// Commands whose line contains a registered pattern get that pattern's
/// response; anything else is answered from the FIFO queue, and succeeds
/// with empty output once the queue is drained.
#[derive(Debug, Default)]
pub struct FakeExecutor {
    rules: Vec<(String, bool, String)>,
    queue: Mutex<VecDeque<(bool, String)>>,
    calls: Mutex<Vec<String>>,
    missing: Vec<String>,
}

impl FakeExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer any command line containing `pattern` with `(success, output)`.
    pub fn on(mut self, pattern: &str, success: bool, output: &str) -> Self {
        self.rules
            .push((pattern.to_string(), success, output.to_string()));
        self
    }

    /// Queue a response for the next command that matches no rule.
    pub fn then(self, success: bool, output: &str) -> Self {
        self.queue
            .lock()
            .expect("queue lock")
            .push_back((success, output.to_string()));
        self
    }

    /// Report `program` as absent from `PATH`.
    pub fn without(mut self, program: &str) -> Self {
        self.missing.push(program.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls lock").clone()
    }
}

impl Executor for FakeExecutor {
    fn run_unchecked(&self, program: &str, args: &[&str]) -> Result<ExecResult, CommandError> {
        let line = std::iter::once(program)
            .chain(args.iter().copied())
            .collect::<Vec<_>>()
            .join(" ");
        self.calls.lock().expect("calls lock").push(line.clone());

        let (success, output) = self
            .rules
            .iter()
            .find(|(pattern, _, _)| line.contains(pattern.as_str()))
            .map(|(_, success, output)| (*success, output.clone()))
            .or_else(|| self.queue.lock().expect("queue lock").pop_front())
            .unwrap_or((true, String::new()));

        Ok(ExecResult {
            output,
            success,
            code: Some(i32::from(!success)),
        })
    }

    fn which(&self, program: &str) -> bool {
        !self.missing.iter().any(|m| m == program)
    }
}
