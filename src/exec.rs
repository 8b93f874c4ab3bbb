//! External process execution.
//!
//! [`Executor`] is the process-spawning seam; [`SystemExecutor`] is the real
//! implementation and tests swap in a scripted one. [`Runner`] layers the
//! dry-run flag on top so every caller honours simulate mode the same way.
use std::io::{self, BufRead as _, BufReader, Read};
use std::process::{Command, Stdio};
use std::sync::Mutex;

use crate::error::CommandError;
use crate::logging::{Channel, Log};

/// Result of a command execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecResult {
    /// Combined stdout and stderr, in the order lines arrived.
    pub output: String,
    pub success: bool,
    pub code: Option<i32>,
}

/// Abstraction over process spawning.
pub trait Executor: Send + Sync + std::fmt::Debug {
    /// Run `program` with `args` to completion and capture its output.
    ///
    /// A non-zero exit is reported through [`ExecResult::success`], not as an
    /// error.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::Spawn`] if the process cannot be started.
    fn run_unchecked(&self, program: &str, args: &[&str]) -> Result<ExecResult, CommandError>;

    /// Check if a program is available on `PATH`.
    fn which(&self, program: &str) -> bool;
}

/// Render a program and its arguments as a single display string.
#[must_use]
pub fn describe(program: &str, args: &[&str]) -> String {
    std::iter::once(program)
        .chain(args.iter().copied())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Production [`Executor`] that spawns real processes.
///
/// Both output pipes are drained on their own thread so that neither can
/// fill up and stall the child; each line is echoed as soon as it arrives.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemExecutor;

impl SystemExecutor {
    /// Echo and collect `pipe` line by line until EOF.
    ///
    /// A read error ends line capture: it is logged at debug, a marker is
    /// appended to the captured text, and the rest of the pipe is discarded
    /// so the child never blocks on a full buffer.
    fn drain(pipe: impl Read, combined: &Mutex<String>) {
        let mut reader = BufReader::new(pipe);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) => return,
                Ok(_) => {
                    let line = String::from_utf8_lossy(&buf);
                    let line = line.trim_end_matches(['\n', '\r']);
                    tracing::info!(target: Channel::OUTPUT_TARGET, "{line}");
                    if let Ok(mut out) = combined.lock() {
                        out.push_str(line);
                        out.push('\n');
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => {
                    tracing::debug!("stopped capturing child output: {e}");
                    if let Ok(mut out) = combined.lock() {
                        out.push_str(&format!("[output capture stopped: {e}]\n"));
                    }
                    if let Err(e) = io::copy(&mut reader, &mut io::sink()) {
                        tracing::debug!("could not discard remaining child output: {e}");
                    }
                    return;
                }
            }
        }
    }
}

impl Executor for SystemExecutor {
    fn run_unchecked(&self, program: &str, args: &[&str]) -> Result<ExecResult, CommandError> {
        let command = describe(program, args);
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| CommandError::Spawn {
                command: command.clone(),
                source,
            })?;

        let combined = Mutex::new(String::new());
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        std::thread::scope(|s| {
            if let Some(out) = stdout {
                s.spawn(|| Self::drain(out, &combined));
            }
            if let Some(err) = stderr {
                s.spawn(|| Self::drain(err, &combined));
            }
        });

        let status = child
            .wait()
            .map_err(|source| CommandError::Spawn { command, source })?;
        let output = combined
            .into_inner()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        Ok(ExecResult {
            output,
            success: status.success(),
            code: status.code(),
        })
    }

    fn which(&self, program: &str) -> bool {
        which::which(program).is_ok()
    }
}

/// Runs commands through an [`Executor`], honouring simulate mode.
///
/// In dry-run mode nothing is spawned: the command is reported through the
/// logger and treated as a success with empty output.
pub struct Runner<'a> {
    executor: &'a dyn Executor,
    log: &'a dyn Log,
    dry_run: bool,
}

impl std::fmt::Debug for Runner<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runner")
            .field("executor", &self.executor)
            .field("log", &"<dyn Log>")
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

/// Shell-command prefix recognised as an "is it installed?" probe.
const CHECK_PREFIX: &str = "command -v";

impl<'a> Runner<'a> {
    #[must_use]
    pub const fn new(executor: &'a dyn Executor, log: &'a dyn Log, dry_run: bool) -> Self {
        Self {
            executor,
            log,
            dry_run,
        }
    }

    #[must_use]
    pub const fn dry_run(&self) -> bool {
        self.dry_run
    }

    #[must_use]
    pub const fn log(&self) -> &'a dyn Log {
        self.log
    }

    #[must_use]
    pub fn which(&self, program: &str) -> bool {
        self.executor.which(program)
    }

    /// Run `program` with `args` and return its combined output.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::Failed`] carrying the full captured output when
    /// the process exits non-zero, or [`CommandError::Spawn`] if it cannot be
    /// started.
    pub fn run(&self, program: &str, args: &[&str]) -> Result<String, CommandError> {
        let command = describe(program, args);
        if self.dry_run {
            self.log.dry_run(&format!("would execute: {command}"));
            return Ok(String::new());
        }

        self.log.debug(&format!("executing: {command}"));
        let result = self.executor.run_unchecked(program, args)?;
        if result.success {
            Ok(result.output)
        } else {
            Err(CommandError::Failed {
                command,
                code: result.code.unwrap_or(-1),
                output: result.output,
            })
        }
    }

    /// Run an opaque command string through `sh -c`.
    ///
    /// In dry-run mode a `command -v ...` probe reports
    /// [`CommandError::Simulated`] so that simulated installs still walk the
    /// install path.
    ///
    /// # Errors
    ///
    /// Same as [`Runner::run`], plus the simulated probe failure.
    pub fn shell(&self, command: &str) -> Result<String, CommandError> {
        if self.dry_run {
            self.log.dry_run(&format!("would execute: {command}"));
            if command.trim_start().starts_with(CHECK_PREFIX) {
                return Err(CommandError::Simulated {
                    command: command.to_string(),
                });
            }
            return Ok(String::new());
        }

        self.log.info(&format!("executing: {command}"));
        let result = self.executor.run_unchecked("sh", &["-c", command])?;
        if result.success {
            Ok(result.output)
        } else {
            Err(CommandError::Failed {
                command: command.to_string(),
                code: result.code.unwrap_or(-1),
                output: result.output,
            })
        }
    }
}

/// Scripted executor shared by unit tests across modules.
#[cfg(test)]
pub mod test_helpers {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::{ExecResult, Executor, describe};
    use crate::error::CommandError;

    /// Replays a queue of `(success, output)` responses in FIFO order and
    /// records every command line it was asked to run.
    ///
    /// When the queue is empty, calls fail with output `"unexpected call"`.
    #[derive(Debug, Default)]
    pub struct ScriptedExecutor {
        responses: Mutex<VecDeque<(bool, String)>>,
        calls: Mutex<Vec<String>>,
        which_result: bool,
    }

    impl ScriptedExecutor {
        #[must_use]
        pub fn new(responses: Vec<(bool, &str)>) -> Self {
            Self {
                responses: Mutex::new(
                    responses
                        .into_iter()
                        .map(|(ok, out)| (ok, out.to_string()))
                        .collect(),
                ),
                calls: Mutex::new(Vec::new()),
                which_result: true,
            }
        }

        /// A script where every call fails with the same output.
        #[must_use]
        pub fn always(success: bool, output: &str, times: usize) -> Self {
            Self::new(vec![(success, output); times])
        }

        #[must_use]
        pub const fn with_which(mut self, result: bool) -> Self {
            self.which_result = result;
            self
        }

        /// Every command line run so far, in order.
        #[must_use]
        pub fn calls(&self) -> Vec<String> {
            self.calls
                .lock()
                .map_or_else(|_| Vec::new(), |guard| guard.clone())
        }

        #[must_use]
        pub fn call_count(&self) -> usize {
            self.calls().len()
        }
    }

    impl Executor for ScriptedExecutor {
        fn run_unchecked(&self, program: &str, args: &[&str]) -> Result<ExecResult, CommandError> {
            if let Ok(mut calls) = self.calls.lock() {
                calls.push(describe(program, args));
            }
            let (success, output) = self
                .responses
                .lock()
                .ok()
                .and_then(|mut q| q.pop_front())
                .unwrap_or_else(|| (false, "unexpected call".to_string()));
            Ok(ExecResult {
                output,
                success,
                code: Some(i32::from(!success)),
            })
        }

        fn which(&self, _: &str) -> bool {
            self.which_result
        }
    }
}
