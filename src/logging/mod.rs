//! Logging infrastructure for structured console and file output.

mod logger;
mod subscriber;
mod types;
mod utils;

pub use logger::Logger;
pub use subscriber::init_subscriber;
pub use types::{Channel, Log, TaskEntry, TaskStatus};

/// Logger plus a thread-local subscriber whose file layer writes to a fresh
/// temp dir. Keep the guard alive for the whole test.
#[cfg(test)]
#[allow(clippy::expect_used)]
pub(crate) fn isolated_logger() -> (
    Logger,
    std::path::PathBuf,
    tempfile::TempDir,
    tracing::dispatcher::DefaultGuard,
) {
    use tracing_subscriber::{Layer as _, filter::LevelFilter, layer::SubscriberExt as _};
    let tmp = tempfile::tempdir().expect("temp dir");
    let path = tmp.path().join("test.log");
    let layer = subscriber::FileLayer::create(&path, "test").expect("file layer");
    let log = Logger::with_log_file(Some(path.clone()));
    let registry = tracing_subscriber::registry().with(layer.with_filter(LevelFilter::DEBUG));
    let guard = tracing::dispatcher::set_default(&tracing::Dispatch::new(registry));
    (log, path, tmp, guard)
}

/// In-memory [`Log`] implementation for unit tests.
#[cfg(test)]
pub mod test_helpers {
    use std::sync::Mutex;

    use super::{Log, TaskStatus};

    /// Captures every message by kind so tests can assert on what was said.
    #[derive(Debug, Default)]
    pub struct RecordingLog {
        infos: Mutex<Vec<String>>,
        warnings: Mutex<Vec<String>>,
        dry_runs: Mutex<Vec<String>>,
        tasks: Mutex<Vec<(String, TaskStatus)>>,
    }

    fn snapshot<T: Clone>(m: &Mutex<Vec<T>>) -> Vec<T> {
        m.lock().map_or_else(|_| Vec::new(), |g| g.clone())
    }

    fn push<T>(m: &Mutex<Vec<T>>, value: T) {
        if let Ok(mut g) = m.lock() {
            g.push(value);
        }
    }

    impl RecordingLog {
        #[must_use]
        pub fn infos(&self) -> Vec<String> {
            snapshot(&self.infos)
        }

        #[must_use]
        pub fn warnings(&self) -> Vec<String> {
            snapshot(&self.warnings)
        }

        #[must_use]
        pub fn dry_runs(&self) -> Vec<String> {
            snapshot(&self.dry_runs)
        }

        #[must_use]
        pub fn tasks(&self) -> Vec<(String, TaskStatus)> {
            snapshot(&self.tasks)
        }
    }

    impl Log for RecordingLog {
        fn stage(&self, msg: &str) {
            push(&self.infos, msg.to_string());
        }
        fn info(&self, msg: &str) {
            push(&self.infos, msg.to_string());
        }
        fn debug(&self, _msg: &str) {}
        fn warn(&self, msg: &str) {
            push(&self.warnings, msg.to_string());
        }
        fn error(&self, msg: &str) {
            push(&self.warnings, msg.to_string());
        }
        fn dry_run(&self, msg: &str) {
            push(&self.dry_runs, msg.to_string());
        }
        fn record_task(&self, name: &str, status: TaskStatus, _message: Option<&str>) {
            push(&self.tasks, (name.to_string(), status));
        }
    }
}
