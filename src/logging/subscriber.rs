//! Tracing subscriber: console formatter, log-file layer, and initialisation.
use std::fs;
use std::io::Write as _;
use std::path::Path;
use std::sync::Mutex;

use tracing::Level;

use super::types::Channel;
use super::utils::{log_file_path, strip_ansi, timestamp};

/// Pulls the `message` field out of an event.
#[derive(Default)]
struct MessageVisitor(String);

impl tracing::field::Visit for MessageVisitor {
    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            value.clone_into(&mut self.0);
        }
    }

    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.0 = format!("{value:?}");
        }
    }
}

fn message_of(event: &tracing::Event<'_>) -> String {
    let mut visitor = MessageVisitor::default();
    event.record(&mut visitor);
    visitor.0
}

/// Render one console line (without the trailing newline).
fn console_line(level: Level, channel: Channel, msg: &str) -> String {
    match (level, channel) {
        (Level::ERROR, _) => format!("\x1b[31mERROR\x1b[0m {msg}"),
        (Level::WARN, _) => format!("\x1b[33mWARN\x1b[0m  {msg}"),
        (Level::INFO, Channel::Stage) => format!("\x1b[1;34m==>\x1b[0m \x1b[1m{msg}\x1b[0m"),
        (Level::INFO, Channel::DryRun) => format!("  \x1b[33m[DRY RUN]\x1b[0m {msg}"),
        (Level::INFO, Channel::Output) => format!("    \x1b[2m│\x1b[0m {msg}"),
        (Level::INFO, Channel::Plain) => format!("  {msg}"),
        _ => format!("  \x1b[2m{msg}\x1b[0m"),
    }
}

/// Render one log-file line: timestamped, ANSI-free, tagged by level.
fn file_line(time: &str, level: Level, channel: Channel, msg: &str) -> String {
    let msg = strip_ansi(msg);
    let tag = match (level, channel) {
        (Level::INFO, Channel::Stage) => return format!("[{time}] ==> {msg}"),
        (Level::INFO, Channel::DryRun) => "[dry run] ",
        (Level::INFO, Channel::Output) => "| ",
        (Level::ERROR, _) => "[error] ",
        (Level::WARN, _) => "[warn] ",
        (Level::DEBUG | Level::TRACE, _) => "[debug] ",
        _ => "",
    };
    format!("[{time}]     {tag}{msg}")
}

/// Appends every event to a per-command log file.
#[derive(Debug)]
pub(super) struct FileLayer {
    file: Mutex<fs::File>,
}

impl FileLayer {
    /// Truncate `path`, write a run header naming `command`, and keep the
    /// file open for appending.
    ///
    /// Returns `None` if the file or its directory cannot be created; the
    /// run then continues with console output only.
    pub(super) fn create(path: &Path, command: &str) -> Option<Self> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).ok()?;
        }
        let rule = "=".repeat(42);
        let header = format!(
            "{rule}\ndotm {} {command} {}\n{rule}\n",
            crate::commands::version::version(),
            timestamp("%Y-%m-%d %H:%M:%S %z"),
        );
        fs::write(path, header).ok()?;
        let file = fs::OpenOptions::new().append(true).open(path).ok()?;
        Some(Self {
            file: Mutex::new(file),
        })
    }
}

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for FileLayer {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        let meta = event.metadata();
        let line = file_line(
            &timestamp("%H:%M:%S"),
            *meta.level(),
            Channel::from_target(meta.target()),
            &message_of(event),
        );
        if let Ok(mut file) = self.file.lock() {
            let _ = writeln!(file, "{line}");
        }
    }
}

/// Console event format for dotm.
struct ConsoleFormat;

impl<S, N> tracing_subscriber::fmt::FormatEvent<S, N> for ConsoleFormat
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
    N: for<'a> tracing_subscriber::fmt::FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &tracing_subscriber::fmt::FmtContext<'_, S, N>,
        mut writer: tracing_subscriber::fmt::format::Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        let meta = event.metadata();
        let line = console_line(
            *meta.level(),
            Channel::from_target(meta.target()),
            &message_of(event),
        );
        writeln!(writer, "{line}")
    }
}

/// Install the global subscriber. Call once, before the first log call.
///
/// WARN and ERROR go to stderr, everything else to stdout. The console shows
/// INFO and above (DEBUG with `verbose`); the log file for `command` always
/// receives DEBUG and above.
pub fn init_subscriber(verbose: bool, command: &str) {
    use tracing_subscriber::fmt::writer::MakeWriterExt as _;
    use tracing_subscriber::{
        Layer as _, filter::LevelFilter, fmt, layer::SubscriberExt as _,
        util::SubscriberInitExt as _,
    };

    let console_filter = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    let writer = std::io::stderr
        .with_max_level(Level::WARN)
        .and(std::io::stdout.with_min_level(Level::INFO));
    let console = fmt::layer()
        .event_format(ConsoleFormat)
        .with_writer(writer)
        .with_filter(console_filter);

    let file = log_file_path(command)
        .and_then(|path| FileLayer::create(&path, command))
        .map(|layer| layer.with_filter(LevelFilter::DEBUG));

    tracing_subscriber::registry().with(console).with(file).init();
}
