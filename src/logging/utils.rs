//! Log-file location, ANSI stripping and timestamps.
use std::path::PathBuf;

/// Remove ANSI CSI sequences (`ESC [ ... final-byte`) from `s`.
///
/// A lone `ESC` not followed by `[` is dropped together with the next char.
pub(super) fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_escape = false;
    let mut in_csi = false;
    for c in s.chars() {
        if in_csi {
            in_csi = !('@'..='~').contains(&c);
        } else if in_escape {
            in_escape = false;
            in_csi = c == '[';
        } else if c == '\x1b' {
            in_escape = true;
        } else {
            out.push(c);
        }
    }
    out
}

/// Directory holding per-command log files: `$XDG_CACHE_HOME/dotm`, or
/// `~/.cache/dotm` when the variable is unset or empty.
pub(super) fn log_dir() -> Option<PathBuf> {
    let cache = std::env::var_os("XDG_CACHE_HOME")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(|| crate::paths::home_dir().map(|home| home.join(".cache")))?;
    Some(cache.join("dotm"))
}

/// `<log_dir>/<command>.log`.
pub(super) fn log_file_path(command: &str) -> Option<PathBuf> {
    log_dir().map(|dir| dir.join(format!("{command}.log")))
}

/// Current local time in `format` (a `chrono` strftime string).
pub(super) fn timestamp(format: &str) -> String {
    chrono::Local::now().format(format).to_string()
}
