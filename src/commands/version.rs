//! Command: print version information.

/// The build version, stamped by `build.rs` when available.
#[must_use]
pub fn version() -> &'static str {
    option_env!("DOTM_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"))
}

/// Print the dotm version to stdout.
pub fn run() {
    println!("dotm {}", version());
}
