#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::wildcard_imports,
    clippy::indexing_slicing
)]
//! Integration tests for the `install` command.
//!
//! Each test writes a `dotm.toml` into a temp dir and drives
//! [`install::run_with`] with a scripted executor, asserting on the commands
//! that would have been spawned and on the files the apply steps touched.

mod common;

use common::{FakeExecutor, IntegrationTestContext};
use dotm::cli::InstallOpts;
use dotm::commands::install;
use dotm::logging::Logger;

fn opts(modules: &[&str]) -> InstallOpts {
    InstallOpts {
        modules: modules.iter().map(ToString::to_string).collect(),
    }
}

fn toml_path(ctx: &IntegrationTestContext, relative: &str) -> String {
    ctx.root_path().join(relative).display().to_string()
}

// ---------------------------------------------------------------------------
// Dependency order and apply steps
// ---------------------------------------------------------------------------

#[test]
fn dependencies_install_first_and_lines_are_injected() {
    let ctx = IntegrationTestContext::empty();
    let rc = toml_path(&ctx, "shellrc");
    std::fs::write(
        ctx.config_path(),
        format!(
            r#"
[modules.base]
description = "Base tools"
install = {{ default = ["install base"] }}

[modules.tool]
description = "A tool"
dependencies = ["base"]
check = "command -v tool"
install = {{ default = ["install tool"] }}
apply = [{{ strategy = "inject", target = '{rc}', line = "export TOOL=1" }}]
"#
        ),
    )
    .unwrap();

    let exec = FakeExecutor::new().on("command -v tool", false, "");
    let log = Logger::new("test");
    install::run_with(&ctx.global("debian"), &opts(&["tool"]), &exec, &log).unwrap();

    assert_eq!(
        exec.calls(),
        vec![
            "sh -c install base",
            "sh -c command -v tool",
            "sh -c install tool"
        ]
    );
    assert_eq!(ctx.read("shellrc"), "export TOOL=1\n");
}

#[test]
fn passing_check_skips_install_but_still_applies() {
    let ctx = IntegrationTestContext::empty();
    let rc = toml_path(&ctx, "rc/zshrc");
    std::fs::write(
        ctx.config_path(),
        format!(
            r#"
[modules.zsh]
description = "Shell"
check = "command -v zsh"
install = {{ default = ["install zsh"] }}
apply = [{{ strategy = "inject", target = '{rc}', line = "setopt autocd" }}]
"#
        ),
    )
    .unwrap();

    let exec = FakeExecutor::new();
    let log = Logger::new("test");
    install::run_with(&ctx.global("debian"), &opts(&["zsh"]), &exec, &log).unwrap();

    assert_eq!(exec.calls(), vec!["sh -c command -v zsh"]);
    assert_eq!(ctx.read("rc/zshrc"), "setopt autocd\n");
}

#[test]
fn shared_dependency_runs_once() {
    let ctx = IntegrationTestContext::with_config(
        r#"
[modules.core]
description = "Core"
install = { default = ["install core"] }

[modules.a]
description = "A"
dependencies = ["core"]
install = { default = ["install a"] }

[modules.b]
description = "B"
dependencies = ["core"]
install = { default = ["install b"] }
"#,
    );
    let exec = FakeExecutor::new();
    let log = Logger::new("test");
    install::run_with(&ctx.global("debian"), &opts(&["a", "b"]), &exec, &log).unwrap();

    assert_eq!(
        exec.calls(),
        vec!["sh -c install core", "sh -c install a", "sh -c install b"]
    );
}

// ---------------------------------------------------------------------------
// Platform selection
// ---------------------------------------------------------------------------

#[test]
fn platform_override_selects_matching_list() {
    let ctx = IntegrationTestContext::with_config(
        r#"
[modules.ripgrep]
description = "Search"

[modules.ripgrep.install]
debian = ["apt-get install -y ripgrep"]
macos = ["brew install ripgrep"]
default = ["cargo install ripgrep"]
"#,
    );

    let exec = FakeExecutor::new();
    let log = Logger::new("test");
    install::run_with(&ctx.global("macos"), &opts(&["ripgrep"]), &exec, &log).unwrap();
    assert_eq!(exec.calls(), vec!["sh -c brew install ripgrep"]);

    let exec = FakeExecutor::new();
    install::run_with(&ctx.global("arch"), &opts(&["ripgrep"]), &exec, &log).unwrap();
    assert_eq!(exec.calls(), vec!["sh -c cargo install ripgrep"]);
}

#[test]
fn unsupported_platform_fails() {
    let ctx = IntegrationTestContext::with_config(
        r#"
[modules.brew-only]
description = "macOS only"
install = { macos = ["brew install thing"] }
"#,
    );
    let exec = FakeExecutor::new();
    let log = Logger::new("test");
    let err = install::run_with(&ctx.global("debian"), &opts(&["brew-only"]), &exec, &log)
        .unwrap_err();
    assert!(err.to_string().contains("1 module(s) failed"));
    assert!(exec.calls().is_empty());
}

// ---------------------------------------------------------------------------
// Failures
// ---------------------------------------------------------------------------

#[test]
fn failed_module_does_not_stop_the_rest() {
    let ctx = IntegrationTestContext::with_config(
        r#"
[modules.broken]
description = "Fails"
install = { default = ["install broken"] }

[modules.fine]
description = "Works"
install = { default = ["install fine"] }
"#,
    );
    let exec = FakeExecutor::new().on("install broken", false, "E: boom");
    let log = Logger::new("test");
    let err = install::run_with(&ctx.global("debian"), &opts(&["broken", "fine"]), &exec, &log)
        .unwrap_err();

    assert!(err.to_string().contains("1 module(s) failed"));
    assert_eq!(log.failure_count(), 1);
    assert!(exec.calls().contains(&"sh -c install fine".to_string()));
}

#[test]
fn unknown_module_is_reported() {
    let ctx = IntegrationTestContext::with_config(
        r#"
[modules.known]
description = "Known"
install = { default = ["true"] }
"#,
    );
    let exec = FakeExecutor::new();
    let log = Logger::new("test");
    assert!(install::run_with(&ctx.global("debian"), &opts(&["nope"]), &exec, &log).is_err());
    assert!(exec.calls().is_empty());
}

#[test]
fn missing_config_file_is_an_error() {
    let ctx = IntegrationTestContext::empty();
    let exec = FakeExecutor::new();
    let log = Logger::new("test");
    let err = install::run_with(&ctx.global("debian"), &opts(&["x"]), &exec, &log).unwrap_err();
    assert!(format!("{err:#}").contains("not found"));
}

// ---------------------------------------------------------------------------
// Dry run
// ---------------------------------------------------------------------------

#[test]
fn dry_run_spawns_nothing_and_writes_nothing() {
    let ctx = IntegrationTestContext::empty();
    let rc = toml_path(&ctx, "bashrc");
    std::fs::write(
        ctx.config_path(),
        format!(
            r#"
[modules.tool]
description = "A tool"
check = "command -v tool"
install = {{ default = ["install tool"] }}
apply = [{{ strategy = "inject", target = '{rc}', line = "alias t=tool" }}]
"#
        ),
    )
    .unwrap();

    let mut global = ctx.global("debian");
    global.dry_run = true;
    let exec = FakeExecutor::new();
    let log = Logger::new("test");
    install::run_with(&global, &opts(&["tool"]), &exec, &log).unwrap();

    assert!(exec.calls().is_empty());
    assert!(!ctx.root_path().join("bashrc").exists());
}
