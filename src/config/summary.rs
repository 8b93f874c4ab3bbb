//! Plain-text renderings of a configuration for `module list` and
//! `config show`.
use std::fmt::Write as _;

use super::{Config, Module};

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";
const THIN_RULE: &str = "─────────────────────────────────────────";

/// One `- name: description` line per module, sorted by name.
#[must_use]
pub fn render_module_list(config: &Config) -> String {
    if config.modules.is_empty() {
        return "No modules defined.\n".to_string();
    }
    let mut out = String::from("Available modules:\n");
    for (name, module) in &config.modules {
        let _ = writeln!(out, "- {name}: {}", module.description);
    }
    out
}

/// Overview of every module with its dependencies.
#[must_use]
pub fn render_summary(config: &Config) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{RULE}\nConfiguration Summary\n{RULE}");
    let _ = writeln!(out, "Total Modules: {}\n", config.modules.len());
    let _ = writeln!(out, "Available Modules:\n{THIN_RULE}");
    for (name, module) in &config.modules {
        let deps = if module.dependencies.is_empty() {
            String::new()
        } else {
            format!(" [deps: {}]", module.dependencies.join(", "))
        };
        let _ = writeln!(out, "  {name:<25} {}{deps}", module.description);
    }
    out
}

/// Every field of one module.
#[must_use]
pub fn render_module_details(name: &str, module: &Module) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{RULE}\nModule: {name}\n{RULE}");
    let _ = writeln!(out, "Description: {}", module.description);

    if !module.dependencies.is_empty() {
        let _ = writeln!(out, "\nDependencies:");
        for dep in &module.dependencies {
            let _ = writeln!(out, "  - {dep}");
        }
    }

    if let Some(check) = module.check_command() {
        let _ = writeln!(out, "\nCheck Command: {check}");
    }

    if !module.install.is_empty() {
        let _ = writeln!(out, "\nInstall Commands:");
        for (platform, commands) in &module.install {
            let _ = writeln!(out, "  {platform}:");
            for command in commands {
                let _ = writeln!(out, "    - {command}");
            }
        }
    }

    if !module.apply.is_empty() {
        let _ = writeln!(out, "\nPost-Install Configuration:");
        for step in &module.apply {
            let _ = writeln!(out, "  Strategy: {}", step.strategy);
            let _ = writeln!(out, "    Target: {}", step.target);
            let _ = writeln!(out, "    Line: {}", step.line);
        }
    }
    out
}
