//! Static checks over a loaded [`Config`].
use std::collections::HashMap;
use std::fmt;

use super::Config;
use crate::resources::line::Strategy;

/// A problem found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationWarning {
    /// Module the problem belongs to, empty for document-level problems.
    pub item: String,
    /// Human-readable message.
    pub message: String,
}

impl ValidationWarning {
    #[must_use]
    pub fn new(item: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            item: item.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.item.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "module '{}': {}", self.item, self.message)
        }
    }
}

/// Validate `config` and return every problem found, in module order.
///
/// Checks for:
/// - an empty module set
/// - missing descriptions and install commands
/// - dependencies on undefined modules
/// - apply steps without a strategy or target, or with an unknown strategy
/// - circular dependencies
#[must_use]
pub fn validate(config: &Config) -> Vec<ValidationWarning> {
    if config.modules.is_empty() {
        return vec![ValidationWarning::new(
            "",
            "no modules defined in configuration",
        )];
    }

    let mut warnings = Vec::new();
    for (name, module) in &config.modules {
        if module.description.trim().is_empty() {
            warnings.push(ValidationWarning::new(name, "missing a description"));
        }
        if module.install.values().all(Vec::is_empty) {
            warnings.push(ValidationWarning::new(name, "has no install commands defined"));
        }
        for dep in &module.dependencies {
            if !config.modules.contains_key(dep) {
                warnings.push(ValidationWarning::new(
                    name,
                    format!("depends on non-existent module '{dep}'"),
                ));
            }
        }
        for (i, step) in module.apply.iter().enumerate() {
            if step.strategy.trim().is_empty() {
                warnings.push(ValidationWarning::new(
                    name,
                    format!("apply step {i} is missing a strategy"),
                ));
            } else if step.strategy.parse::<Strategy>().is_err() {
                warnings.push(ValidationWarning::new(
                    name,
                    format!("apply step {i} has unrecognized strategy '{}'", step.strategy),
                ));
            }
            if step.target.trim().is_empty() {
                warnings.push(ValidationWarning::new(
                    name,
                    format!("apply step {i} is missing a target"),
                ));
            }
        }
    }

    warnings.extend(find_cycles(config).into_iter().map(|chain| {
        let head = chain.first().cloned().unwrap_or_default();
        ValidationWarning::new(
            head,
            format!("circular dependency detected: {}", chain.join(" -> ")),
        )
    }));
    warnings
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Done,
}

/// Return one chain per distinct dependency cycle, each closed by repeating
/// its first module.
fn find_cycles(config: &Config) -> Vec<Vec<String>> {
    let mut marks: HashMap<&str, Mark> = HashMap::new();
    let mut stack: Vec<&str> = Vec::new();
    let mut cycles = Vec::new();
    for name in config.modules.keys() {
        visit(config, name, &mut marks, &mut stack, &mut cycles);
    }
    cycles
}

fn visit<'a>(
    config: &'a Config,
    name: &'a str,
    marks: &mut HashMap<&'a str, Mark>,
    stack: &mut Vec<&'a str>,
    cycles: &mut Vec<Vec<String>>,
) {
    match marks.get(name) {
        Some(Mark::Done) => return,
        Some(Mark::Visiting) => {
            if let Some(start) = stack.iter().position(|n| *n == name) {
                let mut chain: Vec<String> =
                    stack.iter().skip(start).map(ToString::to_string).collect();
                chain.push(name.to_string());
                cycles.push(chain);
            }
            return;
        }
        None => {}
    }
    let Some(module) = config.modules.get(name) else {
        return;
    };

    marks.insert(name, Mark::Visiting);
    stack.push(name);
    for dep in &module.dependencies {
        visit(config, dep, marks, stack, cycles);
    }
    stack.pop();
    marks.insert(name, Mark::Done);
}
