//! Starter documents for new configurations and modules.

/// A minimal configuration document with one example module.
#[must_use]
pub fn config_template() -> String {
    r##"[modules.example-tool]
description = "An example tool to demonstrate the configuration structure"
dependencies = []
check = "command -v example-tool"
apply = [
    { strategy = "inject", target = "~/.zshrc", line = "# Configure example-tool" },
]

[modules.example-tool.install]
debian = ["sudo apt-get update", "sudo apt-get install -y example-tool"]
macos = ["brew install example-tool"]
arch = ["sudo pacman -S --noconfirm example-tool"]
default = []
"##
    .to_string()
}

/// A module block for `name`, ready to paste into `dotm.toml`.
#[must_use]
pub fn module_template(name: &str) -> String {
    let key = if name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        && !name.is_empty()
    {
        name.to_string()
    } else {
        format!("{name:?}")
    };
    format!(
        r##"[modules.{key}]
description = "Description of {name}"
dependencies = []
check = "command -v {name}"
apply = [
    {{ strategy = "inject", target = "~/.zshrc", line = "# Configure {name} here" }},
]

[modules.{key}.install]
debian = ["sudo apt-get install -y {name}"]
macos = ["brew install {name}"]
default = []
"##
    )
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::config::Config;
    use crate::config::validation::validate;
    use crate::platform::Platform;

    #[test]
    fn config_template_parses_and_validates() {
        let cfg = Config::parse(&config_template(), Path::new("template")).unwrap();
        let module = cfg.module("example-tool").unwrap();
        assert_eq!(module.install.len(), 4);
        assert_eq!(
            module.install_commands(&Platform::Arch).unwrap(),
            ["sudo pacman -S --noconfirm example-tool".to_string()]
        );
        assert!(validate(&cfg).is_empty(), "{:?}", validate(&cfg));
    }

    #[test]
    fn module_template_parses_under_its_name() {
        let cfg = Config::parse(&module_template("ripgrep"), Path::new("template")).unwrap();
        let module = cfg.module("ripgrep").unwrap();
        assert_eq!(module.check_command(), Some("command -v ripgrep"));
        assert_eq!(module.apply.len(), 1);
    }

    #[test]
    fn comment_lines_survive_in_apply_steps() {
        let cfg = Config::parse(&config_template(), Path::new("template")).unwrap();
        let step = &cfg.module("example-tool").unwrap().apply[0];
        assert_eq!(step.line, "# Configure example-tool");

        let cfg = Config::parse(&module_template("x"), Path::new("template")).unwrap();
        let module = cfg.module("x").unwrap();
        assert_eq!(module.apply[0].line, "# Configure x here");
        assert_eq!(module.install["macos"], vec!["brew install x"]);
    }

    #[test]
    fn module_template_quotes_unusual_names() {
        let cfg = Config::parse(&module_template("my tool"), Path::new("template")).unwrap();
        assert!(cfg.module("my tool").is_ok());
    }
}
