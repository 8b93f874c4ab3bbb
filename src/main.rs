use anyhow::Result;
use clap::Parser;

use dotm::cli::{Cli, Command};
use dotm::commands;
use dotm::logging::{Logger, init_subscriber};

fn main() -> Result<()> {
    let _ = enable_ansi_support::enable_ansi_support();
    let args = Cli::parse();
    init_subscriber(args.verbose, args.command.name());
    let log = Logger::new(args.command.name());

    match args.command {
        Command::Install(opts) => commands::install::run(&args.global, &opts, &log),
        Command::Module(cmd) => commands::module::run(&args.global, &cmd, &log),
        Command::Config(cmd) => commands::config::run(&args.global, &cmd, &log),
        Command::Repo(cmd) => commands::repo::run(&args.global, &cmd, &log),
        Command::Completion(opts) => {
            commands::completion::run(opts.shell);
            Ok(())
        }
        Command::Version => {
            commands::version::run();
            Ok(())
        }
    }
}
