use clap::Parser;
use std::process;

use taskboard::cli::commands::{Cli, Commands};
use taskboard::config::Settings;
use taskboard::db::connection;
use taskboard::{cli, logging};

fn main() {
    let cli_args = Cli::parse();
    let json_output = cli_args.json;
    let project_flag = cli_args.project.clone();

    // Logging comes up before any command so config problems are reported
    // by the command itself rather than here.
    let log_level = connection::find_git_root()
        .ok()
        .and_then(|root| Settings::load(&root).ok())
        .map(|s| s.log_level)
        .unwrap_or_else(|| Settings::default().log_level);
    logging::init(&log_level);

    let exit_code = match cli_args.command {
        Commands::Init => cli::init::run(json_output),
        Commands::Project(cmd) => cli::project::run(cmd, json_output),
        Commands::Task(cmd) => cli::task::run(cmd, json_output, project_flag.as_deref()),
        Commands::Board { command } => cli::board::run(command, json_output, project_flag.as_deref()),
        Commands::Completion => cli::completion::run(json_output, project_flag.as_deref()),
        Commands::Events { since } => cli::events::run(since, json_output, project_flag.as_deref()),
    };

    process::exit(exit_code);
}
