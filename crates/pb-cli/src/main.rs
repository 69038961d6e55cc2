//! `pb`: validate, migrate, inspect, and merge page-builder project files.

mod commands;

use clap::{Parser, Subcommand};
use commands::{InspectArgs, MergeArgs, MigrateArgs, ValidateArgs};

#[derive(Parser, Debug)]
#[command(name = "pb")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check a project file and list every finding
    Validate(ValidateArgs),

    /// Upgrade a project file to the current format version
    Migrate(MigrateArgs),

    /// Print the page and component tree of a project file
    Inspect(InspectArgs),

    /// Import one project file into another
    Merge(MergeArgs),
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Validate(args) => commands::validate(args),
        Command::Migrate(args) => commands::migrate(args),
        Command::Inspect(args) => commands::inspect(args),
        Command::Merge(args) => commands::merge(args),
    };

    if let Err(err) = result {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
