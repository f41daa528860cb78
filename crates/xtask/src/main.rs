use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;

mod add_mapping;
mod apply_mappings;
mod discover_mappings;
mod fetch_mappings;
mod utils;

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Pipwatch mapping maintenance tasks", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build a candidate mapping table from PyPI wheels
    FetchMappings(fetch_mappings::FetchMappingsArgs),

    /// Merge a candidate table into the bundled mappings
    ApplyMappings(apply_mappings::ApplyMappingsArgs),

    /// Add a single verified mapping
    AddMapping(add_mapping::AddMappingArgs),

    /// Find mismatches among locally installed packages
    DiscoverMappings(discover_mappings::DiscoverMappingsArgs),
}

fn main() {
    let cli = Cli::parse();

    let result: Result<()> = match cli.command {
        Command::FetchMappings(args) => fetch_mappings::run(args),
        Command::ApplyMappings(args) => apply_mappings::run(args),
        Command::AddMapping(args) => add_mapping::run(args),
        Command::DiscoverMappings(args) => discover_mappings::run(args),
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "ERROR:".red().bold(), e);
        std::process::exit(1);
    }
}
