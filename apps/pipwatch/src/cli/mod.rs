//! CLI command handling for pipwatch

mod analyze;
mod mappings;
mod prompt;

use clap::Parser;
use pipwatch_config::AppConfig;
use pipwatch_registry::{MappingRegistry, RegistryOptions};
use std::path::PathBuf;
use std::process;
use tracing::debug;

const EXAMPLES: &str = "\
Examples:
  pipwatch script.py                    # Analyze single file and install dependencies
  pipwatch .                            # Analyze all Python files in current directory
  pipwatch myfolder/                    # Analyze all Python files in a folder
  pipwatch script.py --dry-run          # Show what would be installed
  pipwatch script.py --generate         # Generate requirements.txt
  pipwatch script.py --verbose          # Show detailed logging
  pipwatch script.py --yes              # Auto-confirm installation

Mapping Management:
  pipwatch --update-mappings            # Update package mappings from GitHub
  pipwatch --clear-cache                # Clear cached mappings
  pipwatch --show-mappings              # Show mapping statistics
  pipwatch --show-mappings --json       # Mapping statistics as JSON";

/// The main CLI struct.
#[derive(Parser, Debug)]
#[command(name = "pipwatch")]
#[command(about = "Automatically detect and install Python dependencies")]
#[command(version)]
#[command(after_help = EXAMPLES)]
pub struct Cli {
    /// Path to a Python file or directory to analyze
    pub path: Option<PathBuf>,

    /// Show what would be installed without actually installing
    #[arg(long)]
    pub dry_run: bool,

    /// Generate requirements.txt from detected dependencies
    #[arg(short = 'g', long)]
    pub generate: bool,

    /// Output path for the generated requirements file
    #[arg(short = 'o', long, default_value = "requirements.txt")]
    pub output: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Automatically confirm installation without prompting
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Update package mappings from the remote source
    #[arg(long)]
    pub update_mappings: bool,

    /// Clear cached package mappings
    #[arg(long)]
    pub clear_cache: bool,

    /// Show statistics about loaded package mappings
    #[arg(long)]
    pub show_mappings: bool,

    /// Print mapping statistics as JSON
    #[arg(long)]
    pub json: bool,

    /// Neither read nor write the local mappings cache
    #[arg(long)]
    pub no_cache: bool,

    /// Fetch mappings from this URL instead of the configured one
    #[arg(long, value_name = "URL")]
    pub mappings_url: Option<String>,

    /// Python interpreter used to query and run pip
    #[arg(long, value_name = "EXE")]
    pub python: Option<String>,
}

impl Cli {
    /// Layer command-line overrides on top of the loaded configuration
    fn apply_overrides(&self, config: &mut AppConfig) {
        if self.no_cache {
            config.registry.use_cache = false;
        }
        if let Some(url) = &self.mappings_url {
            config.registry.remote_url = url.clone();
        }
        if let Some(python) = &self.python {
            config.installer.python = python.clone();
        }
    }
}

pub fn run() {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Error: {:#}", e);
            process::exit(1);
        }
    };

    pipwatch_config::logging::initialize(&config, cli.verbose);
    debug!(?cli, "Parsed arguments");

    // One registry for the whole process
    let mut registry = MappingRegistry::new(RegistryOptions::from_config(&config.registry));

    if let Err(e) = dispatch(&cli, &config, &mut registry) {
        eprintln!("❌ Error: {:#}", e);
        process::exit(1);
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<AppConfig> {
    let mut config = AppConfig::load()?;
    cli.apply_overrides(&mut config);
    config.validate()?;
    Ok(config)
}

fn dispatch(cli: &Cli, config: &AppConfig, registry: &mut MappingRegistry) -> anyhow::Result<()> {
    if cli.update_mappings {
        return mappings::handle_update(registry, cli.json);
    }
    if cli.clear_cache {
        mappings::handle_clear(registry);
        return Ok(());
    }
    if cli.show_mappings {
        return mappings::handle_show(registry, cli.json);
    }

    analyze::handle_analyze(cli, &config.installer.python, registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_short_flags() {
        let cli = Cli::try_parse_from(["pipwatch", "app.py", "-g", "-o", "deps.txt", "-v", "-y"])
            .unwrap();
        assert_eq!(cli.path, Some(PathBuf::from("app.py")));
        assert!(cli.generate && cli.verbose && cli.yes);
        assert_eq!(cli.output, PathBuf::from("deps.txt"));
    }

    #[test]
    fn test_overrides_apply_to_config() {
        let cli = Cli::try_parse_from([
            "pipwatch",
            "--no-cache",
            "--mappings-url",
            "https://mirror.example/mappings.json",
            "--python",
            "python3.12",
        ])
        .unwrap();
        let mut config = AppConfig::default();
        cli.apply_overrides(&mut config);

        assert!(!config.registry.use_cache);
        assert_eq!(config.registry.remote_url, "https://mirror.example/mappings.json");
        assert_eq!(config.installer.python, "python3.12");
    }

    #[test]
    fn test_output_defaults_to_requirements_txt() {
        let cli = Cli::try_parse_from(["pipwatch", "."]).unwrap();
        assert_eq!(cli.output, PathBuf::from("requirements.txt"));
        assert!(!cli.dry_run);
    }
}
