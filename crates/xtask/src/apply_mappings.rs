use crate::utils;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use pipwatch_foundation::MappingTable;
use std::path::PathBuf;

#[derive(Args)]
pub struct ApplyMappingsArgs {
    /// Candidate table produced by fetch-mappings
    #[arg(long, default_value = "scripts/pypi_mappings.json")]
    input: PathBuf,

    /// Mappings file to update (defaults to the bundled table)
    #[arg(long)]
    mappings: Option<PathBuf>,

    /// Replace entries that already exist
    #[arg(long)]
    overwrite: bool,

    /// Preview without writing
    #[arg(long)]
    dry_run: bool,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    pub added: usize,
    pub skipped: usize,
}

pub fn run(args: ApplyMappingsArgs) -> Result<()> {
    let mappings_path = match args.mappings {
        Some(path) => path,
        None => utils::bundled_mappings_path()?,
    };
    let mut table = utils::load_table(&mappings_path)?;
    if !args.input.exists() {
        anyhow::bail!("input file not found at {}", args.input.display());
    }
    let incoming = utils::load_table(&args.input)?;

    let outcome = merge(&mut table, &incoming, args.overwrite);
    if outcome.added > 0 {
        table.last_updated = Some(utils::today());
    }

    if args.dry_run {
        println!(
            "[DRY RUN] Would add {} mappings, skip {}",
            outcome.added, outcome.skipped
        );
        return Ok(());
    }

    if outcome.added > 0 {
        utils::save_table(&mappings_path, &table)?;
    }
    println!(
        "{} Added {} mappings, skipped {}",
        "✓".green(),
        outcome.added,
        outcome.skipped
    );
    Ok(())
}

/// Copy `incoming` entries into `table`, keeping existing keys unless `overwrite`
pub fn merge(table: &mut MappingTable, incoming: &MappingTable, overwrite: bool) -> MergeOutcome {
    let mut outcome = MergeOutcome::default();
    for (import_name, entry) in incoming.entries() {
        if table.contains(import_name) && !overwrite {
            outcome.skipped += 1;
            continue;
        }
        table.insert(import_name, entry);
        outcome.added += 1;
    }
    outcome
}
