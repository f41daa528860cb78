use crate::utils;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use pipwatch_foundation::{MappingEntry, UNCATEGORIZED};
use std::path::PathBuf;
use std::time::Duration;

const VALIDATION_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Args)]
pub struct AddMappingArgs {
    /// The import name (e.g. PIL, cv2, sklearn)
    import_name: String,

    /// The PyPI package name (e.g. pillow, opencv-python)
    package_name: String,

    #[arg(long, default_value = UNCATEGORIZED)]
    category: String,

    /// Mappings file to update (defaults to the bundled table)
    #[arg(long)]
    mappings: Option<PathBuf>,

    /// Overwrite an existing mapping without prompting
    #[arg(long)]
    force: bool,

    /// Preview without writing
    #[arg(long)]
    dry_run: bool,
}

pub fn run(args: AddMappingArgs) -> Result<()> {
    let mappings_path = match &args.mappings {
        Some(path) => path.clone(),
        None => utils::bundled_mappings_path()?,
    };

    println!("Checking if '{}' exists on PyPI...", args.package_name);
    if !package_exists(&args.package_name) {
        anyhow::bail!(
            "'{}' was not found on PyPI. Double-check the package name and try again.",
            args.package_name
        );
    }
    println!("  {} Found '{}' on PyPI.", "✓".green(), args.package_name);

    let mut table = utils::load_table(&mappings_path)?;
    if let Some(existing) = table.mappings.get(&args.import_name) {
        let current = existing
            .normalize(&args.import_name)
            .map(|entry| entry.package)
            .unwrap_or_else(|| "?".to_string());
        println!(
            "{} '{}' is already mapped to '{}'.",
            "⚠️".yellow(),
            args.import_name,
            current
        );
        if !args.force && !utils::confirm("Overwrite? [y/N]") {
            println!("Aborted.");
            return Ok(());
        }
    }

    if args.dry_run {
        println!("\n[DRY RUN] Would add mapping:");
        println!(
            "  {} -> {} (category: {})",
            args.import_name, args.package_name, args.category
        );
        return Ok(());
    }

    table.insert(
        args.import_name.clone(),
        MappingEntry::new(args.package_name.clone())
            .with_category(args.category.clone())
            .verified(true),
    );
    utils::save_table(&mappings_path, &table)?;
    println!(
        "{} Added: {} -> {} (category: {})",
        "✓".green(),
        args.import_name,
        args.package_name,
        args.category
    );
    Ok(())
}

fn package_exists(package: &str) -> bool {
    let url = format!("https://pypi.org/pypi/{}/json", package);
    let Ok(client) = utils::http_client(VALIDATION_TIMEOUT) else {
        return false;
    };
    client
        .get(&url)
        .send()
        .map(|response| response.status().is_success())
        .unwrap_or(false)
}
