//! Import-name mismatches among the packages an interpreter has installed

use crate::utils;
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use pipwatch_foundation::{MappingEntry, MappingTable};
use pipwatch_scanner::canonicalize_name;
use pipwatch_scanner::imports::is_standard_library;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const SYS_PATH_SCRIPT: &str = "import json, sys; print(json.dumps([p for p in sys.path if p]))";

#[derive(Args)]
pub struct DiscoverMappingsArgs {
    /// Write discovered mappings to the mappings file
    #[arg(long)]
    apply: bool,

    /// Preview without writing
    #[arg(long)]
    dry_run: bool,

    /// Interpreter whose installed packages are scanned
    #[arg(long, default_value = "python3")]
    python: String,

    /// Mappings file to update (defaults to the bundled table)
    #[arg(long)]
    mappings: Option<PathBuf>,
}

/// An installed distribution and the top-level names it provides
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Distribution {
    pub name: String,
    pub top_level: Vec<String>,
}

pub fn run(args: DiscoverMappingsArgs) -> Result<()> {
    let mappings_path = match &args.mappings {
        Some(path) => path.clone(),
        None => utils::bundled_mappings_path()?,
    };
    let mut table = utils::load_table(&mappings_path)?;

    let output = utils::run_cmd_output(&args.python, &["-c", SYS_PATH_SCRIPT])?;
    let search_path: Vec<PathBuf> =
        serde_json::from_str(output.trim()).context("Unexpected sys.path output")?;

    let distributions: Vec<Distribution> = search_path
        .iter()
        .flat_map(|dir| scan_directory(dir))
        .collect();
    let found = find_mismatches(&distributions, &table);

    if found.is_empty() {
        println!("No new import-to-package mismatches found.");
        return Ok(());
    }

    println!("Found {} potential mapping(s):\n", found.len());
    println!("  {:<30} {:<30}", "Import Name".bold(), "Package Name".bold());
    println!("  {} {}", "-".repeat(30), "-".repeat(30));
    for (import_name, package) in &found {
        println!("  {:<30} {:<30}", import_name, package);
    }

    if !args.apply {
        println!(
            "\nRun with --apply to add these to {}",
            mappings_path.display()
        );
        return Ok(());
    }

    if args.dry_run {
        println!(
            "\n[DRY RUN] Would add {} mapping(s) to {}",
            found.len(),
            mappings_path.display()
        );
        return Ok(());
    }

    for (import_name, package) in &found {
        table.insert(import_name.clone(), MappingEntry::new(package.clone()));
    }
    utils::save_table(&mappings_path, &table)?;
    println!(
        "\n{} Added {} mapping(s) to {}",
        "✓".green(),
        found.len(),
        mappings_path.display()
    );
    println!("Review the entries and set appropriate categories and verified flags.");
    Ok(())
}

/// Distributions installed directly under `dir`
pub fn scan_directory(dir: &Path) -> Vec<Distribution> {
    if !dir.is_dir() {
        return Vec::new();
    }
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_dir())
        .filter_map(|e| read_distribution(e.path()))
        .collect()
}

/// Read a `*.dist-info` or `*.egg-info` metadata directory
pub fn read_distribution(meta_dir: &Path) -> Option<Distribution> {
    let dir_name = meta_dir.file_name()?.to_str()?;
    let metadata_file = if dir_name.ends_with(".dist-info") {
        "METADATA"
    } else if dir_name.ends_with(".egg-info") {
        "PKG-INFO"
    } else {
        return None;
    };

    let metadata = std::fs::read_to_string(meta_dir.join(metadata_file)).ok()?;
    let name = metadata
        .lines()
        .take_while(|line| !line.is_empty())
        .find_map(|line| line.strip_prefix("Name:"))
        .map(str::trim)
        .filter(|name| !name.is_empty())?
        .to_string();

    let top_level = std::fs::read_to_string(meta_dir.join("top_level.txt")).ok()?;
    let top_level = top_level
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('_'))
        .map(str::to_string)
        .collect();

    Some(Distribution { name, top_level })
}

/// Unmapped import names that differ from their distribution's name
///
/// The first distribution providing a name wins. Sorted case-insensitively.
pub fn find_mismatches(distributions: &[Distribution], existing: &MappingTable) -> Vec<(String, String)> {
    let mut seen = HashSet::new();
    let mut found = Vec::new();

    for dist in distributions {
        let dist_key = canonicalize_name(&dist.name);
        for import_name in &dist.top_level {
            if canonicalize_name(import_name) == dist_key
                || existing.contains(import_name)
                || is_standard_library(import_name)
            {
                continue;
            }
            if seen.insert(import_name.clone()) {
                found.push((import_name.clone(), dist.name.clone()));
            }
        }
    }

    found.sort_by_key(|(import_name, _)| import_name.to_lowercase());
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn install(site: &Path, dir_name: &str, metadata_file: &str, name: &str, top_level: &str) {
        let meta = site.join(dir_name);
        std::fs::create_dir_all(&meta).unwrap();
        std::fs::write(
            meta.join(metadata_file),
            format!("Metadata-Version: 2.1\nName: {}\nVersion: 1.0\n\nName: not-this\n", name),
        )
        .unwrap();
        std::fs::write(meta.join("top_level.txt"), top_level).unwrap();
    }

    fn dist(name: &str, top_level: &[&str]) -> Distribution {
        Distribution {
            name: name.to_string(),
            top_level: top_level.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_scan_directory_reads_metadata() {
        let site = TempDir::new().unwrap();
        install(site.path(), "PyYAML-6.0.1.dist-info", "METADATA", "PyYAML", "_yaml\nyaml\n");
        install(site.path(), "legacy_pkg-0.1.egg-info", "PKG-INFO", "legacy-pkg", "legacy\n");
        std::fs::create_dir_all(site.path().join("yaml")).unwrap();
        std::fs::create_dir_all(site.path().join("broken-1.0.dist-info")).unwrap();

        assert_eq!(
            scan_directory(site.path()),
            vec![dist("PyYAML", &["yaml"]), dist("legacy-pkg", &["legacy"])]
        );
    }

    #[test]
    fn test_scan_missing_directory() {
        assert!(scan_directory(Path::new("/nonexistent/site-packages")).is_empty());
    }

    #[test]
    fn test_find_mismatches() {
        let mut existing = MappingTable::default();
        existing.insert("PIL", MappingEntry::new("pillow"));

        let distributions = vec![
            dist("scikit-learn", &["sklearn"]),
            dist("PyYAML", &["yaml"]),
            dist("Pillow", &["PIL"]),
            dist("typing_extensions", &["typing_extensions"]),
            dist("backport", &["json"]),
            dist("pyyaml-fork", &["yaml"]),
        ];

        assert_eq!(
            find_mismatches(&distributions, &existing),
            vec![
                ("sklearn".to_string(), "scikit-learn".to_string()),
                ("yaml".to_string(), "PyYAML".to_string()),
            ]
        );
    }
}
