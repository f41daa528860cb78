//! Dependency analysis: scan, map, then generate or install

use super::prompt::confirm;
use super::Cli;
use anyhow::bail;
use pipwatch_registry::MappingRegistry;
use pipwatch_scanner::{
    analyze_file_content, extract_imports_from_file, filter_standard_library, find_python_files,
    install_all, install_requirements_file, plan_installation, write_manifest, ContentHints,
    InstalledPackages, PipInstaller,
};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{error, info, warn};

const REQUIREMENTS_FILE: &str = "requirements.txt";

pub fn handle_analyze(cli: &Cli, python: &str, registry: &mut MappingRegistry) -> anyhow::Result<()> {
    let Some(path) = cli.path.as_deref() else {
        bail!("file_path is required for analysis (use --help for usage information)");
    };
    if !path.exists() {
        bail!("Path not found: {}", path.display());
    }

    let files = find_python_files(path);
    match files.as_slice() {
        [] => bail!("No Python files found in {}", path.display()),
        [single] => info!("Analyzing {}...", single.display()),
        many => info!("Analyzing {} Python files in {}...", many.len(), path.display()),
    }

    let mut dependencies = BTreeSet::new();
    let mut hints = ContentHints::default();
    for file in &files {
        dependencies.extend(filter_standard_library(&extract_imports_from_file(file)));
        hints.merge(analyze_file_content(file));
    }
    dependencies.extend(hints.pip_installs.iter().cloned());

    if !dependencies.is_empty() {
        info!("Detected {} unique dependencies total.", dependencies.len());
    }

    if dependencies.is_empty() && !hints.mentions_requirements {
        println!("✓ No third-party dependencies found.");
        return Ok(());
    }

    if !dependencies.is_empty() {
        println!("Found the following dependencies:");
        for dependency in &dependencies {
            let package = registry.get_package_name(dependency);
            if &package != dependency {
                println!("  • {} → {}", dependency, package);
            } else {
                println!("  • {}", dependency);
            }
        }
    }

    if hints.mentions_requirements {
        handle_requirements_mention(cli.yes, python);
    }

    if cli.generate {
        let packages: Vec<String> = dependencies
            .iter()
            .map(|d| registry.get_package_name(d))
            .collect();
        let written = write_manifest(packages, &cli.output)?;
        if written > 0 {
            println!("✓ Generated {} with {} packages", cli.output.display(), written);
        }
        return Ok(());
    }

    if cli.dry_run {
        install_dependencies(&dependencies, registry, python, true, cli.verbose);
        return Ok(());
    }

    let proceed = dependencies.is_empty()
        || confirm("\nDo you want to install the detected dependencies?", cli.yes);
    if proceed {
        install_dependencies(&dependencies, registry, python, false, cli.verbose);
    } else {
        println!("Installation cancelled.");
    }
    Ok(())
}

fn handle_requirements_mention(assume_yes: bool, python: &str) {
    println!("\nℹ A reference to 'requirements.txt' was found in the file.");
    if !confirm(
        "Do you want to install dependencies from 'requirements.txt'?",
        assume_yes,
    ) {
        return;
    }

    info!("Installing from requirements.txt...");
    match install_requirements_file(python, Path::new(REQUIREMENTS_FILE)) {
        Ok(()) => println!("✓ Dependencies from requirements.txt installed successfully!"),
        Err(e) => error!(
            error = %e,
            "✗ Failed to install from requirements.txt. The file might not exist or there could be an error."
        ),
    }
}

fn install_dependencies(
    dependencies: &BTreeSet<String>,
    registry: &mut MappingRegistry,
    python: &str,
    dry_run: bool,
    verbose: bool,
) {
    let installed = InstalledPackages::enumerate(python);
    let to_install = plan_installation(dependencies, registry, &installed);

    if to_install.is_empty() {
        println!("✓ All dependencies are already installed.");
        return;
    }

    println!("\nPackages to install: {}", to_install.join(", "));

    if dry_run {
        println!("\n[DRY RUN] Would install the following packages:");
        for package in &to_install {
            println!("  • {}", package);
        }
        return;
    }

    let installer = PipInstaller::new(python).show_output(verbose);
    let report = install_all(&installer, &to_install);

    if report.all_succeeded() {
        println!("\n✓ All dependencies installed successfully!");
    } else {
        warn!("Failed to install: {}", report.failed.join(", "));
        println!("\nFailed to install: {}", report.failed.join(", "));
        println!("These packages might not be available on PyPI or there could be a naming mismatch.");
    }
}
