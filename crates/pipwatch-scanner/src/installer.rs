//! Package installation through pip

use crate::installed::{resolve_interpreter, InstalledPackages};
use pipwatch_foundation::naming::normalize_name;
use pipwatch_foundation::{PipwatchError, PipwatchResult};
use pipwatch_registry::MappingRegistry;
use std::collections::BTreeSet;
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::{debug, error, info};

/// Installs one distribution at a time
pub trait Installer {
    fn install(&self, package: &str) -> PipwatchResult<()>;
}

/// Runs `python -m pip install <package> -q`
#[derive(Debug, Clone)]
pub struct PipInstaller {
    python: String,
    show_output: bool,
}

impl PipInstaller {
    pub fn new(python: impl Into<String>) -> Self {
        Self {
            python: python.into(),
            show_output: false,
        }
    }

    /// Let pip write to the terminal instead of discarding its output
    pub fn show_output(mut self, show: bool) -> Self {
        self.show_output = show;
        self
    }

    fn stdout(&self) -> Stdio {
        if self.show_output {
            Stdio::inherit()
        } else {
            Stdio::null()
        }
    }
}

impl Installer for PipInstaller {
    fn install(&self, package: &str) -> PipwatchResult<()> {
        let interpreter =
            resolve_interpreter(&self.python).map_err(|e| PipwatchError::install(package, e.to_string()))?;

        let status = Command::new(&interpreter)
            .args(["-m", "pip", "install", package, "-q"])
            .stdin(Stdio::null())
            .stdout(self.stdout())
            .status()
            .map_err(|e| PipwatchError::install(package, format!("Failed to run pip: {}", e)))?;

        if !status.success() {
            return Err(PipwatchError::install(
                package,
                format!("pip exited with code {:?}", status.code()),
            ));
        }
        Ok(())
    }
}

/// Outcome of a batch install
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallReport {
    pub installed: Vec<String>,
    pub failed: Vec<String>,
}

impl InstallReport {
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Install each package in turn; a failure never stops the batch
pub fn install_all(installer: &dyn Installer, packages: &[String]) -> InstallReport {
    let mut report = InstallReport::default();
    let total = packages.len();

    for (i, package) in packages.iter().enumerate() {
        info!("[{}/{}] Installing {}...", i + 1, total, package);
        match installer.install(package) {
            Ok(()) => {
                info!("✓ Successfully installed {}", package);
                report.installed.push(package.clone());
            }
            Err(e) => {
                error!(error = %e, "✗ Failed to install {}", package);
                report.failed.push(package.clone());
            }
        }
    }

    report
}

/// Run `python -m pip install -r <requirements>`
pub fn install_requirements_file(python: &str, requirements: &Path) -> PipwatchResult<()> {
    let label = requirements.display().to_string();
    if !requirements.exists() {
        return Err(PipwatchError::not_found(label));
    }

    let interpreter = resolve_interpreter(python)?;
    let status = Command::new(&interpreter)
        .arg("-m")
        .arg("pip")
        .arg("install")
        .arg("-r")
        .arg(requirements)
        .stdin(Stdio::null())
        .status()
        .map_err(|e| PipwatchError::install(&label, format!("Failed to run pip: {}", e)))?;

    if !status.success() {
        return Err(PipwatchError::install(
            label,
            format!("pip exited with code {:?}", status.code()),
        ));
    }
    Ok(())
}

/// Distribution names for `dependencies` that are not installed yet
///
/// Each import identifier is mapped through the registry; the result keeps
/// the mapped spelling and drops duplicates.
pub fn plan_installation(
    dependencies: &BTreeSet<String>,
    registry: &mut MappingRegistry,
    installed: &InstalledPackages,
) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut to_install = Vec::new();

    for dependency in dependencies {
        let package = registry.get_package_name(dependency);
        if installed.contains(&package) {
            debug!("{} is already installed", package);
            continue;
        }
        if seen.insert(normalize_name(&package)) {
            to_install.push(package);
        }
    }

    to_install
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct Scripted {
        failing: Vec<&'static str>,
        calls: RefCell<Vec<String>>,
    }

    impl Installer for Scripted {
        fn install(&self, package: &str) -> PipwatchResult<()> {
            self.calls.borrow_mut().push(package.to_string());
            if self.failing.iter().any(|f| *f == package) {
                Err(PipwatchError::install(package, "not on the index"))
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn test_failures_do_not_abort_batch() {
        let installer = Scripted {
            failing: vec!["ghost-package"],
            calls: RefCell::new(Vec::new()),
        };
        let packages: Vec<String> = ["requests", "ghost-package", "rich"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let report = install_all(&installer, &packages);

        assert_eq!(installer.calls.borrow().len(), 3);
        assert_eq!(report.installed, vec!["requests", "rich"]);
        assert_eq!(report.failed, vec!["ghost-package"]);
        assert!(!report.all_succeeded());
    }

    #[test]
    fn test_empty_batch() {
        let installer = Scripted {
            failing: Vec::new(),
            calls: RefCell::new(Vec::new()),
        };
        let report = install_all(&installer, &[]);
        assert!(report.all_succeeded());
        assert!(installer.calls.borrow().is_empty());
    }

    #[test]
    fn test_missing_requirements_file() {
        let err = install_requirements_file("python3", Path::new("/nonexistent/requirements.txt"))
            .unwrap_err();
        assert!(matches!(err, PipwatchError::NotFound { .. }));
    }

    #[test]
    fn test_missing_interpreter_fails_install() {
        let installer = PipInstaller::new("pipwatch-no-such-python-3.99");
        let err = installer.install("requests").unwrap_err();
        assert!(matches!(err, PipwatchError::Install { .. }));
    }
}
