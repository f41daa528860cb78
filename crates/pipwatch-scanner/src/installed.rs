//! Installed distribution enumeration

use pipwatch_foundation::naming::normalize_name;
use pipwatch_foundation::{PipwatchError, PipwatchResult};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct PipListEntry {
    name: String,
}

/// Normalized names of the distributions installed in an interpreter
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstalledPackages {
    names: HashSet<String>,
}

impl InstalledPackages {
    /// Ask `python -m pip list` what is installed; failures yield an empty set
    pub fn enumerate(python: &str) -> Self {
        match Self::try_enumerate(python) {
            Ok(installed) => {
                debug!(count = installed.len(), "Found installed packages");
                installed
            }
            Err(e) => {
                warn!(error = %e, "Error getting installed packages");
                Self::default()
            }
        }
    }

    fn try_enumerate(python: &str) -> PipwatchResult<Self> {
        let interpreter = resolve_interpreter(python)?;
        let output = Command::new(&interpreter)
            .args(["-m", "pip", "list", "--format=json", "--disable-pip-version-check"])
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .map_err(|e| PipwatchError::io_at(&interpreter, e))?;

        if !output.status.success() {
            return Err(PipwatchError::internal(format!(
                "pip list exited with {:?}",
                output.status.code()
            )));
        }

        Self::from_pip_list_json(&String::from_utf8_lossy(&output.stdout))
    }

    /// Parse the output of `pip list --format=json`
    pub fn from_pip_list_json(json: &str) -> PipwatchResult<Self> {
        let entries: Vec<PipListEntry> = serde_json::from_str(json)?;
        Ok(entries.into_iter().map(|entry| entry.name).collect())
    }

    /// Whether `package` is installed, compared after normalization
    pub fn contains(&self, package: &str) -> bool {
        self.names.contains(&normalize_name(package))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<S> for InstalledPackages {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            names: iter
                .into_iter()
                .map(|name| normalize_name(name.as_ref()))
                .collect(),
        }
    }
}

/// Locate the interpreter on PATH (or accept an explicit path)
pub fn resolve_interpreter(python: &str) -> PipwatchResult<PathBuf> {
    which::which(python)
        .map_err(|_| PipwatchError::not_found(format!("Python interpreter '{}'", python)))
}
