//! requirements.txt generation

use pipwatch_foundation::{PipwatchError, PipwatchResult};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{debug, warn};

/// Write `packages` one per line, sorted and deduplicated
///
/// Returns the number of lines written. An empty input leaves `path`
/// untouched and returns 0.
pub fn write_manifest<I, S>(packages: I, path: &Path) -> PipwatchResult<usize>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let packages: BTreeSet<String> = packages
        .into_iter()
        .map(Into::into)
        .filter(|p: &String| !p.trim().is_empty())
        .collect();

    if packages.is_empty() {
        warn!("No dependencies to write to requirements file.");
        return Ok(0);
    }

    let mut content = String::new();
    for package in &packages {
        content.push_str(package);
        content.push('\n');
    }
    std::fs::write(path, content).map_err(|e| PipwatchError::io_at(path, e))?;

    debug!(path = %path.display(), count = packages.len(), "Wrote requirements file");
    Ok(packages.len())
}
