//! Bundled static mapping table

use pipwatch_foundation::{MappingTable, PipwatchError, PipwatchResult};
use std::path::PathBuf;
use tracing::{debug, warn};

/// Mapping table shipped with the binary, embedded at compile time
pub const EMBEDDED_MAPPINGS: &str = include_str!("../resources/mappings.json");

/// Where the bundled mapping table comes from
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum BundledTable {
    /// The table compiled into the binary
    #[default]
    Embedded,
    /// A table on disk that replaces the embedded one
    File(PathBuf),
}

impl BundledTable {
    /// Load the bundled table, or `None` if it is missing or corrupt
    pub fn load(&self) -> Option<MappingTable> {
        match self.try_load() {
            Ok(table) => {
                debug!(source = %self.describe(), mappings = table.len(), "Loaded bundled mappings");
                Some(table)
            }
            Err(e) => {
                warn!(source = %self.describe(), error = %e, "Failed to load bundled mappings");
                None
            }
        }
    }

    fn try_load(&self) -> PipwatchResult<MappingTable> {
        match self {
            BundledTable::Embedded => Ok(MappingTable::from_json(EMBEDDED_MAPPINGS)?),
            BundledTable::File(path) => {
                if !path.exists() {
                    return Err(PipwatchError::not_found(path.display().to_string()));
                }
                let text =
                    std::fs::read_to_string(path).map_err(|e| PipwatchError::io_at(path, e))?;
                Ok(MappingTable::from_json(&text)?)
            }
        }
    }

    /// Human-readable origin, used in log fields
    pub fn describe(&self) -> String {
        match self {
            BundledTable::Embedded => "embedded".to_string(),
            BundledTable::File(path) => path.display().to_string(),
        }
    }
}
