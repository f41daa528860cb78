//! Layered import-to-package resolution
//!
//! One [`MappingRegistry`] is built at process start and handed by `&mut` to
//! everything that needs lookups. The first lookup runs the resolution chain
//! (fresh cache, remote feed, bundled table, empty table); the flattened
//! result is memoized until an explicit refresh.

use crate::bundled::BundledTable;
use crate::cache::CacheStore;
use crate::remote::{HttpFetcher, RemoteFetcher, DEFAULT_TIMEOUT};
use pipwatch_config::RegistryConfig;
use pipwatch_foundation::{MappingTable, ResolvedMappingView, DEFAULT_MAPPINGS_URL};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

const UNKNOWN: &str = "unknown";

/// Construction options for [`MappingRegistry`]
#[derive(Debug, Clone)]
pub struct RegistryOptions {
    pub use_cache: bool,
    pub remote_url: String,
    /// Cache file location; `None` means `~/.pipwatch/mappings_cache.json`
    pub cache_path: Option<PathBuf>,
    pub timeout: Duration,
    pub bundled: BundledTable,
}

impl Default for RegistryOptions {
    fn default() -> Self {
        Self {
            use_cache: true,
            remote_url: DEFAULT_MAPPINGS_URL.to_string(),
            cache_path: None,
            timeout: DEFAULT_TIMEOUT,
            bundled: BundledTable::Embedded,
        }
    }
}

impl RegistryOptions {
    pub fn from_config(config: &RegistryConfig) -> Self {
        Self {
            use_cache: config.use_cache,
            remote_url: config.remote_url.clone(),
            cache_path: config.cache_path.clone(),
            timeout: Duration::from_secs(config.timeout_seconds),
            bundled: config
                .bundled_path
                .clone()
                .map(BundledTable::File)
                .unwrap_or_default(),
        }
    }
}

/// Which tier produced the current view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MappingSource {
    Cache,
    Remote,
    Bundled,
    Empty,
}

impl fmt::Display for MappingSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MappingSource::Cache => "cache",
            MappingSource::Remote => "remote",
            MappingSource::Bundled => "bundled",
            MappingSource::Empty => "empty",
        };
        f.write_str(name)
    }
}

/// Summary of the loaded mappings
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegistryStats {
    pub total_mappings: usize,
    pub version: String,
    pub cache_enabled: bool,
    pub cache_location: String,
    pub last_updated: String,
}

struct Loaded {
    view: ResolvedMappingView,
    version: Option<String>,
    last_updated: Option<String>,
    source: MappingSource,
}

pub struct MappingRegistry {
    options: RegistryOptions,
    cache: CacheStore,
    fetcher: Box<dyn RemoteFetcher>,
    loaded: Option<Loaded>,
}

impl fmt::Debug for MappingRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MappingRegistry")
            .field("options", &self.options)
            .field("cache", &self.cache)
            .field("source", &self.source())
            .finish()
    }
}

impl MappingRegistry {
    /// Registry backed by the HTTP feed
    pub fn new(options: RegistryOptions) -> Self {
        Self::with_fetcher(options, Box::new(HttpFetcher::new()))
    }

    /// Registry backed by an arbitrary fetcher
    pub fn with_fetcher(options: RegistryOptions, fetcher: Box<dyn RemoteFetcher>) -> Self {
        let cache = options
            .cache_path
            .clone()
            .map(CacheStore::new)
            .unwrap_or_default();
        Self {
            options,
            cache,
            fetcher,
            loaded: None,
        }
    }

    pub fn options(&self) -> &RegistryOptions {
        &self.options
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    /// The resolved view, running the resolution chain when nothing is
    /// memoized yet or `force_refresh` is set. Never fails; the worst case
    /// is an empty view.
    pub fn load_mappings(&mut self, force_refresh: bool) -> &ResolvedMappingView {
        let loaded = match self.loaded.take() {
            Some(loaded) if !force_refresh => loaded,
            _ => {
                let (table, source) = self.resolve_chain(force_refresh);
                debug!(source = %source, mappings = table.len(), "Mappings loaded");
                Loaded {
                    view: table.resolve(),
                    version: table.version,
                    last_updated: table.last_updated,
                    source,
                }
            }
        };
        &self.loaded.insert(loaded).view
    }

    fn resolve_chain(&self, force_refresh: bool) -> (MappingTable, MappingSource) {
        if !force_refresh && self.options.use_cache {
            if let Some(table) = self.cache.read_fresh() {
                return (table, MappingSource::Cache);
            }
        }

        debug!(url = %self.options.remote_url, "Fetching mappings");
        if let Some(table) = self
            .fetcher
            .fetch(&self.options.remote_url, self.options.timeout)
            .filter(usable)
        {
            if self.options.use_cache {
                self.cache.write(&table);
            }
            return (table, MappingSource::Remote);
        }

        if let Some(table) = self.options.bundled.load() {
            debug!("Using bundled mappings");
            return (table, MappingSource::Bundled);
        }

        warn!("No mappings file found, every import will map to itself");
        (MappingTable::default(), MappingSource::Empty)
    }

    /// Distribution name for `import_name`, or the import name itself when unmapped
    pub fn get_package_name(&mut self, import_name: &str) -> String {
        self.load_mappings(false)
            .get(import_name)
            .unwrap_or(import_name)
            .to_string()
    }

    /// Version of the loaded table, `"unknown"` before loading or when absent
    pub fn get_version(&self) -> String {
        self.loaded
            .as_ref()
            .and_then(|l| l.version.clone())
            .unwrap_or_else(|| UNKNOWN.to_string())
    }

    pub fn get_stats(&mut self) -> RegistryStats {
        let total_mappings = self.load_mappings(false).len();
        let last_updated = self
            .loaded
            .as_ref()
            .and_then(|l| l.last_updated.clone())
            .unwrap_or_else(|| UNKNOWN.to_string());

        RegistryStats {
            total_mappings,
            version: self.get_version(),
            cache_enabled: self.options.use_cache,
            cache_location: if self.options.use_cache {
                self.cache.path().display().to_string()
            } else {
                "N/A".to_string()
            },
            last_updated,
        }
    }

    /// Delete the cache snapshot; `true` only if a file was removed
    pub fn clear_cache(&self) -> bool {
        let cleared = self.cache.clear();
        if cleared {
            info!(path = %self.cache.path().display(), "Cleared mappings cache");
        }
        cleared
    }

    /// Tier that produced the memoized view, `None` before the first load
    pub fn source(&self) -> Option<MappingSource> {
        self.loaded.as_ref().map(|l| l.source)
    }
}

// A fetched payload without entries carries nothing to look up
fn usable(table: &MappingTable) -> bool {
    !table.is_empty()
}
