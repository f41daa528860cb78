//! Mapping cache management (~/.pipwatch/mappings_cache.json)

use pipwatch_foundation::{CacheSnapshot, MappingTable, PipwatchError, PipwatchResult};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

/// Snapshots older than this are refetched (24 hours)
pub const TTL_SECONDS: f64 = 86_400.0;

/// Name of the per-user pipwatch directory under $HOME
pub const CACHE_DIR_NAME: &str = ".pipwatch";

/// Cache file name inside [`CACHE_DIR_NAME`]
pub const CACHE_FILE_NAME: &str = "mappings_cache.json";

/// Default cache location (~/.pipwatch/mappings_cache.json)
///
/// Falls back to the working directory when no home directory is known.
pub fn default_cache_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CACHE_DIR_NAME)
        .join(CACHE_FILE_NAME)
}

/// Current time as fractional seconds since the Unix epoch
pub fn now_epoch_seconds() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

/// A snapshot written at `timestamp` is stale at `now` once its age reaches the TTL
pub fn is_stale(timestamp: f64, now: f64) -> bool {
    now - timestamp >= TTL_SECONDS
}

/// Single-file store for the last fetched mapping table
#[derive(Debug, Clone)]
pub struct CacheStore {
    path: PathBuf,
}

impl Default for CacheStore {
    fn default() -> Self {
        Self::new(default_cache_path())
    }
}

impl CacheStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Read the snapshot; missing, unreadable, or malformed files read as `None`
    pub fn read(&self) -> Option<CacheSnapshot> {
        if !self.path.exists() {
            return None;
        }

        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) => {
                debug!(path = %self.path.display(), error = %e, "Failed to read cache");
                return None;
            }
        };

        match serde_json::from_str::<CacheSnapshot>(&text) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                debug!(path = %self.path.display(), error = %e, "Failed to parse cache");
                None
            }
        }
    }

    /// The cached table if it is younger than the TTL
    pub fn read_fresh(&self) -> Option<MappingTable> {
        self.read_fresh_at(now_epoch_seconds())
    }

    /// [`CacheStore::read_fresh`] against an explicit clock
    pub fn read_fresh_at(&self, now: f64) -> Option<MappingTable> {
        let snapshot = self.read()?;
        let age = snapshot.age_seconds(now);
        if is_stale(snapshot.timestamp, now) {
            debug!(age_hours = (age / 3600.0) as i64, "Cache expired");
            return None;
        }
        debug!(age_hours = (age / 3600.0) as i64, "Using cached mappings");
        Some(snapshot.data)
    }

    /// Persist `table` as a new snapshot; failures are logged, never raised
    pub fn write(&self, table: &MappingTable) {
        self.write_at(table, now_epoch_seconds());
    }

    /// [`CacheStore::write`] with an explicit timestamp
    pub fn write_at(&self, table: &MappingTable, timestamp: f64) {
        match self.try_write(table, timestamp) {
            Ok(()) => debug!(path = %self.path.display(), "Saved mappings to cache"),
            Err(e) => debug!(path = %self.path.display(), error = %e, "Failed to save cache"),
        }
    }

    fn try_write(&self, table: &MappingTable, timestamp: f64) -> PipwatchResult<()> {
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&parent).map_err(|e| PipwatchError::io_at(&parent, e))?;

        let snapshot = CacheSnapshot {
            timestamp,
            data: table.clone(),
        };
        let json = serde_json::to_string_pretty(&snapshot)?;

        // Whole-file replacement: concurrent readers see the old or the new snapshot
        let mut tmp = tempfile::NamedTempFile::new_in(&parent)
            .map_err(|e| PipwatchError::io_at(&parent, e))?;
        tmp.write_all(json.as_bytes())?;
        tmp.persist(&self.path)
            .map_err(|e| PipwatchError::io_at(&self.path, e.error))?;
        Ok(())
    }

    /// Delete the cache file; returns whether anything was removed
    pub fn clear(&self) -> bool {
        if !self.path.exists() {
            debug!("No cache file found");
            return false;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "Cache file removed");
                true
            }
            Err(e) => {
                tracing::error!(path = %self.path.display(), error = %e, "Failed to clear cache");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipwatch_foundation::MappingEntry;
    use tempfile::TempDir;

    fn sample_table() -> MappingTable {
        let mut table = MappingTable {
            version: Some("9.9.9".to_string()),
            ..Default::default()
        };
        table.insert("cv2", MappingEntry::new("opencv-python"));
        table
    }

    #[test]
    fn test_default_cache_path() {
        let path = default_cache_path();
        assert!(path.ends_with(".pipwatch/mappings_cache.json"));
    }

    #[test]
    fn test_staleness_boundary() {
        let now = 1_700_000_000.0;
        assert!(!is_stale(now - (TTL_SECONDS - 1.0), now));
        assert!(is_stale(now - TTL_SECONDS, now));
        assert!(is_stale(now - TTL_SECONDS - 1.0, now));
        assert!(!is_stale(now, now));
    }

    #[test]
    fn test_write_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let store = CacheStore::new(dir.path().join("nested/deeper/cache.json"));
        store.write(&sample_table());
        assert!(store.exists());
        assert_eq!(store.read().unwrap().data, sample_table());
    }

    #[test]
    fn test_read_missing_is_none() {
        let dir = TempDir::new().unwrap();
        let store = CacheStore::new(dir.path().join("cache.json"));
        assert!(store.read().is_none());
    }

    #[test]
    fn test_read_malformed_is_none() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cache.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(CacheStore::new(&path).read().is_none());

        std::fs::write(&path, r#"{"timestamp": 1.0}"#).unwrap();
        assert!(CacheStore::new(&path).read().is_none());
    }

    #[test]
    fn test_read_fresh_respects_ttl() {
        let dir = TempDir::new().unwrap();
        let store = CacheStore::new(dir.path().join("cache.json"));
        let now = 1_700_000_000.0;

        store.write_at(&sample_table(), now - (TTL_SECONDS - 1.0));
        assert_eq!(store.read_fresh_at(now), Some(sample_table()));

        store.write_at(&sample_table(), now - TTL_SECONDS);
        assert_eq!(store.read_fresh_at(now), None);
    }

    #[test]
    fn test_write_failure_is_swallowed() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "file, not a directory").unwrap();

        let store = CacheStore::new(blocker.join("cache.json"));
        store.write(&sample_table());
        assert!(!store.exists());
    }

    #[test]
    fn test_clear_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = CacheStore::new(dir.path().join("cache.json"));
        store.write(&sample_table());

        assert!(store.clear());
        assert!(!store.clear());
        assert!(!store.exists());
    }
}
