//! Import-to-package mapping data model
//!
//! A [`MappingTable`] is the versioned document shared by the bundled
//! `mappings.json`, the remote feed, and the local cache. Entries are kept
//! in their raw shape ([`RawEntry`]) so a table read from one source can be
//! written to the cache unchanged; lookups go through the flattened
//! [`ResolvedMappingView`].

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Category assigned to entries that don't carry one
pub const UNCATEGORIZED: &str = "uncategorized";

/// Published location of the canonical mapping table
pub const DEFAULT_MAPPINGS_URL: &str =
    "https://raw.githubusercontent.com/Felixdiamond/pipwatch/main/src/pipwatch/mappings.json";

fn default_category() -> String {
    UNCATEGORIZED.to_string()
}

/// Non-string categories (including `null`) fall back to the default
fn lenient_category<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(category) => category,
        _ => default_category(),
    })
}

/// Only a literal `true` marks an entry verified
fn lenient_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(matches!(
        serde_json::Value::deserialize(deserializer)?,
        serde_json::Value::Bool(true)
    ))
}

/// Versioned collection of import-name mappings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MappingTable {
    /// Dataset version, e.g. "2.1.0"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// ISO date of the last dataset update
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,

    /// Import identifier -> entry
    #[serde(default)]
    pub mappings: BTreeMap<String, RawEntry>,
}

/// A mapping entry as it appears on the wire
///
/// Older tables map an import straight to a package string; current tables
/// use the structured form. Anything else is carried through untouched and
/// ignored at resolution time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawEntry {
    Legacy(String),
    Structured(StructuredEntry),
    Unrecognized(serde_json::Value),
}

/// The structured entry shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredEntry {
    /// Installable distribution name. When missing, the import name is used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,

    #[serde(default = "default_category", deserialize_with = "lenient_category")]
    pub category: String,

    /// Set once a human has reviewed the mapping
    #[serde(default, deserialize_with = "lenient_flag")]
    pub verified: bool,
}

/// Normalized mapping entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingEntry {
    pub package: String,
    pub category: String,
    pub verified: bool,
}

impl MappingEntry {
    pub fn new(package: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            category: default_category(),
            verified: false,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn verified(mut self, verified: bool) -> Self {
        self.verified = verified;
        self
    }
}

impl From<MappingEntry> for RawEntry {
    fn from(entry: MappingEntry) -> Self {
        RawEntry::Structured(StructuredEntry {
            package: Some(entry.package),
            category: entry.category,
            verified: entry.verified,
        })
    }
}

impl RawEntry {
    /// Normalize to a [`MappingEntry`]; `None` for unrecognized shapes
    pub fn normalize(&self, import_name: &str) -> Option<MappingEntry> {
        match self {
            RawEntry::Legacy(package) => Some(MappingEntry::new(package.clone())),
            RawEntry::Structured(entry) => Some(MappingEntry {
                package: entry
                    .package
                    .clone()
                    .unwrap_or_else(|| import_name.to_string()),
                category: entry.category.clone(),
                verified: entry.verified,
            }),
            RawEntry::Unrecognized(_) => None,
        }
    }
}

impl MappingTable {
    /// Parse a table from JSON text
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    /// Serialize with two-space indentation and a trailing newline
    pub fn to_pretty_json(&self) -> serde_json::Result<String> {
        let mut text = serde_json::to_string_pretty(self)?;
        text.push('\n');
        Ok(text)
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    pub fn contains(&self, import_name: &str) -> bool {
        self.mappings.contains_key(import_name)
    }

    /// Insert or replace an entry
    pub fn insert(&mut self, import_name: impl Into<String>, entry: MappingEntry) {
        self.mappings.insert(import_name.into(), entry.into());
    }

    /// Normalized entries, skipping empty keys and unrecognized shapes
    pub fn entries(&self) -> impl Iterator<Item = (&str, MappingEntry)> + '_ {
        self.mappings.iter().filter_map(|(name, raw)| {
            if name.is_empty() {
                return None;
            }
            match raw.normalize(name) {
                Some(entry) => Some((name.as_str(), entry)),
                None => {
                    debug!(import = %name, "Skipping mapping entry with unrecognized shape");
                    None
                }
            }
        })
    }

    /// Flatten into the lookup view
    pub fn resolve(&self) -> ResolvedMappingView {
        ResolvedMappingView(
            self.entries()
                .map(|(name, entry)| (name.to_string(), entry.package))
                .collect(),
        )
    }
}

/// Flattened `import name -> package name` lookup table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedMappingView(HashMap<String, String>);

impl ResolvedMappingView {
    pub fn get(&self, import_name: &str) -> Option<&str> {
        self.0.get(import_name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl FromIterator<(String, String)> for ResolvedMappingView {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Time-stamped copy of a fetched table, as persisted in the cache file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheSnapshot {
    /// Seconds since the Unix epoch at write time
    #[serde(default)]
    pub timestamp: f64,
    pub data: MappingTable,
}

impl CacheSnapshot {
    /// Age of the snapshot relative to `now` (epoch seconds)
    pub fn age_seconds(&self, now: f64) -> f64 {
        now - self.timestamp
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = r#"{
        "version": "2.0.0",
        "last_updated": "2025-01-15",
        "mappings": {
            "PIL": {"package": "pillow", "category": "image-processing", "verified": true},
            "yaml": "pyyaml",
            "attr": {"category": "utilities"},
            "weird": 42
        }
    }"#;

    #[test]
    fn test_parse_both_entry_shapes() {
        let table = MappingTable::from_json(SAMPLE).unwrap();
        assert_eq!(table.version.as_deref(), Some("2.0.0"));
        assert_eq!(table.len(), 4);

        let view = table.resolve();
        assert_eq!(view.get("PIL"), Some("pillow"));
        assert_eq!(view.get("yaml"), Some("pyyaml"));
        assert_eq!(view.len(), 3);
    }

    #[test]
    fn test_structured_entry_without_package_maps_to_itself() {
        let table = MappingTable::from_json(SAMPLE).unwrap();
        assert_eq!(table.resolve().get("attr"), Some("attr"));
    }

    #[test]
    fn test_unrecognized_entries_are_skipped() {
        let table = MappingTable::from_json(SAMPLE).unwrap();
        assert!(table.contains("weird"));
        assert_eq!(table.resolve().get("weird"), None);
    }

    #[test]
    fn test_malformed_metadata_keeps_package() {
        let table = MappingTable::from_json(
            r#"{"mappings": {
                "PIL": {"package": "pillow", "category": null},
                "cv2": {"package": "opencv-python", "verified": "yes"},
                "bad": {"package": 7}
            }}"#,
        )
        .unwrap();

        let view = table.resolve();
        assert_eq!(view.get("PIL"), Some("pillow"));
        assert_eq!(view.get("cv2"), Some("opencv-python"));
        assert_eq!(view.get("bad"), None);

        let entries: HashMap<&str, MappingEntry> = table.entries().collect();
        assert_eq!(entries["PIL"].category, UNCATEGORIZED);
        assert!(!entries["cv2"].verified);
    }

    #[test]
    fn test_structured_defaults() {
        let table =
            MappingTable::from_json(r#"{"mappings": {"cv2": {"package": "opencv-python"}}}"#)
                .unwrap();
        let (_, entry) = table.entries().next().unwrap();
        assert_eq!(entry, MappingEntry::new("opencv-python"));
        assert_eq!(entry.category, UNCATEGORIZED);
        assert!(!entry.verified);
        assert_eq!(table.version, None);
    }

    #[test]
    fn test_empty_keys_are_dropped() {
        let table = MappingTable::from_json(r#"{"mappings": {"": "ghost", "bs4": "beautifulsoup4"}}"#)
            .unwrap();
        assert_eq!(table.resolve().len(), 1);
    }

    #[test]
    fn test_missing_mappings_field_is_empty() {
        let table = MappingTable::from_json(r#"{"version": "1.0"}"#).unwrap();
        assert!(table.is_empty());
        assert!(table.resolve().is_empty());
    }

    #[test]
    fn test_legacy_entries_survive_serialization() {
        let table = MappingTable::from_json(SAMPLE).unwrap();
        let text = table.to_pretty_json().unwrap();
        assert!(text.contains(r#""yaml": "pyyaml""#));
        assert_eq!(MappingTable::from_json(&text).unwrap(), table);
    }

    #[test]
    fn test_insert_writes_structured_entry() {
        let mut table = MappingTable::default();
        table.insert(
            "sklearn",
            MappingEntry::new("scikit-learn")
                .with_category("data-science")
                .verified(true),
        );
        let json = serde_json::to_value(&table).unwrap();
        assert_eq!(json["mappings"]["sklearn"]["package"], "scikit-learn");
        assert_eq!(json["mappings"]["sklearn"]["verified"], true);
    }

    #[test]
    fn test_snapshot_age() {
        let snapshot = CacheSnapshot {
            timestamp: 1_000.0,
            data: MappingTable::default(),
        };
        assert_eq!(snapshot.age_seconds(1_060.5), 60.5);
    }
}
