//! Import-to-package mapping registry
//!
//! Resolves Python import identifiers to installable distribution names from
//! three sources, in order: a local time-boxed cache, a remote feed, and the
//! table bundled with the binary. Every failure along the way degrades to the
//! next source; the registry itself never returns an error.
//!
//! ```no_run
//! use pipwatch_registry::{MappingRegistry, RegistryOptions};
//!
//! let mut registry = MappingRegistry::new(RegistryOptions::default());
//! assert_eq!(registry.get_package_name("PIL"), "pillow");
//! assert_eq!(registry.get_package_name("requests"), "requests");
//! ```

pub mod bundled;
pub mod cache;
pub mod registry;
pub mod remote;

pub use bundled::BundledTable;
pub use cache::{CacheStore, TTL_SECONDS};
pub use registry::{MappingRegistry, MappingSource, RegistryOptions, RegistryStats};
pub use remote::{HttpFetcher, RemoteFetcher};
