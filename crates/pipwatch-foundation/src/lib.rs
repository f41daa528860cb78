//! Foundation Layer - error handling and the mapping data model
//!
//! This crate provides the building blocks shared by every pipwatch crate:
//! - `PipwatchError`, the error type used by fallible library operations
//! - The mapping table model (`MappingTable`, `MappingEntry`, `RawEntry`)
//! - The on-disk cache snapshot shape and the flattened lookup view
//! - Package name normalization helpers

pub mod error;
pub mod model;
pub mod naming;

// Re-export commonly used types for convenience
pub use error::*;
pub use model::*;
