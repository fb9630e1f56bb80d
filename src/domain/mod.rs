//! Domain types for Collexions
//!
//! - Collection: a named, countable group of catalog items that can be pinned
//! - CatalogEntry: the raw shape the catalog collaborator hands us, normalized
//!   into a Collection at ingestion time

pub mod collection;

pub use collection::{CatalogEntry, Collection, ingest};
