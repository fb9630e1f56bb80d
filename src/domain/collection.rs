//! Collection records and catalog ingestion.
//!
//! Catalog entries arrive with optional fields. Anything missing a title or an
//! item count is dropped here so selection code only ever sees complete records.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// A collection eligible for promotion within one library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    /// Display title, unique within a library
    pub title: String,

    /// Number of items in the collection
    pub item_count: u64,

    /// Opaque key used only by the pinning collaborator
    pub handle: String,
}

impl Collection {
    /// Create a collection whose handle is its title.
    pub fn new(title: impl Into<String>, item_count: u64) -> Self {
        let title = title.into();
        Self {
            handle: title.clone(),
            title,
            item_count,
        }
    }

    /// Set an explicit handle
    pub fn with_handle(mut self, handle: impl Into<String>) -> Self {
        self.handle = handle.into();
        self
    }

    /// Normalize a raw catalog entry.
    ///
    /// Returns `None` when the title is missing or blank, or the item count is
    /// missing or negative. A missing handle falls back to the title.
    pub fn from_entry(entry: CatalogEntry) -> Option<Self> {
        let title = entry.title.filter(|t| !t.trim().is_empty())?;
        let item_count = u64::try_from(entry.item_count?).ok()?;
        let handle = entry.handle.unwrap_or_else(|| title.clone());
        Some(Self {
            title,
            item_count,
            handle,
        })
    }
}

/// One collection as reported by the catalog collaborator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    #[serde(default)]
    pub title: Option<String>,

    #[serde(default, alias = "childCount")]
    pub item_count: Option<i64>,

    #[serde(default, alias = "ratingKey")]
    pub handle: Option<String>,
}

impl CatalogEntry {
    pub fn new(title: impl Into<String>, item_count: i64) -> Self {
        Self {
            title: Some(title.into()),
            item_count: Some(item_count),
            handle: None,
        }
    }
}

/// Normalize a library's catalog into collections, preserving catalog order.
///
/// Incomplete entries and repeated titles are skipped.
pub fn ingest(entries: Vec<CatalogEntry>) -> Vec<Collection> {
    let mut seen = HashSet::new();
    let mut collections = Vec::with_capacity(entries.len());

    for entry in entries {
        let raw = format!("{:?}", entry.title);
        let Some(collection) = Collection::from_entry(entry) else {
            log::debug!("Skipping catalog entry without title or item count: {}", raw);
            continue;
        };
        if !seen.insert(collection.title.clone()) {
            log::warn!("Duplicate collection title in catalog, keeping first: '{}'", collection.title);
            continue;
        }
        collections.push(collection);
    }

    collections
}
