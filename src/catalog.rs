//! Catalog collaborator boundary.
//!
//! The engine only needs, per library, the list of collections with their item
//! counts. Talking to a media server is the collaborator's business; the
//! snapshot implementation reads the same data from a file.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde_yaml::Value;

use crate::domain::CatalogEntry;
use crate::error::{CollexionsError, Result};

/// Raw catalog entries keyed by library name.
pub type CatalogSnapshot = HashMap<String, Vec<CatalogEntry>>;

/// Source of the collections available in each library.
pub trait Catalog: Send + Sync {
    /// Every collection in `library`, in catalog order.
    fn collections(&self, library: &str) -> Result<Vec<CatalogEntry>>;
}

/// Catalog backed by an in-memory snapshot, usually loaded from a file.
///
/// File format (YAML or JSON):
///
/// ```yaml
/// Movies:
///   - {title: Marvel, item_count: 30, handle: "1234"}
///   - {title: Pixar, item_count: 25}
/// ```
#[derive(Debug, Clone, Default)]
pub struct SnapshotCatalog {
    libraries: CatalogSnapshot,
}

impl SnapshotCatalog {
    pub fn new(libraries: CatalogSnapshot) -> Self {
        Self { libraries }
    }

    /// Load a snapshot file.
    ///
    /// Only an unreadable file or a top level that is not a mapping fails.
    /// A library that is not a list, or an entry of the wrong shape, is logged
    /// and skipped.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| CollexionsError::Catalog(format!("failed to read {}: {}", path.display(), e)))?;
        let raw: HashMap<String, Value> = serde_yaml::from_str(&content)?;

        let libraries: CatalogSnapshot = raw
            .into_iter()
            .filter_map(|(library, value)| decode_library(&library, value).map(|entries| (library, entries)))
            .collect();
        log::info!("Loaded catalog snapshot with {} libraries from {}", libraries.len(), path.display());
        Ok(Self { libraries })
    }

    pub fn library_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.libraries.keys().map(String::as_str).collect();
        names.sort();
        names
    }
}

impl Catalog for SnapshotCatalog {
    fn collections(&self, library: &str) -> Result<Vec<CatalogEntry>> {
        self.libraries
            .get(library)
            .cloned()
            .ok_or_else(|| CollexionsError::Catalog(format!("library not found: {}", library)))
    }
}

fn decode_library(library: &str, value: Value) -> Option<Vec<CatalogEntry>> {
    let Value::Sequence(items) = value else {
        log::warn!("Skipping library '{}' in catalog snapshot: expected a list of collections", library);
        return None;
    };

    let entries = items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match serde_yaml::from_value::<CatalogEntry>(item) {
            Ok(entry) => Some(entry),
            Err(e) => {
                log::warn!("Skipping {}[{}] in catalog snapshot: {}", library, index, e);
                None
            }
        })
        .collect();
    Some(entries)
}

/// Fetch every named library, logging and skipping the ones that fail.
pub fn snapshot(catalog: &dyn Catalog, libraries: &[String]) -> CatalogSnapshot {
    let mut snapshot = CatalogSnapshot::new();
    for library in libraries {
        match catalog.collections(library) {
            Ok(entries) => {
                log::debug!("Library '{}' has {} collections", library, entries.len());
                snapshot.insert(library.clone(), entries);
            }
            Err(e) => log::error!("Failed to read collections for library '{}': {}", library, e),
        }
    }
    snapshot
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_snapshot_catalog_lookup() {
        let catalog = SnapshotCatalog::new(CatalogSnapshot::from([(
            "Movies".to_string(),
            vec![CatalogEntry::new("Marvel", 30)],
        )]));
        assert_eq!(catalog.collections("Movies").unwrap().len(), 1);
        assert!(matches!(catalog.collections("Anime"), Err(CollexionsError::Catalog(_))));
    }

    #[test]
    fn test_snapshot_catalog_from_yaml_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("catalog.yml");
        fs::write(
            &path,
            r#"
Movies:
  - {title: Marvel, item_count: 30, handle: "1234"}
  - {title: Pixar}
TV Shows: []
"#,
        )
        .unwrap();

        let catalog = SnapshotCatalog::from_file(&path).unwrap();
        assert_eq!(catalog.library_names(), vec!["Movies", "TV Shows"]);
        let movies = catalog.collections("Movies").unwrap();
        assert_eq!(movies[0].handle.as_deref(), Some("1234"));
        assert_eq!(movies[1].item_count, None);
    }

    #[test]
    fn test_snapshot_catalog_skips_malformed_entries() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("catalog.yml");
        fs::write(
            &path,
            r#"
Movies:
  - {title: Marvel, item_count: 30}
  - {title: Pixar, item_count: "lots"}
  - "just a string"
  - {title: DC, item_count: 15}
TV Shows:
  - {title: Sitcoms, item_count: 10}
Anime: "not a list"
"#,
        )
        .unwrap();

        let catalog = SnapshotCatalog::from_file(&path).unwrap();
        assert_eq!(catalog.library_names(), vec!["Movies", "TV Shows"]);
        let titles: Vec<Option<String>> = catalog.collections("Movies").unwrap().into_iter().map(|e| e.title).collect();
        assert_eq!(titles, vec![Some("Marvel".to_string()), Some("DC".to_string())]);
        assert_eq!(catalog.collections("TV Shows").unwrap().len(), 1);
    }

    #[test]
    fn test_snapshot_catalog_rejects_non_mapping_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("catalog.yml");
        fs::write(&path, "- Movies\n- TV Shows\n").unwrap();
        assert!(matches!(SnapshotCatalog::from_file(&path), Err(CollexionsError::Yaml(_))));
    }

    #[test]
    fn test_snapshot_catalog_missing_file() {
        let temp = TempDir::new().unwrap();
        let result = SnapshotCatalog::from_file(temp.path().join("missing.yml"));
        assert!(matches!(result, Err(CollexionsError::Catalog(_))));
    }

    #[test]
    fn test_snapshot_skips_failed_libraries() {
        let catalog = SnapshotCatalog::new(CatalogSnapshot::from([("Movies".to_string(), Vec::new())]));
        let snap = snapshot(&catalog, &["Movies".to_string(), "Anime".to_string()]);
        assert!(snap.contains_key("Movies"));
        assert!(!snap.contains_key("Anime"));
    }
}
