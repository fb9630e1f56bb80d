//! Pinning and notification collaborator boundaries.
//!
//! The engine hands over an ordered selection; promoting collections on a
//! media server and delivering chat messages happen behind these traits.

use std::collections::HashSet;

use crate::domain::Collection;
use crate::error::Result;

/// Promotes collections for a library.
pub trait Pinner: Send {
    /// Demote whatever is currently pinned in `library`, leaving titles in `keep` alone.
    fn reset(&mut self, library: &str, keep: &HashSet<String>) -> Result<()>;

    /// Promote one collection.
    fn pin(&mut self, library: &str, collection: &Collection) -> Result<()>;
}

/// Receives one message per successfully pinned collection.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str) -> Result<()>;
}

/// Message sent after a collection was pinned.
pub fn format_pin_message(title: &str, item_count: u64) -> String {
    format!("Collection '**{}**' ({} items) pinned successfully.", title, item_count)
}

/// Pinner that only records and logs what it was asked to pin.
///
/// Used for previews and for running against a catalog snapshot.
#[derive(Debug, Default)]
pub struct LogPinner {
    pinned: Vec<(String, Collection)>,
}

impl LogPinner {
    pub fn new() -> Self {
        Self::default()
    }

    /// `(library, collection)` pairs pinned since the last reset, in order.
    pub fn pinned(&self) -> &[(String, Collection)] {
        &self.pinned
    }
}

impl Pinner for LogPinner {
    fn reset(&mut self, library: &str, keep: &HashSet<String>) -> Result<()> {
        let before = self.pinned.len();
        self.pinned.retain(|(lib, c)| lib != library || keep.contains(&c.title));
        log::info!("Unpinned {} collections in library '{}'", before - self.pinned.len(), library);
        Ok(())
    }

    fn pin(&mut self, library: &str, collection: &Collection) -> Result<()> {
        log::info!("Attempting to pin collection: {}", collection.title);
        self.pinned.push((library.to_string(), collection.clone()));
        Ok(())
    }
}

/// Notifier that writes messages to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, message: &str) -> Result<()> {
        log::info!("{}", message);
        Ok(())
    }
}
