//! One pinning cycle over every configured library.
//!
//! [`run_cycle`] is pure: it takes the catalog snapshot, the current history
//! and the wall-clock time, and returns the selections plus the history to
//! persist. All I/O lives in [`crate::runner`].

use std::collections::HashSet;

use chrono::NaiveDateTime;
use rand::Rng;

use crate::activation;
use crate::catalog::CatalogSnapshot;
use crate::config::EngineConfig;
use crate::domain::{Collection, ingest};
use crate::history::{self, HistoryRecord};
use crate::selection::{self, CategoryConfig, ExclusionPolicy};

/// Collections chosen for one library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibrarySelection {
    pub library: String,
    pub budget: usize,
    pub collections: Vec<Collection>,
}

impl LibrarySelection {
    pub fn titles(&self) -> Vec<&str> {
        self.collections.iter().map(|c| c.title.as_str()).collect()
    }
}

/// Everything a cycle decided.
#[derive(Debug, Clone)]
pub struct CycleOutcome {
    pub timestamp: NaiveDateTime,
    /// Special titles active on the cycle's date
    pub active_specials: HashSet<String>,
    /// Per library, in configuration order
    pub selections: Vec<LibrarySelection>,
    /// Titles written to history for this cycle, if any
    pub recorded: Option<HistoryRecord>,
    /// Pruned history including `recorded`
    pub history: Vec<HistoryRecord>,
}

impl CycleOutcome {
    pub fn selection(&self, library: &str) -> Option<&LibrarySelection> {
        self.selections.iter().find(|s| s.library == library)
    }

    pub fn total_selected(&self) -> usize {
        self.selections.iter().map(|s| s.collections.len()).sum()
    }
}

/// Select collections for every library in `config.library_names`.
///
/// Activations are evaluated once against `now.date()`. Libraries missing from
/// `snapshot` are skipped. Titles pinned for an earlier library count as
/// recently pinned for later ones within the same cycle.
pub fn run_cycle<R: Rng>(
    config: &EngineConfig,
    snapshot: &CatalogSnapshot,
    history: &[HistoryRecord],
    now: NaiveDateTime,
    rng: &mut R,
) -> CycleOutcome {
    let active_specials = activation::active_titles(&config.specials, now.date());
    let all_specials = activation::all_titles(&config.specials);

    if !active_specials.is_empty() {
        let mut names: Vec<&String> = active_specials.iter().collect();
        names.sort();
        log::info!("Active special collections: {:?}", names);
    }

    let base = selection::resolve(&config.explicit_exclusions, &all_specials, &active_specials);

    let recent = history::recently_pinned(history, config.cooldown, now);
    let recent: HashSet<String> = if config.exempt_specials_from_cooldown {
        recent.difference(&all_specials).cloned().collect()
    } else {
        recent
    };
    log::debug!("{} titles are in their cool-down window", recent.len());

    let mut policy = ExclusionPolicy::default()
        .with_min_items(config.min_items)
        .with_patterns(config.patterns.clone())
        .with_base(base)
        .with_recent(recent)
        .with_specials_exempt(config.exempt_specials_from_cooldown);

    let no_categories = CategoryConfig::default();
    let mut selections = Vec::with_capacity(config.library_names.len());
    let mut pinned: Vec<String> = Vec::new();

    for library in &config.library_names {
        let Some(entries) = snapshot.get(library) else {
            log::warn!("No catalog available for library '{}', skipping it this cycle", library);
            continue;
        };

        let budget = config.budget(library);
        log::info!("Processing library: {} with {} collections to pin.", library, budget);

        let catalog = ingest(entries.clone());
        let categories = config.categories_for(library).unwrap_or(&no_categories);
        let collections = selection::select(&catalog, &active_specials, budget, categories, &policy, rng);

        if collections.is_empty() {
            log::info!("No collections available to pin for library: {}.", library);
        }

        for collection in &collections {
            let is_special = all_specials.contains(&collection.title);
            if is_special && config.exempt_specials_from_cooldown {
                continue;
            }
            if !pinned.contains(&collection.title) {
                pinned.push(collection.title.clone());
            }
            policy.recent.insert(collection.title.clone());
        }

        selections.push(LibrarySelection {
            library: library.clone(),
            budget,
            collections,
        });
    }

    let mut updated = history::prune(history.to_vec(), config.retention, now);
    let recorded = if pinned.is_empty() {
        None
    } else {
        let record = HistoryRecord::new(now, pinned);
        updated.push(record.clone());
        Some(record)
    };

    CycleOutcome {
        timestamp: now,
        active_specials,
        selections,
        recorded,
        history: updated,
    }
}
