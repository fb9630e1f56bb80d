//! Category quotas: at most one pick per configured category.

use std::collections::HashSet;

use rand::Rng;
use rand::seq::IndexedRandom;

use crate::domain::Collection;

/// A named group of titles, one of which may be pinned per cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub name: String,
    pub titles: Vec<String>,
}

impl Category {
    pub fn new(name: impl Into<String>, titles: Vec<String>) -> Self {
        Self {
            name: name.into(),
            titles,
        }
    }
}

/// Categories configured for one library, in configuration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryConfig {
    /// Always pick from a non-empty category (true) or flip a coin per category (false).
    pub always_call: bool,
    pub categories: Vec<Category>,
}

impl Default for CategoryConfig {
    fn default() -> Self {
        Self {
            always_call: true,
            categories: Vec::new(),
        }
    }
}

impl CategoryConfig {
    pub fn new(always_call: bool, categories: Vec<Category>) -> Self {
        Self {
            always_call,
            categories,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

/// Result of one category pass.
#[derive(Debug, Clone)]
pub struct CategoryPick {
    /// Picks in category order
    pub selections: Vec<Collection>,
    pub remaining_slots: usize,
    /// Input exclusions extended with every pick
    pub exclusions: HashSet<String>,
}

/// Pick at most one collection per category from `pool`.
///
/// Candidates for a category are pool members listed under it and not in
/// `exclusions`. Each pick joins the exclusion set before the next category is
/// considered, so a title listed in two categories is picked at most once.
pub fn pick<R: Rng>(
    config: &CategoryConfig,
    pool: &[Collection],
    mut exclusions: HashSet<String>,
    mut remaining_slots: usize,
    rng: &mut R,
) -> CategoryPick {
    let mut selections = Vec::new();

    for category in &config.categories {
        if remaining_slots == 0 {
            break;
        }

        let listed: HashSet<&str> = category.titles.iter().map(String::as_str).collect();
        let candidates: Vec<&Collection> = pool
            .iter()
            .filter(|c| listed.contains(c.title.as_str()) && !exclusions.contains(&c.title))
            .collect();

        if candidates.is_empty() {
            log::debug!("No eligible collections in category '{}'", category.name);
            continue;
        }

        if !config.always_call && !rng.random_bool(0.5) {
            log::info!("Skipping category '{}' this cycle", category.name);
            continue;
        }

        if let Some(chosen) = candidates.choose(rng) {
            log::info!("Added '{}' from category '{}' to pinning list", chosen.title, category.name);
            exclusions.insert(chosen.title.clone());
            selections.push((*chosen).clone());
            remaining_slots -= 1;
        }
    }

    CategoryPick {
        selections,
        remaining_slots,
        exclusions,
    }
}
