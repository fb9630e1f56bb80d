//! Three-phase selection of the collections to pin for one library.
//!
//! 1. **Special**: active special titles from the eligible pool, in catalog order
//! 2. **Category**: at most one title per configured category
//! 3. **Random**: shuffle whatever is left and fill the remaining budget

use std::collections::HashSet;

use rand::Rng;
use rand::seq::SliceRandom;

use super::category::{self, CategoryConfig};
use super::exclusion::ExclusionPolicy;
use crate::domain::Collection;

/// Working state threaded through the phases.
///
/// Each phase consumes the context and returns the extended one.
#[derive(Debug, Clone)]
pub struct SelectionContext {
    remaining: usize,
    excluded: HashSet<String>,
    selected: Vec<Collection>,
}

impl SelectionContext {
    /// Start a selection with `budget` slots and an initial exclusion set.
    pub fn new(budget: usize, excluded: HashSet<String>) -> Self {
        Self {
            remaining: budget,
            excluded,
            selected: Vec::new(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.remaining
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }

    pub fn is_selected(&self, title: &str) -> bool {
        self.selected.iter().any(|c| c.title == title)
    }

    pub fn selected(&self) -> &[Collection] {
        &self.selected
    }

    fn take(mut self, collection: Collection) -> Self {
        self.excluded.insert(collection.title.clone());
        self.selected.push(collection);
        self.remaining = self.remaining.saturating_sub(1);
        self
    }

    /// Active specials from `pool`, in catalog order, up to the budget.
    ///
    /// Specials skip the recency check unless the policy says otherwise.
    pub fn special_phase(
        self,
        pool: &[Collection],
        active_special: &HashSet<String>,
        policy: &ExclusionPolicy,
    ) -> Self {
        let specials: Vec<Collection> = pool
            .iter()
            .filter(|c| active_special.contains(&c.title))
            .filter(|c| policy.exempt_specials_from_cooldown || !policy.recent.contains(&c.title))
            .cloned()
            .collect();

        let mut ctx = self;
        for collection in specials {
            if ctx.is_exhausted() {
                break;
            }
            if ctx.is_selected(&collection.title) {
                continue;
            }
            log::info!("Added special collection '{}' to pinning list", collection.title);
            ctx = ctx.take(collection);
        }
        ctx
    }

    /// One pick per category from the part of `pool` not yet excluded.
    pub fn category_phase<R: Rng>(self, pool: &[Collection], categories: &CategoryConfig, rng: &mut R) -> Self {
        if self.is_exhausted() || categories.is_empty() {
            return self;
        }

        let Self {
            remaining,
            excluded,
            mut selected,
        } = self;

        let pick = category::pick(categories, pool, excluded, remaining, rng);
        selected.extend(pick.selections);

        Self {
            remaining: pick.remaining_slots,
            excluded: pick.exclusions,
            selected,
        }
    }

    /// Fill the remaining budget from a shuffle of everything not yet excluded.
    pub fn random_phase<R: Rng>(self, pool: &[Collection], rng: &mut R) -> Self {
        if self.is_exhausted() {
            return self;
        }

        let mut candidates: Vec<Collection> = pool
            .iter()
            .filter(|c| !self.excluded.contains(&c.title))
            .cloned()
            .collect();
        candidates.shuffle(rng);

        let take = self.remaining;
        let mut ctx = self;
        for collection in candidates.into_iter().take(take) {
            log::info!("Added random collection '{}' to pinning list", collection.title);
            ctx = ctx.take(collection);
        }
        ctx
    }

    pub fn into_selection(self) -> Vec<Collection> {
        self.selected
    }
}

/// Choose at most `budget` collections from `catalog`.
///
/// The result never repeats a title and never contains a title from the
/// policy's base exclusions, a title below the item minimum or a title
/// matching an exclusion pattern. Output order is specials, then category
/// picks in configuration order, then random picks.
pub fn select<R: Rng>(
    catalog: &[Collection],
    active_special: &HashSet<String>,
    budget: usize,
    categories: &CategoryConfig,
    policy: &ExclusionPolicy,
    rng: &mut R,
) -> Vec<Collection> {
    if budget == 0 || catalog.is_empty() {
        return Vec::new();
    }

    let pool = policy.eligible_pool(catalog);
    if pool.is_empty() {
        log::info!("No eligible collections out of {} in catalog", catalog.len());
        return Vec::new();
    }

    SelectionContext::new(budget, policy.combined())
        .special_phase(&pool, active_special, policy)
        .category_phase(&pool, categories, rng)
        .random_phase(&pool, rng)
        .into_selection()
}
