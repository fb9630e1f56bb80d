//! Exclusion sets and the eligibility filter.
//!
//! Two sets are in play each cycle:
//! - the **base** set (explicit exclusions plus inactive specials) applies to
//!   every candidate in every phase
//! - the **recent** set (non-special titles pinned within the cool-down) is
//!   added on top for the category and random phases

use std::collections::HashSet;

use regex::{Regex, RegexBuilder};

use crate::domain::Collection;

/// Default minimum item count for a collection to be pinnable.
pub const DEFAULT_MIN_ITEMS: u64 = 10;

/// `explicit ∪ (all_special − active_special)`
pub fn resolve(
    explicit: &HashSet<String>,
    all_special: &HashSet<String>,
    active_special: &HashSet<String>,
) -> HashSet<String> {
    explicit
        .iter()
        .chain(all_special.difference(active_special))
        .cloned()
        .collect()
}

/// Base exclusions plus the recently pinned titles.
pub fn with_recent(base: &HashSet<String>, recent: &HashSet<String>) -> HashSet<String> {
    base.union(recent).cloned().collect()
}

/// Compile title exclusion patterns case-insensitively.
///
/// Patterns that fail to compile are skipped with a warning.
pub fn compile_patterns(patterns: &[String]) -> Vec<Regex> {
    patterns
        .iter()
        .filter_map(|p| match RegexBuilder::new(p).case_insensitive(true).build() {
            Ok(re) => Some(re),
            Err(e) => {
                log::warn!("Ignoring invalid regex exclusion pattern '{}': {}", p, e);
                None
            }
        })
        .collect()
}

/// Everything that decides whether a candidate may be pinned this cycle.
#[derive(Debug, Clone)]
pub struct ExclusionPolicy {
    /// Collections with fewer items are never pinned.
    pub min_items: u64,
    /// Titles matching any pattern are never pinned.
    pub patterns: Vec<Regex>,
    /// Explicit exclusions plus inactive specials.
    pub base: HashSet<String>,
    /// Non-special titles pinned within the cool-down.
    pub recent: HashSet<String>,
    /// When false, active specials are also subject to the cool-down.
    pub exempt_specials_from_cooldown: bool,
}

impl Default for ExclusionPolicy {
    fn default() -> Self {
        Self {
            min_items: DEFAULT_MIN_ITEMS,
            patterns: Vec::new(),
            base: HashSet::new(),
            recent: HashSet::new(),
            exempt_specials_from_cooldown: true,
        }
    }
}

impl ExclusionPolicy {
    pub fn with_min_items(mut self, min_items: u64) -> Self {
        self.min_items = min_items;
        self
    }

    pub fn with_patterns(mut self, patterns: Vec<Regex>) -> Self {
        self.patterns = patterns;
        self
    }

    pub fn with_base(mut self, base: HashSet<String>) -> Self {
        self.base = base;
        self
    }

    pub fn with_recent(mut self, recent: HashSet<String>) -> Self {
        self.recent = recent;
        self
    }

    pub fn with_specials_exempt(mut self, exempt: bool) -> Self {
        self.exempt_specials_from_cooldown = exempt;
        self
    }

    /// Base plus recent, the set the category and random phases use.
    pub fn combined(&self) -> HashSet<String> {
        with_recent(&self.base, &self.recent)
    }

    /// Pattern matching `title`, if any.
    pub fn matching_pattern(&self, title: &str) -> Option<&Regex> {
        self.patterns.iter().find(|re| re.is_match(title))
    }

    /// Item-count, regex and base-exclusion check.
    pub fn is_eligible(&self, collection: &Collection) -> bool {
        if collection.item_count < self.min_items {
            log::debug!(
                "Excluded '{}': {} items is below the minimum of {}",
                collection.title,
                collection.item_count,
                self.min_items
            );
            return false;
        }
        if let Some(re) = self.matching_pattern(&collection.title) {
            log::info!("Excluded by regex: '{}' matched pattern '{}'", collection.title, re.as_str());
            return false;
        }
        !self.base.contains(&collection.title)
    }

    /// Candidates passing [`Self::is_eligible`], in catalog order.
    pub fn eligible_pool(&self, catalog: &[Collection]) -> Vec<Collection> {
        catalog.iter().filter(|c| self.is_eligible(c)).cloned().collect()
    }
}
