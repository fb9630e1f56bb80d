//! Resolution of the raw config into typed engine settings.
//!
//! Nothing here fails: each malformed entry is logged and skipped, and
//! unusable scalar values fall back to their defaults.

use std::collections::{HashMap, HashSet};

use chrono::Duration;
use regex::Regex;
use serde::Deserialize;
use serde_yaml::Value;

use super::Config;
use crate::activation::{MonthDay, SpecialActivation};
use crate::history::{DEFAULT_COOLDOWN_HOURS, DEFAULT_RETENTION_HOURS, hours};
use crate::selection::{Category, CategoryConfig, DEFAULT_MIN_ITEMS, compile_patterns};

/// Key inside a library's category map that holds the coin-flip policy.
const ALWAYS_CALL_KEY: &str = "always_call";

/// Typed settings consumed by the cycle.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub library_names: Vec<String>,
    pub budgets: HashMap<String, usize>,
    pub explicit_exclusions: HashSet<String>,
    pub patterns: Vec<Regex>,
    pub specials: Vec<SpecialActivation>,
    pub categories: HashMap<String, CategoryConfig>,
    pub cooldown: Duration,
    pub retention: Duration,
    pub min_items: u64,
    pub exempt_specials_from_cooldown: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl EngineConfig {
    pub fn from_config(config: &Config) -> Self {
        let cooldown = hours(resolve_cooldown_hours(config.repeat_block_hours.as_ref()));

        let retention = hours(resolve_retention_hours(config.history_retention_hours.as_ref()));

        let categories = config
            .categories
            .iter()
            .map(|(library, raw)| (library.clone(), resolve_categories(library, raw)))
            .collect();

        Self {
            library_names: config.library_names.clone(),
            budgets: resolve_budgets(&config.number_of_collections_to_pin),
            explicit_exclusions: config.exclusion_list.iter().cloned().collect(),
            patterns: compile_patterns(&config.regex_exclusion_patterns),
            specials: resolve_specials(&config.special_collections),
            categories,
            cooldown,
            retention: retention.max(cooldown),
            min_items: resolve_min_items(config.min_items_for_pinning.as_ref()),
            exempt_specials_from_cooldown: config.exempt_specials_from_cooldown,
        }
    }

    /// Pin budget for a library (zero when unconfigured).
    pub fn budget(&self, library: &str) -> usize {
        self.budgets.get(library).copied().unwrap_or(0)
    }

    pub fn categories_for(&self, library: &str) -> Option<&CategoryConfig> {
        self.categories.get(library)
    }
}

#[derive(Debug, Deserialize)]
struct SpecialEntry {
    start_date: String,
    end_date: String,
    collection_names: Vec<String>,
}

/// Parse special-collection entries, skipping any that are malformed.
pub fn resolve_specials(raw: &[Value]) -> Vec<SpecialActivation> {
    let mut activations = Vec::with_capacity(raw.len());

    for (index, value) in raw.iter().enumerate() {
        let entry: SpecialEntry = match serde_yaml::from_value(value.clone()) {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("Skipping special_collections[{}]: {}", index, e);
                continue;
            }
        };

        let (start, end) = match (entry.start_date.parse::<MonthDay>(), entry.end_date.parse::<MonthDay>()) {
            (Ok(start), Ok(end)) => (start, end),
            (Err(e), _) | (_, Err(e)) => {
                log::warn!("Skipping special_collections[{}]: {}", index, e);
                continue;
            }
        };

        if entry.collection_names.is_empty() {
            log::warn!("Skipping special_collections[{}]: no collection_names", index);
            continue;
        }

        activations.push(SpecialActivation::new(start, end, entry.collection_names));
    }

    activations
}

/// Parse one library's category map, preserving configuration order.
///
/// `always_call` defaults to true. Entries that are not lists of titles are
/// skipped, as are non-string titles inside a list.
pub fn resolve_categories(library: &str, raw: &Value) -> CategoryConfig {
    let Some(mapping) = raw.as_mapping() else {
        log::warn!("Categories for library '{}' are not a mapping, ignoring them", library);
        return CategoryConfig::default();
    };

    let mut config = CategoryConfig::default();

    for (key, value) in mapping {
        let Some(name) = key.as_str() else {
            log::warn!("Skipping non-string category name in library '{}': {:?}", library, key);
            continue;
        };

        if name == ALWAYS_CALL_KEY {
            match value.as_bool() {
                Some(flag) => config.always_call = flag,
                None => log::warn!(
                    "Invalid {} for library '{}': {:?}, using true",
                    ALWAYS_CALL_KEY,
                    library,
                    value
                ),
            }
            continue;
        }

        let Some(items) = value.as_sequence() else {
            log::warn!("Skipping category '{}' in library '{}': not a list of titles", name, library);
            continue;
        };

        let titles: Vec<String> = items
            .iter()
            .filter_map(|item| match item.as_str() {
                Some(title) => Some(title.to_string()),
                None => {
                    log::warn!("Skipping non-string title in category '{}': {:?}", name, item);
                    None
                }
            })
            .collect();

        config.categories.push(Category::new(name, titles));
    }

    config
}

/// Cool-down hours from config, defaulting to 12 when absent or unusable.
pub fn resolve_cooldown_hours(raw: Option<&Value>) -> f64 {
    match raw.and_then(Value::as_f64) {
        Some(h) if h.is_finite() && h > 0.0 => h,
        _ => {
            log::warn!(
                "repeat_block_hours is missing or invalid ({:?}), using {}",
                raw,
                DEFAULT_COOLDOWN_HOURS
            );
            DEFAULT_COOLDOWN_HOURS
        }
    }
}

/// History retention hours, defaulting to 168 when unusable.
pub fn resolve_retention_hours(raw: Option<&Value>) -> f64 {
    let Some(raw) = raw else {
        return DEFAULT_RETENTION_HOURS;
    };
    match raw.as_f64() {
        Some(h) if h.is_finite() && h > 0.0 => h,
        _ => {
            log::warn!(
                "Invalid history_retention_hours {:?}, using {}",
                raw,
                DEFAULT_RETENTION_HOURS
            );
            DEFAULT_RETENTION_HOURS
        }
    }
}

/// Minimum item count, defaulting to 10 when absent or not a non-negative integer.
pub fn resolve_min_items(raw: Option<&Value>) -> u64 {
    let Some(raw) = raw else {
        return DEFAULT_MIN_ITEMS;
    };
    raw.as_u64().unwrap_or_else(|| {
        log::warn!("Invalid min_items_for_pinning {:?}, using {}", raw, DEFAULT_MIN_ITEMS);
        DEFAULT_MIN_ITEMS
    })
}

/// Per-library pin budgets. Entries that are not non-negative integers are
/// skipped, which leaves that library with a budget of zero.
pub fn resolve_budgets(raw: &HashMap<String, Value>) -> HashMap<String, usize> {
    raw.iter()
        .filter_map(|(library, value)| {
            match value.as_u64().and_then(|n| usize::try_from(n).ok()) {
                Some(budget) => Some((library.clone(), budget)),
                None => {
                    log::warn!(
                        "Skipping number_of_collections_to_pin for '{}': {:?} is not a count",
                        library,
                        value
                    );
                    None
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yaml(s: &str) -> Value {
        serde_yaml::from_str(s).unwrap()
    }

    #[test]
    fn test_resolve_specials_skips_malformed() {
        let raw = yaml(
            r#"
- {start_date: "12-20", end_date: "01-05", collection_names: [Christmas]}
- {start_date: "13-01", end_date: "01-05", collection_names: [Bad Month]}
- {start_date: "10-01", collection_names: [Missing End]}
- {start_date: "10-01", end_date: "10-31", collection_names: []}
- "not a mapping"
"#,
        );
        let specials = resolve_specials(raw.as_sequence().unwrap());
        assert_eq!(specials.len(), 1);
        assert_eq!(specials[0].titles, vec!["Christmas"]);
        assert!(specials[0].wraps_year());
    }

    #[test]
    fn test_resolve_categories_preserves_order() {
        let raw = yaml(
            r#"
Zombies: [Walking Dead]
always_call: false
Heroes: [Marvel, DC]
Animated: [Pixar]
"#,
        );
        let config = resolve_categories("Movies", &raw);
        assert!(!config.always_call);
        let names: Vec<&str> = config.categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Zombies", "Heroes", "Animated"]);
        assert_eq!(config.categories[1].titles, vec!["Marvel", "DC"]);
    }

    #[test]
    fn test_resolve_categories_skips_bad_entries() {
        let raw = yaml(
            r#"
always_call: "sometimes"
Broken: Marvel
Mixed: [Pixar, 42, DreamWorks]
"#,
        );
        let config = resolve_categories("Movies", &raw);
        assert!(config.always_call);
        assert_eq!(config.categories.len(), 1);
        assert_eq!(config.categories[0].titles, vec!["Pixar", "DreamWorks"]);
    }

    #[test]
    fn test_resolve_categories_not_mapping() {
        let config = resolve_categories("Movies", &yaml("[Marvel]"));
        assert_eq!(config, CategoryConfig::default());
    }

    #[test]
    fn test_resolve_cooldown_hours() {
        assert_eq!(resolve_cooldown_hours(Some(&yaml("6"))), 6.0);
        assert_eq!(resolve_cooldown_hours(Some(&yaml("1.5"))), 1.5);
        assert_eq!(resolve_cooldown_hours(Some(&yaml("0"))), 12.0);
        assert_eq!(resolve_cooldown_hours(Some(&yaml("-3"))), 12.0);
        assert_eq!(resolve_cooldown_hours(Some(&yaml("soon"))), 12.0);
        assert_eq!(resolve_cooldown_hours(None), 12.0);
    }

    #[test]
    fn test_engine_config_from_config() {
        let config = Config::parse(
            r#"
library_names: [Movies, TV Shows]
number_of_collections_to_pin: {Movies: 3}
exclusion_list: [Trending]
regex_exclusion_patterns: ["^collection of", "(broken"]
special_collections:
  - {start_date: "10-01", end_date: "10-31", collection_names: [Halloween]}
categories:
  Movies: {Heroes: [Marvel]}
repeat_block_hours: 24
history_retention_hours: 2
min_items_for_pinning: 5
exempt_specials_from_cooldown: false
"#,
        )
        .unwrap();
        let engine = config.resolve();

        assert_eq!(engine.budget("Movies"), 3);
        assert_eq!(engine.budget("TV Shows"), 0);
        assert!(engine.explicit_exclusions.contains("Trending"));
        assert_eq!(engine.patterns.len(), 1);
        assert_eq!(engine.specials.len(), 1);
        assert_eq!(engine.categories_for("Movies").unwrap().categories.len(), 1);
        assert!(engine.categories_for("TV Shows").is_none());
        assert_eq!(engine.cooldown, Duration::hours(24));
        // retention never shorter than the cool-down
        assert_eq!(engine.retention, Duration::hours(24));
        assert_eq!(engine.min_items, 5);
        assert!(!engine.exempt_specials_from_cooldown);
    }

    #[test]
    fn test_resolve_budgets_skips_bad_entries() {
        let raw: HashMap<String, Value> = serde_yaml::from_str("{Movies: 3, TV Shows: -1, Anime: many}").unwrap();
        let budgets = resolve_budgets(&raw);
        assert_eq!(budgets, HashMap::from([("Movies".to_string(), 3)]));
    }

    #[test]
    fn test_resolve_min_items_and_retention() {
        assert_eq!(resolve_min_items(None), 10);
        assert_eq!(resolve_min_items(Some(&yaml("3"))), 3);
        assert_eq!(resolve_min_items(Some(&yaml("-2"))), 10);
        assert_eq!(resolve_min_items(Some(&yaml("plenty"))), 10);
        assert_eq!(resolve_retention_hours(None), 168.0);
        assert_eq!(resolve_retention_hours(Some(&yaml("48"))), 48.0);
        assert_eq!(resolve_retention_hours(Some(&yaml("0"))), 168.0);
        assert_eq!(resolve_retention_hours(Some(&yaml("[1, 2]"))), 168.0);
    }

    #[test]
    fn test_one_bad_budget_keeps_rest_of_config() {
        let engine = Config::parse(
            r#"
number_of_collections_to_pin: {Movies: 3, TV Shows: -1}
exclusion_list: [Trending]
min_items_for_pinning: lots
"#,
        )
        .unwrap()
        .resolve();
        assert_eq!(engine.budget("Movies"), 3);
        assert_eq!(engine.budget("TV Shows"), 0);
        assert!(engine.explicit_exclusions.contains("Trending"));
        assert_eq!(engine.min_items, 10);
    }

    #[test]
    fn test_engine_config_default() {
        let engine = EngineConfig::default();
        assert_eq!(engine.cooldown, Duration::hours(12));
        assert_eq!(engine.retention, Duration::hours(168));
        assert_eq!(engine.min_items, 10);
        assert!(engine.exempt_specials_from_cooldown);
    }
}
