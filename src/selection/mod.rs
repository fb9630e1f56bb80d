//! Selection of the collections to pin each cycle.
//!
//! This module provides:
//! - **Exclusions**: the base and recency exclusion sets plus the eligibility
//!   filter (item minimum, title patterns)
//! - **Category picker**: at most one title per configured category, with an
//!   optional coin flip per category
//! - **Engine**: the special → category → random phases threaded through a
//!   [`SelectionContext`]
//!
//! Randomness comes from the caller's RNG so a long-running process keeps one
//! generator for its whole lifetime, and tests can seed it.

pub mod category;
pub mod engine;
pub mod exclusion;

pub use category::{Category, CategoryConfig, CategoryPick, pick};
pub use engine::{SelectionContext, select};
pub use exclusion::{DEFAULT_MIN_ITEMS, ExclusionPolicy, compile_patterns, resolve, with_recent};
