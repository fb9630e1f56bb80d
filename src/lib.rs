//! Collexions - rotating pinned collections
//!
//! Each cycle picks a bounded set of collections per library to promote:
//! calendar-gated specials first, then one title per configured category,
//! then a random fill. A cool-down window over the pin history keeps the same
//! titles from coming back cycle after cycle.

pub mod activation;
pub mod catalog;
pub mod config;
pub mod cycle;
pub mod domain;
pub mod error;
pub mod history;
pub mod pinning;
pub mod runner;
pub mod selection;

pub use error::{CollexionsError, Result};
