//! Calendar windows for special collections.
//!
//! A special activation names a recurring `MM-DD` to `MM-DD` range. Both ends
//! are inclusive. When the start falls after the end in the calendar year the
//! window wraps over New Year, e.g. `12-20` to `01-05`.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};

use crate::error::{CollexionsError, Result};

/// A month/day pair with no year attached.
///
/// Ordering is calendar order within a year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthDay {
    month: u32,
    day: u32,
}

impl MonthDay {
    /// Create a month/day, rejecting days that exist in no year.
    pub fn new(month: u32, day: u32) -> Option<Self> {
        // 2000 is a leap year, so 02-29 is accepted
        NaiveDate::from_ymd_opt(2000, month, day).map(|_| Self { month, day })
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    /// Bind to a concrete year.
    ///
    /// 02-29 resolves to 02-28 in non-leap years. Returns `None` only when the
    /// year is outside chrono's range.
    pub fn on_year(&self, year: i32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(year, self.month, self.day).or_else(|| NaiveDate::from_ymd_opt(year, self.month, 28))
    }
}

impl FromStr for MonthDay {
    type Err = CollexionsError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || CollexionsError::Config(format!("invalid month-day '{}', expected MM-DD", s));
        let (month, day) = s.trim().split_once('-').ok_or_else(invalid)?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        let day: u32 = day.parse().map_err(|_| invalid())?;
        Self::new(month, day).ok_or_else(invalid)
    }
}

impl fmt::Display for MonthDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}-{:02}", self.month, self.day)
    }
}

/// A calendar-bounded rule that makes a set of titles eligible for pinning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecialActivation {
    pub start: MonthDay,
    pub end: MonthDay,
    pub titles: Vec<String>,
}

impl SpecialActivation {
    pub fn new(start: MonthDay, end: MonthDay, titles: Vec<String>) -> Self {
        Self { start, end, titles }
    }

    /// Whether the window wraps over New Year.
    pub fn wraps_year(&self) -> bool {
        self.start > self.end
    }
}

/// Whether an activation covers `today`.
pub fn is_active(activation: &SpecialActivation, today: NaiveDate) -> bool {
    let year = today.year();
    let (Some(start), Some(end)) = (activation.start.on_year(year), activation.end.on_year(year)) else {
        return false;
    };

    if activation.wraps_year() {
        // [start, Dec-31] of this year or [Jan-1, end] of the next one
        today >= start || today <= end
    } else {
        start <= today && today <= end
    }
}

/// Titles of every activation covering `today`.
pub fn active_titles(activations: &[SpecialActivation], today: NaiveDate) -> HashSet<String> {
    activations
        .iter()
        .filter(|a| is_active(a, today))
        .flat_map(|a| a.titles.iter().cloned())
        .collect()
}

/// Titles named by any activation, active or not.
pub fn all_titles(activations: &[SpecialActivation]) -> HashSet<String> {
    activations.iter().flat_map(|a| a.titles.iter().cloned()).collect()
}
