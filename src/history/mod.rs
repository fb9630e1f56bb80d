//! Pin history: which non-special titles were pinned, and when.
//!
//! History is a JSON object mapping a local timestamp to the titles pinned in
//! that cycle:
//!
//! ```json
//! {
//!   "2025-01-01 08:00:00": ["Marvel", "Pixar"],
//!   "2025-01-01": ["legacy date-only key"]
//! }
//! ```
//!
//! This module holds the pure record operations (decode, encode, prune,
//! cool-down lookup). [`HistoryStore`] adds the file-backed persistence.

mod store;

use std::collections::{BTreeMap, HashSet};

use chrono::{Duration, NaiveDate, NaiveDateTime};

pub use store::HistoryStore;

/// Timestamp format used for history keys.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Date-only format written by older versions.
pub const LEGACY_DATE_FORMAT: &str = "%Y-%m-%d";

/// Cool-down applied when config does not give a usable value.
pub const DEFAULT_COOLDOWN_HOURS: f64 = 12.0;

/// How long records are kept on disk by default.
pub const DEFAULT_RETENTION_HOURS: f64 = 168.0;

/// Titles pinned during one cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRecord {
    pub timestamp: NaiveDateTime,
    pub titles: Vec<String>,
}

impl HistoryRecord {
    pub fn new(timestamp: NaiveDateTime, titles: Vec<String>) -> Self {
        Self { timestamp, titles }
    }
}

/// Convert fractional hours to a chrono duration, saturating at the largest
/// representable span.
pub fn hours(h: f64) -> Duration {
    Duration::try_milliseconds((h * 3_600_000.0) as i64).unwrap_or(Duration::MAX)
}

/// `now - window`, or the earliest representable time if that underflows.
pub fn cutoff(now: NaiveDateTime, window: Duration) -> NaiveDateTime {
    now.checked_sub_signed(window).unwrap_or(NaiveDateTime::MIN)
}

/// Parse a history key, accepting legacy date-only keys as midnight.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT) {
        return Some(dt);
    }
    NaiveDate::parse_from_str(s, LEGACY_DATE_FORMAT)
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

pub fn format_timestamp(timestamp: &NaiveDateTime) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}

/// Decode the persisted JSON form.
///
/// Entries with an unparseable key or a value that is not a list of strings
/// are dropped and logged. Returns the surviving records ordered by
/// timestamp, plus how many entries were dropped.
pub fn decode(value: serde_json::Value) -> (Vec<HistoryRecord>, usize) {
    let serde_json::Value::Object(map) = value else {
        log::warn!("Pin history is not a JSON object, ignoring its contents");
        return (Vec::new(), 1);
    };

    let mut records = Vec::with_capacity(map.len());
    let mut dropped = 0;

    for (key, titles) in map {
        let Some(timestamp) = parse_timestamp(&key) else {
            log::warn!("Unrecognized date format in pin history: {}", key);
            dropped += 1;
            continue;
        };
        let Some(titles) = string_list(&titles) else {
            log::warn!("Pin history entry {} is not a list of titles, dropping it", key);
            dropped += 1;
            continue;
        };
        records.push(HistoryRecord::new(timestamp, titles));
    }

    records.sort_by_key(|r| r.timestamp);
    (records, dropped)
}

fn string_list(value: &serde_json::Value) -> Option<Vec<String>> {
    value
        .as_array()?
        .iter()
        .map(|v| v.as_str().map(str::to_string))
        .collect()
}

/// Encode records into the persisted JSON form.
///
/// Records that share a timestamp are merged, keeping title order.
pub fn encode(records: &[HistoryRecord]) -> serde_json::Value {
    let mut merged: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for record in records {
        let titles = merged.entry(format_timestamp(&record.timestamp)).or_default();
        for title in &record.titles {
            if !titles.contains(title) {
                titles.push(title.clone());
            }
        }
    }

    serde_json::Value::Object(
        merged
            .into_iter()
            .map(|(k, v)| (k, serde_json::Value::from(v)))
            .collect(),
    )
}

/// Union of titles pinned at or after `now - cooldown`.
pub fn recently_pinned(records: &[HistoryRecord], cooldown: Duration, now: NaiveDateTime) -> HashSet<String> {
    let since = cutoff(now, cooldown);
    records
        .iter()
        .filter(|r| r.timestamp >= since)
        .flat_map(|r| r.titles.iter().cloned())
        .collect()
}

/// Drop records older than `now - retention`.
pub fn prune(records: Vec<HistoryRecord>, retention: Duration, now: NaiveDateTime) -> Vec<HistoryRecord> {
    let since = cutoff(now, retention);
    records.into_iter().filter(|r| r.timestamp >= since).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ts(s: &str) -> NaiveDateTime {
        parse_timestamp(s).unwrap()
    }

    fn titles(t: &[&str]) -> Vec<String> {
        t.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_timestamp_full() {
        let dt = ts("2025-03-04 05:06:07");
        assert_eq!(format_timestamp(&dt), "2025-03-04 05:06:07");
    }

    #[test]
    fn test_parse_timestamp_legacy_date() {
        let dt = ts("2025-03-04");
        assert_eq!(format_timestamp(&dt), "2025-03-04 00:00:00");
    }

    #[test]
    fn test_parse_timestamp_invalid() {
        assert!(parse_timestamp("yesterday").is_none());
        assert!(parse_timestamp("2025-13-01").is_none());
    }

    #[test]
    fn test_hours_fractional() {
        assert_eq!(hours(12.0), Duration::hours(12));
        assert_eq!(hours(1.5), Duration::minutes(90));
    }

    #[test]
    fn test_hours_saturates() {
        assert_eq!(hours(1e300), Duration::MAX);
        assert!(hours(1e12) > Duration::days(365 * 1000));
    }

    #[test]
    fn test_huge_window_keeps_everything() {
        let now = ts("2025-06-01 12:00:00");
        let records = vec![
            HistoryRecord::new(ts("1970-01-01 00:00:00"), titles(&["Ancient"])),
            HistoryRecord::new(ts("2025-06-01 11:00:00"), titles(&["Recent"])),
        ];
        assert_eq!(cutoff(now, Duration::MAX), NaiveDateTime::MIN);
        assert_eq!(recently_pinned(&records, hours(1e12), now).len(), 2);
        assert_eq!(prune(records, Duration::MAX, now).len(), 2);
    }

    #[test]
    fn test_decode_drops_malformed_entries() {
        let value = json!({
            "2025-01-01 08:00:00": ["Marvel", "Pixar"],
            "2025-01-01": ["Bond"],
            "not a date": ["Alien"],
            "2025-01-02 08:00:00": "Marvel",
            "2025-01-03 08:00:00": ["ok", 5],
        });
        let (records, dropped) = decode(value);
        assert_eq!(dropped, 3);
        assert_eq!(records.len(), 2);
        // ordered by timestamp: legacy midnight key first
        assert_eq!(records[0].titles, titles(&["Bond"]));
        assert_eq!(records[1].titles, titles(&["Marvel", "Pixar"]));
    }

    #[test]
    fn test_decode_non_object() {
        let (records, dropped) = decode(json!(["Marvel"]));
        assert!(records.is_empty());
        assert_eq!(dropped, 1);
    }

    #[test]
    fn test_encode_merges_same_timestamp() {
        let t = ts("2025-01-01 08:00:00");
        let records = vec![
            HistoryRecord::new(t, titles(&["Marvel"])),
            HistoryRecord::new(t, titles(&["Pixar", "Marvel"])),
        ];
        assert_eq!(encode(&records), json!({"2025-01-01 08:00:00": ["Marvel", "Pixar"]}));
    }

    #[test]
    fn test_recently_pinned_window() {
        let now = ts("2025-01-02 12:00:00");
        let records = vec![
            HistoryRecord::new(ts("2025-01-02 11:00:00"), titles(&["Recent"])),
            HistoryRecord::new(ts("2025-01-02 00:00:00"), titles(&["Boundary"])),
            HistoryRecord::new(ts("2025-01-01 23:59:59"), titles(&["Expired"])),
        ];
        let recent = recently_pinned(&records, Duration::hours(12), now);
        assert!(recent.contains("Recent"));
        assert!(recent.contains("Boundary"));
        assert!(!recent.contains("Expired"));
    }

    #[test]
    fn test_recently_pinned_boundary_is_monotonic() {
        let now = ts("2025-06-01 12:00:00");
        let cooldown = Duration::hours(12);
        let at_edge = vec![HistoryRecord::new(now - cooldown, titles(&["A"]))];
        let past_edge = vec![HistoryRecord::new(now - cooldown - Duration::seconds(1), titles(&["A"]))];
        assert!(recently_pinned(&at_edge, cooldown, now).contains("A"));
        assert!(recently_pinned(&past_edge, cooldown, now).is_empty());
    }

    #[test]
    fn test_prune() {
        let now = ts("2025-01-10 00:00:00");
        let records = vec![
            HistoryRecord::new(ts("2025-01-01 00:00:00"), titles(&["Old"])),
            HistoryRecord::new(ts("2025-01-09 12:00:00"), titles(&["New"])),
        ];
        let kept = prune(records, Duration::hours(24), now);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].titles, titles(&["New"]));
    }
}
