//! Bounded interaction history and the path key derived from it.

use std::fmt;

use platform_host::InteractionRecord;
use serde::{Deserialize, Serialize};

/// Largest accepted history bound.
pub const MAX_HISTORY_LENGTH_LIMIT: usize = 10;
/// Separator placed between path segments.
pub const PATH_DELIMITER: &str = "__";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Most-recent-first log of interactions, never longer than its bound.
///
/// The one exception is [`HistoryLedger::open`], which always seeds the ledger with the app-open
/// record so a generator sees which app it is rendering.
pub struct HistoryLedger {
    records: Vec<InteractionRecord>,
    max_length: usize,
}

impl HistoryLedger {
    pub fn new(max_length: usize) -> Self {
        Self {
            records: Vec::new(),
            max_length: max_length.min(MAX_HISTORY_LENGTH_LIMIT),
        }
    }

    /// Replaces the ledger with the synthetic record of an app being opened.
    pub fn open(&mut self, record: InteractionRecord) {
        self.records.clear();
        self.records.push(record);
    }

    /// Prepends `record` and drops the oldest entries beyond the bound.
    pub fn append(&mut self, record: InteractionRecord) {
        self.records.insert(0, record);
        self.records.truncate(self.max_length);
    }

    /// Clamps `max_length` to [`MAX_HISTORY_LENGTH_LIMIT`] and truncates immediately.
    pub fn set_max_length(&mut self, max_length: usize) {
        self.max_length = max_length.min(MAX_HISTORY_LENGTH_LIMIT);
        self.records.truncate(self.max_length);
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    pub fn records(&self) -> &[InteractionRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
/// Cache key for an ordered sequence of interaction ids.
///
/// Segments are escaped (`\` becomes `\\`, `_` becomes `\_`) before being joined with
/// [`PATH_DELIMITER`], so two different id sequences never share a key.
pub struct PathKey(String);

impl PathKey {
    pub fn from_segments<S: AsRef<str>>(segments: &[S]) -> Self {
        let escaped: Vec<String> = segments
            .iter()
            .map(|segment| escape_segment(segment.as_ref()))
            .collect();
        Self(escaped.join(PATH_DELIMITER))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PathKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn escape_segment(segment: &str) -> String {
    let mut escaped = String::with_capacity(segment.len());
    for ch in segment.chars() {
        match ch {
            '\\' => escaped.push_str("\\\\"),
            '_' => escaped.push_str("\\_"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Interaction ids accumulated since the active app was opened.
pub struct PathTracker {
    segments: Vec<String>,
}

impl PathTracker {
    /// Starts a fresh path at `first_id`.
    pub fn reset_to(&mut self, first_id: &str) {
        self.segments.clear();
        self.segments.push(first_id.to_string());
    }

    pub fn extend(&mut self, id: &str) {
        self.segments.push(id.to_string());
    }

    pub fn clear(&mut self) {
        self.segments.clear();
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns the key for the current path, or `None` when no path is active.
    pub fn key(&self) -> Option<PathKey> {
        (!self.segments.is_empty()).then(|| PathKey::from_segments(&self.segments))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn click(id: &str) -> InteractionRecord {
        InteractionRecord::click(id, id.to_uppercase())
    }

    fn ids(ledger: &HistoryLedger) -> Vec<&str> {
        ledger.records().iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn append_keeps_most_recent_entries_first() {
        let mut ledger = HistoryLedger::new(3);
        for id in ["a", "b", "c", "d"] {
            ledger.append(click(id));
        }
        assert_eq!(ids(&ledger), vec!["d", "c", "b"]);
    }

    #[test]
    fn lowering_the_bound_truncates_without_restoring_later() {
        let mut ledger = HistoryLedger::new(10);
        for id in ["a", "b", "c", "d", "e"] {
            ledger.append(click(id));
        }

        for n in (0..=MAX_HISTORY_LENGTH_LIMIT).rev() {
            let previous = ledger.len();
            ledger.set_max_length(n);
            assert!(ledger.len() <= n);
            assert_eq!(ledger.len(), n.min(previous));
        }

        ledger.set_max_length(10);
        assert!(ledger.is_empty());
    }

    #[test]
    fn bound_is_clamped_to_the_limit() {
        let mut ledger = HistoryLedger::new(42);
        assert_eq!(ledger.max_length(), MAX_HISTORY_LENGTH_LIMIT);
        ledger.set_max_length(11);
        assert_eq!(ledger.max_length(), MAX_HISTORY_LENGTH_LIMIT);
    }

    #[test]
    fn open_replaces_the_ledger_with_one_record() {
        let mut ledger = HistoryLedger::new(0);
        ledger.append(click("stale"));
        ledger.open(InteractionRecord::app_open("notepad", "Notepad"));
        assert_eq!(ids(&ledger), vec!["notepad"]);
    }

    #[test]
    fn path_key_joins_plain_ids_with_the_delimiter() {
        let mut path = PathTracker::default();
        assert_eq!(path.key(), None);
        path.reset_to("notepad");
        path.extend("save");
        assert_eq!(path.key().expect("key").as_str(), "notepad__save");
    }

    #[test]
    fn path_keys_do_not_collide_when_ids_contain_underscores() {
        let split = PathKey::from_segments(&["a", "b"]);
        let joined = PathKey::from_segments(&["a__b"]);
        let trailing = PathKey::from_segments(&["a_", "_b"]);
        assert_ne!(split, joined);
        assert_ne!(joined, trailing);
        assert_ne!(split, trailing);
        assert_eq!(joined.as_str(), "a\\_\\_b");
    }
}
