//! Session-scoped cache of synthesized content keyed by interaction path.

use std::collections::HashMap;

use crate::history::PathKey;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Path-keyed content store that is only active while statefulness is enabled.
///
/// Entries are never evicted; disabling statefulness drops all of them.
pub struct ContentCache {
    enabled: bool,
    entries: HashMap<PathKey, String>,
}

impl ContentCache {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            entries: HashMap::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Toggles statefulness, clearing every entry when it is turned off.
    ///
    /// Returns whether the flag changed.
    pub fn set_enabled(&mut self, enabled: bool) -> bool {
        if !enabled {
            self.entries.clear();
        }
        let changed = self.enabled != enabled;
        self.enabled = enabled;
        changed
    }

    /// Returns cached content for `key`; always a miss while disabled.
    pub fn get(&self, key: &PathKey) -> Option<&str> {
        if !self.enabled {
            return None;
        }
        self.entries.get(key).map(String::as_str)
    }

    /// Stores `content` for `key`, returning whether anything was written.
    ///
    /// Writes are skipped while disabled and when the stored value is identical.
    pub fn put(&mut self, key: PathKey, content: String) -> bool {
        if !self.enabled {
            return false;
        }
        if self.entries.get(&key) == Some(&content) {
            return false;
        }
        self.entries.insert(key, content);
        true
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
