//! One-way crash transition triggered by unstable-resource interactions.

use std::collections::BTreeSet;

use platform_host::InteractionRecord;
use rand::{seq::SliceRandom, Rng};
use serde::{Deserialize, Serialize};

use crate::model::SessionState;

/// Interaction id prefix that crashes the session.
pub const DEFAULT_UNSTABLE_RESOURCE_PREFIX: &str = "access_unstable_file";
/// Stop code reported by the crash screen.
pub const CRASH_STOP_CODE: &str = "UNSTABLE_MEMORY_CORRUPTION";

const MIN_HIDDEN_ENTRIES: usize = 2;
const MAX_HIDDEN_ENTRIES: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrashReport {
    pub stop_code: String,
    /// Desktop entries hidden by the crash, in selection order.
    pub hidden_entry_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Holds [`SessionState`]; once crashed it never returns to normal.
pub struct CrashController {
    trigger_prefix: String,
    state: SessionState,
    hidden: BTreeSet<String>,
    report: Option<CrashReport>,
}

impl Default for CrashController {
    fn default() -> Self {
        Self::new(DEFAULT_UNSTABLE_RESOURCE_PREFIX)
    }
}

impl CrashController {
    pub fn new(trigger_prefix: impl Into<String>) -> Self {
        Self {
            trigger_prefix: trigger_prefix.into(),
            state: SessionState::Normal,
            hidden: BTreeSet::new(),
            report: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_crashed(&self) -> bool {
        self.state == SessionState::Crashed
    }

    /// Returns whether `record` targets an unstable resource.
    pub fn is_trigger(&self, record: &InteractionRecord) -> bool {
        !self.trigger_prefix.is_empty() && record.id.starts_with(&self.trigger_prefix)
    }

    /// Hides a random 2..=5 subset of `visible_entries` (capped at their count) and enters
    /// [`SessionState::Crashed`].
    ///
    /// Returns `None` when the session had already crashed; nothing changes in that case.
    pub fn crash<R: Rng + ?Sized>(
        &mut self,
        visible_entries: &[String],
        rng: &mut R,
    ) -> Option<&CrashReport> {
        if self.is_crashed() {
            return None;
        }
        let wanted = rng.gen_range(MIN_HIDDEN_ENTRIES..=MAX_HIDDEN_ENTRIES);
        let count = wanted.min(visible_entries.len());
        let hidden_entry_ids: Vec<String> = visible_entries
            .choose_multiple(rng, count)
            .cloned()
            .collect();

        self.hidden.extend(hidden_entry_ids.iter().cloned());
        self.state = SessionState::Crashed;
        self.report = Some(CrashReport {
            stop_code: CRASH_STOP_CODE.to_string(),
            hidden_entry_ids,
        });
        self.report.as_ref()
    }

    pub fn hidden_entries(&self) -> &BTreeSet<String> {
        &self.hidden
    }

    pub fn is_hidden(&self, entry_id: &str) -> bool {
        self.hidden.contains(entry_id)
    }

    pub fn report(&self) -> Option<&CrashReport> {
        self.report.as_ref()
    }
}
