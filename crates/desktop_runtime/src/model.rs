use std::time::Duration;

use platform_host::InteractionRecord;
use serde::{Deserialize, Serialize};

use crate::{
    apps::{AppCatalog, AppDefinition},
    cache::ContentCache,
    crash::{CrashController, CrashReport},
    generation::GenerationCoordinator,
    history::{HistoryLedger, PathTracker},
    wallpaper::WallpaperCoordinator,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SessionState {
    #[default]
    Normal,
    /// Terminal; no action is processed once entered.
    Crashed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct WallpaperState {
    /// Current background reference (a `data:` URL).
    pub url: Option<String>,
    /// Single-flight flag; true while an image request is outstanding.
    pub generating: bool,
    pub error: Option<String>,
    pub auto_refresh_enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    pub max_history_length: usize,
    pub statefulness_enabled: bool,
    pub wallpaper_refresh: Duration,
    pub unstable_resource_prefix: String,
    pub close_button_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// All engine state for one desktop session.
///
/// Mutated only by [`crate::reducer::reduce_session`].
pub struct DesktopSession {
    pub catalog: AppCatalog,
    pub active_app: Option<AppDefinition>,
    pub history: HistoryLedger,
    pub path: PathTracker,
    pub cache: ContentCache,
    pub generation: GenerationCoordinator,
    pub wallpaper: WallpaperCoordinator,
    pub crash: CrashController,
    pub close_button_id: String,
}

impl DesktopSession {
    pub fn new(catalog: AppCatalog, settings: SessionSettings) -> Self {
        Self {
            catalog,
            active_app: None,
            history: HistoryLedger::new(settings.max_history_length),
            path: PathTracker::default(),
            cache: ContentCache::new(settings.statefulness_enabled),
            generation: GenerationCoordinator::default(),
            wallpaper: WallpaperCoordinator::new(settings.wallpaper_refresh),
            crash: CrashController::new(settings.unstable_resource_prefix),
            close_button_id: settings.close_button_id,
        }
    }

    pub fn is_crashed(&self) -> bool {
        self.crash.is_crashed()
    }

    /// Desktop entry ids that have not been hidden, in catalog order.
    pub fn visible_entry_ids(&self) -> Vec<String> {
        self.catalog
            .entry_ids()
            .filter(|id| !self.crash.is_hidden(id))
            .map(str::to_string)
            .collect()
    }

    pub fn snapshot(&self) -> DesktopSnapshot {
        DesktopSnapshot {
            active_app: self.active_app.as_ref().map(|app| app.id.clone()),
            content: self.generation.content().to_string(),
            loading: self.generation.is_loading(),
            error: self.generation.error().map(str::to_string),
            wallpaper: self.wallpaper.state().clone(),
            session_state: self.crash.state(),
            crashed: self.is_crashed(),
            hidden_entries: self.crash.hidden_entries().iter().cloned().collect(),
            visible_entries: self.visible_entry_ids(),
            quick_launch: self
                .catalog
                .quick_launch_apps()
                .into_iter()
                .map(|app| app.id.clone())
                .collect(),
            crash_report: self.crash.report().cloned(),
            max_history_length: self.history.max_length(),
            statefulness_enabled: self.cache.is_enabled(),
            history: self.history.records().to_vec(),
            path_key: self.path.key().map(|key| key.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Observable state published to the presentation layer after every change.
pub struct DesktopSnapshot {
    pub active_app: Option<String>,
    /// Current content, possibly partial while `loading`.
    pub content: String,
    pub loading: bool,
    pub error: Option<String>,
    pub wallpaper: WallpaperState,
    pub session_state: SessionState,
    pub crashed: bool,
    /// Sorted ids of hidden desktop entries.
    pub hidden_entries: Vec<String>,
    pub visible_entries: Vec<String>,
    /// Taskbar quick-launch app ids, in configured order.
    pub quick_launch: Vec<String>,
    pub crash_report: Option<CrashReport>,
    pub max_history_length: usize,
    pub statefulness_enabled: bool,
    /// Most-recent-first.
    pub history: Vec<InteractionRecord>,
    pub path_key: Option<String>,
}
