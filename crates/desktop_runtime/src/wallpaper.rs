//! Wallpaper generation coordination: single-flight guard, time-of-day prompts, and payload
//! decoding.

use std::time::Duration;

use base64::Engine as _;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::WallpaperState;

/// Period between automatic wallpaper refreshes.
pub const DEFAULT_WALLPAPER_REFRESH: Duration = Duration::from_secs(300);
/// User-visible message for a failed wallpaper generation.
pub const WALLPAPER_FAILURE_MESSAGE: &str = "Failed to generate wallpaper. Please try again.";

const DATA_URL_PREFIX: &str = "data:image/png;base64,";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WallpaperRequestId(pub u64);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WallpaperError {
    /// The image service reported an error.
    #[error("image generation failed: {0}")]
    Failed(String),
    /// The image service returned something that is not base64.
    #[error("image payload is not valid base64: {0}")]
    InvalidPayload(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// How a finished wallpaper request affected state.
pub enum WallpaperOutcome {
    /// A new background was published.
    Applied,
    /// The request failed; the previous background was kept.
    Failed(WallpaperError),
    /// The request no longer owned the single-flight slot.
    Stale,
}

/// Mood phrase for the local-clock `hour`.
pub fn mood_for_hour(hour: u32) -> &'static str {
    match hour {
        0..=4 => "deep night sky",
        5..=11 => "crisp morning sunrise",
        12..=16 => "bright afternoon",
        17..=20 => "warm evening sunset",
        _ => "starry night",
    }
}

/// Default wallpaper prompt for the local-clock `hour`.
pub fn prompt_for_hour(hour: u32) -> String {
    format!(
        "A beautiful, serene desktop wallpaper of a landscape, capturing the mood of a peaceful {}. Digital art.",
        mood_for_hour(hour)
    )
}

/// Builds the background reference for a base64 PNG payload.
///
/// # Errors
///
/// Returns [`WallpaperError::InvalidPayload`] when `payload` does not decode as base64.
pub fn wallpaper_data_url(payload: &str) -> Result<String, WallpaperError> {
    let payload = payload.trim();
    base64::engine::general_purpose::STANDARD
        .decode(payload)
        .map_err(|err| WallpaperError::InvalidPayload(err.to_string()))?;
    Ok(format!("{DATA_URL_PREFIX}{payload}"))
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Owner of [`WallpaperState`]; `generating` doubles as the single-flight slot.
pub struct WallpaperCoordinator {
    state: WallpaperState,
    refresh_period: Duration,
    last_request: u64,
    in_flight: Option<WallpaperRequestId>,
}

impl Default for WallpaperCoordinator {
    fn default() -> Self {
        Self::new(DEFAULT_WALLPAPER_REFRESH)
    }
}

impl WallpaperCoordinator {
    pub fn new(refresh_period: Duration) -> Self {
        Self {
            state: WallpaperState::default(),
            refresh_period,
            last_request: 0,
            in_flight: None,
        }
    }

    /// Claims the single-flight slot, or returns `None` while another request is outstanding.
    pub fn try_begin(&mut self) -> Option<WallpaperRequestId> {
        if self.state.generating {
            return None;
        }
        self.last_request += 1;
        let id = WallpaperRequestId(self.last_request);
        self.in_flight = Some(id);
        self.state.generating = true;
        self.state.error = None;
        Some(id)
    }

    /// Applies the image service result for request `id` and releases the slot.
    pub fn finish(
        &mut self,
        id: WallpaperRequestId,
        result: Result<String, String>,
    ) -> WallpaperOutcome {
        if self.in_flight != Some(id) {
            return WallpaperOutcome::Stale;
        }
        self.release();
        match result
            .map_err(WallpaperError::Failed)
            .and_then(|payload| wallpaper_data_url(&payload))
        {
            Ok(url) => {
                self.state.url = Some(url);
                WallpaperOutcome::Applied
            }
            Err(err) => {
                self.state.error = Some(WALLPAPER_FAILURE_MESSAGE.to_string());
                WallpaperOutcome::Failed(err)
            }
        }
    }

    /// Releases the slot for a request whose task ended without a result.
    pub fn abandon(&mut self, id: WallpaperRequestId) -> bool {
        if self.in_flight != Some(id) {
            return false;
        }
        self.release();
        true
    }

    /// Records the auto-refresh flag, returning whether it changed.
    pub fn set_auto_refresh(&mut self, enabled: bool) -> bool {
        let changed = self.state.auto_refresh_enabled != enabled;
        self.state.auto_refresh_enabled = enabled;
        changed
    }

    pub fn refresh_period(&self) -> Duration {
        self.refresh_period
    }

    pub fn in_flight(&self) -> Option<WallpaperRequestId> {
        self.in_flight
    }

    pub fn state(&self) -> &WallpaperState {
        &self.state
    }

    fn release(&mut self) {
        self.in_flight = None;
        self.state.generating = false;
    }
}
