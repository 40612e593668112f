//! Reducer actions, side-effect intents, and transition logic for the desktop session.

use std::time::Duration;

use platform_host::{InteractionKind, InteractionRecord};
use rand::RngCore;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    generation::{GenerationError, GenerationId, GenerationRequest},
    history::MAX_HISTORY_LENGTH_LIMIT,
    model::DesktopSession,
    wallpaper::{WallpaperOutcome, WallpaperRequestId},
};

#[derive(Debug, Clone, PartialEq, Eq)]
/// Actions accepted by [`reduce_session`] to mutate [`DesktopSession`].
pub enum SessionAction {
    /// Open an app from the catalog, replacing the active one.
    OpenApp {
        /// Catalog id of the app.
        app_id: String,
    },
    /// Forward a user interaction into the engine.
    SubmitInteraction(InteractionRecord),
    /// Close the active app and clear its history and path.
    CloseApp,
    /// Change the history bound (`0..=10`).
    SetMaxHistoryLength {
        /// New bound.
        length: usize,
    },
    /// Toggle caching of generated content by path.
    SetStatefulness {
        /// Whether statefulness is enabled.
        enabled: bool,
    },
    /// Request a wallpaper for an already-resolved prompt.
    RequestWallpaper {
        /// Prompt sent to the image capability.
        prompt: String,
    },
    /// Toggle the periodic wallpaper refresh.
    SetAutoWallpaper {
        /// Whether the refresh schedule should run.
        enabled: bool,
    },
    /// A streamed fragment arrived for a generation.
    ContentFragment {
        /// Generation that produced the fragment.
        generation_id: GenerationId,
        /// Raw fragment text.
        fragment: String,
    },
    /// The content stream closed without error.
    GenerationCompleted {
        /// Generation that completed.
        generation_id: GenerationId,
    },
    /// The content stream reported an error.
    GenerationFailed {
        /// Generation that failed.
        generation_id: GenerationId,
        /// Capability-provided failure detail.
        message: String,
    },
    /// The stream task ended without a terminal event.
    GenerationAbandoned {
        /// Generation whose task was dropped.
        generation_id: GenerationId,
    },
    /// The image capability answered a wallpaper request.
    WallpaperGenerated {
        /// Request that finished.
        request_id: WallpaperRequestId,
        /// Base64 payload or failure detail.
        result: Result<String, String>,
    },
    /// The wallpaper task ended without an answer.
    WallpaperAbandoned {
        /// Request whose task was dropped.
        request_id: WallpaperRequestId,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Side-effect intents emitted by [`reduce_session`] for the runtime to execute.
pub enum RuntimeEffect {
    /// Stream content for a new generation.
    StreamContent(GenerationRequest),
    /// Ask the image capability for a wallpaper.
    GenerateWallpaper {
        /// Request id owning the single-flight slot.
        request_id: WallpaperRequestId,
        /// Prompt to send.
        prompt: String,
    },
    /// Install (or replace) the periodic wallpaper schedule.
    StartWallpaperRefresh {
        /// Refresh period.
        period: Duration,
    },
    /// Cancel the periodic wallpaper schedule.
    StopWallpaperRefresh,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
/// Reducer errors for actions the session rejects outright.
pub enum ReducerError {
    /// Requested history bound is above [`MAX_HISTORY_LENGTH_LIMIT`].
    #[error("max history length {requested} is outside 0..={max}")]
    InvalidHistoryLength {
        /// Rejected value.
        requested: usize,
        /// Largest accepted value.
        max: usize,
    },
    /// The app id is not in the catalog.
    #[error("unknown app `{app_id}`")]
    UnknownApp {
        /// Rejected id.
        app_id: String,
    },
}

/// Applies a [`SessionAction`] to the session and collects resulting side effects.
///
/// History, path, and cache updates happen here synchronously, before any effect for the same
/// action is returned. Once the session has crashed every action is ignored.
///
/// # Errors
///
/// Returns [`ReducerError::UnknownApp`] for an id missing from the catalog and
/// [`ReducerError::InvalidHistoryLength`] for a bound above the limit; state is left unchanged.
pub fn reduce_session(
    session: &mut DesktopSession,
    action: SessionAction,
    rng: &mut dyn RngCore,
) -> Result<Vec<RuntimeEffect>, ReducerError> {
    let mut effects = Vec::new();
    if session.is_crashed() {
        debug!(?action, "session crashed; ignoring action");
        return Ok(effects);
    }

    match action {
        SessionAction::OpenApp { app_id } => {
            let app = session
                .catalog
                .get(&app_id)
                .cloned()
                .ok_or(ReducerError::UnknownApp { app_id })?;
            session
                .history
                .open(InteractionRecord::app_open(app.id.clone(), app.name.clone()));
            session.path.reset_to(&app.id);
            session.active_app = Some(app);
            request_content(session, &mut effects);
        }
        SessionAction::SubmitInteraction(record) => {
            if is_close_interaction(session, &record) {
                close_active_app(session);
            } else if session.crash.is_trigger(&record) {
                crash_session(session, &record, rng, &mut effects);
            } else {
                if session.active_app.is_some() {
                    session.path.extend(&record.id);
                } else {
                    session.path.reset_to(&record.id);
                }
                session.history.append(record);
                request_content(session, &mut effects);
            }
        }
        SessionAction::CloseApp => close_active_app(session),
        SessionAction::SetMaxHistoryLength { length } => {
            if length > MAX_HISTORY_LENGTH_LIMIT {
                return Err(ReducerError::InvalidHistoryLength {
                    requested: length,
                    max: MAX_HISTORY_LENGTH_LIMIT,
                });
            }
            session.history.set_max_length(length);
        }
        SessionAction::SetStatefulness { enabled } => {
            if session.cache.set_enabled(enabled) {
                debug!(enabled, "statefulness changed");
            }
        }
        SessionAction::RequestWallpaper { prompt } => match session.wallpaper.try_begin() {
            Some(request_id) => {
                effects.push(RuntimeEffect::GenerateWallpaper { request_id, prompt });
            }
            None => debug!("wallpaper generation already in flight; skipping request"),
        },
        SessionAction::SetAutoWallpaper { enabled } => {
            if session.wallpaper.set_auto_refresh(enabled) {
                effects.push(if enabled {
                    RuntimeEffect::StartWallpaperRefresh {
                        period: session.wallpaper.refresh_period(),
                    }
                } else {
                    RuntimeEffect::StopWallpaperRefresh
                });
            }
        }
        SessionAction::ContentFragment {
            generation_id,
            fragment,
        } => {
            if !session.generation.push_fragment(generation_id, &fragment) {
                debug!(?generation_id, "dropping fragment from superseded generation");
            }
        }
        SessionAction::GenerationCompleted { generation_id } => {
            let Some(done) = session.generation.complete(generation_id) else {
                debug!(?generation_id, "ignoring completion of superseded generation");
                return Ok(effects);
            };
            if let Some(path) = done.path {
                if !done.content.is_empty() && session.cache.put(path.clone(), done.content) {
                    debug!(path = %path, "cached generated content");
                }
            }
        }
        SessionAction::GenerationFailed {
            generation_id,
            message,
        } => {
            let err = GenerationError::StreamFailure(message);
            if session.generation.fail(generation_id, &err) {
                warn!(?generation_id, error = %err, "content generation failed");
            }
        }
        SessionAction::GenerationAbandoned { generation_id } => {
            if session.generation.abandon(generation_id) {
                debug!(?generation_id, "content generation abandoned");
            }
        }
        SessionAction::WallpaperGenerated { request_id, result } => {
            match session.wallpaper.finish(request_id, result) {
                WallpaperOutcome::Applied => info!(?request_id, "wallpaper applied"),
                WallpaperOutcome::Failed(err) => {
                    warn!(?request_id, error = %err, "wallpaper generation failed")
                }
                WallpaperOutcome::Stale => debug!(?request_id, "ignoring stale wallpaper result"),
            }
        }
        SessionAction::WallpaperAbandoned { request_id } => {
            if session.wallpaper.abandon(request_id) {
                debug!(?request_id, "wallpaper generation abandoned");
            }
        }
    }

    Ok(effects)
}

fn is_close_interaction(session: &DesktopSession, record: &InteractionRecord) -> bool {
    record.kind == InteractionKind::CloseButton || record.id == session.close_button_id
}

fn close_active_app(session: &mut DesktopSession) {
    if let Some(app) = session.active_app.take() {
        debug!(app_id = %app.id, "closing app");
    }
    session.history.clear();
    session.path.clear();
    session.generation.reset();
}

fn crash_session(
    session: &mut DesktopSession,
    trigger: &InteractionRecord,
    rng: &mut dyn RngCore,
    effects: &mut Vec<RuntimeEffect>,
) {
    let visible = session.visible_entry_ids();
    let Some(report) = session.crash.crash(&visible, rng) else {
        return;
    };
    warn!(
        trigger = %trigger.id,
        stop_code = %report.stop_code,
        hidden = ?report.hidden_entry_ids,
        "session crashed"
    );
    session.generation.supersede();
    session.wallpaper.set_auto_refresh(false);
    effects.push(RuntimeEffect::StopWallpaperRefresh);
}

fn request_content(session: &mut DesktopSession, effects: &mut Vec<RuntimeEffect>) {
    let path = session.path.key();
    if let Some(cached) = path.as_ref().and_then(|key| session.cache.get(key)) {
        let cached = cached.to_string();
        debug!(path = ?path, "serving cached content");
        session.generation.serve_cached(cached);
        return;
    }

    match session.generation.begin(
        session.history.records(),
        session.history.max_length(),
        path,
    ) {
        Ok(request) => effects.push(RuntimeEffect::StreamContent(request)),
        Err(err) => debug!(error = %err, "content generation not started"),
    }
}
