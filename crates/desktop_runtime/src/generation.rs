//! Content-generation bookkeeping: loading flag, progressive accumulation, and stale-result guards.
//!
//! The coordinator never talks to a generator itself. The reducer asks it to [`begin`] a request,
//! the host streams fragments back as actions, and every fragment or terminal event carries the
//! [`GenerationId`] it belongs to so results from a superseded request are dropped.
//!
//! [`begin`]: GenerationCoordinator::begin

use platform_host::InteractionRecord;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::history::PathKey;

/// Final content published when a stream fails.
pub const STREAM_ERROR_FRAGMENT: &str =
    r#"<div class="p-4 text-red-600 bg-red-100 rounded-md">Error loading content.</div>"#;
/// User-visible message for a failed stream.
pub const STREAM_FAILURE_MESSAGE: &str = "Failed to stream content from the API.";
/// User-visible message for a request without interaction context.
pub const EMPTY_HISTORY_MESSAGE: &str = "No interaction data to process.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GenerationId(pub u64);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GenerationError {
    /// Generation was requested with an empty history.
    #[error("No interaction data to process.")]
    EmptyHistory,
    /// The content stream reported an error.
    #[error("content stream failed: {0}")]
    StreamFailure(String),
}

impl GenerationError {
    /// Message shown to the user for this error.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::EmptyHistory => EMPTY_HISTORY_MESSAGE,
            Self::StreamFailure(_) => STREAM_FAILURE_MESSAGE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Request the host must issue against the content stream service.
pub struct GenerationRequest {
    pub generation_id: GenerationId,
    /// Most-recent-first history snapshot taken when the request began.
    pub history: Vec<InteractionRecord>,
    pub max_history_length: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Result of a generation that ran to completion while still current.
pub struct CompletedGeneration {
    pub generation_id: GenerationId,
    /// Path that was active when the generation began.
    pub path: Option<PathKey>,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ActiveGeneration {
    id: GenerationId,
    path: Option<PathKey>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Observable generation state plus the identity of the one request allowed to update it.
pub struct GenerationCoordinator {
    last_id: u64,
    active: Option<ActiveGeneration>,
    content: String,
    loading: bool,
    error: Option<String>,
}

impl GenerationCoordinator {
    /// Starts a new generation, superseding any in-flight one.
    ///
    /// Clears the visible content and raises the loading flag. An empty `history` leaves loading
    /// off, records [`EMPTY_HISTORY_MESSAGE`], and issues nothing.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::EmptyHistory`] when `history` is empty.
    pub fn begin(
        &mut self,
        history: &[InteractionRecord],
        max_history_length: usize,
        path: Option<PathKey>,
    ) -> Result<GenerationRequest, GenerationError> {
        self.supersede();
        self.content.clear();
        if history.is_empty() {
            let err = GenerationError::EmptyHistory;
            self.error = Some(err.user_message().to_string());
            return Err(err);
        }

        self.last_id += 1;
        let generation_id = GenerationId(self.last_id);
        self.active = Some(ActiveGeneration {
            id: generation_id,
            path,
        });
        self.loading = true;
        self.error = None;
        Ok(GenerationRequest {
            generation_id,
            history: history.to_vec(),
            max_history_length,
        })
    }

    /// Appends a fragment from generation `id`; fragments from other generations are ignored.
    pub fn push_fragment(&mut self, id: GenerationId, fragment: &str) -> bool {
        if !self.is_current(id) {
            return false;
        }
        self.content.push_str(fragment);
        true
    }

    /// Finishes generation `id` successfully, returning what should be cached.
    pub fn complete(&mut self, id: GenerationId) -> Option<CompletedGeneration> {
        if !self.is_current(id) {
            return None;
        }
        let active = self.active.take()?;
        self.loading = false;
        Some(CompletedGeneration {
            generation_id: active.id,
            path: active.path,
            content: self.content.clone(),
        })
    }

    /// Fails generation `id`, replacing the content with [`STREAM_ERROR_FRAGMENT`].
    pub fn fail(&mut self, id: GenerationId, error: &GenerationError) -> bool {
        if !self.is_current(id) {
            return false;
        }
        self.active = None;
        self.loading = false;
        self.content = STREAM_ERROR_FRAGMENT.to_string();
        self.error = Some(error.user_message().to_string());
        true
    }

    /// Drops generation `id` without a terminal event, keeping whatever was published.
    pub fn abandon(&mut self, id: GenerationId) -> bool {
        if !self.is_current(id) {
            return false;
        }
        self.active = None;
        self.loading = false;
        true
    }

    /// Publishes previously cached content without issuing a request.
    pub fn serve_cached(&mut self, content: String) {
        self.supersede();
        self.content = content;
        self.error = None;
    }

    /// Clears all visible output, e.g. when the active app closes.
    pub fn reset(&mut self) {
        self.supersede();
        self.content.clear();
        self.error = None;
    }

    /// Detaches the in-flight generation so its late results are ignored.
    pub fn supersede(&mut self) -> Option<GenerationId> {
        self.loading = false;
        self.active.take().map(|active| active.id)
    }

    pub fn is_current(&self, id: GenerationId) -> bool {
        self.active.as_ref().is_some_and(|active| active.id == id)
    }

    pub fn active_id(&self) -> Option<GenerationId> {
        self.active.as_ref().map(|active| active.id)
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}
