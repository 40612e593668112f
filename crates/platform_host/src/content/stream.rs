//! Streaming content-generation service contracts and adapters.

use std::{cell::RefCell, collections::VecDeque, rc::Rc};

use futures::stream::{self, LocalBoxStream, StreamExt};

use crate::interaction::InteractionRecord;

/// Stream of generated content fragments.
///
/// An `Err` item signals failure; consumers stop reading at the first error.
pub type ContentStream = LocalBoxStream<'static, Result<String, String>>;

/// Host service that synthesizes app content from an interaction history.
pub trait ContentStreamService {
    /// Starts a streaming generation seeded by `history` (most-recent-first).
    ///
    /// Implementations should consider at most `max_history_length` records.
    fn stream_content(
        &self,
        history: &[InteractionRecord],
        max_history_length: usize,
    ) -> ContentStream;
}

#[derive(Debug, Clone, Copy, Default)]
/// Content service for hosts without a generator; every request fails immediately.
pub struct NoopContentStreamService;

impl ContentStreamService for NoopContentStreamService {
    fn stream_content(
        &self,
        _history: &[InteractionRecord],
        _max_history_length: usize,
    ) -> ContentStream {
        stream::once(async { Err("content stream service unavailable".to_string()) }).boxed_local()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// One request observed by [`MemoryContentStreamService`].
pub struct RecordedContentRequest {
    /// History snapshot passed to the service.
    pub history: Vec<InteractionRecord>,
    /// History bound passed to the service.
    pub max_history_length: usize,
}

#[derive(Debug, Clone, Default)]
struct MemoryContentStreamInner {
    scripts: VecDeque<Vec<Result<String, String>>>,
    requests: Vec<RecordedContentRequest>,
}

#[derive(Debug, Clone, Default)]
/// In-memory content service replaying scripted fragment sequences in request order.
///
/// Requests beyond the scripted ones produce an empty (successful) stream.
pub struct MemoryContentStreamService {
    inner: Rc<RefCell<MemoryContentStreamInner>>,
}

impl MemoryContentStreamService {
    /// Queues the fragments for the next unanswered request.
    pub fn push_script(&self, fragments: Vec<Result<String, String>>) {
        self.inner.borrow_mut().scripts.push_back(fragments);
    }

    /// Queues a successful response built from plain fragments.
    pub fn push_fragments<I, S>(&self, fragments: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push_script(fragments.into_iter().map(|f| Ok(f.into())).collect());
    }

    /// Returns the requests observed so far.
    pub fn requests(&self) -> Vec<RecordedContentRequest> {
        self.inner.borrow().requests.clone()
    }

    /// Returns the number of requests observed so far.
    pub fn request_count(&self) -> usize {
        self.inner.borrow().requests.len()
    }
}

impl ContentStreamService for MemoryContentStreamService {
    fn stream_content(
        &self,
        history: &[InteractionRecord],
        max_history_length: usize,
    ) -> ContentStream {
        let mut inner = self.inner.borrow_mut();
        inner.requests.push(RecordedContentRequest {
            history: history.to_vec(),
            max_history_length,
        });
        let script = inner.scripts.pop_front().unwrap_or_default();
        stream::iter(script).boxed_local()
    }
}

/// Returns at most `max_history_length` most-recent records from `history`.
pub fn bounded_history(
    history: &[InteractionRecord],
    max_history_length: usize,
) -> &[InteractionRecord] {
    &history[..history.len().min(max_history_length)]
}
