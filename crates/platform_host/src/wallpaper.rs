//! Wallpaper image-generation service contracts and adapters.

use std::{cell::RefCell, collections::VecDeque, future::Future, pin::Pin, rc::Rc};

/// Object-safe boxed future used by [`ImageGenerationService`].
pub type ImageGenerationFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Host service that renders a wallpaper image from a text prompt.
pub trait ImageGenerationService {
    /// Generates one image and returns its base64-encoded PNG payload.
    fn generate_image<'a>(&'a self, prompt: &'a str)
        -> ImageGenerationFuture<'a, Result<String, String>>;
}

#[derive(Debug, Clone, Copy, Default)]
/// Image service for hosts without a generator.
pub struct NoopImageGenerationService;

impl ImageGenerationService for NoopImageGenerationService {
    fn generate_image<'a>(
        &'a self,
        _prompt: &'a str,
    ) -> ImageGenerationFuture<'a, Result<String, String>> {
        Box::pin(async { Err("image generation service unavailable".to_string()) })
    }
}

/// Base64 payload of a 1x1 transparent PNG.
pub const PLACEHOLDER_PNG_BASE64: &str =
    "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAQAAAC1HAwCAAAAC0lEQVR42mNkYAAAAAYAAjCB0C8AAAAASUVORK5CYII=";

#[derive(Debug, Default)]
struct MemoryImageGenerationInner {
    results: VecDeque<Result<String, String>>,
    prompts: Vec<String>,
}

#[derive(Debug, Clone, Default)]
/// In-memory image service answering with queued results, then [`PLACEHOLDER_PNG_BASE64`].
pub struct MemoryImageGenerationService {
    inner: Rc<RefCell<MemoryImageGenerationInner>>,
}

impl MemoryImageGenerationService {
    /// Queues the result for the next unanswered request.
    pub fn push_result(&self, result: Result<String, String>) {
        self.inner.borrow_mut().results.push_back(result);
    }

    /// Returns every prompt received so far.
    pub fn prompts(&self) -> Vec<String> {
        self.inner.borrow().prompts.clone()
    }

    /// Returns the number of requests received so far.
    pub fn request_count(&self) -> usize {
        self.inner.borrow().prompts.len()
    }
}

impl ImageGenerationService for MemoryImageGenerationService {
    fn generate_image<'a>(
        &'a self,
        prompt: &'a str,
    ) -> ImageGenerationFuture<'a, Result<String, String>> {
        Box::pin(async move {
            let mut inner = self.inner.borrow_mut();
            inner.prompts.push(prompt.to_string());
            inner
                .results
                .pop_front()
                .unwrap_or_else(|| Ok(PLACEHOLDER_PNG_BASE64.to_string()))
        })
    }
}
