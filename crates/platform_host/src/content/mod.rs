//! Content-generation domain contracts and lightweight test adapters.

mod stream;

pub use stream::{
    bounded_history, ContentStream, ContentStreamService, MemoryContentStreamService,
    NoopContentStreamService, RecordedContentRequest,
};
