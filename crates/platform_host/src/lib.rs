//! Typed host-domain contracts and shared models used by the generative desktop runtime.
//!
//! This crate is the API-first boundary for external capabilities: the streaming content
//! generator, the wallpaper image generator, interval timers, the local clock, and the task
//! executor. Concrete generator backends are composed by the entry layer and handed to
//! `desktop_runtime` as a [`HostServices`] bundle.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

pub mod content;
pub mod host;
pub mod interaction;
pub mod scheduler;
pub mod spawn;
pub mod time;
pub mod wallpaper;

pub use content::{
    bounded_history, ContentStream, ContentStreamService, MemoryContentStreamService,
    NoopContentStreamService, RecordedContentRequest,
};
pub use host::HostServices;
pub use interaction::{parse_interaction_payload, ElementKind, InteractionKind, InteractionRecord};
pub use scheduler::{
    IntervalHandle, IntervalScheduler, IntervalTick, ManualIntervalScheduler,
    NoopIntervalScheduler,
};
pub use spawn::{LocalTask, TaskSpawner};
pub use time::{FixedLocalClock, LocalClock, SystemLocalClock};
pub use wallpaper::{
    ImageGenerationFuture, ImageGenerationService, MemoryImageGenerationService,
    NoopImageGenerationService, PLACEHOLDER_PNG_BASE64,
};
