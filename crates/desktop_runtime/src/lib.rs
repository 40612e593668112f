//! Interaction-driven content synthesis engine for a generated desktop session.

pub mod apps;
pub mod cache;
pub mod config;
pub mod crash;
mod effect_executor;
pub mod generation;
pub mod history;
pub mod host;
pub mod model;
pub mod reducer;
pub mod runtime_context;
pub mod wallpaper;

pub use apps::{AppCatalog, AppDefinition};
pub use config::{ConfigError, RuntimeConfig};
pub use crash::CrashReport;
pub use generation::{GenerationError, GenerationId};
pub use history::{PathKey, MAX_HISTORY_LENGTH_LIMIT};
pub use host::DesktopHostContext;
pub use model::*;
pub use reducer::{reduce_session, ReducerError, RuntimeEffect, SessionAction};
pub use runtime_context::{DesktopRuntime, SnapshotObserver, WeakDesktopRuntime};
pub use wallpaper::{prompt_for_hour, WallpaperError, WallpaperRequestId};
