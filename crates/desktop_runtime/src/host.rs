//! Host-side runtime helpers for executing reducer effects against injected services.
//!
//! Effects that talk to a generator run as spawned local tasks. Each task owns a
//! [`DispatchOnDrop`] guard so the session hears about the task ending even when the executor drops
//! it before completion, which keeps the loading and single-flight flags from sticking.

mod content_effects;
mod wallpaper_effects;

use std::{cell::RefCell, rc::Rc};

use platform_host::{
    ContentStreamService, HostServices, ImageGenerationService, IntervalHandle, IntervalScheduler,
    LocalClock, LocalTask,
};
use tracing::warn;

use crate::{
    reducer::{RuntimeEffect, SessionAction},
    runtime_context::{DesktopRuntime, WeakDesktopRuntime},
};

#[derive(Clone)]
/// Host service bundle plus the host-owned handles the runtime effects manage.
pub struct DesktopHostContext {
    services: HostServices,
    wallpaper_refresh: Rc<RefCell<Option<IntervalHandle>>>,
}

impl DesktopHostContext {
    pub fn new(services: HostServices) -> Self {
        Self {
            services,
            wallpaper_refresh: Rc::new(RefCell::new(None)),
        }
    }

    /// Returns the configured streaming content service.
    pub fn content_stream_service(&self) -> Rc<dyn ContentStreamService> {
        self.services.content.clone()
    }

    /// Returns the configured image generation service.
    pub fn image_generation_service(&self) -> Rc<dyn ImageGenerationService> {
        self.services.images.clone()
    }

    /// Returns the configured interval scheduler.
    pub fn scheduler(&self) -> Rc<dyn IntervalScheduler> {
        self.services.scheduler.clone()
    }

    /// Returns the configured local clock.
    pub fn clock(&self) -> Rc<dyn LocalClock> {
        self.services.clock.clone()
    }

    /// Whether a periodic wallpaper refresh is currently installed.
    pub fn has_wallpaper_refresh(&self) -> bool {
        self.wallpaper_refresh.borrow().is_some()
    }

    /// Executes a single [`RuntimeEffect`] emitted by the reducer.
    pub fn run_runtime_effect(&self, runtime: &DesktopRuntime, effect: RuntimeEffect) {
        match effect {
            RuntimeEffect::StreamContent(request) => {
                content_effects::stream_content(self, runtime, request)
            }
            RuntimeEffect::GenerateWallpaper { request_id, prompt } => {
                wallpaper_effects::generate_wallpaper(self, runtime, request_id, prompt)
            }
            RuntimeEffect::StartWallpaperRefresh { period } => {
                wallpaper_effects::start_refresh(self, runtime, period)
            }
            RuntimeEffect::StopWallpaperRefresh => wallpaper_effects::stop_refresh(self),
        }
    }

    /// Installs `handle` as the refresh schedule, returning the one it replaced.
    fn replace_wallpaper_refresh(&self, handle: Option<IntervalHandle>) -> Option<IntervalHandle> {
        self.wallpaper_refresh.replace(handle)
    }

    /// Spawns `task`; a rejected task is dropped, which fires its guard.
    fn spawn(&self, label: &'static str, task: LocalTask) {
        if let Err(err) = self.services.spawner.spawn_task(task) {
            warn!(task = label, "failed to spawn runtime task: {err}");
        }
    }
}

/// Dispatches a fallback action when dropped unless disarmed first.
pub(crate) struct DispatchOnDrop {
    runtime: WeakDesktopRuntime,
    action: Option<SessionAction>,
}

impl DispatchOnDrop {
    pub(crate) fn new(runtime: WeakDesktopRuntime, action: SessionAction) -> Self {
        Self {
            runtime,
            action: Some(action),
        }
    }

    pub(crate) fn disarm(&mut self) {
        self.action = None;
    }
}

impl Drop for DispatchOnDrop {
    fn drop(&mut self) {
        let Some(action) = self.action.take() else {
            return;
        };
        if let Some(runtime) = self.runtime.upgrade() {
            runtime.dispatch_action(action);
        }
    }
}
