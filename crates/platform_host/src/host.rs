//! Host service bundle injected into the desktop runtime.

use std::rc::Rc;

use crate::{
    ContentStreamService, ImageGenerationService, IntervalScheduler, LocalClock,
    NoopContentStreamService, NoopImageGenerationService, NoopIntervalScheduler, SystemLocalClock,
    TaskSpawner,
};

/// Runtime-selected host service bundle.
///
/// All environment-specific service selection happens before this bundle crosses into
/// `desktop_runtime`, which keeps the engine decoupled from concrete generator backends.
#[derive(Clone)]
pub struct HostServices {
    /// Streaming content generator.
    pub content: Rc<dyn ContentStreamService>,
    /// Wallpaper image generator.
    pub images: Rc<dyn ImageGenerationService>,
    /// Periodic callback scheduler.
    pub scheduler: Rc<dyn IntervalScheduler>,
    /// Local wall clock.
    pub clock: Rc<dyn LocalClock>,
    /// Executor for runtime tasks.
    pub spawner: Rc<dyn TaskSpawner>,
}

impl HostServices {
    /// Bundle with no generators and no timers, running tasks on `spawner`.
    pub fn headless(spawner: Rc<dyn TaskSpawner>) -> Self {
        Self {
            content: Rc::new(NoopContentStreamService),
            images: Rc::new(NoopImageGenerationService),
            scheduler: Rc::new(NoopIntervalScheduler),
            clock: Rc::new(SystemLocalClock),
            spawner,
        }
    }

    /// Replaces the content generator.
    pub fn with_content(mut self, content: Rc<dyn ContentStreamService>) -> Self {
        self.content = content;
        self
    }

    /// Replaces the image generator.
    pub fn with_images(mut self, images: Rc<dyn ImageGenerationService>) -> Self {
        self.images = images;
        self
    }

    /// Replaces the interval scheduler.
    pub fn with_scheduler(mut self, scheduler: Rc<dyn IntervalScheduler>) -> Self {
        self.scheduler = scheduler;
        self
    }

    /// Replaces the local clock.
    pub fn with_clock(mut self, clock: Rc<dyn LocalClock>) -> Self {
        self.clock = clock;
        self
    }
}
