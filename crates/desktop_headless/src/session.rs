use std::{rc::Rc, time::Duration};

use desktop_runtime::{DesktopRuntime, DesktopSnapshot, RuntimeConfig};
use futures::executor::LocalPool;
use platform_host::{
    HostServices, InteractionRecord, LocalClock, ManualIntervalScheduler,
    MemoryImageGenerationService,
};
use serde::Serialize;
use tracing::debug;

use crate::{
    placeholder::PlaceholderContentService,
    script::{ScriptError, ScriptLine, ScriptStep},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// Snapshot taken after one script step settled.
pub struct StepReport {
    pub line: usize,
    pub step: ScriptStep,
    pub snapshot: DesktopSnapshot,
}

/// Runtime wired to offline generators, a virtual clock, and a local executor.
///
/// Every step runs the executor until it stalls, so reports always show settled state.
pub struct HeadlessSession {
    pool: LocalPool,
    scheduler: ManualIntervalScheduler,
    runtime: DesktopRuntime,
}

impl HeadlessSession {
    /// Builds a session; `clock` decides the default wallpaper prompt.
    ///
    /// # Errors
    ///
    /// Returns [`ScriptError::Config`] when `config` fails validation.
    pub fn new(config: RuntimeConfig, clock: Rc<dyn LocalClock>) -> Result<Self, ScriptError> {
        let pool = LocalPool::new();
        let scheduler = ManualIntervalScheduler::default();
        let services = HostServices::headless(Rc::new(pool.spawner()))
            .with_content(Rc::new(PlaceholderContentService))
            .with_images(Rc::new(MemoryImageGenerationService::default()))
            .with_scheduler(Rc::new(scheduler.clone()))
            .with_clock(clock);
        let runtime = DesktopRuntime::new(config, services)?;
        Ok(Self {
            pool,
            scheduler,
            runtime,
        })
    }

    pub fn runtime(&self) -> &DesktopRuntime {
        &self.runtime
    }

    /// Boots the runtime and returns the settled snapshot.
    pub fn boot(&mut self) -> DesktopSnapshot {
        self.runtime.boot();
        self.pool.run_until_stalled();
        self.runtime.snapshot()
    }

    /// Applies one script line and returns the settled snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`ScriptError::Step`] when the runtime rejects the step.
    pub fn apply(&mut self, line: ScriptLine) -> Result<StepReport, ScriptError> {
        debug!(line = line.line, step = ?line.step, "applying script step");
        let ScriptLine { line, step } = line;
        let step_error = |source| ScriptError::Step { line, source };
        match &step {
            ScriptStep::Open { app_id } => self.runtime.open_app(app_id).map_err(step_error)?,
            ScriptStep::Click { id, label } => {
                let mut record = InteractionRecord::click(id.as_str(), label.as_str());
                if let Some(app_id) = self.runtime.snapshot().active_app {
                    record = record.in_app(app_id);
                }
                self.runtime.submit_interaction(record);
            }
            ScriptStep::Interact { record } => self.runtime.submit_interaction(record.clone()),
            ScriptStep::Close => self.runtime.close_app(),
            ScriptStep::History { length } => self
                .runtime
                .set_max_history_length(*length)
                .map_err(step_error)?,
            ScriptStep::Stateful { enabled } => self.runtime.set_statefulness(*enabled),
            ScriptStep::Wallpaper { prompt } => self.runtime.request_wallpaper(prompt.as_deref()),
            ScriptStep::AutoWallpaper { enabled } => self.runtime.set_auto_wallpaper(*enabled),
            ScriptStep::Advance { seconds } => {
                self.scheduler.advance(Duration::from_secs(*seconds));
            }
        }
        self.pool.run_until_stalled();
        Ok(StepReport {
            line,
            step,
            snapshot: self.runtime.snapshot(),
        })
    }

    /// Applies every line in order, stopping at the first rejected step.
    ///
    /// # Errors
    ///
    /// Returns the first [`ScriptError::Step`] encountered.
    pub fn run_script(&mut self, lines: Vec<ScriptLine>) -> Result<Vec<StepReport>, ScriptError> {
        lines.into_iter().map(|line| self.apply(line)).collect()
    }
}
