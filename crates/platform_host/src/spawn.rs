//! Local task spawning contract for runtime-owned async work.

use futures::{
    executor::LocalSpawner,
    future::LocalBoxFuture,
    task::LocalSpawnExt,
};

/// Boxed `'static` future spawned on the runtime's thread.
pub type LocalTask = LocalBoxFuture<'static, ()>;

/// Host service that runs runtime tasks on the single cooperative executor.
pub trait TaskSpawner {
    /// Spawns `task`; it must not be polled before this call returns.
    ///
    /// # Errors
    ///
    /// Returns an error when the executor has shut down.
    fn spawn_task(&self, task: LocalTask) -> Result<(), String>;
}

impl TaskSpawner for LocalSpawner {
    fn spawn_task(&self, task: LocalTask) -> Result<(), String> {
        self.spawn_local(task).map_err(|err| err.to_string())
    }
}
