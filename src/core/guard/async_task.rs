/*!
 * Async Task Resources
 *
 * Tokio tasks bound to an extent, aborted on release
 */

use super::traits::Resource;
use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::debug;

/// Boxed future accepted by [`TaskResource`]
pub type TaskFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

/// Task spawn failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    #[error("No tokio runtime available to spawn the task")]
    NoRuntime,
}

/// Background task with automatic cancellation
///
/// Release never waits: an unfinished task is aborted and its future is
/// dropped by the runtime.
///
/// # Example
///
/// ```ignore
/// let tasks = Arc::new(TaskResource::<()>::new());
/// let key = scope.acquire(&tasks, Box::pin(heartbeat()))?;
/// // heartbeat aborted when the scope exits
/// ```
pub struct TaskResource<T> {
    runtime: Option<Handle>,
    _output: PhantomData<fn() -> T>,
}

impl<T: Send + 'static> TaskResource<T> {
    /// Spawn on whichever runtime is current at acquisition
    pub fn new() -> Self {
        Self {
            runtime: None,
            _output: PhantomData,
        }
    }

    /// Spawn on a specific runtime
    pub fn on(runtime: Handle) -> Self {
        Self {
            runtime: Some(runtime),
            _output: PhantomData,
        }
    }
}

impl<T: Send + 'static> Default for TaskResource<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + 'static> Resource for TaskResource<T> {
    type Params = TaskFuture<T>;
    type Handle = JoinHandle<T>;
    type Error = TaskError;

    fn kind(&self) -> &'static str {
        "async_task"
    }

    fn acquire(&self, future: TaskFuture<T>) -> Result<JoinHandle<T>, TaskError> {
        let runtime = match &self.runtime {
            Some(runtime) => runtime.clone(),
            None => Handle::try_current().map_err(|_| TaskError::NoRuntime)?,
        };

        debug!("spawning scoped task");
        Ok(runtime.spawn(future))
    }

    fn release(&self, handle: JoinHandle<T>) -> Result<(), TaskError> {
        if !handle.is_finished() {
            debug!("aborting unfinished task");
            handle.abort();
        }
        Ok(())
    }
}
