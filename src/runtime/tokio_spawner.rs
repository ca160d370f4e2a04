//! Background task spawning.

use std::future::Future;
use std::sync::Arc;

/// Abstraction for spawning background work on a runtime.
///
/// Gate workers, lifecycle listeners and acknowledgment loggers all go through
/// this seam so tests can drive them on the test runtime.
pub trait Spawn: Send + Sync + 'static {
    /// Spawn a detached future.
    fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static;
}

/// Tokio-based spawner that executes tasks on a tokio runtime.
#[derive(Clone, Debug)]
pub struct TokioSpawner {
    handle: Arc<tokio::runtime::Handle>,
}

impl TokioSpawner {
    /// Create a spawner from a tokio runtime handle.
    pub fn new(handle: tokio::runtime::Handle) -> Self {
        Self {
            handle: Arc::new(handle),
        }
    }

    /// Spawner bound to the runtime the caller is running on.
    ///
    /// Panics outside a tokio runtime, like `Handle::current`.
    pub fn current() -> Self {
        Self::new(tokio::runtime::Handle::current())
    }
}

impl Spawn for TokioSpawner {
    fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.handle.spawn(fut);
    }
}
