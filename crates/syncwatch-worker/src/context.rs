//! Task handler trait
//!
//! The worker pool only knows how to schedule [`FileTask`]s; what a run does is
//! behind this trait. [`crate::PipelineCoordinator`] is the production handler.

use anyhow::Result;
use async_trait::async_trait;

use syncwatch_core::FileTask;

#[async_trait]
pub trait TaskHandler: Send + Sync {
    /// Run one task to a terminal state. Errors are logged by the pool and
    /// never retried.
    async fn handle(&self, task: FileTask) -> Result<()>;
}
