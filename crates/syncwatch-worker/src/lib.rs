//! Syncwatch Worker
//!
//! Everything that turns filesystem activity into pipeline runs: the
//! [`PipelineCoordinator`] state machine, the bounded [`FileTaskQueue`], the
//! [`EventIngestor`] watcher and the optional [`Rescanner`].

pub mod context;
pub mod coordinator;
pub mod ingest;
pub mod queue;
pub mod rescan;

pub use context::TaskHandler;
pub use coordinator::{PipelineCoordinator, RunOutcome};
pub use ingest::{EventIngestor, IngestError};
pub use queue::{FileTaskQueue, QueueConfig, TaskSender};
pub use rescan::Rescanner;
