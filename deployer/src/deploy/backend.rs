//! Deploy runner interface

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::errors::DeployerError;

/// Named event of a job's log stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// One raw log line
    Log(String),

    /// Terminal success; JSON object or raw output text
    Done(String),

    /// Terminal failure reported by the runner
    Error(String),
}

/// Open log stream; an `Err` item is a transport failure
pub type EventStream = BoxStream<'static, Result<StreamEvent, DeployerError>>;

/// Deploy runner trait for testability
#[async_trait]
pub trait DeployBackend: Send + Sync {
    /// Submit source and config, returning the job id
    async fn start_job(
        &self,
        code: &str,
        config: &serde_json::Value,
    ) -> Result<String, DeployerError>;

    /// Open the log stream of a job; `Ok` means the connection is open
    async fn open_stream(&self, job_id: &str) -> Result<EventStream, DeployerError>;
}
