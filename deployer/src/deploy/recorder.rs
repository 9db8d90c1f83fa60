//! Deployment recording
//!
//! The on-chain result is authoritative; the stored record is advisory. A
//! failed save is logged for operators and never turns a deployment into a
//! failure, nor is it retried.

use async_trait::async_trait;
use tracing::{error, info};

use crate::errors::DeployerError;
use crate::models::deployment::DeploymentArtifact;

/// Where a deployment record belongs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordTarget {
    pub job_id: String,
    pub conversation_id: String,
    pub message_id: String,
}

/// Persistence collaborator trait for testability
#[async_trait]
pub trait Recorder: Send + Sync {
    /// Store the artifact against the originating conversation message
    async fn save(
        &self,
        target: &RecordTarget,
        artifact: &DeploymentArtifact,
    ) -> Result<(), DeployerError>;
}

/// Make the single persistence attempt for a terminal job
///
/// Returns whether the save went through; callers only use it for logging.
pub async fn record(
    recorder: &dyn Recorder,
    target: &RecordTarget,
    artifact: &DeploymentArtifact,
) -> bool {
    match recorder.save(target, artifact).await {
        Ok(()) => {
            info!(
                "Recorded {:?} deployment {} for message {}",
                artifact.status, target.job_id, target.message_id
            );
            true
        }
        Err(e) => {
            error!(
                "Saving deployment {} for conversation {} failed: {}",
                target.job_id, target.conversation_id, e
            );
            false
        }
    }
}
