//! Deployment initiation

use tracing::{error, info};

use crate::deploy::backend::DeployBackend;
use crate::errors::DeployerError;
use crate::models::deployment::DeploymentJob;
use crate::models::generated::{config_present, GeneratedArtifact};

/// Start a job for the given source and config
///
/// Fails with `MissingArtifact` before any request when either is empty.
/// Does not open the log stream.
pub async fn start(
    backend: &dyn DeployBackend,
    source_code: &str,
    config: &serde_json::Value,
) -> Result<DeploymentJob, DeployerError> {
    if source_code.trim().is_empty() || !config_present(config) {
        return Err(DeployerError::MissingArtifact);
    }

    match backend.start_job(source_code, config).await {
        Ok(job_id) => {
            info!("Deployment started: {}", job_id);
            Ok(DeploymentJob::new(job_id, source_code, config.clone()))
        }
        Err(e) => {
            error!("Failed to start deployment: {}", e);
            Err(e)
        }
    }
}

/// Start a job from an assistant response's generated artifact
pub async fn start_generated(
    backend: &dyn DeployBackend,
    generated: &GeneratedArtifact,
) -> Result<DeploymentJob, DeployerError> {
    match (generated.source_code(), generated.config()) {
        (Some(code), Some(config)) => start(backend, code, config).await,
        _ => Err(DeployerError::MissingArtifact),
    }
}
