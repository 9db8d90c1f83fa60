//! Deploy runner API client

use async_trait::async_trait;
use deploy_api::{StartDeploymentRequest, StartDeploymentResponse};
use tracing::debug;

use crate::deploy::backend::{DeployBackend, EventStream};
use crate::errors::DeployerError;
use crate::http::client::HttpClient;
use crate::http::sse;

impl HttpClient {
    /// Submit a contract for deployment, returning its job id
    pub async fn start_deployment(
        &self,
        code: &str,
        config: &serde_json::Value,
    ) -> Result<String, DeployerError> {
        let request = StartDeploymentRequest {
            code: code.to_string(),
            config: config.clone(),
        };
        let response: StartDeploymentResponse = self.post(&["start"], &request).await?;
        response
            .deployment_id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| {
                DeployerError::ProtocolViolation("No deploymentId returned from server".to_string())
            })
    }

    /// Open the log stream of a job
    pub async fn open_log_stream(&self, job_id: &str) -> Result<EventStream, DeployerError> {
        let response = self.get_stream(&["stream", job_id]).await?;
        debug!("Log stream for job {} opened", job_id);
        Ok(sse::event_stream(response.bytes_stream()))
    }
}

#[async_trait]
impl DeployBackend for HttpClient {
    async fn start_job(
        &self,
        code: &str,
        config: &serde_json::Value,
    ) -> Result<String, DeployerError> {
        self.start_deployment(code, config).await
    }

    async fn open_stream(&self, job_id: &str) -> Result<EventStream, DeployerError> {
        self.open_log_stream(job_id).await
    }
}
