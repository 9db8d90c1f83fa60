//! Conversation API client

use async_trait::async_trait;
use deploy_api::{DeploymentRecord, SaveDeploymentRequest};

use crate::deploy::recorder::{RecordTarget, Recorder};
use crate::errors::DeployerError;
use crate::http::client::HttpClient;
use crate::models::deployment::DeploymentArtifact;

impl HttpClient {
    /// Attach a deployment record to a conversation message
    pub async fn save_deployment(
        &self,
        conversation_id: &str,
        message_id: &str,
        deployment: DeploymentRecord,
    ) -> Result<(), DeployerError> {
        let request = SaveDeploymentRequest {
            conversation_id: conversation_id.to_string(),
            message_id: message_id.to_string(),
            deployment,
        };
        self.post_empty(&["conversations", conversation_id, "deployment"], &request)
            .await
    }
}

#[async_trait]
impl Recorder for HttpClient {
    async fn save(
        &self,
        target: &RecordTarget,
        artifact: &DeploymentArtifact,
    ) -> Result<(), DeployerError> {
        self.save_deployment(&target.conversation_id, &target.message_id, artifact.to_record())
            .await
    }
}
