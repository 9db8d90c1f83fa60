//! API models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Deployment start request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartDeploymentRequest {
    pub code: String,
    pub config: serde_json::Value,
}

/// Deployment start response
///
/// The id is optional on the wire so a malformed success body can be told
/// apart from a transport failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartDeploymentResponse {
    #[serde(default)]
    pub deployment_id: Option<String>,
}

/// Error response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub error: Option<String>,
}

/// Structured payload of the terminal `done` event
///
/// Every field accepts a string, a number or any other JSON scalar; the deploy
/// runner is not consistent about quoting numeric ids.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonePayload {
    #[serde(default, deserialize_with = "lenient_string")]
    pub output: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub code_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub contract_address: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub contract_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub token_symbol: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub token_supply: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub txhash: Option<String>,
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

/// Deployment outcome as stored by the conversation service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentStatus {
    Success,
    Error,
}

/// Summarized deployment stored against a conversation message
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentRecord {
    pub status: DeploymentStatus,
    pub txhash: Option<String>,
    pub code_id: Option<String>,
    pub contract_address: Option<String>,
    pub contract_name: Option<String>,
    pub token_symbol: Option<String>,
    pub token_supply: Option<String>,
    pub logs: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    pub deployed_at: DateTime<Utc>,
}

/// Save deployment request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveDeploymentRequest {
    pub conversation_id: String,
    pub message_id: String,
    pub deployment: DeploymentRecord,
}
