//! Deployment models

use chrono::{DateTime, Utc};
use deploy_api::{DeploymentRecord, DeploymentStatus, DonePayload};
use serde::{Deserialize, Serialize};

/// Lifecycle of a deployment job as shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Streaming,
    Success,
    Error,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Success | JobStatus::Error)
    }
}

/// One build-and-deploy attempt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentJob {
    job_id: String,
    source_code: String,
    config: serde_json::Value,
    status: JobStatus,
}

impl DeploymentJob {
    pub fn new(job_id: impl Into<String>, source_code: impl Into<String>, config: serde_json::Value) -> Self {
        Self {
            job_id: job_id.into(),
            source_code: source_code.into(),
            config,
            status: JobStatus::Pending,
        }
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn source_code(&self) -> &str {
        &self.source_code
    }

    pub fn config(&self) -> &serde_json::Value {
        &self.config
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    /// Move the status forward; a request to go backwards or to leave a
    /// terminal status is ignored and reported as `false`.
    pub fn advance(&mut self, status: JobStatus) -> bool {
        if self.status.is_terminal() || status <= self.status {
            return false;
        }
        self.status = status;
        true
    }
}

/// Origin of a display line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLineKind {
    /// Payload of a `log` event
    Received,
    /// Informational line added by the reader
    Info,
    /// Error line added by the reader
    Error,
}

/// A display line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogLine {
    pub kind: LogLineKind,
    pub text: String,
    pub received_at: DateTime<Utc>,
}

impl LogLine {
    pub fn new(kind: LogLineKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            received_at: Utc::now(),
        }
    }
}

/// Fields recognized in a single piece of log text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialArtifact {
    pub transaction_hash: Option<String>,
    pub code_id: Option<String>,
    pub contract_address: Option<String>,
    pub contract_name: Option<String>,
    pub token_symbol: Option<String>,
    pub token_supply: Option<String>,
}

impl PartialArtifact {
    pub fn is_empty(&self) -> bool {
        *self == PartialArtifact::default()
    }
}

impl From<&DonePayload> for PartialArtifact {
    fn from(payload: &DonePayload) -> Self {
        Self {
            transaction_hash: non_empty(&payload.txhash),
            code_id: non_empty(&payload.code_id),
            contract_address: non_empty(&payload.contract_address),
            contract_name: non_empty(&payload.contract_name),
            token_symbol: non_empty(&payload.token_symbol),
            token_supply: non_empty(&payload.token_supply),
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.is_empty()).cloned()
}

/// Structured result of a deployment, accumulated from its log stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentArtifact {
    pub transaction_hash: Option<String>,
    pub code_id: Option<String>,
    pub contract_address: Option<String>,
    pub contract_name: Option<String>,
    pub token_symbol: Option<String>,
    pub token_supply: Option<String>,
    pub raw_logs: Vec<String>,
    pub status: DeploymentStatus,
    pub error_message: Option<String>,
    pub output: Option<String>,
}

impl Default for DeploymentArtifact {
    fn default() -> Self {
        Self {
            transaction_hash: None,
            code_id: None,
            contract_address: None,
            contract_name: None,
            token_symbol: None,
            token_supply: None,
            raw_logs: Vec::new(),
            status: DeploymentStatus::Error,
            error_message: None,
            output: None,
        }
    }
}

impl DeploymentArtifact {
    /// Artifact for a job that failed before any log arrived
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: DeploymentStatus::Error,
            error_message: Some(message.into()),
            ..Default::default()
        }
    }

    /// Merge extracted fields, keeping any value that is already known
    pub fn absorb(&mut self, partial: PartialArtifact) {
        fill(&mut self.transaction_hash, partial.transaction_hash);
        fill(&mut self.code_id, partial.code_id);
        fill(&mut self.contract_address, partial.contract_address);
        fill(&mut self.contract_name, partial.contract_name);
        fill(&mut self.token_symbol, partial.token_symbol);
        fill(&mut self.token_supply, partial.token_supply);
    }

    /// Wire form stored by the conversation service
    pub fn to_record(&self) -> DeploymentRecord {
        DeploymentRecord {
            status: self.status,
            txhash: self.transaction_hash.clone(),
            code_id: self.code_id.clone(),
            contract_address: self.contract_address.clone(),
            contract_name: self.contract_name.clone(),
            token_symbol: self.token_symbol.clone(),
            token_supply: self.token_supply.clone(),
            logs: self.raw_logs.clone(),
            error: self.error_message.clone(),
            output: self.output.clone(),
            deployed_at: Utc::now(),
        }
    }
}

fn fill(slot: &mut Option<String>, value: Option<String>) {
    if slot.is_none() {
        *slot = value;
    }
}
