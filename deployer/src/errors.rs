//! Error types for the deployment pipeline

use thiserror::Error;

/// Main error type for the deployment pipeline
#[derive(Error, Debug)]
pub enum DeployerError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Source code or config missing before a job was started
    #[error("Missing code or config in response")]
    MissingArtifact,

    /// The request or the stream could not reach the collaborator
    #[error("Transport error: {0}")]
    Transport(String),

    /// The collaborator answered with a structured error
    #[error("{0}")]
    RejectedByServer(String),

    /// A success response that does not follow the wire contract
    #[error("Protocol violation: {0}")]
    ProtocolViolation(String),

    #[error("Timed out after {0:?} waiting for the log stream")]
    ConnectTimeout(std::time::Duration),

    /// The log stream failed after it was opened
    #[error("Log stream failed: {0}")]
    StreamFailed(String),

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
