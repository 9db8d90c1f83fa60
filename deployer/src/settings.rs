//! Settings file management

use std::path::{Path, PathBuf};

use secrecy::SecretString;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use crate::errors::DeployerError;
use crate::logs::LogLevel;

/// Deployer settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Directory for rolling log files; stdout only when unset
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    /// Emit JSON log lines
    #[serde(default)]
    pub json_logs: bool,

    /// Deploy runner configuration
    #[serde(default)]
    pub deploy: DeploySettings,

    /// Conversation API configuration
    #[serde(default)]
    pub api: ApiSettings,

    /// Log stream configuration
    #[serde(default)]
    pub stream: StreamSettings,

    /// Plain request configuration
    #[serde(default)]
    pub http: HttpSettings,

    /// Block explorer configuration
    #[serde(default)]
    pub explorer: ExplorerSettings,
}

impl Settings {
    /// Load settings from a JSON file
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, DeployerError> {
        let path = path.as_ref();
        debug!("Loading settings from {}", path.display());
        let contents = tokio::fs::read_to_string(path).await?;
        Self::from_json(&contents)
    }

    /// Parse settings from a JSON string
    pub fn from_json(contents: &str) -> Result<Self, DeployerError> {
        let settings: Settings = serde_json::from_str(contents)?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), DeployerError> {
        for (name, value) in [
            ("deploy.root_url", &self.deploy.root_url),
            ("api.root_url", &self.api.root_url),
        ] {
            url::Url::parse(value)
                .map_err(|e| DeployerError::ConfigError(format!("{}: {}", name, e)))?;
        }
        if self.stream.connect_timeout_secs == 0 {
            return Err(DeployerError::ConfigError(
                "stream.connect_timeout_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Deploy runner settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploySettings {
    /// Root of the deploy API (`/start`, `/stream/{id}`)
    #[serde(default = "default_deploy_url")]
    pub root_url: String,
}

fn default_deploy_url() -> String {
    "http://localhost:12001/api/deploy".to_string()
}

impl Default for DeploySettings {
    fn default() -> Self {
        Self {
            root_url: default_deploy_url(),
        }
    }
}

/// Conversation API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSettings {
    /// Root of the application API
    #[serde(default = "default_api_url")]
    pub root_url: String,

    /// Bearer token for the session
    #[serde(default, skip_serializing, deserialize_with = "deserialize_token")]
    pub token: Option<SecretString>,
}

fn default_api_url() -> String {
    "http://localhost:5000/api".to_string()
}

fn deserialize_token<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    let token = Option::<String>::deserialize(deserializer)?;
    Ok(token.filter(|t| !t.trim().is_empty()).map(SecretString::from))
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            root_url: default_api_url(),
            token: None,
        }
    }
}

/// Log stream settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamSettings {
    /// Maximum wait for the stream to open
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

fn default_connect_timeout() -> u64 {
    30
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

/// HTTP request settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpSettings {
    /// Timeout for request/response calls
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// Block explorer settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplorerSettings {
    /// Transaction page prefix
    #[serde(default = "default_tx_base_url")]
    pub tx_base_url: String,
}

fn default_tx_base_url() -> String {
    "https://testnet.seistream.app/transactions".to_string()
}

impl Default for ExplorerSettings {
    fn default() -> Self {
        Self {
            tx_base_url: default_tx_base_url(),
        }
    }
}
