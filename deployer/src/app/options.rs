//! Deployer configuration options

use std::time::Duration;

use secrecy::SecretString;

use crate::deploy::watcher;
use crate::models::deployment::DeploymentArtifact;
use crate::settings::Settings;
use crate::utils::explorer_tx_url;

/// Main deployer options
#[derive(Debug, Clone)]
pub struct DeployerOptions {
    /// Deploy API root (`/start`, `/stream/{id}`)
    pub deploy_root_url: String,

    /// Application API root (conversation persistence)
    pub api_root_url: String,

    /// Bearer token for the application API
    pub api_token: Option<SecretString>,

    /// Timeout for plain request/response calls
    pub request_timeout: Duration,

    /// Log stream watcher options
    pub watcher: watcher::Options,

    /// Transaction page prefix for explorer links
    pub explorer_tx_base_url: String,
}

impl Default for DeployerOptions {
    fn default() -> Self {
        Self::from(&Settings::default())
    }
}

impl DeployerOptions {
    /// Explorer page of the artifact's transaction, when one is known
    pub fn explorer_link(&self, artifact: &DeploymentArtifact) -> Option<String> {
        artifact
            .transaction_hash
            .as_deref()
            .map(|txhash| explorer_tx_url(&self.explorer_tx_base_url, txhash))
    }
}

impl From<&Settings> for DeployerOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            deploy_root_url: settings.deploy.root_url.clone(),
            api_root_url: settings.api.root_url.clone(),
            api_token: settings.api.token.clone(),
            request_timeout: Duration::from_secs(settings.http.request_timeout_secs),
            watcher: watcher::Options {
                connect_timeout: Duration::from_secs(settings.stream.connect_timeout_secs),
            },
            explorer_tx_base_url: settings.explorer.tx_base_url.clone(),
        }
    }
}
