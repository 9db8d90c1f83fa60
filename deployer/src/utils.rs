//! Utility functions

use serde::{Deserialize, Serialize};

/// Version information for the deployer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionInfo {
    pub version: String,
    pub git_hash: String,
    pub build_time: String,
}

/// Get version information
pub fn version_info() -> VersionInfo {
    VersionInfo {
        version: env!("CARGO_PKG_VERSION").to_string(),
        git_hash: option_env!("GIT_HASH").unwrap_or("unknown").to_string(),
        build_time: option_env!("BUILD_TIME").unwrap_or("unknown").to_string(),
    }
}

/// User-Agent sent with every request
pub fn user_agent() -> String {
    let version = version_info();
    format!("fwdeploy/{} ({})", version.version, version.git_hash)
}

/// Block explorer link for a transaction hash
pub fn explorer_tx_url(base_url: &str, txhash: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), txhash.trim())
}
