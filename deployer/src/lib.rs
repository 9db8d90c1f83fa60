//! Framew0rk Deployer Library
//!
//! Starts contract deployment jobs, follows their log streams, scrapes the
//! deployment artifact out of the logs and records the result once.

pub mod app;
pub mod deploy;
pub mod errors;
pub mod http;
pub mod logs;
pub mod models;
pub mod settings;
pub mod utils;

pub use app::DeployerOptions;
pub use deploy::{ArtifactKey, DeploymentHandle, DeploymentManager, WatchOutcome};
pub use errors::DeployerError;
