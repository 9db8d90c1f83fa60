//! Deployment pipeline: initiation, log streaming, extraction and recording

pub mod backend;
pub mod extractor;
pub mod fsm;
pub mod initiator;
pub mod manager;
pub mod progress;
pub mod reader;
pub mod recorder;
pub mod watcher;

pub use backend::{DeployBackend, EventStream, StreamEvent};
pub use manager::{ArtifactKey, DeploymentHandle, DeploymentManager};
pub use watcher::WatchOutcome;
