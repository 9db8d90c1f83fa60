//! HTTP collaborators: deploy runner and conversation API

pub mod client;
pub mod conversations;
pub mod deployments;
pub mod sse;

pub use client::HttpClient;
