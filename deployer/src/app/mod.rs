//! Application wiring

pub mod options;

pub use options::DeployerOptions;
