//! Logging configuration

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt,
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

use crate::errors::DeployerError;
use crate::settings::Settings;

/// Base file name of the rolling log; the appender adds a date suffix
pub const LOG_FILE_NAME: &str = "fwdeploy.log";

/// Default verbosity when `RUST_LOG` is unset
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    #[serde(alias = "warning")]
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = DeployerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_json::from_value(serde_json::Value::String(s.to_lowercase()))
            .map_err(|_| DeployerError::ConfigError(format!("Invalid log level: {}", s)))
    }
}

/// Where and how the deployer logs
#[derive(Debug, Clone)]
pub struct LogOptions {
    pub log_level: LogLevel,
    pub stdout: bool,
    /// Directory for the daily rolling file, if any
    pub log_dir: Option<PathBuf>,
    pub json_format: bool,
}

impl From<&Settings> for LogOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            log_level: settings.log_level,
            stdout: true,
            log_dir: settings.log_dir.clone(),
            json_format: settings.json_logs,
        }
    }
}

/// Initialize logging
///
/// When file output is enabled the returned guard flushes the background
/// writer on drop and must be kept alive by the caller.
pub fn init_logging(options: LogOptions) -> Result<Option<WorkerGuard>, DeployerError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(options.log_level.as_str()));

    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();

    if options.stdout {
        if options.json_format {
            layers.push(fmt::layer().json().boxed());
        } else {
            layers.push(fmt::layer().boxed());
        }
    }

    let mut guard = None;
    if let Some(log_dir) = &options.log_dir {
        let appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_NAME);
        let (writer, worker_guard) = tracing_appender::non_blocking(appender);
        layers.push(fmt::layer().with_ansi(false).with_writer(writer).boxed());
        guard = Some(worker_guard);
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init()
        .map_err(|e| DeployerError::ConfigError(e.to_string()))?;

    Ok(guard)
}
