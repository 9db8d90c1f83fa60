//! Logging initialization tests
//!
//! The global subscriber can only be installed once per process, so this
//! binary holds a single test.

use fwdeploy::logs::{init_logging, LogOptions, LOG_FILE_NAME};
use fwdeploy::settings::Settings;
use fwdeploy::DeployerError;

#[test]
fn test_init_logging_writes_rolling_file() {
    let dir = tempfile::tempdir().unwrap();
    let settings = Settings::from_json(&format!(
        r#"{{"log_level": "debug", "log_dir": {}}}"#,
        serde_json::to_string(dir.path()).unwrap()
    ))
    .unwrap();
    let mut options = LogOptions::from(&settings);
    options.stdout = false;

    let guard = init_logging(options.clone()).unwrap();
    assert!(guard.is_some());
    tracing::info!("Deployment started: job-log-1");

    // A second global subscriber is refused
    assert!(matches!(init_logging(options), Err(DeployerError::ConfigError(_))));

    // Dropping the guard flushes the background writer
    drop(guard);

    let files: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect();
    assert_eq!(files.len(), 1);
    let name = files[0].file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with(LOG_FILE_NAME), "unexpected file {}", name);

    let contents = std::fs::read_to_string(&files[0]).unwrap();
    assert!(contents.contains("Deployment started: job-log-1"));
    assert!(!contents.contains("\x1b["));
}
