//! Log stream watcher for one job

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use futures::StreamExt;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::deploy::backend::{DeployBackend, StreamEvent};
use crate::deploy::fsm::StreamState;
use crate::deploy::reader::{JobSnapshot, LogStreamReader};
use crate::deploy::recorder::{self, RecordTarget, Recorder};
use crate::errors::DeployerError;
use crate::models::deployment::DeploymentArtifact;

/// Watcher options
#[derive(Debug, Clone)]
pub struct Options {
    /// Maximum wait for the stream to open
    pub connect_timeout: Duration,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
        }
    }
}

/// How a watched job ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchOutcome {
    Completed,
    Failed,
    Abandoned,
}

impl WatchOutcome {
    fn from_state(state: StreamState) -> Self {
        match state {
            StreamState::Completed => WatchOutcome::Completed,
            StreamState::Abandoned => WatchOutcome::Abandoned,
            _ => WatchOutcome::Failed,
        }
    }
}

/// Open the job's stream and follow it to a terminal state
///
/// Every stream event goes through `reader`; each change is published on
/// `updates`. A terminal event or failure leads to exactly one recorder call.
/// Resolving `cancel_signal` abandons the job without recording.
pub async fn run(
    options: &Options,
    reader: &mut LogStreamReader,
    backend: &dyn DeployBackend,
    recorder: &dyn Recorder,
    target: &RecordTarget,
    updates: &watch::Sender<JobSnapshot>,
    mut cancel_signal: Pin<Box<dyn Future<Output = ()> + Send>>,
) -> Result<WatchOutcome, DeployerError> {
    reader.begin_connect()?;
    updates.send_replace(reader.snapshot());

    let job_id = reader.job_id().to_string();
    let connect = tokio::time::timeout(options.connect_timeout, backend.open_stream(&job_id));

    let opened = tokio::select! {
        biased;
        _ = &mut cancel_signal => {
            reader.cancel();
            None
        }
        result = connect => {
            match result {
                Ok(Ok(stream)) => Some(stream),
                Ok(Err(e)) => {
                    let handed = reader.on_connect_failed(&e.to_string());
                    return Ok(finish(reader, recorder, target, updates, handed).await);
                }
                Err(_) => {
                    let message = DeployerError::ConnectTimeout(options.connect_timeout).to_string();
                    let handed = reader.on_connect_failed(&message);
                    return Ok(finish(reader, recorder, target, updates, handed).await);
                }
            }
        }
    };

    let Some(mut stream) = opened else {
        return Ok(finish(reader, recorder, target, updates, None).await);
    };

    reader.on_open();
    updates.send_replace(reader.snapshot());

    let handed = loop {
        tokio::select! {
            biased;
            _ = &mut cancel_signal => {
                reader.cancel();
                break None;
            }
            item = stream.next() => {
                let handed = match item {
                    Some(Ok(StreamEvent::Log(line))) => {
                        reader.on_log(&line);
                        None
                    }
                    Some(Ok(StreamEvent::Done(payload))) => reader.on_done(&payload),
                    Some(Ok(StreamEvent::Error(message))) => reader.on_error(&message),
                    Some(Err(e)) => reader.on_transport_error(&e.to_string()),
                    None => reader.on_transport_error("stream closed before completion"),
                };
                if handed.is_some() || reader.state().is_terminal() {
                    break handed;
                }
                updates.send_replace(reader.snapshot());
            }
        }
    };

    drop(stream);
    Ok(finish(reader, recorder, target, updates, handed).await)
}

async fn finish(
    reader: &mut LogStreamReader,
    recorder: &dyn Recorder,
    target: &RecordTarget,
    updates: &watch::Sender<JobSnapshot>,
    handed: Option<DeploymentArtifact>,
) -> WatchOutcome {
    if reader.close() {
        debug!("Log stream for job {} closed", reader.job_id());
    }
    updates.send_replace(reader.snapshot());

    let outcome = WatchOutcome::from_state(reader.state());
    info!("Job {} finished: {:?}", reader.job_id(), outcome);

    if let Some(artifact) = handed {
        recorder::record(recorder, target, &artifact).await;
    }
    outcome
}
