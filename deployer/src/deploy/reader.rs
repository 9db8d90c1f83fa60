//! Per-job log stream state
//!
//! `LogStreamReader` owns everything one job accumulates: the display
//! buffer, the artifact and the progress marker. It performs no I/O; the
//! watcher feeds it stream events and forwards what it hands back to the
//! recorder.

use deploy_api::{DeploymentStatus, DonePayload};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::deploy::extractor;
use crate::deploy::fsm::{StreamFsm, StreamSignal, StreamState};
use crate::deploy::progress::{ProgressStep, ProgressTracker};
use crate::errors::DeployerError;
use crate::models::deployment::{
    DeploymentArtifact, DeploymentJob, JobStatus, LogLine, LogLineKind, PartialArtifact,
};

/// Display line added when the stream opens
pub const CONNECTED_LINE: &str = "Connected to deployment log stream...";

const DEFAULT_ERROR: &str = "Error during deployment.";

/// Point-in-time view of a job for observers
#[derive(Debug, Clone, Serialize)]
pub struct JobSnapshot {
    pub job_id: String,
    pub status: JobStatus,
    pub stream_state: StreamState,
    pub lines: Vec<LogLine>,
    pub artifact: DeploymentArtifact,
    pub progress: Option<ProgressStep>,
    pub error: Option<String>,
}

/// Log stream reader for one job
#[derive(Debug)]
pub struct LogStreamReader {
    job: DeploymentJob,
    fsm: StreamFsm,
    lines: Vec<LogLine>,
    artifact: DeploymentArtifact,
    progress: ProgressTracker,
    handed_off: bool,
}

impl LogStreamReader {
    /// Create a reader for a started job
    pub fn new(job: DeploymentJob) -> Self {
        Self {
            job,
            fsm: StreamFsm::new(),
            lines: Vec::new(),
            artifact: DeploymentArtifact::default(),
            progress: ProgressTracker::new(),
            handed_off: false,
        }
    }

    pub fn job(&self) -> &DeploymentJob {
        &self.job
    }

    pub fn job_id(&self) -> &str {
        self.job.job_id()
    }

    pub fn state(&self) -> StreamState {
        self.fsm.state()
    }

    pub fn lines(&self) -> &[LogLine] {
        &self.lines
    }

    pub fn artifact(&self) -> &DeploymentArtifact {
        &self.artifact
    }

    pub fn progress(&self) -> &ProgressTracker {
        &self.progress
    }

    pub fn is_closed(&self) -> bool {
        self.fsm.is_closed()
    }

    /// Idle -> Connecting
    pub fn begin_connect(&mut self) -> Result<(), DeployerError> {
        self.fsm
            .process(StreamSignal::Open)
            .map_err(DeployerError::InvalidTransition)?;
        debug!("Opening log stream for job {}", self.job_id());
        Ok(())
    }

    /// Connecting -> Streaming
    pub fn on_open(&mut self) {
        if let Err(e) = self.fsm.process(StreamSignal::Connected) {
            debug!("Ignoring open signal for job {}: {}", self.job_id(), e);
            return;
        }
        info!("Log stream connected for job {}", self.job_id());
        self.job.advance(JobStatus::Streaming);
        self.lines.push(LogLine::new(LogLineKind::Info, CONNECTED_LINE));
    }

    /// A `log` event
    pub fn on_log(&mut self, text: &str) {
        if let Err(e) = self.fsm.process(StreamSignal::Log) {
            debug!("Ignoring log line for job {}: {}", self.job_id(), e);
            return;
        }
        self.lines.push(LogLine::new(LogLineKind::Received, text));
        self.artifact.raw_logs.push(text.to_string());
        self.progress.observe(text);

        let partial = extractor::extract(text);
        if !partial.is_empty() {
            debug!("Extracted {:?} from job {}", partial, self.job_id());
            self.artifact.absorb(partial);
        }
    }

    /// The terminal `done` event; hands back the artifact to record
    pub fn on_done(&mut self, payload: &str) -> Option<DeploymentArtifact> {
        if let Err(e) = self.fsm.process(StreamSignal::Done) {
            debug!("Ignoring done event for job {}: {}", self.job_id(), e);
            return None;
        }

        let (fields, output) = match serde_json::from_str::<DonePayload>(payload) {
            Ok(done) => {
                let output = done.output.clone().unwrap_or_default();
                (PartialArtifact::from(&done), output)
            }
            Err(_) => (PartialArtifact::default(), payload.to_string()),
        };
        self.artifact.absorb(fields);
        self.artifact.absorb(extractor::extract_text(&output));
        self.artifact.output = Some(output);
        self.artifact.status = DeploymentStatus::Success;
        self.job.advance(JobStatus::Success);

        info!(
            "Deployment {} succeeded (txhash: {:?}, code id: {:?}, contract: {:?})",
            self.job_id(),
            self.artifact.transaction_hash,
            self.artifact.code_id,
            self.artifact.contract_address
        );
        self.hand_off()
    }

    /// The named `error` event sent by the runner
    pub fn on_error(&mut self, message: &str) -> Option<DeploymentArtifact> {
        let message = if message.trim().is_empty() {
            DEFAULT_ERROR.to_string()
        } else {
            message.to_string()
        };
        self.fail(format!("Error: {}", message), message)
    }

    /// The connection broke after it was opened
    pub fn on_transport_error(&mut self, message: &str) -> Option<DeploymentArtifact> {
        let message = format!("Connection to log stream lost: {}", message);
        self.fail(format!("Error: {}", message), message)
    }

    /// The stream could not be opened at all; only the error is recorded
    pub fn on_connect_failed(&mut self, message: &str) -> Option<DeploymentArtifact> {
        if self.fsm.state() != StreamState::Connecting {
            debug!("Ignoring connect failure for job {} in {:?}", self.job_id(), self.fsm.state());
            return None;
        }
        let message = format!("Connection to log stream failed: {}", message);
        if let Err(e) = self.fsm.process(StreamSignal::Fail(message.clone())) {
            debug!("Ignoring connect failure for job {}: {}", self.job_id(), e);
            return None;
        }
        warn!("Job {}: {}", self.job_id(), message);
        self.job.advance(JobStatus::Error);
        self.lines.push(LogLine::new(LogLineKind::Error, format!("Error: {}", message)));
        self.artifact = DeploymentArtifact::failed(message);
        self.hand_off()
    }

    fn fail(&mut self, line: String, message: String) -> Option<DeploymentArtifact> {
        if let Err(e) = self.fsm.process(StreamSignal::Fail(message.clone())) {
            debug!("Ignoring failure for job {}: {}", self.job_id(), e);
            return None;
        }
        warn!("Deployment {} failed: {}", self.job_id(), message);
        self.lines.push(LogLine::new(LogLineKind::Error, line));
        self.artifact.status = DeploymentStatus::Error;
        self.artifact.error_message = Some(message);
        self.job.advance(JobStatus::Error);
        self.hand_off()
    }

    /// Discard the stream without recording; true if this call abandoned it
    pub fn cancel(&mut self) -> bool {
        let was_terminal = self.fsm.state().is_terminal();
        // Cancel is accepted from every state
        let _ = self.fsm.process(StreamSignal::Cancel);
        if was_terminal {
            return false;
        }
        info!("Log stream for job {} abandoned", self.job_id());
        true
    }

    /// Release the connection; true only for the first call after a terminal state
    pub fn close(&mut self) -> bool {
        self.fsm.close()
    }

    fn hand_off(&mut self) -> Option<DeploymentArtifact> {
        if self.handed_off {
            return None;
        }
        self.handed_off = true;
        Some(self.artifact.clone())
    }

    pub fn snapshot(&self) -> JobSnapshot {
        JobSnapshot {
            job_id: self.job_id().to_string(),
            status: self.job.status(),
            stream_state: self.fsm.state(),
            lines: self.lines.clone(),
            artifact: self.artifact.clone(),
            progress: self.progress.step().copied(),
            error: self.fsm.error().map(str::to_string),
        }
    }
}
