//! Active deployment management
//!
//! Tracks the job currently attached to each generated artifact (one
//! conversation message) and makes sure an artifact never has two open log
//! streams: deploying it again abandons the previous job's stream first.
//! Jobs share nothing; each watcher task owns its reader and drops its entry
//! once the job is closed and recorded.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::app::options::DeployerOptions;
use crate::deploy::backend::DeployBackend;
use crate::deploy::initiator;
use crate::deploy::reader::{JobSnapshot, LogStreamReader};
use crate::deploy::recorder::{RecordTarget, Recorder};
use crate::deploy::watcher::{self, WatchOutcome};
use crate::errors::DeployerError;
use crate::http::client::HttpClient;

/// The generated artifact a deployment belongs to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactKey {
    pub conversation_id: String,
    pub message_id: String,
}

impl ArtifactKey {
    pub fn new(conversation_id: impl Into<String>, message_id: impl Into<String>) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            message_id: message_id.into(),
        }
    }
}

/// Caller's handle on a running deployment
pub struct DeploymentHandle {
    job_id: String,
    updates: watch::Receiver<JobSnapshot>,
    task: JoinHandle<Result<WatchOutcome, DeployerError>>,
}

impl DeploymentHandle {
    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    /// Latest published state of the job
    pub fn snapshot(&self) -> JobSnapshot {
        self.updates.borrow().clone()
    }

    /// Receiver notified on every change of the job
    pub fn subscribe(&self) -> watch::Receiver<JobSnapshot> {
        self.updates.clone()
    }

    /// Wait for the job to end, including its record attempt
    pub async fn wait(self) -> Result<WatchOutcome, DeployerError> {
        self.task
            .await
            .map_err(|e| DeployerError::Internal(format!("Watcher task failed: {}", e)))?
    }
}

struct ActiveJob {
    job_id: String,
    cancel_tx: Option<oneshot::Sender<()>>,
    updates: watch::Receiver<JobSnapshot>,
}

impl ActiveJob {
    fn is_live(&self) -> bool {
        !self.updates.borrow().stream_state.is_terminal()
    }

    fn cancel(&mut self) -> bool {
        match self.cancel_tx.take() {
            Some(tx) => tx.send(()).is_ok(),
            None => false,
        }
    }

    /// Resolve once the watcher has reached a terminal state
    async fn closed(mut updates: watch::Receiver<JobSnapshot>) {
        // An error means the watcher is gone, which is just as final
        let _ = updates.wait_for(|s| s.stream_state.is_terminal()).await;
    }
}

/// Deployment manager
pub struct DeploymentManager {
    backend: Arc<dyn DeployBackend>,
    recorder: Arc<dyn Recorder>,
    options: watcher::Options,
    jobs: Arc<Mutex<HashMap<ArtifactKey, ActiveJob>>>,
}

impl DeploymentManager {
    /// Create a new deployment manager
    pub fn new(
        backend: Arc<dyn DeployBackend>,
        recorder: Arc<dyn Recorder>,
        options: watcher::Options,
    ) -> Self {
        Self {
            backend,
            recorder,
            options,
            jobs: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Wire HTTP collaborators from options
    pub fn from_options(options: &DeployerOptions) -> Result<Self, DeployerError> {
        let deploy_client = HttpClient::new(&options.deploy_root_url, options.request_timeout)?;
        let mut api_client = HttpClient::new(&options.api_root_url, options.request_timeout)?;
        if let Some(token) = options.api_token.clone() {
            api_client = api_client.with_token(token);
        }

        Ok(Self::new(
            Arc::new(deploy_client),
            Arc::new(api_client),
            options.watcher.clone(),
        ))
    }

    /// Start a job for the artifact and begin watching its log stream
    ///
    /// Any still-open stream of an earlier attempt for the same artifact is
    /// abandoned (and awaited) before the new stream is opened.
    pub async fn deploy(
        &self,
        key: ArtifactKey,
        source_code: &str,
        config: &serde_json::Value,
    ) -> Result<DeploymentHandle, DeployerError> {
        let job = initiator::start(self.backend.as_ref(), source_code, config).await?;
        let job_id = job.job_id().to_string();

        if let Some(previous) = self.take(&key) {
            info!(
                "Abandoning job {} before watching {} for message {}",
                previous.0, job_id, key.message_id
            );
            ActiveJob::closed(previous.1).await;
        }

        let reader = LogStreamReader::new(job);
        let (updates_tx, updates_rx) = watch::channel(reader.snapshot());
        let (cancel_tx, cancel_rx) = oneshot::channel::<()>();

        let raced = {
            let mut jobs = self.jobs.lock().unwrap_or_else(|e| e.into_inner());
            if jobs.values().any(|j| j.job_id == job_id && j.is_live()) {
                error!("Deploy runner returned an id that is already active: {}", job_id);
                return Err(DeployerError::ProtocolViolation(format!(
                    "Duplicate deploymentId {}",
                    job_id
                )));
            }
            let entry = ActiveJob {
                job_id: job_id.clone(),
                cancel_tx: Some(cancel_tx),
                updates: updates_rx.clone(),
            };
            jobs.insert(key.clone(), entry).map(|mut raced| {
                warn!(
                    "Concurrent deploy for message {}, abandoning job {}",
                    key.message_id, raced.job_id
                );
                raced.cancel();
                raced.updates
            })
        };
        if let Some(updates) = raced {
            ActiveJob::closed(updates).await;
        }

        let target = RecordTarget {
            job_id: job_id.clone(),
            conversation_id: key.conversation_id.clone(),
            message_id: key.message_id.clone(),
        };
        let jobs = self.jobs.clone();
        let backend = self.backend.clone();
        let recorder = self.recorder.clone();
        let options = self.options.clone();

        let task = tokio::spawn(async move {
            let mut reader = reader;
            let outcome = watcher::run(
                &options,
                &mut reader,
                backend.as_ref(),
                recorder.as_ref(),
                &target,
                &updates_tx,
                Box::pin(async move {
                    // A dropped sender means the manager is gone; abandon too
                    let _ = cancel_rx.await;
                }),
            )
            .await;
            release(&jobs, &key, &target.job_id);
            outcome
        });

        Ok(DeploymentHandle {
            job_id,
            updates: updates_rx,
            task,
        })
    }

    /// Abandon the live job of an artifact; true if one was cancelled
    pub fn cancel(&self, key: &ArtifactKey) -> bool {
        let mut jobs = self.jobs.lock().unwrap_or_else(|e| e.into_inner());
        match jobs.get_mut(key) {
            Some(job) if job.is_live() => job.cancel(),
            _ => false,
        }
    }

    /// Abandon a live job by id; true if one was cancelled
    pub fn cancel_job(&self, job_id: &str) -> bool {
        let mut jobs = self.jobs.lock().unwrap_or_else(|e| e.into_inner());
        jobs.values_mut()
            .find(|j| j.job_id == job_id && j.is_live())
            .map(|j| j.cancel())
            .unwrap_or(false)
    }

    /// Latest state of the job attached to an artifact
    pub fn snapshot(&self, key: &ArtifactKey) -> Option<JobSnapshot> {
        let jobs = self.jobs.lock().unwrap_or_else(|e| e.into_inner());
        jobs.get(key).map(|j| j.updates.borrow().clone())
    }

    /// Jobs whose stream has not reached a terminal state
    pub fn active_jobs(&self) -> Vec<JobSnapshot> {
        let jobs = self.jobs.lock().unwrap_or_else(|e| e.into_inner());
        jobs.values()
            .filter(|j| j.is_live())
            .map(|j| j.updates.borrow().clone())
            .collect()
    }

    /// Abandon every live job and wait for their streams to close
    pub async fn shutdown(&self) {
        info!("Shutting down deployment manager...");
        let drained: Vec<(String, watch::Receiver<JobSnapshot>)> = {
            let mut jobs = self.jobs.lock().unwrap_or_else(|e| e.into_inner());
            jobs.drain()
                .map(|(_, mut job)| {
                    job.cancel();
                    (job.job_id, job.updates)
                })
                .collect()
        };
        for (job_id, updates) in drained {
            ActiveJob::closed(updates).await;
            debug!("Job {} closed", job_id);
        }
    }

    fn take(&self, key: &ArtifactKey) -> Option<(String, watch::Receiver<JobSnapshot>)> {
        let mut jobs = self.jobs.lock().unwrap_or_else(|e| e.into_inner());
        let mut previous = jobs.remove(key)?;
        previous.cancel();
        Some((previous.job_id, previous.updates))
    }
}

/// Forget a finished job unless its key already belongs to a newer one
fn release(jobs: &Mutex<HashMap<ArtifactKey, ActiveJob>>, key: &ArtifactKey, job_id: &str) {
    let mut jobs = jobs.lock().unwrap_or_else(|e| e.into_inner());
    if jobs.get(key).is_some_and(|j| j.job_id == job_id) {
        jobs.remove(key);
        debug!("Released job {}", job_id);
    }
}
