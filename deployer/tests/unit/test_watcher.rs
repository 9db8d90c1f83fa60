//! Watcher and manager unit tests against in-memory collaborators

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use deploy_api::DeploymentStatus;
use futures::stream::{self, StreamExt};
use serde_json::json;
use tokio::sync::{oneshot, watch, Barrier};

use fwdeploy::deploy::backend::{DeployBackend, EventStream, StreamEvent};
use fwdeploy::deploy::fsm::StreamState;
use fwdeploy::deploy::initiator;
use fwdeploy::deploy::reader::LogStreamReader;
use fwdeploy::deploy::recorder::{RecordTarget, Recorder};
use fwdeploy::deploy::watcher::{self, WatchOutcome};
use fwdeploy::models::deployment::{DeploymentArtifact, DeploymentJob};
use fwdeploy::models::generated::GeneratedArtifact;
use fwdeploy::{ArtifactKey, DeployerError, DeploymentManager};

const HASH_A: &str = "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";
const HASH_B: &str = "BBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBB";

/// What the stream does after its scripted events
#[derive(Clone, Copy)]
enum Tail {
    End,
    Hold,
    Break,
}

#[derive(Clone, Copy)]
enum Open {
    Stream(Tail),
    Refuse,
    Hang,
}

struct ScriptedBackend {
    events: Vec<StreamEvent>,
    open: Open,
    fixed_id: Option<String>,
    /// Yield to the scheduler before every scripted event
    interleave: bool,
    /// Holds every start until this many are in flight
    start_gate: Option<Barrier>,
    started: AtomicUsize,
    opened: AtomicUsize,
    live: Arc<AtomicUsize>,
    max_live: AtomicUsize,
}

impl ScriptedBackend {
    fn new(events: Vec<StreamEvent>, open: Open) -> Self {
        Self {
            events,
            open,
            fixed_id: None,
            interleave: false,
            start_gate: None,
            started: AtomicUsize::new(0),
            opened: AtomicUsize::new(0),
            live: Arc::new(AtomicUsize::new(0)),
            max_live: AtomicUsize::new(0),
        }
    }
}

/// Counts a stream as open until it is dropped
struct LiveStream(Arc<AtomicUsize>);

impl Drop for LiveStream {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl DeployBackend for ScriptedBackend {
    async fn start_job(
        &self,
        _code: &str,
        _config: &serde_json::Value,
    ) -> Result<String, DeployerError> {
        let n = self.started.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.start_gate {
            gate.wait().await;
        }
        Ok(self.fixed_id.clone().unwrap_or_else(|| format!("job-{}", n)))
    }

    async fn open_stream(&self, _job_id: &str) -> Result<EventStream, DeployerError> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        let events = stream::iter(self.events.clone().into_iter().map(Ok));
        let scripted: EventStream = match self.open {
            Open::Stream(Tail::End) => events.boxed(),
            Open::Stream(Tail::Hold) => events.chain(stream::pending()).boxed(),
            Open::Stream(Tail::Break) => events
                .chain(stream::once(async {
                    Err(DeployerError::StreamFailed("connection reset".to_string()))
                }))
                .boxed(),
            Open::Refuse => return Err(DeployerError::Transport("refused".to_string())),
            Open::Hang => return std::future::pending().await,
        };

        let scripted = if self.interleave {
            scripted
                .then(|item| async move {
                    tokio::task::yield_now().await;
                    item
                })
                .boxed()
        } else {
            scripted
        };

        let now = self.live.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_live.fetch_max(now, Ordering::SeqCst);
        let guard = LiveStream(self.live.clone());
        Ok(scripted
            .map(move |item| {
                let _held = &guard;
                item
            })
            .boxed())
    }
}

#[derive(Default)]
struct CountingRecorder {
    saved: Mutex<Vec<(RecordTarget, DeploymentArtifact)>>,
    fail: bool,
}

impl CountingRecorder {
    fn saved(&self) -> Vec<(RecordTarget, DeploymentArtifact)> {
        self.saved.lock().unwrap().clone()
    }
}

#[async_trait]
impl Recorder for CountingRecorder {
    async fn save(
        &self,
        target: &RecordTarget,
        artifact: &DeploymentArtifact,
    ) -> Result<(), DeployerError> {
        self.saved.lock().unwrap().push((target.clone(), artifact.clone()));
        if self.fail {
            return Err(DeployerError::Transport("api down".to_string()));
        }
        Ok(())
    }
}

fn target() -> RecordTarget {
    RecordTarget {
        job_id: "job-0".to_string(),
        conversation_id: "conv-1".to_string(),
        message_id: "msg-1".to_string(),
    }
}

fn reader() -> LogStreamReader {
    LogStreamReader::new(DeploymentJob::new("job-0", "code", json!({"name": "Token"})))
}

fn log(text: &str) -> StreamEvent {
    StreamEvent::Log(text.to_string())
}

async fn watch_with(
    backend: &ScriptedBackend,
    recorder: &CountingRecorder,
    options: watcher::Options,
) -> (WatchOutcome, LogStreamReader) {
    let mut reader = reader();
    let (updates, _rx) = watch::channel(reader.snapshot());
    let outcome = watcher::run(
        &options,
        &mut reader,
        backend,
        recorder,
        &target(),
        &updates,
        Box::pin(std::future::pending::<()>()),
    )
    .await
    .unwrap();
    (outcome, reader)
}

#[tokio::test]
async fn test_watch_done_merges_fallback_only() {
    let backend = ScriptedBackend::new(
        vec![
            log(&format!("txhash: {}", HASH_A)),
            StreamEvent::Done(json!({"txhash": HASH_B, "codeId": "5"}).to_string()),
        ],
        Open::Stream(Tail::Hold),
    );
    let recorder = CountingRecorder::default();

    let (outcome, reader) = watch_with(&backend, &recorder, watcher::Options::default()).await;

    assert_eq!(outcome, WatchOutcome::Completed);
    assert!(reader.is_closed());
    let saved = recorder.saved();
    assert_eq!(saved.len(), 1);
    let (saved_target, artifact) = &saved[0];
    assert_eq!(saved_target, &target());
    assert_eq!(artifact.status, DeploymentStatus::Success);
    assert_eq!(artifact.transaction_hash.as_deref(), Some(HASH_A));
    assert_eq!(artifact.code_id.as_deref(), Some("5"));
    assert_eq!(artifact.raw_logs.len(), 1);
}

#[tokio::test]
async fn test_watch_immediate_error_records_once() {
    let backend = ScriptedBackend::new(
        vec![
            StreamEvent::Error("Compilation failed".to_string()),
            StreamEvent::Done("{}".to_string()),
        ],
        Open::Stream(Tail::End),
    );
    let recorder = CountingRecorder::default();

    let (outcome, reader) = watch_with(&backend, &recorder, watcher::Options::default()).await;

    assert_eq!(outcome, WatchOutcome::Failed);
    assert_eq!(reader.state(), StreamState::Failed);
    let saved = recorder.saved();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].1.status, DeploymentStatus::Error);
    assert_eq!(saved[0].1.error_message.as_deref(), Some("Compilation failed"));
    assert!(saved[0].1.raw_logs.is_empty());
}

#[tokio::test]
async fn test_watch_connect_failure_records_minimal_error() {
    let backend = ScriptedBackend::new(vec![], Open::Refuse);
    let recorder = CountingRecorder::default();

    let (outcome, reader) = watch_with(&backend, &recorder, watcher::Options::default()).await;

    assert_eq!(outcome, WatchOutcome::Failed);
    assert_eq!(reader.lines().len(), 1);
    let saved = recorder.saved();
    assert_eq!(saved.len(), 1);
    let artifact = &saved[0].1;
    assert_eq!(artifact.status, DeploymentStatus::Error);
    assert!(artifact.raw_logs.is_empty());
    assert_eq!(
        artifact.error_message.as_deref(),
        Some("Connection to log stream failed: Transport error: refused")
    );
}

#[tokio::test]
async fn test_watch_connect_timeout() {
    let backend = ScriptedBackend::new(vec![], Open::Hang);
    let recorder = CountingRecorder::default();
    let options = watcher::Options {
        connect_timeout: Duration::from_millis(20),
    };

    let (outcome, _reader) = watch_with(&backend, &recorder, options).await;

    assert_eq!(outcome, WatchOutcome::Failed);
    let saved = recorder.saved();
    assert_eq!(saved.len(), 1);
    assert!(saved[0].1.error_message.as_deref().unwrap().contains("Timed out"));
}

#[tokio::test]
async fn test_watch_stream_end_without_done_fails() {
    let backend = ScriptedBackend::new(vec![log("Compiling")], Open::Stream(Tail::End));
    let recorder = CountingRecorder::default();

    let (outcome, _reader) = watch_with(&backend, &recorder, watcher::Options::default()).await;

    assert_eq!(outcome, WatchOutcome::Failed);
    let saved = recorder.saved();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].1.raw_logs, vec!["Compiling"]);
    assert_eq!(
        saved[0].1.error_message.as_deref(),
        Some("Connection to log stream lost: stream closed before completion")
    );
}

#[tokio::test]
async fn test_watch_transport_break_keeps_logs() {
    let backend = ScriptedBackend::new(
        vec![log(&format!("txhash: {}", HASH_A))],
        Open::Stream(Tail::Break),
    );
    let recorder = CountingRecorder::default();

    let (outcome, _reader) = watch_with(&backend, &recorder, watcher::Options::default()).await;

    assert_eq!(outcome, WatchOutcome::Failed);
    let saved = recorder.saved();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].1.transaction_hash.as_deref(), Some(HASH_A));
    assert!(saved[0].1.error_message.as_deref().unwrap().contains("connection reset"));
}

#[tokio::test]
async fn test_watch_recorder_failure_keeps_outcome() {
    let backend = ScriptedBackend::new(vec![StreamEvent::Done("{}".to_string())], Open::Stream(Tail::End));
    let recorder = CountingRecorder {
        fail: true,
        ..Default::default()
    };

    let (outcome, _reader) = watch_with(&backend, &recorder, watcher::Options::default()).await;

    assert_eq!(outcome, WatchOutcome::Completed);
    assert_eq!(recorder.saved().len(), 1);
}

#[tokio::test]
async fn test_watch_cancel_never_records() {
    let backend = ScriptedBackend::new(vec![log("Compiling")], Open::Stream(Tail::Hold));
    let recorder = CountingRecorder::default();

    let mut reader = reader();
    let (updates, mut rx) = watch::channel(reader.snapshot());
    let (cancel_tx, cancel_rx) = oneshot::channel::<()>();
    tokio::spawn(async move {
        let _ = rx.wait_for(|s| s.artifact.raw_logs.len() == 1).await;
        let _ = cancel_tx.send(());
    });

    let outcome = watcher::run(
        &watcher::Options::default(),
        &mut reader,
        &backend,
        &recorder,
        &target(),
        &updates,
        Box::pin(async move {
            let _ = cancel_rx.await;
        }),
    )
    .await
    .unwrap();

    assert_eq!(outcome, WatchOutcome::Abandoned);
    assert!(recorder.saved().is_empty());
    assert!(reader.is_closed());
    assert_eq!(updates.borrow().stream_state, StreamState::Abandoned);
}

#[tokio::test]
async fn test_watch_cancel_while_connecting() {
    let backend = ScriptedBackend::new(vec![], Open::Hang);
    let recorder = CountingRecorder::default();

    let mut reader = reader();
    let (updates, _rx) = watch::channel(reader.snapshot());
    let outcome = watcher::run(
        &watcher::Options::default(),
        &mut reader,
        &backend,
        &recorder,
        &target(),
        &updates,
        Box::pin(async {}),
    )
    .await
    .unwrap();

    assert_eq!(outcome, WatchOutcome::Abandoned);
    assert!(recorder.saved().is_empty());
}

fn manager(backend: ScriptedBackend) -> (DeploymentManager, Arc<ScriptedBackend>, Arc<CountingRecorder>) {
    let backend = Arc::new(backend);
    let recorder = Arc::new(CountingRecorder::default());
    let manager = DeploymentManager::new(backend.clone(), recorder.clone(), watcher::Options::default());
    (manager, backend, recorder)
}

#[tokio::test]
async fn test_manager_records_completed_job() {
    let (manager, _backend, recorder) = manager(ScriptedBackend::new(
        vec![log(&format!("txhash: {}", HASH_B)), StreamEvent::Done("{}".to_string())],
        Open::Stream(Tail::End),
    ));

    let handle = manager
        .deploy(ArtifactKey::new("conv-1", "msg-1"), "code", &json!({"name": "Token"}))
        .await
        .unwrap();
    assert_eq!(handle.job_id(), "job-0");
    assert_eq!(handle.wait().await.unwrap(), WatchOutcome::Completed);

    let saved = recorder.saved();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].0, target());
    assert_eq!(saved[0].1.transaction_hash.as_deref(), Some(HASH_B));
    assert!(manager.active_jobs().is_empty());
}

#[tokio::test]
async fn test_manager_missing_artifact_makes_no_request() {
    let (manager, backend, _recorder) =
        manager(ScriptedBackend::new(vec![], Open::Stream(Tail::End)));
    let key = ArtifactKey::new("conv-1", "msg-1");

    let result = manager.deploy(key.clone(), "", &json!({"name": "Token"})).await;
    assert!(matches!(result, Err(DeployerError::MissingArtifact)));

    let result = manager.deploy(key, "code", &json!({})).await;
    assert!(matches!(result, Err(DeployerError::MissingArtifact)));

    assert_eq!(backend.started.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_manager_redeploy_abandons_previous_stream() {
    let (manager, backend, recorder) =
        manager(ScriptedBackend::new(vec![log("Compiling")], Open::Stream(Tail::Hold)));
    let key = ArtifactKey::new("conv-1", "msg-1");

    let first = manager.deploy(key.clone(), "code", &json!({"a": 1})).await.unwrap();
    let mut first_updates = first.subscribe();
    first_updates
        .wait_for(|s| s.stream_state == StreamState::Streaming)
        .await
        .unwrap();

    let second = manager.deploy(key.clone(), "code", &json!({"a": 1})).await.unwrap();
    assert_ne!(first.job_id(), second.job_id());
    assert_eq!(first.snapshot().stream_state, StreamState::Abandoned);
    assert_eq!(first.wait().await.unwrap(), WatchOutcome::Abandoned);
    // The finished first job must not evict its successor's entry
    let current = manager.snapshot(&key).map(|s| s.job_id);
    assert_eq!(current.as_deref(), Some(second.job_id()));

    assert!(manager.cancel(&key));
    assert_eq!(second.wait().await.unwrap(), WatchOutcome::Abandoned);
    assert!(!manager.cancel(&key));
    assert!(manager.snapshot(&key).is_none());

    assert_eq!(backend.opened.load(Ordering::SeqCst), 2);
    assert!(recorder.saved().is_empty());
}

#[tokio::test]
async fn test_manager_rejects_duplicate_job_id() {
    let mut backend = ScriptedBackend::new(vec![], Open::Stream(Tail::Hold));
    backend.fixed_id = Some("same".to_string());
    let (manager, _backend, _recorder) = manager(backend);

    let first = manager
        .deploy(ArtifactKey::new("conv-1", "msg-1"), "code", &json!({"a": 1}))
        .await
        .unwrap();
    let result = manager
        .deploy(ArtifactKey::new("conv-1", "msg-2"), "code", &json!({"a": 1}))
        .await;
    assert!(matches!(result, Err(DeployerError::ProtocolViolation(_))));

    assert!(manager.cancel_job(first.job_id()));
    assert_eq!(first.wait().await.unwrap(), WatchOutcome::Abandoned);
}

#[tokio::test]
async fn test_manager_shutdown_abandons_all() {
    let (manager, _backend, recorder) =
        manager(ScriptedBackend::new(vec![log("Compiling")], Open::Stream(Tail::Hold)));

    let a = manager
        .deploy(ArtifactKey::new("conv-1", "msg-1"), "code", &json!({"a": 1}))
        .await
        .unwrap();
    let b = manager
        .deploy(ArtifactKey::new("conv-2", "msg-1"), "code", &json!({"a": 1}))
        .await
        .unwrap();

    manager.shutdown().await;

    assert_eq!(a.wait().await.unwrap(), WatchOutcome::Abandoned);
    assert_eq!(b.wait().await.unwrap(), WatchOutcome::Abandoned);
    assert!(manager.active_jobs().is_empty());
    assert!(recorder.saved().is_empty());
}

#[tokio::test]
async fn test_manager_releases_finished_jobs() {
    let mut events: Vec<StreamEvent> = (0..100).map(|i| log(&format!("step {}", i))).collect();
    events.push(StreamEvent::Done("{}".to_string()));
    let (manager, _backend, recorder) = manager(ScriptedBackend::new(events, Open::Stream(Tail::End)));

    let mut handles = Vec::new();
    for n in 0..20 {
        let key = ArtifactKey::new("conv-1", format!("msg-{}", n));
        handles.push(manager.deploy(key, "code", &json!({"a": 1})).await.unwrap());
    }
    for handle in handles {
        assert_eq!(handle.wait().await.unwrap(), WatchOutcome::Completed);
    }

    assert_eq!(recorder.saved().len(), 20);
    assert!(manager.active_jobs().is_empty());
    for n in 0..20 {
        assert!(manager.snapshot(&ArtifactKey::new("conv-1", format!("msg-{}", n))).is_none());
    }
}

#[tokio::test]
async fn test_manager_releases_failed_job() {
    let (manager, _backend, recorder) =
        manager(ScriptedBackend::new(vec![log("Compiling")], Open::Stream(Tail::Break)));
    let key = ArtifactKey::new("conv-1", "msg-1");

    let handle = manager.deploy(key.clone(), "code", &json!({"a": 1})).await.unwrap();
    assert_eq!(handle.wait().await.unwrap(), WatchOutcome::Failed);

    assert_eq!(recorder.saved().len(), 1);
    assert!(manager.snapshot(&key).is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_manager_concurrent_deploys_keep_one_stream() {
    let mut backend = ScriptedBackend::new(vec![log("Compiling")], Open::Stream(Tail::Hold));
    backend.start_gate = Some(Barrier::new(2));
    let (manager, backend, recorder) = manager(backend);
    let manager = Arc::new(manager);
    let key = ArtifactKey::new("conv-1", "msg-1");

    let spawn_deploy = || {
        let manager = manager.clone();
        let key = key.clone();
        tokio::spawn(async move { manager.deploy(key, "code", &json!({"a": 1})).await })
    };
    let a = spawn_deploy();
    let b = spawn_deploy();
    let a = a.await.unwrap().unwrap();
    let b = b.await.unwrap().unwrap();

    // Whichever landed first was abandoned before the other returned
    let (displaced, survivor) = if a.snapshot().stream_state == StreamState::Abandoned {
        (a, b)
    } else {
        (b, a)
    };
    assert_eq!(displaced.snapshot().stream_state, StreamState::Abandoned);
    survivor
        .subscribe()
        .wait_for(|s| s.stream_state == StreamState::Streaming)
        .await
        .unwrap();

    assert_eq!(manager.active_jobs().len(), 1);
    let current = manager.snapshot(&key).map(|s| s.job_id);
    assert_eq!(current.as_deref(), Some(survivor.job_id()));
    assert_eq!(backend.max_live.load(Ordering::SeqCst), 1);

    manager.shutdown().await;
    assert_eq!(displaced.wait().await.unwrap(), WatchOutcome::Abandoned);
    assert_eq!(survivor.wait().await.unwrap(), WatchOutcome::Abandoned);
    assert_eq!(backend.live.load(Ordering::SeqCst), 0);
    assert!(recorder.saved().is_empty());
}

const GENERATED_ANSWER: &str = "Here is your token contract.\n\n\
```rust\npub fn instantiate() {}\n```\n\n\
Deploy it with this config:\n\n\
```json\n{\"name\": \"Token\", \"symbol\": \"TKN\"}\n```\n";

#[tokio::test]
async fn test_start_generated_submits_fenced_blocks() {
    let backend = ScriptedBackend::new(vec![], Open::Stream(Tail::End));
    let generated = GeneratedArtifact::from_markdown(GENERATED_ANSWER);

    let job = initiator::start_generated(&backend, &generated).await.unwrap();

    assert_eq!(job.job_id(), "job-0");
    assert_eq!(job.source_code(), "pub fn instantiate() {}");
    assert_eq!(job.config(), &json!({"name": "Token", "symbol": "TKN"}));
    assert_eq!(backend.started.load(Ordering::SeqCst), 1);
    assert_eq!(backend.opened.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_start_generated_without_config_makes_no_request() {
    let backend = ScriptedBackend::new(vec![], Open::Stream(Tail::End));

    let no_config = GeneratedArtifact::from_markdown("```rust\npub fn instantiate() {}\n```\n");
    let result = initiator::start_generated(&backend, &no_config).await;
    assert!(matches!(result, Err(DeployerError::MissingArtifact)));

    let empty_config =
        GeneratedArtifact::from_markdown("```rust\npub fn instantiate() {}\n```\n```json\n{}\n```\n");
    let result = initiator::start_generated(&backend, &empty_config).await;
    assert!(matches!(result, Err(DeployerError::MissingArtifact)));

    assert_eq!(backend.started.load(Ordering::SeqCst), 0);
}

fn job_target(job_id: &str) -> RecordTarget {
    RecordTarget {
        job_id: job_id.to_string(),
        conversation_id: "conv-1".to_string(),
        message_id: format!("msg-{}", job_id),
    }
}

async fn run_job(backend: &ScriptedBackend, recorder: &CountingRecorder, job_id: &str) -> WatchOutcome {
    let mut reader = LogStreamReader::new(DeploymentJob::new(job_id, "code", json!({"a": 1})));
    let (updates, _rx) = watch::channel(reader.snapshot());
    watcher::run(
        &watcher::Options::default(),
        &mut reader,
        backend,
        recorder,
        &job_target(job_id),
        &updates,
        Box::pin(std::future::pending::<()>()),
    )
    .await
    .unwrap()
}

fn recorded_for(recorder: &CountingRecorder, job_id: &str) -> Vec<DeploymentArtifact> {
    recorder
        .saved()
        .into_iter()
        .filter(|(target, _)| target.job_id == job_id)
        .map(|(_, artifact)| artifact)
        .collect()
}

#[tokio::test]
async fn test_concurrent_watchers_match_solo_runs() {
    let script_a = vec![
        log("Compiling token v0.1.0"),
        log(&format!("txhash: {}", HASH_A)),
        log(r#"- key: code_id value: "11""#),
        log(&format!("txhash: {}", HASH_B)),
        StreamEvent::Done(json!({"contractAddress": "sei1alpha", "codeId": "99"}).to_string()),
    ];
    let script_b = vec![
        log(r#"- key: code_id value: "22""#),
        log(&format!("txhash: {}", HASH_B)),
        log("Instantiating contract"),
        log(&format!("txhash: {}", HASH_A)),
        StreamEvent::Error("Out of gas".to_string()),
    ];
    let backend = |events: &Vec<StreamEvent>| {
        let mut backend = ScriptedBackend::new(events.clone(), Open::Stream(Tail::End));
        backend.interleave = true;
        backend
    };

    let solo = CountingRecorder::default();
    assert_eq!(run_job(&backend(&script_a), &solo, "job-a").await, WatchOutcome::Completed);
    assert_eq!(run_job(&backend(&script_b), &solo, "job-b").await, WatchOutcome::Failed);

    let shared = CountingRecorder::default();
    let (backend_a, backend_b) = (backend(&script_a), backend(&script_b));
    let (outcome_a, outcome_b) = tokio::join!(
        run_job(&backend_a, &shared, "job-a"),
        run_job(&backend_b, &shared, "job-b"),
    );
    assert_eq!(outcome_a, WatchOutcome::Completed);
    assert_eq!(outcome_b, WatchOutcome::Failed);

    for job_id in ["job-a", "job-b"] {
        let alone = recorded_for(&solo, job_id);
        let together = recorded_for(&shared, job_id);
        assert_eq!(alone.len(), 1);
        assert_eq!(together, alone, "artifact of {} differs when run concurrently", job_id);
    }
    let a = recorded_for(&shared, "job-a").remove(0);
    assert_eq!(a.transaction_hash.as_deref(), Some(HASH_A));
    assert_eq!(a.code_id.as_deref(), Some("11"));
    assert_eq!(a.contract_address.as_deref(), Some("sei1alpha"));
    let b = recorded_for(&shared, "job-b").remove(0);
    assert_eq!(b.transaction_hash.as_deref(), Some(HASH_B));
    assert_eq!(b.code_id.as_deref(), Some("22"));
    assert_eq!(b.error_message.as_deref(), Some("Out of gas"));
}
