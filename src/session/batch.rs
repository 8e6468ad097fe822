use crate::metrics;
use crate::session::error::{SessionError, SessionResult};
use crate::session::state_machine::SessionStateMachine;
use crate::session::types::{SessionReport, SessionSignal, SessionSnapshot, TaskEvent, UploadTask};
use crate::transport::{
    AntiForgeryToken, DestinationId, ProgressReporter, UploadFile, UploadRequest, UploadTransport,
};
use futures::FutureExt;
use parking_lot::RwLock;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinSet;
use url::Url;

/// Host reaction seam for a batch session.
pub trait SessionObserver: Send + Sync {
    /// New progress text for the status element.
    fn on_progress(&self, _session_id: &str, _text: &str) {}

    /// Every task is terminal. Fired exactly once per session.
    fn on_all_done(&self, _report: &SessionReport) {}
}

/// Starts batch sessions: one concurrent upload per selected file.
pub struct BatchUploader<T: UploadTransport> {
    transport: Arc<T>,
    token: AntiForgeryToken,
    observer: Option<Arc<dyn SessionObserver>>,
    runtime: Option<Handle>,
}

impl<T: UploadTransport> Clone for BatchUploader<T> {
    fn clone(&self) -> Self {
        Self {
            transport: self.transport.clone(),
            token: self.token.clone(),
            observer: self.observer.clone(),
            runtime: self.runtime.clone(),
        }
    }
}

impl<T: UploadTransport> BatchUploader<T> {
    pub fn new(transport: Arc<T>, token: AntiForgeryToken) -> Self {
        Self {
            transport,
            token,
            observer: None,
            runtime: None,
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn SessionObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Run sessions on `runtime` instead of the ambient one, so sessions can
    /// be started from threads outside any runtime.
    pub fn with_runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Start a new session. Every file is submitted at once; there is no
    /// queueing, cancellation or retry.
    ///
    /// Fails with [`SessionError::NoRuntime`] when no runtime was configured
    /// and the caller is not inside one.
    pub fn start(
        &self,
        files: Vec<UploadFile>,
        destination: DestinationId,
        endpoint: Url,
    ) -> SessionResult<SessionHandle> {
        let runtime = match &self.runtime {
            Some(runtime) => runtime.clone(),
            None => Handle::try_current().map_err(|_| SessionError::NoRuntime)?,
        };

        let session_id = uuid::Uuid::new_v4().to_string();
        let total = files.len();

        let tasks = files
            .iter()
            .enumerate()
            .map(|(index, file)| UploadTask::new(index, file, destination.clone(), endpoint.clone()))
            .collect();
        let mut machine = SessionStateMachine::new(session_id.clone(), tasks);
        let initial = machine.start();

        tracing::info!(
            "Session {} started: {} file(s) to destination {} via {}",
            session_id,
            total,
            destination,
            endpoint
        );
        metrics::record_session_started(total);

        let (progress_tx, progress_rx) = watch::channel(machine.display().to_string());
        let (done_tx, done_rx) = oneshot::channel();
        let snapshot = Arc::new(RwLock::new(machine.snapshot()));
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let mut uploads = JoinSet::new();
        for (index, file) in files.into_iter().enumerate() {
            let request = UploadRequest {
                file,
                destination: destination.clone(),
                endpoint: endpoint.clone(),
                token: self.token.clone(),
            };
            uploads.spawn_on(
                run_upload(self.transport.clone(), index, request, event_tx.clone()),
                &runtime,
            );
        }
        drop(event_tx);

        let outputs = SessionOutputs {
            progress: progress_tx,
            snapshot: snapshot.clone(),
            done: Some(done_tx),
            observer: self.observer.clone(),
            started: Instant::now(),
        };
        runtime.spawn(drive_session(machine, initial, event_rx, uploads, outputs));

        Ok(SessionHandle {
            session_id,
            total,
            progress: progress_rx,
            snapshot,
            done: done_rx,
        })
    }
}

/// The host's view of a running session.
pub struct SessionHandle {
    session_id: String,
    total: usize,
    progress: watch::Receiver<String>,
    snapshot: Arc<RwLock<SessionSnapshot>>,
    done: oneshot::Receiver<SessionReport>,
}

impl SessionHandle {
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Current progress text.
    pub fn progress_text(&self) -> String {
        self.progress.borrow().clone()
    }

    /// Subscribe to progress text changes.
    pub fn progress_receiver(&self) -> watch::Receiver<String> {
        self.progress.clone()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot.read().clone()
    }

    /// Wait for the done signal.
    pub async fn wait(self) -> SessionResult<SessionReport> {
        self.done
            .await
            .map_err(|_| SessionError::Aborted(self.session_id))
    }
}

struct SessionOutputs {
    progress: watch::Sender<String>,
    snapshot: Arc<RwLock<SessionSnapshot>>,
    done: Option<oneshot::Sender<SessionReport>>,
    observer: Option<Arc<dyn SessionObserver>>,
    started: Instant,
}

impl SessionOutputs {
    fn emit(&mut self, session_id: &str, signals: Vec<SessionSignal>) {
        for signal in signals {
            match signal {
                SessionSignal::Progress(text) => {
                    tracing::debug!("Session {}: {}", session_id, text);
                    if let Some(observer) = &self.observer {
                        observer.on_progress(session_id, &text);
                    }
                    self.progress.send_replace(text);
                }
                SessionSignal::AllDone(report) => {
                    tracing::info!(
                        "Session {} done: {} succeeded, {} failed",
                        session_id,
                        report.succeeded.len(),
                        report.failed.len()
                    );
                    metrics::record_session_completed(&report, self.started.elapsed());
                    if let Some(observer) = &self.observer {
                        observer.on_all_done(&report);
                    }
                    if let Some(done) = self.done.take() {
                        let _ = done.send(report);
                    }
                }
            }
        }
    }
}

/// Owns the state machine for the lifetime of the session; all transitions
/// happen here, one event at a time.
async fn drive_session(
    mut machine: SessionStateMachine,
    initial: Vec<SessionSignal>,
    mut events: mpsc::UnboundedReceiver<TaskEvent>,
    mut uploads: JoinSet<()>,
    mut outputs: SessionOutputs,
) {
    let session_id = machine.session_id().to_string();
    outputs.emit(&session_id, initial);

    while !machine.is_done() {
        let Some(event) = events.recv().await else {
            tracing::warn!(
                "Session {} lost its upload tasks at {} / {}",
                session_id,
                machine.completed(),
                machine.total()
            );
            break;
        };

        match machine.apply(event) {
            Ok(signals) => {
                *outputs.snapshot.write() = machine.snapshot();
                outputs.emit(&session_id, signals);
            }
            Err(e) => tracing::warn!("Session {} ignored event: {}", session_id, e),
        }
    }

    while uploads.join_next().await.is_some() {}
}

async fn run_upload<T: UploadTransport>(
    transport: Arc<T>,
    index: usize,
    request: UploadRequest,
    events: mpsc::UnboundedSender<TaskEvent>,
) {
    let progress_events = events.clone();
    let reporter = ProgressReporter::new(move |progress| {
        let _ = progress_events.send(TaskEvent::Progress { index, progress });
    });

    let file_name = request.file.name.clone();
    let bytes = request.file.len();

    let outcome = AssertUnwindSafe(transport.upload(request, reporter))
        .catch_unwind()
        .await;

    let event = match outcome {
        Ok(Ok(_receipt)) => {
            metrics::record_upload_succeeded(bytes);
            TaskEvent::Succeeded { index }
        }
        Ok(Err(e)) => {
            tracing::warn!("Upload of {} failed: {}", file_name, e);
            metrics::record_upload_failed();
            TaskEvent::Failed {
                index,
                error: e.to_string(),
            }
        }
        Err(_) => {
            tracing::error!("Upload task for {} panicked", file_name);
            metrics::record_upload_failed();
            TaskEvent::Failed {
                index,
                error: "upload task panicked".to_string(),
            }
        }
    };

    let _ = events.send(event);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::types::TaskState;
    use crate::transport::mock::ScriptedTransport;
    use crate::transport::Identifier;
    use parking_lot::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingObserver {
        texts: Mutex<Vec<String>>,
        reports: Mutex<Vec<SessionReport>>,
    }

    impl SessionObserver for RecordingObserver {
        fn on_progress(&self, _session_id: &str, text: &str) {
            self.texts.lock().push(text.to_string());
        }

        fn on_all_done(&self, report: &SessionReport) {
            self.reports.lock().push(report.clone());
        }
    }

    fn endpoint() -> Url {
        Url::parse("http://localhost:8000/admin/files/upload/").unwrap()
    }

    fn files(names: &[&str]) -> Vec<UploadFile> {
        names
            .iter()
            .map(|name| UploadFile::new(*name, vec![1u8; 32]))
            .collect()
    }

    fn uploader(
        transport: Arc<ScriptedTransport>,
        observer: Arc<RecordingObserver>,
    ) -> BatchUploader<ScriptedTransport> {
        BatchUploader::new(transport, AntiForgeryToken::new("token")).with_observer(observer)
    }

    async fn wait_for_text(handle: &SessionHandle, expected: &str) {
        let mut progress = handle.progress_receiver();
        tokio::time::timeout(Duration::from_secs(5), progress.wait_for(|text| text == expected))
            .await
            .expect("timed out waiting for progress text")
            .expect("session driver dropped");
    }

    #[tokio::test]
    async fn test_all_files_uploaded() {
        let transport = Arc::new(ScriptedTransport::new());
        let observer = Arc::new(RecordingObserver::default());

        let handle = uploader(transport.clone(), observer.clone()).start(
            files(&["a.txt", "b.txt", "c.txt"]),
            Identifier::Numeric(3),
            endpoint(),
        )
        .unwrap();
        assert_eq!(handle.total(), 3);

        let report = handle.wait().await.unwrap();
        assert_eq!(report.total, 3);
        assert_eq!(report.succeeded.len(), 3);
        assert!(report.all_succeeded());
        assert_eq!(transport.calls(), 3);

        let texts = observer.texts.lock().clone();
        assert_eq!(texts.first().map(String::as_str), Some("0 / 3"));
        assert_eq!(texts.last().map(String::as_str), Some("3 / 3"));
        assert_eq!(observer.reports.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_requests_carry_destination_and_token() {
        let transport = Arc::new(ScriptedTransport::new());
        let observer = Arc::new(RecordingObserver::default());

        let handle = uploader(transport.clone(), observer).start(
            files(&["a.txt"]),
            Identifier::Numeric(12),
            endpoint(),
        )
        .unwrap();
        handle.wait().await.unwrap();

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].destination, Identifier::Numeric(12));
        assert_eq!(requests[0].token.as_str(), "token");
        assert_eq!(requests[0].endpoint, endpoint());
    }

    #[tokio::test]
    async fn test_empty_selection_completes_immediately() {
        let transport = Arc::new(ScriptedTransport::new());
        let observer = Arc::new(RecordingObserver::default());

        let handle = uploader(transport.clone(), observer.clone()).start(
            Vec::new(),
            Identifier::Numeric(1),
            endpoint(),
        )
        .unwrap();

        let report = handle.wait().await.unwrap();
        assert_eq!(report.total, 0);
        assert_eq!(report.completed(), 0);
        assert_eq!(transport.calls(), 0);
        assert_eq!(observer.reports.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_failure_does_not_block_siblings() {
        let transport = Arc::new(ScriptedTransport::new().fail("bad.bin", 500));
        let observer = Arc::new(RecordingObserver::default());

        let handle = uploader(transport, observer.clone()).start(
            files(&["good.txt", "bad.bin", "other.txt"]),
            Identifier::Numeric(1),
            endpoint(),
        )
        .unwrap();

        let report = handle.wait().await.unwrap();
        assert_eq!(report.succeeded.len(), 2);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].file_name, "bad.bin");
        assert!(report.failed[0].error.contains("500"));
        assert_eq!(observer.reports.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_panicking_upload_counts_as_failed() {
        let transport = Arc::new(ScriptedTransport::new().panic_on("boom.bin"));
        let observer = Arc::new(RecordingObserver::default());

        let handle = uploader(transport, observer).start(
            files(&["boom.bin", "fine.txt"]),
            Identifier::Numeric(1),
            endpoint(),
        )
        .unwrap();

        let report = handle.wait().await.unwrap();
        assert_eq!(report.completed(), 2);
        assert_eq!(report.failed[0].file_name, "boom.bin");
    }

    #[tokio::test]
    async fn test_out_of_order_completion() {
        let transport = Arc::new(ScriptedTransport::new());
        let gate_a = transport.gate("a.txt");
        let gate_b = transport.gate("b.txt");
        let gate_c = transport.gate("c.txt");
        let observer = Arc::new(RecordingObserver::default());

        let handle = uploader(transport, observer.clone()).start(
            files(&["a.txt", "b.txt", "c.txt"]),
            Identifier::Numeric(1),
            endpoint(),
        )
        .unwrap();

        gate_c.notify_one();
        wait_for_text(&handle, "1 / 3").await;
        let snapshot = handle.snapshot();
        assert_eq!(snapshot.tasks[2].state, TaskState::Succeeded);
        assert!(snapshot.tasks[0].state.is_in_flight());

        gate_a.notify_one();
        wait_for_text(&handle, "2 / 3").await;
        assert_eq!(handle.snapshot().tasks[0].state, TaskState::Succeeded);
        assert!(observer.reports.lock().is_empty());

        gate_b.notify_one();
        let report = handle.wait().await.unwrap();
        assert_eq!(report.completed(), 3);
        assert_eq!(observer.reports.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_percent_progress_text() {
        let transport = Arc::new(ScriptedTransport::new().progress("big.bin", &[(512, Some(1024))]));
        let gate_big = transport.gate("big.bin");
        let gate_small = transport.gate("small.txt");
        let observer = Arc::new(RecordingObserver::default());

        let handle = uploader(transport, observer.clone()).start(
            files(&["small.txt", "big.bin"]),
            Identifier::Numeric(1),
            endpoint(),
        )
        .unwrap();

        wait_for_text(&handle, "50% of 1 / 2").await;

        gate_small.notify_one();
        wait_for_text(&handle, "1 / 2").await;

        gate_big.notify_one();
        let report = handle.wait().await.unwrap();
        assert_eq!(report.completed(), 2);
        assert_eq!(observer.texts.lock().last().map(String::as_str), Some("2 / 2"));
    }

    #[test]
    fn test_start_outside_runtime_fails() {
        let transport = Arc::new(ScriptedTransport::new());
        let observer = Arc::new(RecordingObserver::default());

        let result = uploader(transport.clone(), observer).start(
            files(&["a.txt"]),
            Identifier::Numeric(1),
            endpoint(),
        );
        assert!(matches!(result, Err(SessionError::NoRuntime)));
        assert_eq!(transport.calls(), 0);
    }

    #[test]
    fn test_start_on_configured_runtime() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let transport = Arc::new(ScriptedTransport::new());
        let observer = Arc::new(RecordingObserver::default());

        let handle = uploader(transport.clone(), observer)
            .with_runtime(runtime.handle().clone())
            .start(files(&["a.txt", "b.txt"]), Identifier::Numeric(1), endpoint())
            .unwrap();

        let report = runtime.block_on(handle.wait()).unwrap();
        assert_eq!(report.succeeded.len(), 2);
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test]
    async fn test_sessions_are_independent() {
        let transport = Arc::new(ScriptedTransport::new());
        let observer = Arc::new(RecordingObserver::default());
        let uploader = uploader(transport.clone(), observer.clone());

        let first = uploader
            .start(files(&["a.txt"]), Identifier::Numeric(1), endpoint())
            .unwrap();
        let first_id = first.session_id().to_string();
        let first_report = first.wait().await.unwrap();

        let second = uploader
            .start(files(&["a.txt"]), Identifier::Numeric(1), endpoint())
            .unwrap();
        assert_ne!(second.session_id(), first_id);
        let second_report = second.wait().await.unwrap();

        assert_eq!(first_report.total, 1);
        assert_eq!(second_report.total, 1);
        assert_eq!(transport.calls(), 2);
        assert_eq!(observer.reports.lock().len(), 2);
    }
}
