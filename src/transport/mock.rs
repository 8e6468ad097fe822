//! Scripted transport for unit tests.

use crate::transport::error::{TransportError, TransportResult};
use crate::transport::types::{ProgressReporter, TransferProgress, UploadReceipt, UploadRequest};
use crate::transport::UploadTransport;
use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Notify;

#[derive(Clone)]
struct Script {
    progress: Vec<TransferProgress>,
    outcome: Result<Bytes, u16>,
    gate: Option<Arc<Notify>>,
    panics: bool,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            progress: Vec::new(),
            outcome: Ok(Bytes::from_static(b"{\"success\": true}")),
            gate: None,
            panics: false,
        }
    }
}

/// Per-file scripted outcomes. Files without a script succeed immediately.
#[derive(Default)]
pub struct ScriptedTransport {
    scripts: Mutex<HashMap<String, Script>>,
    requests: Mutex<Vec<UploadRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, file: &str, body: &str) -> Self {
        self.scripts.lock().entry(file.to_string()).or_default().outcome =
            Ok(Bytes::from(body.to_string()));
        self
    }

    pub fn fail(self, file: &str, status: u16) -> Self {
        self.scripts.lock().entry(file.to_string()).or_default().outcome = Err(status);
        self
    }

    pub fn panic_on(self, file: &str) -> Self {
        self.scripts.lock().entry(file.to_string()).or_default().panics = true;
        self
    }

    pub fn progress(self, file: &str, updates: &[(u64, Option<u64>)]) -> Self {
        self.scripts.lock().entry(file.to_string()).or_default().progress = updates
            .iter()
            .map(|&(bytes_sent, bytes_total)| TransferProgress {
                bytes_sent,
                bytes_total,
            })
            .collect();
        self
    }

    /// Hold the upload of `file` until the returned `Notify` is signalled.
    pub fn gate(&self, file: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.scripts.lock().entry(file.to_string()).or_default().gate = Some(gate.clone());
        gate
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn requests(&self) -> Vec<UploadRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl UploadTransport for ScriptedTransport {
    async fn upload(
        &self,
        request: UploadRequest,
        reporter: ProgressReporter,
    ) -> TransportResult<UploadReceipt> {
        let script = self
            .scripts
            .lock()
            .get(&request.file.name)
            .cloned()
            .unwrap_or_default();
        self.requests.lock().push(request);

        for update in &script.progress {
            reporter.report(*update);
        }
        if let Some(gate) = script.gate {
            gate.notified().await;
        }
        if script.panics {
            panic!("scripted transport panic");
        }

        match script.outcome {
            Ok(body) => Ok(UploadReceipt { status: 200, body }),
            Err(status) => Err(TransportError::Status {
                status,
                body: String::new(),
            }),
        }
    }
}
