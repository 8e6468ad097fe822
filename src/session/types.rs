use crate::transport::{DestinationId, TransferProgress, UploadFile};
use serde::{Deserialize, Serialize};
use url::Url;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum TaskState {
    Pending,
    InFlight,
    Succeeded,
    Failed { error: String },
}

impl TaskState {
    pub fn is_in_flight(&self) -> bool {
        matches!(self, TaskState::InFlight)
    }
}

/// One file's upload operation and its state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadTask {
    pub index: usize,
    pub file_name: String,
    pub destination: DestinationId,
    pub endpoint: Url,
    pub state: TaskState,
    pub bytes_sent: u64,
    pub bytes_total: Option<u64>,
    pub started_at: Option<i64>,
    pub finished_at: Option<i64>,
}

impl UploadTask {
    pub fn new(index: usize, file: &UploadFile, destination: DestinationId, endpoint: Url) -> Self {
        Self {
            index,
            file_name: file.name.clone(),
            destination,
            endpoint,
            state: TaskState::Pending,
            bytes_sent: 0,
            bytes_total: None,
            started_at: None,
            finished_at: None,
        }
    }
}

/// Reports delivered by an upload task to its session.
#[derive(Debug, Clone)]
pub enum TaskEvent {
    Progress {
        index: usize,
        progress: TransferProgress,
    },
    Succeeded {
        index: usize,
    },
    Failed {
        index: usize,
        error: String,
    },
}

impl TaskEvent {
    pub fn index(&self) -> usize {
        match self {
            TaskEvent::Progress { index, .. }
            | TaskEvent::Succeeded { index }
            | TaskEvent::Failed { index, .. } => *index,
        }
    }
}

/// Output of a session transition, to be forwarded to the host.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionSignal {
    Progress(String),
    AllDone(SessionReport),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FailedUpload {
    pub file_name: String,
    pub error: String,
}

/// Delivered exactly once, when every task of a session is terminal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionReport {
    pub session_id: String,
    pub total: usize,
    pub succeeded: Vec<String>,
    pub failed: Vec<FailedUpload>,
    pub started_at: i64,
    pub finished_at: i64,
}

impl SessionReport {
    pub fn completed(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Point-in-time view of a running session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub session_id: String,
    pub total: usize,
    pub completed: usize,
    pub progress_text: String,
    pub tasks: Vec<UploadTask>,
}
