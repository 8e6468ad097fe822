use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Upload rejected with status {status}: {body}")]
    Status { status: u16, body: String },
}

impl TransportError {
    /// HTTP status of a rejected upload, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            TransportError::Request(e) => e.status().map(|s| s.as_u16()),
        }
    }
}

pub type TransportResult<T> = Result<T, TransportError>;
