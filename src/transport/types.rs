use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use url::Url;

/// Opaque identifier used for destinations (folders, form rows) and for
/// records returned by the upload endpoint. Numeric and textual ids are both
/// accepted on the wire.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(untagged)]
pub enum Identifier {
    Numeric(u64),
    Text(String),
}

pub type DestinationId = Identifier;

impl Identifier {
    /// Parse a form value. Empty input yields `None`.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.is_empty() {
            return None;
        }
        Some(match value.parse::<u64>() {
            Ok(n) => Identifier::Numeric(n),
            Err(_) => Identifier::Text(value.to_string()),
        })
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identifier::Numeric(n) => write!(f, "{n}"),
            Identifier::Text(s) => f.write_str(s),
        }
    }
}

/// Anti-forgery token handed over by the host page.
#[derive(Clone, PartialEq, Eq)]
pub struct AntiForgeryToken(String);

impl AntiForgeryToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Keep the token out of logs.
impl fmt::Debug for AntiForgeryToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AntiForgeryToken(***)")
    }
}

/// A locally selected file: a name plus its content.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub name: String,
    pub content: Bytes,
}

impl UploadFile {
    pub fn new(name: impl Into<String>, content: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    /// Read a file from disk, naming it after the last path component.
    pub async fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
        Ok(Self::new(name, content))
    }

    pub fn len(&self) -> u64 {
        self.content.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

/// One progress report from the transport. `bytes_total` is `None` when the
/// transport cannot compute the length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferProgress {
    pub bytes_sent: u64,
    pub bytes_total: Option<u64>,
}

impl TransferProgress {
    /// Rounded percentage, only when the total is known and non-zero.
    pub fn percent(&self) -> Option<u32> {
        match self.bytes_total {
            Some(total) if total > 0 => {
                let ratio = self.bytes_sent.min(total) as f64 / total as f64;
                Some((ratio * 100.0).round() as u32)
            }
            _ => None,
        }
    }
}

/// Callback the transport uses to report upload progress.
#[derive(Clone)]
pub struct ProgressReporter {
    inner: Arc<dyn Fn(TransferProgress) + Send + Sync>,
}

impl ProgressReporter {
    pub fn new(f: impl Fn(TransferProgress) + Send + Sync + 'static) -> Self {
        Self { inner: Arc::new(f) }
    }

    /// Reporter that discards every update.
    pub fn noop() -> Self {
        Self::new(|_| {})
    }

    pub fn report(&self, progress: TransferProgress) {
        (self.inner)(progress)
    }
}

impl fmt::Debug for ProgressReporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressReporter").finish_non_exhaustive()
    }
}

/// Everything needed to submit a single file.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub file: UploadFile,
    pub destination: DestinationId,
    pub endpoint: Url,
    pub token: AntiForgeryToken,
}

/// Successful (2xx) response from the upload endpoint.
#[derive(Debug, Clone)]
pub struct UploadReceipt {
    pub status: u16,
    pub body: Bytes,
}

impl UploadReceipt {
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_slice(&self.body)
    }
}
