use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Answer of `POST /upload/`; `pk` and `name` feed the inline widget.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub success: bool,
    pub pk: u64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredFile {
    pub pk: u64,
    pub folder: String,
    pub name: String,
    pub size: u64,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FolderListing {
    pub folder: String,
    pub files: Vec<StoredFile>,
    pub count: usize,
}
