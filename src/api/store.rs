use crate::api::error::{ApiError, ApiResult};
use crate::api::types::StoredFile;
use bytes::Bytes;
use dashmap::DashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

/// Files received by the upload endpoint, indexed by folder.
///
/// Content is written under `storage_dir/<folder>/<pk>-<name>` when a storage
/// directory is configured; otherwise only the index is kept.
pub struct UploadStore {
    next_pk: AtomicU64,
    folders: DashMap<String, Vec<StoredFile>>,
    storage_dir: Option<PathBuf>,
}

impl UploadStore {
    pub fn new(storage_dir: Option<PathBuf>) -> Self {
        Self {
            next_pk: AtomicU64::new(1),
            folders: DashMap::new(),
            storage_dir,
        }
    }

    pub fn in_memory() -> Self {
        Self::new(None)
    }

    pub async fn save(&self, folder: &str, file_name: &str, data: Bytes) -> ApiResult<StoredFile> {
        if !is_valid_folder(folder) {
            return Err(ApiError::InvalidRequest(format!("Invalid folder: {folder}")));
        }
        let name = sanitize_file_name(file_name)
            .ok_or_else(|| ApiError::InvalidRequest(format!("Invalid file name: {file_name}")))?;

        let pk = self.next_pk.fetch_add(1, Ordering::SeqCst);

        if let Some(dir) = &self.storage_dir {
            let folder_dir = dir.join(folder);
            tokio::fs::create_dir_all(&folder_dir).await?;
            tokio::fs::write(folder_dir.join(format!("{pk}-{name}")), &data).await?;
        }

        let stored = StoredFile {
            pk,
            folder: folder.to_string(),
            name,
            size: data.len() as u64,
            uploaded_at: chrono::Utc::now(),
        };
        self.folders
            .entry(folder.to_string())
            .or_default()
            .push(stored.clone());

        Ok(stored)
    }

    pub fn list(&self, folder: &str) -> Vec<StoredFile> {
        self.folders
            .get(folder)
            .map(|files| files.clone())
            .unwrap_or_default()
    }

    pub fn count(&self) -> usize {
        self.folders.iter().map(|e| e.value().len()).sum()
    }
}

/// Folder names double as directory names.
pub(crate) fn is_valid_folder(folder: &str) -> bool {
    !folder.is_empty()
        && folder
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Last path component only, so names cannot escape the folder directory.
fn sanitize_file_name(name: &str) -> Option<String> {
    let name = name.rsplit(['/', '\\']).next()?.trim();
    if name.is_empty() || name == "." || name == ".." {
        return None;
    }
    Path::new(name)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_save_and_list() {
        let store = UploadStore::in_memory();
        let first = store.save("3", "a.txt", Bytes::from_static(b"aaa")).await.unwrap();
        let second = store.save("3", "b.txt", Bytes::from_static(b"b")).await.unwrap();
        store.save("4", "c.txt", Bytes::new()).await.unwrap();

        assert_ne!(first.pk, second.pk);
        assert_eq!(store.list("3").len(), 2);
        assert_eq!(store.list("3")[0].size, 3);
        assert!(store.list("99").is_empty());
        assert_eq!(store.count(), 3);
    }

    #[tokio::test]
    async fn test_writes_to_storage_dir() {
        let dir = TempDir::new().unwrap();
        let store = UploadStore::new(Some(dir.path().to_path_buf()));

        let stored = store
            .save("7", "../../etc/passwd", Bytes::from_static(b"x"))
            .await
            .unwrap();
        assert_eq!(stored.name, "passwd");

        let path = dir.path().join("7").join(format!("{}-passwd", stored.pk));
        assert_eq!(tokio::fs::read(path).await.unwrap(), b"x");
    }

    #[tokio::test]
    async fn test_rejects_bad_folder_and_name() {
        let store = UploadStore::in_memory();
        assert!(store.save("../x", "a.txt", Bytes::new()).await.is_err());
        assert!(store.save("1", "..", Bytes::new()).await.is_err());
        assert!(store.save("1", "dir/", Bytes::new()).await.is_err());
    }
}
