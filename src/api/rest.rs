use crate::api::error::{ApiError, ApiResult};
use crate::api::store::{is_valid_folder, UploadStore};
use crate::api::types::*;
use crate::host::UploadConfig;
use crate::metrics;
use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use std::sync::Arc;

/// Shared state of the upload endpoint.
#[derive(Clone)]
pub struct ApiState {
    pub store: Arc<UploadStore>,
    /// Expected anti-forgery token; `None` accepts any.
    pub token: Option<String>,
    pub config: UploadConfig,
}

pub struct RestApi {
    state: ApiState,
    max_upload_bytes: usize,
}

impl RestApi {
    pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 100 * 1024 * 1024;

    pub fn new(store: UploadStore, token: Option<String>, config: UploadConfig) -> Self {
        Self {
            state: ApiState {
                store: Arc::new(store),
                token,
                config,
            },
            max_upload_bytes: Self::DEFAULT_MAX_UPLOAD_BYTES,
        }
    }

    pub fn with_max_upload_bytes(mut self, max_upload_bytes: usize) -> Self {
        self.max_upload_bytes = max_upload_bytes;
        self
    }

    pub fn store(&self) -> Arc<UploadStore> {
        self.state.store.clone()
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/health", get(health_check))
            .route("/upload/", post(upload_file))
            .route("/api/v1/folders/:folder/files", get(list_folder))
            .layer(DefaultBodyLimit::max(self.max_upload_bytes))
            .with_state(self.state.clone())
    }
}

async fn health_check() -> &'static str {
    "OK"
}

/// Accepts one file per request, mirroring the batch and inline clients:
/// token, folder and file arrive as multipart fields named by [`UploadConfig`].
async fn upload_file(
    State(state): State<ApiState>,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<UploadResponse>)> {
    let mut token: Option<String> = None;
    let mut folder: Option<String> = None;
    let mut file: Option<(String, Bytes)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::InvalidRequest(format!("Failed to read multipart field: {e}")))?
    {
        let name = field.name().unwrap_or("").to_string();

        if name == state.config.token_field {
            token = Some(field.text().await.map_err(|e| {
                ApiError::InvalidRequest(format!("Failed to read token: {e}"))
            })?);
        } else if name == state.config.destination_field {
            folder = Some(field.text().await.map_err(|e| {
                ApiError::InvalidRequest(format!("Failed to read folder: {e}"))
            })?);
        } else if name == state.config.file_field {
            let filename = field
                .file_name()
                .ok_or_else(|| ApiError::InvalidRequest("No filename provided".to_string()))?
                .to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| ApiError::InvalidRequest(format!("Failed to read file data: {e}")))?;
            file = Some((filename, data));
        } else {
            tracing::debug!("Ignoring multipart field {}", name);
        }
    }

    if let Some(expected) = &state.token {
        if token.as_deref() != Some(expected.as_str()) {
            metrics::record_upload_rejected("bad_token");
            return Err(ApiError::Forbidden);
        }
    }

    let folder = folder.filter(|f| !f.is_empty()).ok_or_else(|| {
        metrics::record_upload_rejected("no_folder");
        ApiError::InvalidRequest("No folder provided".to_string())
    })?;
    let (filename, data) = file.ok_or_else(|| {
        metrics::record_upload_rejected("no_file");
        ApiError::InvalidRequest("No file uploaded".to_string())
    })?;

    let stored = state
        .store
        .save(&folder, &filename, data)
        .await
        .inspect_err(|_| metrics::record_upload_rejected("store"))?;
    metrics::record_file_received(stored.size);

    tracing::info!(
        "Stored {} ({} bytes) in folder {} as pk {}",
        stored.name,
        stored.size,
        stored.folder,
        stored.pk
    );

    Ok((
        StatusCode::OK,
        Json(UploadResponse {
            success: true,
            pk: stored.pk,
            name: stored.name,
        }),
    ))
}

async fn list_folder(
    State(state): State<ApiState>,
    Path(folder): Path<String>,
) -> ApiResult<Json<FolderListing>> {
    if !is_valid_folder(&folder) {
        return Err(ApiError::InvalidRequest(format!("Invalid folder: {folder}")));
    }

    // A folder nothing was stored in lists as empty.
    let files = state.store.list(&folder);

    Ok(Json(FolderListing {
        count: files.len(),
        folder,
        files,
    }))
}
