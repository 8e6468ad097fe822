use crate::host::error::{HostError, HostResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Field names and transport tuning shared by every upload component.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UploadConfig {
    /// Multipart field carrying the anti-forgery token
    pub token_field: String,

    /// Multipart field carrying the destination identifier
    pub destination_field: String,

    /// Multipart field carrying the file content
    pub file_field: String,

    /// Page query parameter holding the current destination
    pub destination_query_param: String,

    /// Upload endpoint, resolved against the page URL when relative
    pub endpoint: String,

    pub request_timeout_secs: u64,

    /// Size of the pieces the file body is streamed in; one progress report per piece
    pub stream_chunk_size: usize,

    pub user_agent: String,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            token_field: "csrfmiddlewaretoken".to_string(),
            destination_field: "folder".to_string(),
            file_field: "file".to_string(),
            destination_query_param: "folder__id__exact".to_string(),
            endpoint: "./upload/".to_string(),
            request_timeout_secs: 300,
            stream_chunk_size: 64 * 1024,
            user_agent: concat!("dropzone-upload/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl UploadConfig {
    pub fn from_toml_str(source: &str) -> HostResult<Self> {
        let config: UploadConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML config file. Missing keys fall back to defaults.
    pub fn load(path: impl AsRef<Path>) -> HostResult<Self> {
        let source = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&source)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    fn validate(&self) -> HostResult<()> {
        if self.stream_chunk_size == 0 {
            return Err(HostError::InvalidConfig(
                "stream_chunk_size must be greater than zero".into(),
            ));
        }
        for (key, value) in [
            ("token_field", &self.token_field),
            ("destination_field", &self.destination_field),
            ("file_field", &self.file_field),
        ] {
            if value.is_empty() {
                return Err(HostError::InvalidConfig(format!("{key} must not be empty")));
            }
        }
        Ok(())
    }
}
