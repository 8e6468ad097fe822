pub mod config;
pub mod context;
pub mod error;

pub use config::UploadConfig;
pub use context::{destination_from_page_url, resolve_endpoint, HostContext};
pub use error::{HostError, HostResult};
