pub mod error;
pub mod http;
#[cfg(test)]
pub(crate) mod mock;
pub mod types;

pub use error::{TransportError, TransportResult};
pub use http::HttpUploadTransport;
pub use types::{
    AntiForgeryToken, DestinationId, Identifier, ProgressReporter, TransferProgress, UploadFile,
    UploadReceipt, UploadRequest,
};

use async_trait::async_trait;

/// The network seam: submits one file and reports progress while doing so.
///
/// Implementations must resolve exactly once per call; a non-2xx answer or a
/// network failure is an `Err`.
#[async_trait]
pub trait UploadTransport: Send + Sync + 'static {
    async fn upload(
        &self,
        request: UploadRequest,
        reporter: ProgressReporter,
    ) -> TransportResult<UploadReceipt>;
}
