use crate::host::UploadConfig;
use crate::transport::error::{TransportError, TransportResult};
use crate::transport::types::{ProgressReporter, TransferProgress, UploadReceipt, UploadRequest};
use crate::transport::UploadTransport;
use async_trait::async_trait;
use bytes::Bytes;
use futures::{stream, Stream, StreamExt};
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client};

/// Multipart upload over HTTP(S).
///
/// The file part is streamed in `stream_chunk_size` pieces; every piece the
/// client pulls into the request is reported as progress.
#[derive(Clone)]
pub struct HttpUploadTransport {
    client: Client,
    config: UploadConfig,
}

impl HttpUploadTransport {
    pub fn new(config: UploadConfig) -> TransportResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &UploadConfig {
        &self.config
    }

    fn build_form(&self, request: &UploadRequest, reporter: ProgressReporter) -> Form {
        let file = &request.file;
        let body = Body::wrap_stream(progress_stream(
            file.content.clone(),
            self.config.stream_chunk_size,
            reporter,
        ));
        let part = Part::stream_with_length(body, file.len()).file_name(file.name.clone());

        Form::new()
            .text(
                self.config.token_field.clone(),
                request.token.as_str().to_string(),
            )
            .text(
                self.config.destination_field.clone(),
                request.destination.to_string(),
            )
            .part(self.config.file_field.clone(), part)
    }
}

#[async_trait]
impl UploadTransport for HttpUploadTransport {
    async fn upload(
        &self,
        request: UploadRequest,
        reporter: ProgressReporter,
    ) -> TransportResult<UploadReceipt> {
        let form = self.build_form(&request, reporter);

        let response = self
            .client
            .post(request.endpoint.clone())
            .header("X-Requested-With", "XMLHttpRequest")
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        tracing::debug!(
            "Uploaded {} ({} bytes) to {}",
            request.file.name,
            request.file.len(),
            request.endpoint
        );

        Ok(UploadReceipt {
            status: status.as_u16(),
            body,
        })
    }
}

/// Split `content` into pieces, reporting cumulative bytes as each piece is pulled.
fn progress_stream(
    content: Bytes,
    chunk_size: usize,
    reporter: ProgressReporter,
) -> impl Stream<Item = Result<Bytes, std::io::Error>> + Send + Sync + 'static {
    let total = content.len() as u64;
    let chunk_size = chunk_size.max(1);

    let mut pieces = Vec::with_capacity(content.len() / chunk_size + 1);
    let mut offset = 0;
    while offset < content.len() {
        let end = (offset + chunk_size).min(content.len());
        pieces.push(content.slice(offset..end));
        offset = end;
    }

    let mut sent = 0u64;
    stream::iter(pieces).map(move |piece| {
        sent += piece.len() as u64;
        reporter.report(TransferProgress {
            bytes_sent: sent,
            bytes_total: Some(total),
        });
        Ok(piece)
    })
}
