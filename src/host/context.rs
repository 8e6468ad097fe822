use crate::host::config::UploadConfig;
use crate::host::error::HostResult;
use crate::transport::{AntiForgeryToken, DestinationId, Identifier};
use url::Url;

/// Everything the host page hands to the upload components: the current
/// destination (if any), the anti-forgery token and the upload endpoint.
#[derive(Debug, Clone)]
pub struct HostContext {
    pub destination: Option<DestinationId>,
    pub token: AntiForgeryToken,
    pub endpoint: Url,
}

impl HostContext {
    pub fn new(destination: Option<DestinationId>, token: AntiForgeryToken, endpoint: Url) -> Self {
        Self {
            destination,
            token,
            endpoint,
        }
    }

    /// Build the context from the page URL: the destination is read from the
    /// configured query parameter and the endpoint is resolved against the page.
    pub fn from_page_url(
        page_url: &Url,
        token: AntiForgeryToken,
        config: &UploadConfig,
    ) -> HostResult<Self> {
        let endpoint = resolve_endpoint(page_url, &config.endpoint)?;
        let destination = destination_from_page_url(page_url, &config.destination_query_param);

        if destination.is_none() {
            tracing::debug!(
                "No {} in {}, drop zone stays inert",
                config.destination_query_param,
                page_url
            );
        }

        Ok(Self::new(destination, token, endpoint))
    }

    pub fn has_destination(&self) -> bool {
        self.destination.is_some()
    }
}

/// Numeric destination from a page query parameter. Non-numeric or empty
/// values are ignored.
pub fn destination_from_page_url(page_url: &Url, param: &str) -> Option<DestinationId> {
    page_url
        .query_pairs()
        .find(|(key, _)| key == param)
        .and_then(|(_, value)| value.parse::<u64>().ok())
        .map(Identifier::Numeric)
}

/// Resolve `endpoint` against `page_url`; absolute endpoints are returned as is.
pub fn resolve_endpoint(page_url: &Url, endpoint: &str) -> HostResult<Url> {
    Ok(page_url.join(endpoint)?)
}
