//! Streaming over plain HTTP with reqwest.
//!
//! The request is sent as JSON with `Accept: text/event-stream`; a successful
//! response body is handed to the frame decoder chunk by chunk.

use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use tracing::{debug, warn};

use crate::client::{ByteStream, StreamError, StreamingClient};
use crate::http::{add_extra_headers, build_http_client, resolve_url};
use crate::model::StreamRequest;
use crate::options::{HttpTransport, TransportOptions};

const EVENT_STREAM: &str = "text/event-stream";

/// Streaming client using HTTP transport.
#[derive(Debug, Clone, Default)]
pub struct HttpStreamClient {
    transport_options: TransportOptions<HttpTransport>,
}

impl HttpStreamClient {
    /// Client whose relative targets resolve against `base_url`.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            transport_options: TransportOptions::new(
                HttpTransport::default().with_base_url(base_url.into()),
            ),
        }
    }

    /// Client configured from `SSE_RELAY_*` environment variables.
    pub fn from_env() -> Self {
        Self {
            transport_options: TransportOptions::from_env(),
        }
    }
}

#[async_trait]
impl StreamingClient for HttpStreamClient {
    type TransportProvider = HttpTransport;

    async fn open(
        request: &StreamRequest,
        transport_options: &TransportOptions<Self::TransportProvider>,
    ) -> Result<ByteStream, StreamError> {
        let url = resolve_url(transport_options.provider.base_url.as_deref(), &request.target)?;
        let http_client = build_http_client(transport_options)?;

        let mut req = http_client
            .request(request.method.into(), &url)
            .header(ACCEPT, EVENT_STREAM);

        if let Some(api_key) = &transport_options.provider.api_key {
            req = req.header(AUTHORIZATION, format!("Bearer {}", api_key.expose_secret()));
        }

        req = add_extra_headers(req, transport_options.provider.extra_headers.as_ref());
        req = add_extra_headers(req, Some(&request.headers));

        if let Some(body) = &request.body {
            req = req.header(CONTENT_TYPE, "application/json").json(body);
        }

        debug!(method = %request.method, url = %url, "opening stream");

        let response = req.send().await.map_err(|e| {
            StreamError::TransportUnavailable(format!("request to {} failed: {}", url, e))
        })?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, url = %url, "stream request rejected");
            return Err(StreamError::Status { status, body });
        }

        Ok(response.bytes_stream().map_err(StreamError::from).boxed())
    }

    fn new(transport_options: TransportOptions<Self::TransportProvider>) -> Self {
        Self { transport_options }
    }

    fn transport_options(&self) -> &TransportOptions<Self::TransportProvider> {
        &self.transport_options
    }
}
