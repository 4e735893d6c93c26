//! HTTP client utilities for opening streams.

use reqwest::{Client, RequestBuilder};
use std::collections::HashMap;

use crate::client::StreamError;
use crate::options::{HttpTransport, TransportOptions};

/// Build a configured HTTP client from transport options.
///
/// This applies common configuration like timeouts and proxies.
pub fn build_http_client(
    transport_options: &TransportOptions<HttpTransport>,
) -> Result<Client, StreamError> {
    let mut builder = Client::builder();

    if let Some(timeout) = transport_options.timeout {
        builder = builder.timeout(timeout);
    }

    if let Some(proxy_url) = &transport_options.provider.proxy {
        let proxy = reqwest::Proxy::all(proxy_url)
            .map_err(|e| StreamError::Config(format!("invalid proxy {}: {}", proxy_url, e)))?;
        builder = builder.proxy(proxy);
    }

    builder
        .build()
        .map_err(|e| StreamError::Config(format!("cannot build HTTP client: {}", e)))
}

/// Add headers to a request, if any.
pub fn add_extra_headers(
    mut request: RequestBuilder,
    extra_headers: Option<&HashMap<String, String>>,
) -> RequestBuilder {
    if let Some(headers) = extra_headers {
        for (key, value) in headers {
            request = request.header(key, value);
        }
    }
    request
}

/// Resolve a request target against an optional base URL.
///
/// Absolute `http://` and `https://` targets are used as-is; anything else is
/// treated as a path under `base_url`.
///
/// # Example
/// ```
/// use sse_relay::http::resolve_url;
///
/// let url = resolve_url(Some("http://localhost:8000/api/v1/"), "/roles/process/stream").unwrap();
/// assert_eq!(url, "http://localhost:8000/api/v1/roles/process/stream");
/// ```
pub fn resolve_url(base_url: Option<&str>, target: &str) -> Result<String, StreamError> {
    if target.starts_with("http://") || target.starts_with("https://") {
        return Ok(target.to_string());
    }

    let base = base_url.ok_or_else(|| {
        StreamError::Config(format!("relative target {:?} requires a base URL", target))
    })?;

    Ok(format!(
        "{}/{}",
        base.trim_end_matches('/'),
        target.trim_start_matches('/')
    ))
}
