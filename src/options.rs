//! Transport configuration.

use std::collections::HashMap;
use std::time::Duration;

const ENV_BASE_URL: &str = "SSE_RELAY_BASE_URL";
const ENV_API_KEY: &str = "SSE_RELAY_API_KEY";
const ENV_PROXY: &str = "SSE_RELAY_PROXY";
const ENV_TIMEOUT_SECS: &str = "SSE_RELAY_TIMEOUT_SECS";

/// A secret string type for sensitive data like API keys.
/// Prevents accidental logging or display of secrets.
#[derive(Clone)]
pub struct SecretString(String);

impl SecretString {
    /// Create a new secret string.
    pub fn new(s: String) -> Self {
        Self(s)
    }

    /// Get the underlying secret value.
    pub fn expose_secret(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for SecretString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretString([REDACTED])")
    }
}

impl From<String> for SecretString {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for SecretString {
    fn from(s: &str) -> Self {
        Self::new(s.to_string())
    }
}

/// Generic transport options: fields shared by every transport plus the
/// transport-specific configuration in `provider`.
///
/// # Example
/// ```rust
/// use sse_relay::options::{HttpTransport, TransportOptions};
/// use std::time::Duration;
///
/// let options = TransportOptions {
///     timeout: Some(Duration::from_secs(30)),
///     provider: HttpTransport::default().with_base_url("http://localhost:8000/api/v1".to_string()),
/// };
/// assert!(options.provider.api_key.is_none());
/// ```
#[derive(Debug, Clone)]
pub struct TransportOptions<T> {
    /// Overall request timeout. A timeout that fires while the body is being
    /// read surfaces as a transport fault, not as end-of-stream.
    pub timeout: Option<Duration>,

    /// Transport-specific options
    pub provider: T,
}

/// HTTP-specific transport options.
/// Used as the provider field in `TransportOptions<HttpTransport>`.
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    /// Bearer token sent as `Authorization`
    pub api_key: Option<SecretString>,

    /// Base URL that relative request targets are joined onto
    pub base_url: Option<String>,

    /// HTTP proxy URL
    pub proxy: Option<String>,

    /// Additional HTTP headers to include in requests
    pub extra_headers: Option<HashMap<String, String>>,
}

impl HttpTransport {
    /// Create new HTTP transport options with an API key.
    pub fn new(api_key: impl Into<SecretString>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            base_url: None,
            proxy: None,
            extra_headers: None,
        }
    }

    /// Read `SSE_RELAY_BASE_URL`, `SSE_RELAY_API_KEY` and `SSE_RELAY_PROXY`.
    /// Unset or empty variables leave the field as `None`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            api_key: get(ENV_API_KEY).map(SecretString::new),
            base_url: get(ENV_BASE_URL),
            proxy: get(ENV_PROXY),
            extra_headers: None,
        }
    }

    /// Set the base URL.
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = Some(base_url);
        self
    }

    /// Set the proxy URL.
    pub fn with_proxy(mut self, proxy: String) -> Self {
        self.proxy = Some(proxy);
        self
    }

    /// Set extra headers.
    pub fn with_extra_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.extra_headers = Some(headers);
        self
    }

    /// Add a single extra header.
    pub fn with_header(mut self, key: String, value: String) -> Self {
        self.extra_headers
            .get_or_insert_with(HashMap::new)
            .insert(key, value);
        self
    }
}

impl<T> TransportOptions<T> {
    /// Create new transport options with transport-specific configuration.
    pub fn new(provider: T) -> Self {
        Self {
            timeout: None,
            provider,
        }
    }

    /// Set the timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl TransportOptions<HttpTransport> {
    /// HTTP transport options from the environment, including
    /// `SSE_RELAY_TIMEOUT_SECS`. A non-numeric timeout is ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let timeout = lookup(ENV_TIMEOUT_SECS)
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs);
        Self {
            timeout,
            provider: HttpTransport::from_lookup(lookup),
        }
    }
}

impl Default for TransportOptions<HttpTransport> {
    fn default() -> Self {
        Self::new(HttpTransport::default())
    }
}
