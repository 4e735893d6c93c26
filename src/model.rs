//! The request descriptor handed to a streaming call.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::client::StreamError;

/// HTTP method used to open the stream.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    #[default]
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
        }
    }
}

/// Everything needed to open one stream: where, how, and with what body.
///
/// `target` is either an absolute `http(s)://` URL or a path that gets joined
/// onto the transport's base URL.
///
/// # Example
/// ```rust
/// use sse_relay::model::StreamRequest;
/// use serde_json::json;
///
/// let request = StreamRequest::post("/roles/process/stream")
///     .with_body(json!({ "role_id": "life-coach", "query": "Where do I start?" }));
/// assert_eq!(request.target, "/roles/process/stream");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StreamRequest {
    /// Absolute URL or path relative to the transport base URL
    pub target: String,

    /// HTTP method
    pub method: Method,

    /// JSON body, sent with `Content-Type: application/json`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,

    /// Per-request headers, applied after the transport's extra headers
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,
}

impl StreamRequest {
    pub fn new(method: Method, target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            method,
            body: None,
            headers: HashMap::new(),
        }
    }

    pub fn post(target: impl Into<String>) -> Self {
        Self::new(Method::Post, target)
    }

    pub fn get(target: impl Into<String>) -> Self {
        Self::new(Method::Get, target)
    }

    /// Set the JSON body.
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Serialize any value as the JSON body.
    pub fn with_json<T: Serialize + ?Sized>(self, body: &T) -> Result<Self, StreamError> {
        Ok(self.with_body(serde_json::to_value(body)?))
    }

    /// Add a single header.
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }
}
