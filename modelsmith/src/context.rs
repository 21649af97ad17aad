//! Request accessor capability used by generated contexts.
//!
//! A generated context owns a boxed [`RequestAccessor`] and implements the
//! trait itself by forwarding, so handlers can use the typed fields and the
//! raw request through the same value.

use std::collections::HashMap;
use std::fmt::Debug;

use serde_json::Value;

use crate::error::ResponseError;

/// Read access to a raw request and write access to its response.
pub trait RequestAccessor: Debug + Send {
    /// Returns the raw path or query parameter value.
    fn param(&self, name: &str) -> Option<&str>;

    /// Returns the raw header value.
    fn header(&self, name: &str) -> Option<&str>;

    /// Returns the decoded request body, if one was sent.
    fn payload(&self) -> Option<&Value>;

    /// Sets a response header.
    fn set_header(&mut self, name: &str, value: &str);

    /// Writes the response status and body.
    fn respond(&mut self, status: u16, body: Vec<u8>) -> Result<(), ResponseError>;

    /// Returns the response written so far, for accessors that keep it.
    fn sent(&self) -> Option<&SentResponse> {
        None
    }
}

/// A response captured by [`MemoryRequest`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SentResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl SentResponse {
    /// Decodes the body as JSON.
    pub fn json(&self) -> Result<Value, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers.get("Content-Type").map(String::as_str)
    }
}

/// An in-memory request, used to drive generated contexts without a server.
///
/// Header lookups are case-insensitive.
///
/// ## Examples
///
/// ```
/// use modelsmith::{MemoryRequest, RequestAccessor};
///
/// let mut request = MemoryRequest::new()
///     .with_param("count", "42")
///     .with_header("X-Account", "7");
///
/// assert_eq!(request.param("count"), Some("42"));
/// assert_eq!(request.header("x-account"), Some("7"));
///
/// request.respond(204, Vec::new()).unwrap();
/// assert_eq!(request.sent().map(|r| r.status), Some(204));
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryRequest {
    params: HashMap<String, String>,
    headers: HashMap<String, String>,
    payload: Option<Value>,
    response_headers: HashMap<String, String>,
    sent: Option<SentResponse>,
}

impl MemoryRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.into().to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Boxes the request for a generated context constructor.
    pub fn boxed(self) -> Box<dyn RequestAccessor> {
        Box::new(self)
    }
}

impl RequestAccessor for MemoryRequest {
    fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    fn payload(&self) -> Option<&Value> {
        self.payload.as_ref()
    }

    fn set_header(&mut self, name: &str, value: &str) {
        self.response_headers
            .insert(name.to_string(), value.to_string());
    }

    fn respond(&mut self, status: u16, body: Vec<u8>) -> Result<(), ResponseError> {
        if let Some(previous) = &self.sent {
            return Err(ResponseError::AlreadySent(previous.status));
        }
        tracing::debug!(status, bytes = body.len(), "response sent");
        self.sent = Some(SentResponse {
            status,
            headers: self.response_headers.clone(),
            body,
        });
        Ok(())
    }

    fn sent(&self) -> Option<&SentResponse> {
        self.sent.as_ref()
    }
}
