//! Handler function trait, invocation context, and the value and error types
//! crossing the user-function boundary.

use crate::event::{self, Event};
use crate::http::{Method, PlinthRequest, PlinthResponse};
use async_trait::async_trait;
use tracing::warn;

/// Per-request context handed to the handler function.
///
/// Built fresh for every request and discarded once the response is
/// produced. An absent event is an expected state, not an error.
#[derive(Debug, Clone)]
pub struct InvocationContext {
    /// The raw inbound request.
    pub request: PlinthRequest,
    /// The decoded event envelope, when the request carried a valid one.
    pub event: Option<Event>,
}

impl InvocationContext {
    /// Build a context from an inbound request. Never fails.
    ///
    /// POST requests get a decode attempt; a malformed or absent envelope is
    /// logged and leaves the context without an event. Other methods never
    /// attempt a decode.
    pub fn from_request(request: PlinthRequest) -> Self {
        let event = if request.method == Method::Post {
            match event::decode(&request.headers, request.body.as_ref()) {
                Ok(event) => Some(event),
                Err(err) => {
                    warn!("No event envelope attached: {}", err);
                    None
                }
            }
        } else {
            None
        };
        Self { request, event }
    }

    /// Whether the request carried a well-formed event envelope.
    pub fn has_event(&self) -> bool {
        self.event.is_some()
    }
}

/// A handler function hosted by the runtime.
///
/// `init` runs at most once per process, strictly before the first `handle`;
/// `handle` runs once per request.
#[async_trait]
pub trait PlinthFunction: Send + Sync {
    /// One-time setup, run before the first request is handled.
    async fn init(&self) -> Result<(), PlinthError> {
        Ok(())
    }

    /// Handle a single invocation.
    async fn handle(&self, context: InvocationContext) -> Result<FunctionValue, PlinthError>;
}

/// What a handler function may return.
#[derive(Debug, Clone)]
pub enum FunctionValue {
    /// A structured event; the runtime encodes it in binary transport mode.
    Event(Event),
    /// Any other response, passed through to the client verbatim.
    Http(PlinthResponse),
}

impl FunctionValue {
    /// A plain-text response value.
    pub fn text(content: impl Into<String>) -> Self {
        FunctionValue::Http(PlinthResponse::text(content))
    }

    /// A JSON response value.
    pub fn json<T: serde::Serialize>(data: &T) -> Result<Self, serde_json::Error> {
        Ok(FunctionValue::Http(PlinthResponse::json(data)?))
    }
}

impl From<Event> for FunctionValue {
    fn from(event: Event) -> Self {
        FunctionValue::Event(event)
    }
}

impl From<PlinthResponse> for FunctionValue {
    fn from(response: PlinthResponse) -> Self {
        FunctionValue::Http(response)
    }
}

/// Handler function error type.
///
/// `Display` is the bare message; the dispatcher embeds it verbatim in the
/// failure response body.
#[derive(Debug, Clone)]
pub struct PlinthError {
    /// Error message.
    pub message: String,
}

impl PlinthError {
    /// Create a new PlinthError.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for PlinthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for PlinthError {}

impl From<std::io::Error> for PlinthError {
    fn from(err: std::io::Error) -> Self {
        PlinthError::new(err.to_string())
    }
}

impl From<serde_json::Error> for PlinthError {
    fn from(err: serde_json::Error) -> Self {
        PlinthError::new(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_with_binary_envelope_attaches_event() {
        let request = PlinthRequest::new(Method::Post, "/")
            .header("ce-id", "1")
            .header("ce-source", "/src")
            .header("ce-type", "com.example.ping")
            .header("ce-specversion", "1.0")
            .body("payload");

        let context = InvocationContext::from_request(request);
        assert!(context.has_event());
        let event = context.event.unwrap();
        assert_eq!(event.ty, "com.example.ping");
        assert_eq!(event.data_text().as_deref(), Some("payload"));
    }

    #[test]
    fn post_without_envelope_builds_bare_context() {
        let request = PlinthRequest::new(Method::Post, "/")
            .header("content-type", "application/json")
            .body(r#"{"unrelated": true}"#);

        let context = InvocationContext::from_request(request);
        assert!(!context.has_event());
        assert_eq!(
            context.request.text().as_deref(),
            Some(r#"{"unrelated": true}"#)
        );
    }

    #[test]
    fn get_never_attempts_decode() {
        let request = PlinthRequest::new(Method::Get, "/")
            .header("ce-id", "1")
            .header("ce-source", "/src")
            .header("ce-type", "com.example.ping")
            .header("ce-specversion", "1.0");

        let context = InvocationContext::from_request(request);
        assert!(!context.has_event());
    }
}
