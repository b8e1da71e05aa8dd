//! Wire codec for the event envelope.
//!
//! Two transport modes exist. In *structured* mode a single JSON body carries
//! the attributes and data; in *binary* mode the attributes travel as `ce-*`
//! headers and the body is the raw data payload. Mode selection happens here,
//! not in the dispatcher.

use crate::event::envelope::Event;
use bytes::Bytes;
use serde::Deserialize;
use std::collections::HashMap;

/// Content type marking a structured-mode envelope body.
pub const STRUCTURED_CONTENT_TYPE: &str = "application/cloudevents+json";

/// A request that does not carry a well-formed envelope.
///
/// Every decode failure collapses into one malformed-envelope reason; callers
/// treat it the same as "no event present".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeError {
    /// What made the envelope malformed.
    pub reason: String,
}

impl DecodeError {
    fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    fn missing(attribute: &str) -> Self {
        Self::new(format!("missing required attribute '{}'", attribute))
    }
}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "malformed event envelope: {}", self.reason)
    }
}

impl std::error::Error for DecodeError {}

/// The JSON shape of a structured-mode envelope body.
#[derive(Debug, Deserialize)]
struct StructuredEnvelope {
    id: String,
    source: String,
    #[serde(rename = "type")]
    ty: String,
    specversion: String,
    time: Option<String>,
    datacontenttype: Option<String>,
    data: Option<serde_json::Value>,
}

/// Case-insensitive header lookup.
fn header<'a>(headers: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

/// Decode an event from request headers and body.
///
/// A `content-type` of `application/cloudevents+json` selects structured
/// mode; anything else is treated as binary mode, which requires the
/// `ce-id`, `ce-source`, `ce-type` and `ce-specversion` headers.
pub fn decode(headers: &HashMap<String, String>, body: Option<&Bytes>) -> Result<Event, DecodeError> {
    let content_type = header(headers, "content-type").unwrap_or("");
    if content_type.starts_with(STRUCTURED_CONTENT_TYPE) {
        decode_structured(body)
    } else {
        decode_binary(headers, body)
    }
}

fn decode_structured(body: Option<&Bytes>) -> Result<Event, DecodeError> {
    let body = body.ok_or_else(|| DecodeError::new("structured envelope without a body"))?;
    let envelope: StructuredEnvelope =
        serde_json::from_slice(body).map_err(|err| DecodeError::new(err.to_string()))?;

    // A JSON string is the payload itself; any other value is carried as its
    // compact JSON encoding.
    let data = envelope.data.map(|value| match value {
        serde_json::Value::String(text) => Bytes::from(text),
        other => Bytes::from(other.to_string()),
    });

    Ok(Event {
        id: envelope.id,
        source: envelope.source,
        ty: envelope.ty,
        specversion: envelope.specversion,
        time: envelope.time,
        datacontenttype: envelope.datacontenttype,
        data,
    })
}

fn decode_binary(headers: &HashMap<String, String>, body: Option<&Bytes>) -> Result<Event, DecodeError> {
    let id = header(headers, "ce-id").ok_or_else(|| DecodeError::missing("ce-id"))?;
    let source = header(headers, "ce-source").ok_or_else(|| DecodeError::missing("ce-source"))?;
    let ty = header(headers, "ce-type").ok_or_else(|| DecodeError::missing("ce-type"))?;
    let specversion =
        header(headers, "ce-specversion").ok_or_else(|| DecodeError::missing("ce-specversion"))?;

    Ok(Event {
        id: id.to_string(),
        source: source.to_string(),
        ty: ty.to_string(),
        specversion: specversion.to_string(),
        time: header(headers, "ce-time").map(String::from),
        datacontenttype: header(headers, "content-type").map(String::from),
        data: body.cloned(),
    })
}

/// Encode an event for binary-mode transport.
///
/// The attributes become `ce-*` headers, `datacontenttype` becomes the
/// `content-type` header, and the payload travels as the body untouched.
pub fn encode_binary(event: &Event) -> (HashMap<String, String>, Option<Bytes>) {
    let mut headers = HashMap::new();
    headers.insert("ce-id".to_string(), event.id.clone());
    headers.insert("ce-source".to_string(), event.source.clone());
    headers.insert("ce-type".to_string(), event.ty.clone());
    headers.insert("ce-specversion".to_string(), event.specversion.clone());
    if let Some(time) = &event.time {
        headers.insert("ce-time".to_string(), time.clone());
    }
    if let Some(content_type) = &event.datacontenttype {
        headers.insert("content-type".to_string(), content_type.clone());
    }
    (headers, event.data.clone())
}
