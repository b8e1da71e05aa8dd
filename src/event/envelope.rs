//! The structured event envelope.

use bytes::Bytes;

/// Attribute-set version stamped on events built in-process.
pub const SPEC_VERSION: &str = "1.0";

/// A self-describing message: fixed metadata attributes plus a data payload.
///
/// An event is always whole; the codec either decodes every required
/// attribute or fails the attempt entirely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// Identifier of the event, unique within its source.
    pub id: String,
    /// Context in which the event happened.
    pub source: String,
    /// Kind of occurrence the event describes.
    pub ty: String,
    /// Version of the attribute set in use.
    pub specversion: String,
    /// Timestamp of the occurrence, RFC 3339.
    pub time: Option<String>,
    /// Content type of the data payload.
    pub datacontenttype: Option<String>,
    /// The data payload.
    pub data: Option<Bytes>,
}

impl Event {
    /// Create a new event with the required attributes.
    pub fn new(ty: impl Into<String>, source: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            ty: ty.into(),
            specversion: SPEC_VERSION.to_string(),
            time: None,
            datacontenttype: None,
            data: None,
        }
    }

    /// Set the occurrence timestamp.
    pub fn time(mut self, time: impl Into<String>) -> Self {
        self.time = Some(time.into());
        self
    }

    /// Set the content type of the data payload.
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.datacontenttype = Some(content_type.into());
        self
    }

    /// Set the data payload.
    pub fn data(mut self, data: impl Into<Bytes>) -> Self {
        self.data = Some(data.into());
        self
    }

    /// Get the data payload as text if present.
    pub fn data_text(&self) -> Option<String> {
        self.data
            .as_ref()
            .map(|b| String::from_utf8_lossy(b).to_string())
    }
}
