//! The event envelope and its wire codec.

mod codec;
mod envelope;

pub use codec::{decode, encode_binary, DecodeError, STRUCTURED_CONTENT_TYPE};
pub use envelope::{Event, SPEC_VERSION};
