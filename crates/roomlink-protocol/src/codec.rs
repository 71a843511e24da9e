//! Codec trait and implementations for request and response bodies.
//!
//! A "codec" (coder/decoder) converts between Rust types and raw bytes.
//! The transport layer doesn't care HOW a body is serialized; it holds
//! something that implements [`Codec`] and hands it bytes. Today that is
//! [`JsonCodec`], matching the room service's JSON API.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// `Send + Sync + 'static` lets one codec be shared by every request a
/// client issues, from any tokio worker thread.
pub trait Codec: Send + Sync + 'static {
    /// The `Content-Type` header value for bodies produced by this codec.
    fn content_type(&self) -> &'static str;

    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed,
    /// incomplete, or don't match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// This is behind the `json` feature flag (enabled by default).
///
/// ## Example
///
/// ```rust
/// use roomlink_protocol::{Codec, JsonCodec, ReadyRequest, ReadyResponse};
///
/// let codec = JsonCodec;
///
/// let body = codec.encode(&ReadyRequest { ready: true }).unwrap();
/// assert_eq!(body, br#"{"ready":true}"#);
///
/// let resp: ReadyResponse = codec.decode(br#"{"all_ready":false}"#).unwrap();
/// assert!(!resp.all_ready);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn content_type(&self) -> &'static str {
        "application/json"
    }

    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
