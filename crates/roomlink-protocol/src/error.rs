//! Error types for the protocol layer.
//!
//! Each roomlink crate defines its own error enum. A `ProtocolError`
//! always means the problem is in the shape of the data (serialization or
//! a snapshot that breaks a room invariant), never in networking.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust value into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed: malformed JSON, missing fields, wrong
    /// types, or a truncated body.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The data decoded fine but violates a protocol rule, e.g. a room
    /// whose `current_players` disagrees with its player list.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
