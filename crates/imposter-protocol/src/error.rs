//! Error types for the protocol layer.

/// Errors that can occur while encoding or decoding messages.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed. Malformed JSON, an unknown `event` tag,
    /// or a missing required field all end up here.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The message parsed but is unusable, e.g. a frame that is not
    /// valid UTF-8 where text is required.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
