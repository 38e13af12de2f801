//! Codec trait and implementations for serializing/deserializing messages.
//!
//! The gateway never touches `serde_json` directly; it goes through a
//! [`Codec`] so the wire format can change without touching command
//! handling.

use serde::{de::DeserializeOwned, Serialize};

use crate::ProtocolError;

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// `Send + Sync + 'static` because one codec instance is shared by every
/// connection task for the lifetime of the server.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed or
    /// don't match the expected type.
    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError>;

    /// Encodes a value as a UTF-8 string, for text-frame transports.
    ///
    /// The default implementation encodes to bytes and validates them.
    fn encode_text<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<String, ProtocolError> {
        let bytes = self.encode(value)?;
        String::from_utf8(bytes).map_err(|e| {
            ProtocolError::InvalidMessage(format!("encoded frame is not UTF-8: {e}"))
        })
    }
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// Browser clients speak JSON over WebSocket text frames, so this is the
/// codec the server uses.
///
/// ```rust
/// use imposter_protocol::{Codec, GameId, JsonCodec};
///
/// let codec = JsonCodec;
/// let bytes = codec.encode(&GameId::new("abc-def-ghi")).unwrap();
/// assert_eq!(bytes, br#""abc-def-ghi""#);
///
/// let decoded: GameId = codec.decode(&bytes).unwrap();
/// assert_eq!(decoded.as_str(), "abc-def-ghi");
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }

    fn encode_text<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<String, ProtocolError> {
        serde_json::to_string(value).map_err(ProtocolError::Encode)
    }
}

#[cfg(all(test, feature = "json"))]
mod tests {
    use super::*;
    use crate::PlayerId;

    #[test]
    fn test_json_codec_decode_garbage_returns_decode_error() {
        let result: Result<PlayerId, _> = JsonCodec.decode(b"not json at all");
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }

    #[test]
    fn test_json_codec_encode_text_matches_bytes() {
        let pid = PlayerId::new();
        let text = JsonCodec.encode_text(&pid).unwrap();
        let bytes = JsonCodec.encode(&pid).unwrap();
        assert_eq!(text.as_bytes(), bytes.as_slice());
    }
}
