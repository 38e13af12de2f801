//! Unified error type for the imposter server.

use imposter_directory::DirectoryError;
use imposter_protocol::ProtocolError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attributes let `?` convert sub-crate errors directly.
#[derive(Debug, thiserror::Error)]
pub enum ImposterError {
    /// Encoding or decoding a message failed.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A directory lookup or game rule failed.
    #[error(transparent)]
    Directory(#[from] DirectoryError),

    /// Binding or accepting on the listening socket failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The WebSocket handshake or a frame send/receive failed.
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// A configuration value could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use imposter_protocol::GameId;

    use super::*;

    #[test]
    fn test_from_directory_error() {
        let err = DirectoryError::SessionNotFound(GameId::new("abc-def-ghi"));
        let top: ImposterError = err.into();
        assert!(matches!(top, ImposterError::Directory(_)));
        assert_eq!(top.to_string(), "game abc-def-ghi not found");
    }

    #[test]
    fn test_from_protocol_error() {
        let err = ProtocolError::InvalidMessage("bad".into());
        let top: ImposterError = err.into();
        assert!(matches!(top, ImposterError::Protocol(_)));
    }

    #[test]
    fn test_from_io_error() {
        let err = std::io::Error::new(std::io::ErrorKind::AddrInUse, "taken");
        let top: ImposterError = err.into();
        assert!(matches!(top, ImposterError::Io(_)));
        assert!(top.to_string().contains("taken"));
    }
}
