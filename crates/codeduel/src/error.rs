//! Unified error type for the codeduel server.

use codeduel_protocol::ProtocolError;
use codeduel_session::SessionError;
use codeduel_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum CodeduelError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid message).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A session-level error (no free codes, bad code, not in a game).
    #[error(transparent)]
    Session(#[from] SessionError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::SendFailed(std::io::Error::new(
            std::io::ErrorKind::BrokenPipe,
            "gone",
        ));
        let codeduel_err: CodeduelError = err.into();
        assert!(matches!(codeduel_err, CodeduelError::Transport(_)));
    }

    #[test]
    fn test_from_protocol_error() {
        let err = ProtocolError::InvalidMessage("bad".into());
        let codeduel_err: CodeduelError = err.into();
        assert!(matches!(codeduel_err, CodeduelError::Protocol(_)));
        assert!(codeduel_err.to_string().contains("bad"));
    }

    #[test]
    fn test_from_session_error() {
        let codeduel_err: CodeduelError = SessionError::PoolExhausted.into();
        assert!(matches!(codeduel_err, CodeduelError::Session(_)));
    }
}
