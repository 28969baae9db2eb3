//! Error types for the client engine.

use std::time::Duration;

use codeduel_protocol::ProtocolError;
use codeduel_transport::TransportError;

/// Errors a [`MatchClient`](crate::MatchClient) operation can return.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The server did not accept the connection in time. Worth retrying.
    #[error("connection not established within {0:?}")]
    ConnectTimeout(Duration),

    /// The connection failed or broke while sending.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A message could not be encoded, or the server sent one that makes
    /// no sense at this point.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The server refused the request and said why.
    #[error("rejected by server: {0}")]
    Rejected(String),

    /// The connection is gone; the awaited message will never arrive.
    #[error("disconnected from server")]
    Disconnected,
}
