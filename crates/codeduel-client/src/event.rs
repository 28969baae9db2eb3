//! Notifications the client raises on its own, outside any request.

/// Something happened that the game should react to.
///
/// Delivered on the receiver returned by
/// [`MatchClient::connect`](crate::MatchClient::connect).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// The opponent's connection went away mid-session.
    OpponentDisconnected,
    /// The server connection ended before the outcome arrived.
    ServerDisconnected,
    /// The server refused a request and said why: a bad game code, no
    /// free codes, or a result it could not accept.
    Rejected(String),
}

/// What happened to a result submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    /// This was the first submission; it went to the server.
    Sent,
    /// A result was already submitted; nothing was sent.
    AlreadySubmitted,
}
