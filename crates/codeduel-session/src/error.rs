//! Error types for the session layer.

use codeduel_protocol::GameCode;
use codeduel_transport::ConnectionId;

/// Message shown to a player whose join request cannot be honoured.
pub const INVALID_CODE_MESSAGE: &str = "Invalid game code or game full";

/// Message shown to a player when every game code is in use.
pub const POOL_EXHAUSTED_MESSAGE: &str = "No free game codes, try again later";

/// Message shown to a player who creates or joins while already playing.
pub const ALREADY_IN_GAME_MESSAGE: &str = "You are already in a game";

/// Message shown to a player who reports a result outside any game.
pub const NOT_IN_GAME_MESSAGE: &str = "You are not in a game";

/// Message shown to a player who reports a result before the opponent joins.
pub const NOT_STARTED_MESSAGE: &str = "The game has not started yet";

/// Errors that can occur during session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Every code in the pool is held by a live session. Temporary:
    /// codes come back as sessions end.
    #[error("code pool exhausted")]
    PoolExhausted,

    /// No live session uses this code.
    #[error("game {0} not found")]
    NotFound(GameCode),

    /// The session already has both players.
    #[error("game {0} is full")]
    SessionFull(GameCode),

    /// The connection already belongs to a session.
    #[error("{0} already in game {1}")]
    AlreadyInSession(ConnectionId, GameCode),

    /// The connection does not belong to any session.
    #[error("{0} is not in any game")]
    NotInSession(ConnectionId),

    /// A result arrived before the second player joined.
    #[error("game {0} has not started")]
    NotStarted(GameCode),

    /// Game settings are out of range.
    #[error("invalid settings: {0}")]
    InvalidSettings(String),
}

impl SessionError {
    /// The human-readable reason sent to the client in an `Error` message.
    pub fn client_message(&self) -> String {
        match self {
            Self::PoolExhausted => POOL_EXHAUSTED_MESSAGE.to_string(),
            Self::NotFound(_) | Self::SessionFull(_) => {
                INVALID_CODE_MESSAGE.to_string()
            }
            Self::AlreadyInSession(..) => ALREADY_IN_GAME_MESSAGE.to_string(),
            Self::NotInSession(_) => NOT_IN_GAME_MESSAGE.to_string(),
            Self::NotStarted(_) => NOT_STARTED_MESSAGE.to_string(),
            Self::InvalidSettings(_) => self.to_string(),
        }
    }
}
