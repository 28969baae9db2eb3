//! Core protocol types for codeduel's wire format.
//!
//! Every type in this module travels "on the wire": it is serialized to
//! bytes, sent over one player's connection, and deserialized on the other
//! side. Think of this as the vocabulary the client and server share.
//!
//! Each message is a self-describing JSON record. Requests carry their kind
//! in an `action` field, server messages in a `status` field:
//!
//! ```text
//! client → server   { "action": "joinGame", "code": "4217" }
//! server → client   { "status": "secretCode", "sequence": ["A","C","C","F"] }
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// GameCode
// ---------------------------------------------------------------------------

/// The short numeric code a player shares so an opponent can join.
///
/// A newtype over `String` rather than a bare number: the code is typed in
/// by a human and compared as text, so `"0042"` and `"42"` are different
/// codes. `#[serde(transparent)]` keeps it a plain JSON string, so
/// `GameCode("4217")` serializes as `"4217"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameCode(String);

impl GameCode {
    /// Wraps an arbitrary code string (e.g. one typed in by a player).
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Returns the code as text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<u16> for GameCode {
    fn from(code: u16) -> Self {
        Self(code.to_string())
    }
}

impl fmt::Display for GameCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// GameResult
// ---------------------------------------------------------------------------

/// One player's self-reported outcome of their game.
///
/// Produced exactly once per client: either when the game ends (solved or
/// out of attempts) or as a forfeiture when the local clock runs past the
/// time ceiling. The server only compares these; it never re-scores guesses.
///
/// `#[serde(rename_all = "camelCase")]` gives the wire names `isWin`,
/// `elapsedMs` and `isTimeout`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameResult {
    /// `true` if the player cracked the secret.
    pub is_win: bool,
    /// Number of guesses the player used.
    pub attempts: u32,
    /// Play time in milliseconds, excluding pauses.
    pub elapsed_ms: u64,
    /// `true` if this result is a forfeiture caused by the time ceiling.
    #[serde(default)]
    pub is_timeout: bool,
}

impl GameResult {
    /// A genuine outcome: the player solved the secret or ran out of attempts.
    pub fn finished(is_win: bool, attempts: u32, elapsed_ms: u64) -> Self {
        Self {
            is_win,
            attempts,
            elapsed_ms,
            is_timeout: false,
        }
    }

    /// The forfeiture sent when the local timeout ceiling is exceeded.
    pub fn forfeit() -> Self {
        Self {
            is_win: false,
            attempts: 0,
            elapsed_ms: 0,
            is_timeout: true,
        }
    }
}

// ---------------------------------------------------------------------------
// ClientRequest: client → server
// ---------------------------------------------------------------------------

/// Requests a client sends to the server.
///
/// `#[serde(tag = "action")]` makes this an "internally tagged" enum:
/// the variant name is stored in an `action` field next to the payload,
/// e.g. `{ "action": "joinGame", "code": "4217" }`. An unknown `action`
/// fails to deserialize, which the server treats as a protocol violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum ClientRequest {
    /// "Open a new game and give me its code."
    CreateGame,

    /// "Put me into the game with this code."
    JoinGame { code: GameCode },

    /// "My game is over; here is how it went."
    SubmitResult { result: GameResult },
}

// ---------------------------------------------------------------------------
// ServerMessage: server → client
// ---------------------------------------------------------------------------

/// Messages the server sends to a client.
///
/// Some are direct replies (`GameCode`, `Joined`, `Error`); the rest are
/// pushes that arrive whenever the session reaches the matching point
/// (both players present, both results in, opponent gone).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum ServerMessage {
    /// Reply to `CreateGame`: the code to hand to the opponent.
    GameCode { code: GameCode },

    /// Reply to a successful `JoinGame`.
    Joined,

    /// Push: the shared secret, sent to both players once the second joins.
    SecretCode { sequence: Vec<String> },

    /// Push: the personalised outcome text, sent once both results are in.
    Results { text: String },

    /// A request could not be served (bad code, full game, no capacity).
    Error { message: String },

    /// Push: the other player's connection went away mid-session.
    OpponentDisconnected,
}

// =========================================================================
// Tests
// =========================================================================
