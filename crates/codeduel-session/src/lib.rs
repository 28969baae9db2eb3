//! Session lifecycle management for codeduel.
//!
//! Two players meet through a short numeric code: the first creates a
//! session and receives the code, the second joins with it, and both get
//! the same secret. Each reports one result; once both are in, each player
//! is told how they did against the other and the session is torn down.
//!
//! # Key types
//!
//! - [`SessionRegistry`]: creates sessions, routes connections, tears down
//! - [`Session`]: one game between two connections
//! - [`CodePool`]: hands out and takes back game codes
//! - [`SessionState`]: lifecycle state machine
//! - [`Settings`]: secret length, attempts, and symbols
//! - [`SecretGenerator`]: where the shared secret comes from

mod config;
mod error;
pub mod outcome;
mod pool;
mod registry;
mod secret;
mod session;

pub use config::{
    MAX_ATTEMPTS, MAX_SEQUENCE_LENGTH, MAX_SYMBOLS, MIN_ATTEMPTS, MIN_SEQUENCE_LENGTH,
    MIN_SYMBOLS, SessionState, Settings,
};
pub use error::{
    ALREADY_IN_GAME_MESSAGE, INVALID_CODE_MESSAGE, NOT_IN_GAME_MESSAGE, NOT_STARTED_MESSAGE,
    POOL_EXHAUSTED_MESSAGE, SessionError,
};
pub use pool::{CodePool, DEFAULT_CODE_RANGE};
pub use registry::SessionRegistry;
pub use secret::{Feedback, RandomSecret, SecretGenerator, score_guess};
pub use session::{MAX_PLAYERS, Outbound, Outbox, Session, SubmitStatus};
