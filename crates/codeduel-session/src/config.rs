//! Game settings and the session state machine.

use crate::SessionError;

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

pub const MIN_SEQUENCE_LENGTH: usize = 3;
pub const MAX_SEQUENCE_LENGTH: usize = 6;
pub const MIN_ATTEMPTS: u32 = 3;
pub const MAX_ATTEMPTS: u32 = 20;
pub const MIN_SYMBOLS: usize = 3;
pub const MAX_SYMBOLS: usize = 8;

/// Parameters for secret generation: how long the secret is, how many
/// guesses a player gets, and which symbols may appear.
///
/// Construct through [`Settings::new`], which rejects out-of-range values,
/// so a `Settings` in hand is always usable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    sequence_length: usize,
    max_attempts: u32,
    symbols: Vec<String>,
}

impl Settings {
    /// Validates and builds a settings value.
    ///
    /// # Errors
    /// [`SessionError::InvalidSettings`] if a value is out of range or the
    /// symbols are not unique.
    pub fn new(
        sequence_length: usize,
        max_attempts: u32,
        symbols: Vec<String>,
    ) -> Result<Self, SessionError> {
        if !(MIN_SEQUENCE_LENGTH..=MAX_SEQUENCE_LENGTH).contains(&sequence_length) {
            return Err(SessionError::InvalidSettings(format!(
                "sequence length should be from {MIN_SEQUENCE_LENGTH} to {MAX_SEQUENCE_LENGTH}"
            )));
        }
        if !(MIN_ATTEMPTS..=MAX_ATTEMPTS).contains(&max_attempts) {
            return Err(SessionError::InvalidSettings(format!(
                "maximum number of attempts should be from {MIN_ATTEMPTS} to {MAX_ATTEMPTS}"
            )));
        }
        if !(MIN_SYMBOLS..=MAX_SYMBOLS).contains(&symbols.len()) {
            return Err(SessionError::InvalidSettings(format!(
                "number of symbols should be from {MIN_SYMBOLS} to {MAX_SYMBOLS}"
            )));
        }
        let mut unique = symbols.clone();
        unique.sort();
        unique.dedup();
        if unique.len() != symbols.len() {
            return Err(SessionError::InvalidSettings(
                "symbols should be unique".into(),
            ));
        }
        Ok(Self {
            sequence_length,
            max_attempts,
            symbols,
        })
    }

    pub fn sequence_length(&self) -> usize {
        self.sequence_length
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sequence_length: 4,
            max_attempts: 10,
            symbols: ["A", "B", "C", "D", "E", "F"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// The lifecycle state of a session.
///
/// Transitions are strictly ordered, except that any state may jump to
/// `Closed` when a player disconnects:
///
/// ```text
/// Waiting → Ready → AwaitingResults → Complete → Closed
/// ```
///
/// - **Waiting**: one player, code handed out, nothing else known.
/// - **Ready**: second player joined, secret broadcast to both.
/// - **AwaitingResults**: at least one result is in.
/// - **Complete**: both results in, outcomes pushed.
/// - **Closed**: torn down, code released.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    Waiting,
    Ready,
    AwaitingResults,
    Complete,
    Closed,
}

impl SessionState {
    /// Returns `true` if a second player may still join.
    pub fn is_joinable(&self) -> bool {
        matches!(self, Self::Waiting)
    }

    /// Returns `true` while players are playing and may submit results.
    pub fn accepts_results(&self) -> bool {
        matches!(self, Self::Ready | Self::AwaitingResults)
    }

    /// The next state in normal play, or `None` from `Closed`.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Waiting => Some(Self::Ready),
            Self::Ready => Some(Self::AwaitingResults),
            Self::AwaitingResults => Some(Self::Complete),
            Self::Complete => Some(Self::Closed),
            Self::Closed => None,
        }
    }

    /// Returns `true` if moving to `target` is allowed.
    pub fn can_transition_to(self, target: Self) -> bool {
        self.next() == Some(target) || (target == Self::Closed && self != Self::Closed)
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Waiting => write!(f, "Waiting"),
            Self::Ready => write!(f, "Ready"),
            Self::AwaitingResults => write!(f, "AwaitingResults"),
            Self::Complete => write!(f, "Complete"),
            Self::Closed => write!(f, "Closed"),
        }
    }
}
