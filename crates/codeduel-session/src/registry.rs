//! Session registry: creates sessions, routes connections to them, and
//! tears them down.
//!
//! This is the entry point for session operations from the connection
//! handlers. It owns the [`CodePool`], every live [`Session`], and the
//! index from connection to session.
//!
//! # Concurrency note
//!
//! All methods take `&mut self` and never await. The server keeps the
//! registry behind a single `tokio::sync::Mutex`, which makes that lock
//! the only synchronization boundary for session state. Sessions talk to
//! players through outboxes, so no network I/O happens under the lock.

use std::collections::HashMap;

use codeduel_protocol::{GameCode, GameResult};
use codeduel_transport::ConnectionId;

use crate::session::{Outbox, Session, SubmitStatus};
use crate::{CodePool, RandomSecret, SecretGenerator, SessionError, SessionState, Settings};

/// Tracks every live session and which connection plays in which.
pub struct SessionRegistry<G: SecretGenerator = RandomSecret> {
    pool: CodePool,

    /// Live sessions, keyed by their code.
    sessions: HashMap<GameCode, Session>,

    /// Maps each connection to the session it plays in.
    /// A connection is in at most ONE session at a time.
    memberships: HashMap<ConnectionId, GameCode>,

    settings: Settings,
    secrets: G,
}

impl SessionRegistry {
    /// Creates a registry over the default four-digit code range with a
    /// random secret generator.
    pub fn new(settings: Settings) -> Self {
        Self::with_parts(CodePool::default(), settings, RandomSecret::new())
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

impl<G: SecretGenerator> SessionRegistry<G> {
    /// Creates a registry from an explicit pool and secret generator.
    pub fn with_parts(pool: CodePool, settings: Settings, secrets: G) -> Self {
        Self {
            pool,
            sessions: HashMap::new(),
            memberships: HashMap::new(),
            settings,
            secrets,
        }
    }

    /// Opens a `Waiting` session hosted by `conn` and returns its code.
    ///
    /// # Errors
    /// [`SessionError::PoolExhausted`] if no code is free, in which case
    /// the registry is left unchanged. [`SessionError::AlreadyInSession`]
    /// if `conn` already plays somewhere.
    pub fn create_session(
        &mut self,
        conn: ConnectionId,
        outbox: Outbox,
    ) -> Result<GameCode, SessionError> {
        if let Some(current) = self.memberships.get(&conn) {
            return Err(SessionError::AlreadyInSession(conn, current.clone()));
        }

        let code = self.pool.allocate()?;
        self.sessions
            .insert(code.clone(), Session::new(code.clone(), conn, outbox));
        self.memberships.insert(conn, code.clone());

        tracing::info!(conn_id = %conn, %code, "session created");
        Ok(code)
    }

    /// Adds `conn` as the second player of `code` and starts the session.
    ///
    /// On success the joiner's outbox receives `Joined`, then both players
    /// receive the same `SecretCode`.
    ///
    /// # Errors
    /// [`SessionError::NotFound`] for an unknown code,
    /// [`SessionError::SessionFull`] if the session already has two
    /// players. Both are reported to the player as
    /// [`INVALID_CODE_MESSAGE`](crate::INVALID_CODE_MESSAGE).
    pub fn join_session(
        &mut self,
        code: &GameCode,
        conn: ConnectionId,
        outbox: Outbox,
    ) -> Result<(), SessionError> {
        if let Some(current) = self.memberships.get(&conn) {
            return Err(SessionError::AlreadyInSession(conn, current.clone()));
        }

        let session = self
            .sessions
            .get_mut(code)
            .ok_or_else(|| SessionError::NotFound(code.clone()))?;

        session.add_player(conn, outbox)?;
        self.memberships.insert(conn, code.clone());
        tracing::info!(conn_id = %conn, %code, "player joined");

        let secret = self.secrets.generate(&self.settings);
        session.start(secret);
        Ok(())
    }

    /// Records `conn`'s result in its session.
    ///
    /// When this completes the session, both outcomes are pushed and the
    /// session is torn down before returning.
    ///
    /// # Errors
    /// [`SessionError::NotInSession`] if `conn` is in no session,
    /// [`SessionError::NotStarted`] if its session has no opponent yet.
    pub fn submit_result(
        &mut self,
        conn: ConnectionId,
        result: GameResult,
    ) -> Result<SubmitStatus, SessionError> {
        let code = self
            .memberships
            .get(&conn)
            .cloned()
            .ok_or(SessionError::NotInSession(conn))?;
        let session = self
            .sessions
            .get_mut(&code)
            .ok_or(SessionError::NotInSession(conn))?;

        let status = session.record_result(conn, result)?;
        if status == SubmitStatus::Completed {
            self.teardown(&code, None);
        }
        Ok(status)
    }

    /// Handles `conn` going away.
    ///
    /// If its session is still live, the opponent (if any) is told once
    /// and closed, and the code goes back to the pool. A connection that
    /// never joined, or whose session already finished, is a no-op.
    pub fn disconnect(&mut self, conn: ConnectionId) {
        match self.memberships.remove(&conn) {
            Some(code) => self.teardown(&code, Some(conn)),
            None => tracing::debug!(conn_id = %conn, "disconnect outside any session"),
        }
    }

    /// Tears down every live session.
    pub fn shutdown(&mut self) {
        let codes: Vec<GameCode> = self.sessions.keys().cloned().collect();
        for code in &codes {
            self.teardown(code, None);
        }
        tracing::info!(count = codes.len(), "all sessions torn down");
    }

    fn teardown(&mut self, code: &GameCode, departed: Option<ConnectionId>) {
        let Some(mut session) = self.sessions.remove(code) else {
            return;
        };
        session.close(departed);
        for conn in session.players() {
            self.memberships.remove(&conn);
        }
        self.pool.release(code.clone());
        tracing::info!(%code, "session torn down");
    }

    /// Number of live sessions.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// The code of the session `conn` plays in, if any.
    pub fn code_of(&self, conn: ConnectionId) -> Option<&GameCode> {
        self.memberships.get(&conn)
    }

    /// The state of the live session with this code.
    pub fn session_state(&self, code: &GameCode) -> Option<SessionState> {
        self.sessions.get(code).map(Session::state)
    }

    /// Number of codes ready to be handed out.
    pub fn available_codes(&self) -> usize {
        self.pool.available()
    }
}
