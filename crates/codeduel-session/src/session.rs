//! A single two-player session: who is in it, the shared secret, and the
//! results submitted so far.
//!
//! A `Session` never touches the network. Everything it wants to tell a
//! player goes into that player's [`Outbox`], an unbounded channel drained
//! by the player's connection handler. That keeps every session operation
//! synchronous, so the registry can run it while holding its lock.

use std::collections::HashMap;

use codeduel_protocol::{GameCode, GameResult, ServerMessage};
use codeduel_transport::ConnectionId;
use tokio::sync::mpsc;

use crate::outcome::outcome_messages;
use crate::{SessionError, SessionState};

/// Maximum number of players in a session.
pub const MAX_PLAYERS: usize = 2;

/// Something the session wants a connection handler to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// Encode and send this message.
    Message(ServerMessage),
    /// Close the connection from the server side.
    Close,
}

/// Channel sender for delivering outbound work to a player's handler.
pub type Outbox = mpsc::UnboundedSender<Outbound>;

/// What happened to a submitted result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitStatus {
    /// Stored; the opponent has not reported yet.
    Recorded,
    /// Stored, and it was the second result: outcomes were pushed and the
    /// session is finished.
    Completed,
    /// This connection already reported; the result was ignored.
    Duplicate,
}

#[derive(Debug)]
struct Player {
    conn: ConnectionId,
    outbox: Outbox,
}

impl Player {
    /// Queues `outbound` for this player.
    ///
    /// A closed outbox means the handler is already gone; its own
    /// disconnect path cleans up, so the failure is only logged.
    fn push(&self, outbound: Outbound) {
        if self.outbox.send(outbound).is_err() {
            tracing::debug!(conn_id = %self.conn, "outbox closed, dropping push");
        }
    }
}

/// One game between (at most) two connections.
#[derive(Debug)]
pub struct Session {
    code: GameCode,
    state: SessionState,
    /// Host first, joiner second.
    players: Vec<Player>,
    /// Assigned exactly once, when the second player joins.
    secret: Option<Vec<String>>,
    results: HashMap<ConnectionId, GameResult>,
}

impl Session {
    /// Creates a `Waiting` session holding only its host.
    pub fn new(code: GameCode, host: ConnectionId, outbox: Outbox) -> Self {
        Self {
            code,
            state: SessionState::Waiting,
            players: vec![Player { conn: host, outbox }],
            secret: None,
            results: HashMap::new(),
        }
    }

    pub fn code(&self) -> &GameCode {
        &self.code
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// The secret, once the session has started.
    pub fn secret(&self) -> Option<&[String]> {
        self.secret.as_deref()
    }

    /// Connection ids of the players, host first.
    pub fn players(&self) -> impl Iterator<Item = ConnectionId> + '_ {
        self.players.iter().map(|p| p.conn)
    }

    /// Adds the second player and confirms with `Joined`.
    ///
    /// The session stays `Waiting` until [`start`](Self::start) hands out
    /// the secret.
    ///
    /// # Errors
    /// [`SessionError::SessionFull`] if the session is not waiting for an
    /// opponent, [`SessionError::AlreadyInSession`] if `conn` is the host.
    pub fn add_player(
        &mut self,
        conn: ConnectionId,
        outbox: Outbox,
    ) -> Result<(), SessionError> {
        if !self.state.is_joinable() || self.players.len() >= MAX_PLAYERS {
            return Err(SessionError::SessionFull(self.code.clone()));
        }
        if self.players.iter().any(|p| p.conn == conn) {
            return Err(SessionError::AlreadyInSession(conn, self.code.clone()));
        }

        let player = Player { conn, outbox };
        player.push(Outbound::Message(ServerMessage::Joined));
        self.players.push(player);
        Ok(())
    }

    /// Assigns the secret and pushes it to both players.
    ///
    /// Both players receive the same sequence. Calling this on a session
    /// that is not full or has already started is a no-op.
    pub fn start(&mut self, secret: Vec<String>) {
        if self.players.len() < MAX_PLAYERS || self.secret.is_some() {
            tracing::warn!(code = %self.code, state = %self.state, "start ignored");
            return;
        }
        self.transition(SessionState::Ready);
        for player in &self.players {
            player.push(Outbound::Message(ServerMessage::SecretCode {
                sequence: secret.clone(),
            }));
        }
        self.secret = Some(secret);
        tracing::info!(code = %self.code, "session started");
    }

    /// Stores `conn`'s result. When it is the second one, pushes each
    /// player their personalised outcome and moves to `Complete`.
    ///
    /// # Errors
    /// [`SessionError::NotStarted`] if the session has no secret yet or is
    /// already complete. [`SessionError::NotInSession`] if `conn` is not a
    /// player here.
    pub fn record_result(
        &mut self,
        conn: ConnectionId,
        result: GameResult,
    ) -> Result<SubmitStatus, SessionError> {
        if !self.players.iter().any(|p| p.conn == conn) {
            return Err(SessionError::NotInSession(conn));
        }
        if self.results.contains_key(&conn) {
            tracing::debug!(conn_id = %conn, code = %self.code, "duplicate result ignored");
            return Ok(SubmitStatus::Duplicate);
        }
        if !self.state.accepts_results() {
            return Err(SessionError::NotStarted(self.code.clone()));
        }

        self.results.insert(conn, result);
        tracing::debug!(conn_id = %conn, code = %self.code, ?result, "result recorded");

        if self.results.len() < MAX_PLAYERS {
            if self.state == SessionState::Ready {
                self.transition(SessionState::AwaitingResults);
            }
            return Ok(SubmitStatus::Recorded);
        }

        self.push_outcomes();
        Ok(SubmitStatus::Completed)
    }

    fn push_outcomes(&mut self) {
        let (host, joiner) = (&self.players[0], &self.players[1]);
        // Both entries exist: this only runs once results.len() == MAX_PLAYERS.
        let (Some(host_result), Some(joiner_result)) =
            (self.results.get(&host.conn), self.results.get(&joiner.conn))
        else {
            return;
        };

        let (to_host, to_joiner) = outcome_messages(host_result, joiner_result);
        host.push(Outbound::Message(ServerMessage::Results { text: to_host }));
        joiner.push(Outbound::Message(ServerMessage::Results { text: to_joiner }));

        if self.state == SessionState::Ready {
            self.transition(SessionState::AwaitingResults);
        }
        self.transition(SessionState::Complete);
        tracing::info!(code = %self.code, "session completed");
    }

    /// Closes the session and asks every remaining handler to close.
    ///
    /// `departed` is the connection that went away, if any. Its opponent
    /// gets exactly one `OpponentDisconnected` before the close, unless the
    /// outcome was already delivered. Closing twice is a no-op.
    pub fn close(&mut self, departed: Option<ConnectionId>) {
        if self.state == SessionState::Closed {
            return;
        }
        let completed = self.state == SessionState::Complete;

        for player in self.players.iter().filter(|p| Some(p.conn) != departed) {
            if departed.is_some() && !completed {
                player.push(Outbound::Message(ServerMessage::OpponentDisconnected));
            }
            player.push(Outbound::Close);
        }

        self.transition(SessionState::Closed);
        tracing::info!(code = %self.code, ?departed, "session closed");
    }

    fn transition(&mut self, target: SessionState) {
        debug_assert!(
            self.state.can_transition_to(target),
            "illegal transition {} -> {}",
            self.state,
            target
        );
        tracing::debug!(code = %self.code, from = %self.state, to = %target, "state change");
        self.state = target;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::UnboundedReceiver;

    fn player(id: u64) -> (ConnectionId, Outbox, UnboundedReceiver<Outbound>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (ConnectionId::new(id), tx, rx)
    }

    fn drain(rx: &mut UnboundedReceiver<Outbound>) -> Vec<Outbound> {
        let mut out = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            out.push(msg);
        }
        out
    }

    fn secret() -> Vec<String> {
        ["A", "C", "C", "F"].into_iter().map(String::from).collect()
    }

    fn started() -> (
        Session,
        (ConnectionId, UnboundedReceiver<Outbound>),
        (ConnectionId, UnboundedReceiver<Outbound>),
    ) {
        let (a, a_tx, mut a_rx) = player(1);
        let (b, b_tx, mut b_rx) = player(2);
        let mut session = Session::new(GameCode::new("4217"), a, a_tx);
        session.add_player(b, b_tx).unwrap();
        session.start(secret());
        drain(&mut a_rx);
        drain(&mut b_rx);
        (session, (a, a_rx), (b, b_rx))
    }

    #[test]
    fn test_new_session_is_waiting_with_host() {
        let (a, a_tx, _a_rx) = player(1);
        let session = Session::new(GameCode::new("4217"), a, a_tx);
        assert_eq!(session.state(), SessionState::Waiting);
        assert_eq!(session.player_count(), 1);
        assert!(session.secret().is_none());
    }

    #[test]
    fn test_join_then_start_pushes_same_secret_to_both() {
        let (a, a_tx, mut a_rx) = player(1);
        let (b, b_tx, mut b_rx) = player(2);
        let mut session = Session::new(GameCode::new("4217"), a, a_tx);

        session.add_player(b, b_tx).unwrap();
        session.start(secret());

        let expected = Outbound::Message(ServerMessage::SecretCode { sequence: secret() });
        assert_eq!(drain(&mut a_rx), vec![expected.clone()]);
        assert_eq!(
            drain(&mut b_rx),
            vec![Outbound::Message(ServerMessage::Joined), expected]
        );
        assert_eq!(session.state(), SessionState::Ready);
    }

    #[test]
    fn test_third_player_rejected() {
        let (mut session, _, _) = started();
        let (c, c_tx, mut c_rx) = player(3);
        assert!(matches!(
            session.add_player(c, c_tx),
            Err(SessionError::SessionFull(_))
        ));
        assert!(drain(&mut c_rx).is_empty());
    }

    #[test]
    fn test_host_cannot_join_own_session() {
        let (a, a_tx, _a_rx) = player(1);
        let mut session = Session::new(GameCode::new("4217"), a, a_tx.clone());
        assert!(matches!(
            session.add_player(a, a_tx),
            Err(SessionError::AlreadyInSession(..))
        ));
    }

    #[test]
    fn test_result_before_start_rejected() {
        let (a, a_tx, _a_rx) = player(1);
        let mut session = Session::new(GameCode::new("4217"), a, a_tx);
        assert!(matches!(
            session.record_result(a, GameResult::forfeit()),
            Err(SessionError::NotStarted(_))
        ));
    }

    #[test]
    fn test_outcomes_pushed_once_when_both_results_in() {
        let (mut session, (a, mut a_rx), (b, mut b_rx)) = started();

        let first = session
            .record_result(a, GameResult::finished(true, 5, 12_000))
            .unwrap();
        assert_eq!(first, SubmitStatus::Recorded);
        assert_eq!(session.state(), SessionState::AwaitingResults);
        assert!(drain(&mut a_rx).is_empty());

        let second = session
            .record_result(b, GameResult::finished(true, 7, 15_000))
            .unwrap();
        assert_eq!(second, SubmitStatus::Completed);
        assert_eq!(session.state(), SessionState::Complete);

        let a_out = drain(&mut a_rx);
        let b_out = drain(&mut b_rx);
        assert_eq!(a_out.len(), 1);
        assert_eq!(b_out.len(), 1);
        assert!(matches!(&a_out[0], Outbound::Message(ServerMessage::Results { text }) if text.starts_with("You win!")));
        assert!(matches!(&b_out[0], Outbound::Message(ServerMessage::Results { text }) if text.starts_with("You lose")));
    }

    #[test]
    fn test_duplicate_result_ignored() {
        let (mut session, (a, _), _) = started();
        session.record_result(a, GameResult::forfeit()).unwrap();
        assert_eq!(
            session
                .record_result(a, GameResult::finished(true, 1, 1))
                .unwrap(),
            SubmitStatus::Duplicate
        );
        assert_eq!(session.state(), SessionState::AwaitingResults);
    }

    #[test]
    fn test_close_after_disconnect_notifies_opponent_once() {
        let (mut session, (a, mut a_rx), (_b, mut b_rx)) = started();

        session.close(Some(a));
        session.close(Some(a));

        assert!(drain(&mut a_rx).is_empty());
        assert_eq!(
            drain(&mut b_rx),
            vec![
                Outbound::Message(ServerMessage::OpponentDisconnected),
                Outbound::Close
            ]
        );
        assert_eq!(session.state(), SessionState::Closed);
    }

    #[test]
    fn test_close_after_completion_only_closes() {
        let (mut session, (a, mut a_rx), (b, mut b_rx)) = started();
        session.record_result(a, GameResult::forfeit()).unwrap();
        session.record_result(b, GameResult::forfeit()).unwrap();
        drain(&mut a_rx);
        drain(&mut b_rx);

        session.close(None);

        assert_eq!(drain(&mut a_rx), vec![Outbound::Close]);
        assert_eq!(drain(&mut b_rx), vec![Outbound::Close]);
    }

    #[test]
    fn test_dead_outbox_does_not_block_opponent() {
        let (mut session, (a, a_rx), (b, mut b_rx)) = started();
        drop(a_rx);

        session.record_result(a, GameResult::forfeit()).unwrap();
        let status = session
            .record_result(b, GameResult::finished(true, 3, 9_000))
            .unwrap();

        assert_eq!(status, SubmitStatus::Completed);
        assert_eq!(drain(&mut b_rx).len(), 1);
    }
}
