//! The client protocol engine.
//!
//! A [`MatchClient`] owns one connection and one background listener task.
//! The listener decodes every server message and routes it by kind:
//!
//! - direct replies (`GameCode`, `Joined`, `Error`) → the reply channel,
//!   read by [`create_game`](MatchClient::create_game) and
//!   [`join_game`](MatchClient::join_game)
//! - `SecretCode` → the secret channel
//! - `Results` → the results channel
//! - `Error` while no create or join is outstanding → the results channel,
//!   so [`receive_results`](MatchClient::receive_results) fails instead of
//!   waiting forever
//! - `OpponentDisconnected`, server loss, and errors → [`ClientEvent`]s
//!
//! Each channel has exactly one consumer, so a message is never handed to
//! the wrong waiter. When the listener ends, every sender is dropped and
//! any call still waiting returns [`ClientError::Disconnected`].

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use codeduel_clock::{MonitorConfig, SharedClock, TimeoutMonitor};
use codeduel_protocol::{
    ClientRequest, Codec, GameCode, GameResult, JsonCodec, ProtocolError, ServerMessage,
};
use codeduel_transport::{Connection, Incoming, WebSocketConnection};
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;

use crate::{ClientConfig, ClientError, ClientEvent, Submission};

/// A direct reply to `CreateGame` or `JoinGame`.
#[derive(Debug)]
enum Reply {
    GameCode(GameCode),
    Joined,
    Rejected(String),
}

/// What ends a game from the server's side: the outcome text, or the
/// reason the server refused to judge it.
type Outcome = Result<String, String>;

/// Receiving ends of the listener's routing channels.
struct Slots {
    replies: Mutex<mpsc::UnboundedReceiver<Reply>>,
    secret: Mutex<mpsc::UnboundedReceiver<Vec<String>>>,
    results: Mutex<mpsc::UnboundedReceiver<Outcome>>,
}

/// Sending ends, owned by the listener task.
struct Routes {
    replies: mpsc::UnboundedSender<Reply>,
    secret: mpsc::UnboundedSender<Vec<String>>,
    results: mpsc::UnboundedSender<Outcome>,
    events: mpsc::UnboundedSender<ClientEvent>,
    /// Set while a create or join waits for its reply.
    awaiting_reply: Arc<AtomicBool>,
}

/// One player's connection to a codeduel server.
pub struct MatchClient {
    conn: Arc<WebSocketConnection>,
    codec: JsonCodec,
    slots: Slots,
    /// Set by the first result submission, genuine or forfeit.
    submitted: AtomicBool,
    awaiting_reply: Arc<AtomicBool>,
    listener: JoinHandle<()>,
}

impl MatchClient {
    /// Connects to the server and starts the listener.
    ///
    /// Returns the client and the receiver for [`ClientEvent`]s.
    ///
    /// # Errors
    /// [`ClientError::ConnectTimeout`] if the connection is not up within
    /// `config.connect_timeout`, [`ClientError::Transport`] if it fails
    /// outright.
    pub async fn connect(
        config: &ClientConfig,
    ) -> Result<(Self, mpsc::UnboundedReceiver<ClientEvent>), ClientError> {
        let conn = tokio::time::timeout(
            config.connect_timeout,
            WebSocketConnection::connect(&config.url),
        )
        .await
        .map_err(|_| ClientError::ConnectTimeout(config.connect_timeout))??;

        tracing::info!(conn_id = %conn.id(), url = %config.url, "connected");
        Ok(Self::from_connection(conn))
    }

    /// Wraps an already open connection and starts the listener.
    pub fn from_connection(
        conn: WebSocketConnection,
    ) -> (Self, mpsc::UnboundedReceiver<ClientEvent>) {
        let conn = Arc::new(conn);
        let (replies_tx, replies_rx) = mpsc::unbounded_channel();
        let (secret_tx, secret_rx) = mpsc::unbounded_channel();
        let (results_tx, results_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let awaiting_reply = Arc::new(AtomicBool::new(false));

        let routes = Routes {
            replies: replies_tx,
            secret: secret_tx,
            results: results_tx,
            events: events_tx,
            awaiting_reply: Arc::clone(&awaiting_reply),
        };
        let listener = tokio::spawn(listen(Arc::clone(&conn), JsonCodec, routes));

        let client = Self {
            conn,
            codec: JsonCodec,
            slots: Slots {
                replies: Mutex::new(replies_rx),
                secret: Mutex::new(secret_rx),
                results: Mutex::new(results_rx),
            },
            submitted: AtomicBool::new(false),
            awaiting_reply,
            listener,
        };
        (client, events_rx)
    }

    /// Asks the server for a new game and returns its code.
    ///
    /// # Errors
    /// [`ClientError::Rejected`] if the server has no free codes.
    pub async fn create_game(&self) -> Result<GameCode, ClientError> {
        match self.request(&ClientRequest::CreateGame).await? {
            Reply::GameCode(code) => {
                tracing::info!(%code, "game created");
                Ok(code)
            }
            Reply::Rejected(message) => Err(ClientError::Rejected(message)),
            Reply::Joined => Err(unexpected("joined")),
        }
    }

    /// Asks to join the game with `code`.
    ///
    /// Returns `false` if the server rejected the code; the reason also
    /// arrives as [`ClientEvent::Rejected`].
    pub async fn join_game(&self, code: &GameCode) -> Result<bool, ClientError> {
        let request = ClientRequest::JoinGame { code: code.clone() };
        match self.request(&request).await? {
            Reply::Joined => {
                tracing::info!(%code, "joined game");
                Ok(true)
            }
            Reply::Rejected(message) => {
                tracing::info!(%code, %message, "join rejected");
                Ok(false)
            }
            Reply::GameCode(_) => Err(unexpected("gameCode")),
        }
    }

    /// Waits for the shared secret. Each secret is handed out once.
    pub async fn receive_secret_code(&self) -> Result<Vec<String>, ClientError> {
        self.slots
            .secret
            .lock()
            .await
            .recv()
            .await
            .ok_or(ClientError::Disconnected)
    }

    /// Reports this player's result, unless one was already reported.
    pub async fn submit_result(&self, result: GameResult) -> Result<Submission, ClientError> {
        if self.submitted.swap(true, Ordering::SeqCst) {
            tracing::debug!("result already submitted, ignoring");
            return Ok(Submission::AlreadySubmitted);
        }
        self.send(&ClientRequest::SubmitResult { result }).await?;
        tracing::debug!(?result, "result submitted");
        Ok(Submission::Sent)
    }

    /// Reports a forfeit because the time ran out.
    ///
    /// Shares the submission latch with [`submit_result`](Self::submit_result),
    /// so whichever comes first is the only one sent.
    pub async fn send_timeout_forfeiture(&self) -> Result<Submission, ClientError> {
        self.submit_result(GameResult::forfeit()).await
    }

    /// Waits for the outcome text.
    ///
    /// # Errors
    /// [`ClientError::Rejected`] if the server refused the submitted result,
    /// e.g. because the opponent never joined.
    pub async fn receive_results(&self) -> Result<String, ClientError> {
        match self.slots.results.lock().await.recv().await {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(ClientError::Rejected(message)),
            None => Err(ClientError::Disconnected),
        }
    }

    /// Returns `true` once a result has been submitted.
    pub fn has_submitted(&self) -> bool {
        self.submitted.load(Ordering::SeqCst)
    }

    /// Watches `clock` and submits the forfeiture when it crosses the
    /// ceiling. The returned monitor stops watching when dropped.
    pub fn start_timeout_monitor(
        self: &Arc<Self>,
        clock: SharedClock,
        config: MonitorConfig,
    ) -> TimeoutMonitor {
        let client = Arc::clone(self);
        TimeoutMonitor::spawn(clock, config, move || {
            tokio::spawn(async move {
                if let Err(e) = client.send_timeout_forfeiture().await {
                    tracing::warn!(error = %e, "failed to send timeout forfeiture");
                }
            });
        })
    }

    /// Closes the connection.
    pub async fn close(&self) -> Result<(), ClientError> {
        self.conn.close().await?;
        Ok(())
    }

    async fn send(&self, request: &ClientRequest) -> Result<(), ClientError> {
        let bytes = self.codec.encode(request)?;
        self.conn.send(&bytes).await?;
        Ok(())
    }

    /// Sends a create or join and waits for its direct reply.
    async fn request(&self, request: &ClientRequest) -> Result<Reply, ClientError> {
        let mut replies = self.slots.replies.lock().await;
        self.awaiting_reply.store(true, Ordering::SeqCst);
        if let Err(e) = self.send(request).await {
            self.awaiting_reply.store(false, Ordering::SeqCst);
            return Err(e);
        }
        replies.recv().await.ok_or(ClientError::Disconnected)
    }
}

impl Drop for MatchClient {
    fn drop(&mut self) {
        self.listener.abort();
    }
}

fn unexpected(status: &str) -> ClientError {
    ClientError::Protocol(ProtocolError::InvalidMessage(format!(
        "unexpected {status} reply"
    )))
}

/// Routes every incoming message until the connection ends.
async fn listen(conn: Arc<WebSocketConnection>, codec: JsonCodec, routes: Routes) {
    let conn_id = conn.id();
    let mut results_delivered = false;

    loop {
        let data = match conn.recv().await {
            Ok(Incoming::Frame(data)) => data,
            Ok(Incoming::Closed) => {
                tracing::debug!(%conn_id, "server closed the connection");
                break;
            }
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "recv error");
                break;
            }
        };

        let message: ServerMessage = match codec.decode(&data) {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!(%conn_id, error = %e, "undecodable server message");
                break;
            }
        };
        tracing::debug!(%conn_id, ?message, "received");

        // A send only fails when the client was dropped; nothing to do then.
        match message {
            ServerMessage::GameCode { code } => {
                routes.awaiting_reply.store(false, Ordering::SeqCst);
                let _ = routes.replies.send(Reply::GameCode(code));
            }
            ServerMessage::Joined => {
                routes.awaiting_reply.store(false, Ordering::SeqCst);
                let _ = routes.replies.send(Reply::Joined);
            }
            ServerMessage::Error { message } => {
                let _ = routes.events.send(ClientEvent::Rejected(message.clone()));
                if routes.awaiting_reply.swap(false, Ordering::SeqCst) {
                    let _ = routes.replies.send(Reply::Rejected(message));
                } else {
                    let _ = routes.results.send(Err(message));
                }
            }
            ServerMessage::SecretCode { sequence } => {
                let _ = routes.secret.send(sequence);
            }
            ServerMessage::Results { text } => {
                results_delivered = true;
                let _ = routes.results.send(Ok(text));
            }
            ServerMessage::OpponentDisconnected => {
                let _ = routes.events.send(ClientEvent::OpponentDisconnected);
            }
        }
    }

    // The server closes every connection after the outcome; that close is
    // expected and not reported.
    if !results_delivered {
        let _ = routes.events.send(ClientEvent::ServerDisconnected);
    }
    tracing::debug!(%conn_id, "listener stopped");
}
