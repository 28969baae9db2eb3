//! `CodeduelServer` builder and server loop.
//!
//! This is the entry point for running a codeduel server. It ties
//! together all the layers: transport → protocol → session registry.

use std::future::Future;
use std::ops::RangeInclusive;
use std::sync::Arc;
use std::time::Duration;

use codeduel_protocol::JsonCodec;
use codeduel_session::{
    CodePool, DEFAULT_CODE_RANGE, RandomSecret, SecretGenerator, SessionRegistry, Settings,
};
use codeduel_transport::{Transport, WebSocketTransport};
use tokio::sync::Mutex;

use crate::CodeduelError;
use crate::handler::handle_connection;

/// Port the server listens on when none is given.
pub const DEFAULT_PORT: u16 = 12345;

/// Everything needed to start a server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on, e.g. `0.0.0.0:12345`.
    pub bind_addr: String,
    /// A connection that sends nothing for this long is dropped.
    pub idle_timeout: Duration,
    /// Secret length and symbols for every game.
    pub settings: Settings,
    /// Game codes handed out to sessions.
    pub code_range: RangeInclusive<u16>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: format!("127.0.0.1:{DEFAULT_PORT}"),
            idle_timeout: Duration::from_secs(10 * 60),
            settings: Settings::default(),
            code_range: DEFAULT_CODE_RANGE,
        }
    }
}

/// Shared server state passed to each connection handler task.
///
/// Wrapped in `Arc` so it can be cheaply cloned across tasks. The
/// registry's mutex is the one lock every session operation goes through.
pub(crate) struct ServerState<G: SecretGenerator> {
    pub(crate) registry: Mutex<SessionRegistry<G>>,
    pub(crate) codec: JsonCodec,
    pub(crate) idle_timeout: Duration,
}

/// Builder for configuring and starting a codeduel server.
///
/// # Example
///
/// ```rust,no_run
/// use codeduel::prelude::*;
///
/// # async fn start() -> Result<(), CodeduelError> {
/// let server = CodeduelServer::builder()
///     .bind("0.0.0.0:12345")
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct CodeduelServerBuilder {
    config: ServerConfig,
}

impl CodeduelServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
        }
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_addr = addr.to_string();
        self
    }

    /// Sets how long a silent connection is kept open.
    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.config.idle_timeout = timeout;
        self
    }

    /// Sets the game settings.
    pub fn settings(mut self, settings: Settings) -> Self {
        self.config.settings = settings;
        self
    }

    /// Sets the range game codes are drawn from.
    pub fn code_range(mut self, range: RangeInclusive<u16>) -> Self {
        self.config.code_range = range;
        self
    }

    /// Binds the listener with random secrets.
    pub async fn build(self) -> Result<CodeduelServer<RandomSecret>, CodeduelError> {
        self.build_with(RandomSecret::new()).await
    }

    /// Binds the listener with the given secret generator.
    pub async fn build_with<G: SecretGenerator>(
        self,
        secrets: G,
    ) -> Result<CodeduelServer<G>, CodeduelError> {
        let ServerConfig {
            bind_addr,
            idle_timeout,
            settings,
            code_range,
        } = self.config;

        let transport = WebSocketTransport::bind(&bind_addr).await?;
        let registry =
            SessionRegistry::with_parts(CodePool::shuffled(code_range), settings, secrets);

        let state = Arc::new(ServerState {
            registry: Mutex::new(registry),
            codec: JsonCodec,
            idle_timeout,
        });

        Ok(CodeduelServer { transport, state })
    }
}

impl Default for CodeduelServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A codeduel server, bound and ready to accept.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct CodeduelServer<G: SecretGenerator = RandomSecret> {
    transport: WebSocketTransport,
    state: Arc<ServerState<G>>,
}

impl CodeduelServer {
    /// Creates a new builder.
    pub fn builder() -> CodeduelServerBuilder {
        CodeduelServerBuilder::new()
    }
}

impl<G: SecretGenerator> CodeduelServer<G> {
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the accept loop until the process is terminated.
    pub async fn run(self) -> Result<(), CodeduelError> {
        self.run_until(std::future::pending()).await
    }

    /// Runs the accept loop until `shutdown` resolves, then tears down
    /// every live session. Handlers close their connections as their
    /// outboxes drain.
    pub async fn run_until(
        mut self,
        shutdown: impl Future<Output = ()>,
    ) -> Result<(), CodeduelError> {
        tracing::info!("codeduel server running");
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                accepted = self.transport.accept() => match accepted {
                    Ok(conn) => {
                        let state = Arc::clone(&self.state);
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(conn, state).await {
                                tracing::debug!(error = %e, "connection ended with error");
                            }
                        });
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "accept failed");
                    }
                },
            }
        }

        self.state.registry.lock().await.shutdown();
        tracing::info!("codeduel server stopped");
        Ok(())
    }
}
