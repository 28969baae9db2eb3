//! # codeduel
//!
//! Server for a two-player code-breaking duel.
//!
//! One player creates a game and receives a short numeric code; the other
//! joins with that code. Both get the same secret sequence, each reports
//! how their own attempt went, and each is told who won. The server only
//! matches players and judges results; guessing happens on the clients.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use codeduel::prelude::*;
//!
//! # async fn start() -> Result<(), CodeduelError> {
//! let server = CodeduelServer::builder()
//!     .bind("0.0.0.0:12345")
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod error;
mod handler;
mod server;

pub use error::CodeduelError;
pub use server::{CodeduelServer, CodeduelServerBuilder, DEFAULT_PORT, ServerConfig};

/// Re-exports of the commonly used types from every layer.
pub mod prelude {
    pub use crate::{CodeduelError, CodeduelServer, CodeduelServerBuilder, ServerConfig};
    pub use codeduel_protocol::{
        ClientRequest, Codec, GameCode, GameResult, JsonCodec, ServerMessage,
    };
    pub use codeduel_session::{
        RandomSecret, SecretGenerator, SessionError, SessionRegistry, Settings,
    };
    pub use codeduel_transport::{ConnectionId, TransportError};
}
