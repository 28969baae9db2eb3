//! Client side of the codeduel protocol.
//!
//! [`MatchClient`] connects to a server, creates or joins a game, waits for
//! the shared secret, reports one result, and waits for the outcome.
//! Everything the server pushes without being asked comes out as a
//! [`ClientEvent`].
//!
//! ```rust,no_run
//! use codeduel_client::{ClientConfig, MatchClient};
//! use codeduel_protocol::GameResult;
//!
//! # async fn play() -> Result<(), codeduel_client::ClientError> {
//! let (client, _events) = MatchClient::connect(&ClientConfig::default()).await?;
//! let code = client.create_game().await?;
//! println!("tell your opponent: {code}");
//!
//! let secret = client.receive_secret_code().await?;
//! // ... play against `secret` ...
//! client.submit_result(GameResult::finished(true, 5, 12_000)).await?;
//! println!("{}", client.receive_results().await?);
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod error;
mod event;

pub use client::MatchClient;
pub use config::ClientConfig;
pub use error::ClientError;
pub use event::{ClientEvent, Submission};
