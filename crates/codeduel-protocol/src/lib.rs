//! Wire protocol for codeduel.
//!
//! This crate defines the "language" that player clients and the duel
//! server speak:
//!
//! - **Types** ([`ClientRequest`], [`ServerMessage`], [`GameResult`],
//!   [`GameCode`]): the records that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how those records are
//!   converted to/from bytes.
//! - **Errors** ([`ProtocolError`]): what can go wrong during
//!   encoding/decoding.
//!
//! # Architecture
//!
//! The protocol layer sits between transport (raw frames) and the session
//! engine. It knows nothing about connections or sessions.
//!
//! ```text
//! Transport (frames) → Protocol (ClientRequest / ServerMessage) → Session registry
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{ClientRequest, GameCode, GameResult, ServerMessage};
