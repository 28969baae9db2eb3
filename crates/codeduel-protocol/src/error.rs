//! Error types for the protocol layer.
//!
//! Each crate in codeduel defines its own error enum. When you see a
//! `ProtocolError`, the problem is in turning messages into bytes or back,
//! not in networking or session bookkeeping.

/// Errors that can occur in the protocol layer.
///
/// `#[derive(thiserror::Error)]` generates the `std::error::Error` impl;
/// the `#[error("...")]` attributes are the messages that show up in logs.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a Rust type).
    ///
    /// Common causes: malformed JSON, a missing field, or an `action` /
    /// `status` value this side does not know.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The message decoded but breaks a protocol rule.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
