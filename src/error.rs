//! Error types for kisslight
//!
//! Provides a unified error type for all client operations.

use thiserror::Error;

use crate::protocol::{Status, Verb};

/// Result type alias using KlError
pub type Result<T> = std::result::Result<T, KlError>;

/// Unified error type for kisslight operations
#[derive(Debug, Error)]
pub enum KlError {
    // -------------------------------------------------------------------------
    // Usage Errors
    // -------------------------------------------------------------------------
    /// Bad or missing arguments, detected before any network I/O
    #[error("Usage error: {0}")]
    Usage(String),

    // -------------------------------------------------------------------------
    // Transport Errors
    // -------------------------------------------------------------------------
    /// Connect, read or write failure on the hub connection
    #[error("Transport error: {0}")]
    Transport(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Protocol Errors
    // -------------------------------------------------------------------------
    /// Reply line missing expected tokens or carrying a non-numeric status
    #[error("Malformed reply: {0}")]
    MalformedReply(String),

    /// Well-formed reply with a non-success status
    #[error("{verb} rejected by hub ({status}): {message}")]
    ProtocolRejection {
        verb: Verb,
        status: Status,
        message: String,
    },

    // -------------------------------------------------------------------------
    // Code Learning Errors
    // -------------------------------------------------------------------------
    /// Learned or manually entered code fails the nibble-pattern check
    #[error("code {code} is invalid, not adding")]
    InvalidLearnedCode { code: i64 },

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl KlError {
    /// Build a rejection error for `verb`
    pub fn rejection(verb: Verb, status: Status, message: impl Into<String>) -> Self {
        KlError::ProtocolRejection {
            verb,
            status,
            message: message.into(),
        }
    }
}
