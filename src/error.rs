//! Error types for chanlog
//!
//! Codec failures get their own narrow enums so callers can match on them;
//! everything else funnels into [`ChanlogError`].

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using ChanlogError
pub type Result<T> = std::result::Result<T, ChanlogError>;

/// A raw inbound line that could not be turned into a command
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("too few tokens: expected at least 2, got {0}")]
    TooFewTokens(usize),

    #[error("empty source prefix")]
    EmptySource,

    #[error("empty command verb")]
    EmptyCommand,
}

/// An outbound command that cannot be represented on the wire
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SerializeError {
    #[error("invalid verb {0:?}")]
    InvalidVerb(String),

    #[error("invalid source {0:?}")]
    InvalidSource(String),

    #[error("space in non-final argument {index}")]
    SpaceInArgument { index: usize },

    #[error("empty non-final argument {index}")]
    EmptyArgument { index: usize },

    #[error("non-final argument {index} starts with ':'")]
    ColonPrefixedArgument { index: usize },

    #[error("line break in argument {index}")]
    LineBreak { index: usize },
}

/// Unified error type for chanlog operations
#[derive(Debug, Error)]
pub enum ChanlogError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to open log file {}: {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // -------------------------------------------------------------------------
    // Protocol Errors
    // -------------------------------------------------------------------------
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Serialize error: {0}")]
    Serialize(#[from] SerializeError),

    // -------------------------------------------------------------------------
    // Connection Errors
    // -------------------------------------------------------------------------
    #[error("Failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Connection is {0}, expected idle")]
    InvalidState(&'static str),

    #[error("Connection is not open")]
    NotConnected,

    #[error("Write failed: {0}")]
    Write(#[source] std::io::Error),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}
