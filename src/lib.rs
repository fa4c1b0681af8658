//! # chanlog
//!
//! A minimal IRC client core with:
//! - A line codec between raw IRC and structured [`Command`]s
//! - One reader thread per connection, never blocked by listeners
//! - Bounded per-listener mailboxes with a drop-newest overflow policy
//! - Built-in keepalive replies and per-channel activity logs
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        IRC Server                            │
//! └──────────────▲──────────────────────────┬───────────────────┘
//!                │ send (Mutex)             │ read loop
//!                │                          ▼
//!                │                 ┌─────────────────┐
//!                │                 │  codec::parse   │
//!                │                 └────────┬────────┘
//!                │                          ▼
//!                │                 ┌─────────────────┐
//!                │                 │   Dispatcher    │
//!                │                 │  (try_send)     │
//!                │                 └───┬─────────┬───┘
//!                │                     │         │
//!                │                     ▼         ▼
//!         ┌──────┴──────┐      ┌─────────────┐  ┌─────────────┐
//!         │  AutoPong   │◄─────┤  Mailbox    │  │  Mailbox    │
//!         └─────────────┘      └─────────────┘  └──────┬──────┘
//!                                                      ▼
//!                                              ┌───────────────┐
//!                                              │ ChannelLogger │
//!                                              │   (file)      │
//!                                              └───────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod protocol;
pub mod network;
pub mod listener;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{ChanlogError, ParseError, Result, SerializeError};
pub use config::Config;
pub use protocol::{parse, serialize, Command};
pub use network::{Connection, ConnectionState, Disconnect, Mailbox, Termination};
pub use listener::{AutoPong, ChannelLogger, CommandSink, Listener};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of chanlog
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
