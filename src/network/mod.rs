//! Network Module
//!
//! The connection to an IRC server and the fan-out of what it reads.
//!
//! ## Architecture
//! - Single reader thread per connection
//! - Dispatcher offering each command to bounded per-listener mailboxes
//! - Mutex-guarded write path shared by every sender
//! - Single-shot termination signal

mod connection;
mod dispatcher;
mod termination;

pub use connection::{Connection, ConnectionState};
pub use dispatcher::{Dispatcher, Mailbox};
pub use termination::{Disconnect, Termination};
