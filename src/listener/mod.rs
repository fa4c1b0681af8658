//! Listener Module
//!
//! Consumers of inbound commands. Each listener runs on its own thread and
//! drains its own mailbox, so a slow listener only ever delays itself.
//!
//! ## Built-in listeners
//! - [`AutoPong`]: answers keepalive PINGs
//! - [`ChannelLogger`]: appends one channel's activity to a file

mod auto_pong;
mod channel_logger;

pub use auto_pong::AutoPong;
pub use channel_logger::{open_log, ChannelLogger, TIMESTAMP_FORMAT};

use std::thread::{self, JoinHandle};

use crate::error::Result;
use crate::network::Mailbox;
use crate::protocol::Command;

/// Processes commands one at a time, in arrival order
pub trait Listener: Send + 'static {
    /// Short name used for the thread and in logs
    fn name(&self) -> &str;

    /// Handle one command. Errors are logged and the loop continues.
    fn handle(&mut self, command: &Command) -> Result<()>;
}

/// Anything commands can be written to
pub trait CommandSink: Send + Sync + 'static {
    fn send(&self, command: &Command) -> Result<()>;
}

/// Run `listener` on a new thread until `mailbox` closes
pub fn spawn<L: Listener>(mut listener: L, mailbox: Mailbox) -> Result<JoinHandle<()>> {
    let thread_name = format!("listener-{}", listener.name());

    let handle = thread::Builder::new().name(thread_name).spawn(move || {
        tracing::debug!("Listener {} started on mailbox {}", listener.name(), mailbox.id());

        for command in mailbox.iter() {
            if let Err(e) = listener.handle(&command) {
                tracing::warn!("Listener {} failed on {}: {}", listener.name(), command.verb, e);
            }
        }

        tracing::debug!(
            "Listener {} stopped ({} commands dropped)",
            listener.name(),
            mailbox.dropped()
        );
    })?;

    Ok(handle)
}
