//! Keepalive responder

use super::{CommandSink, Listener};
use crate::error::Result;
use crate::protocol::Command;

/// Replies `PONG <token>` to every `PING <token>`
pub struct AutoPong<S: CommandSink> {
    sink: S,
}

impl<S: CommandSink> AutoPong<S> {
    pub fn new(sink: S) -> Self {
        Self { sink }
    }
}

impl<S: CommandSink> Listener for AutoPong<S> {
    fn name(&self) -> &str {
        "auto-pong"
    }

    fn handle(&mut self, command: &Command) -> Result<()> {
        if !command.is("PING") {
            return Ok(());
        }

        match command.arg(0) {
            Some(token) => {
                tracing::debug!("PING {}, sending PONG", token);
                self.sink.send(&Command::pong(token))
            }
            None => {
                tracing::debug!("Ignoring PING without a token");
                Ok(())
            }
        }
    }
}
