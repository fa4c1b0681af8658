//! Channel activity logger

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

use chrono::Local;

use super::Listener;
use crate::error::{ChanlogError, Result};
use crate::protocol::Command;

/// Timestamp layout inside the leading brackets of every record
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f %z";

/// Open (creating if needed) a log file for appending
pub fn open_log(path: impl AsRef<Path>) -> Result<File> {
    let path = path.as_ref();
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| ChanlogError::File {
            path: path.to_path_buf(),
            source,
        })
}

/// Appends `[timestamp] record` lines for one channel
///
/// | Verb    | Record                                   |
/// |---------|------------------------------------------|
/// | PRIVMSG | `<source>: <text>`                       |
/// | JOIN    | `<source> has joined <channel>`          |
/// | PART    | `<source> has left <channel>`            |
/// | TOPIC   | `<source> has set the topic to <topic>`  |
/// | QUIT    | `<source> has quit: <message>`           |
///
/// QUIT carries no channel, so every logger records it.
pub struct ChannelLogger<W: Write + Send + 'static = File> {
    channel: String,
    name: String,
    out: W,
}

impl<W: Write + Send + 'static> ChannelLogger<W> {
    pub fn new(channel: impl Into<String>, out: W) -> Self {
        let channel = channel.into();
        let name = format!("log{}", channel);
        Self { channel, name, out }
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// The record for `command`, without timestamp, or `None` if it
    /// doesn't belong in this log
    pub fn format_record(&self, command: &Command) -> Option<String> {
        let source = command.source.as_deref().unwrap_or("*");
        let in_channel = command.arg(0) == Some(self.channel.as_str());

        match command.verb.to_ascii_uppercase().as_str() {
            "PRIVMSG" if in_channel => command
                .arg(1)
                .map(|text| format!("{}: {}", source, text)),
            "JOIN" if in_channel => Some(format!("{} has joined {}", source, self.channel)),
            "PART" if in_channel => Some(format!("{} has left {}", source, self.channel)),
            "TOPIC" if in_channel => command
                .arg(1)
                .map(|topic| format!("{} has set the topic to {}", source, topic)),
            "QUIT" => Some(match command.arg(0) {
                Some(message) => format!("{} has quit: {}", source, message),
                None => format!("{} has quit", source),
            }),
            _ => None,
        }
    }
}

impl<W: Write + Send + 'static> Listener for ChannelLogger<W> {
    fn name(&self) -> &str {
        &self.name
    }

    fn handle(&mut self, command: &Command) -> Result<()> {
        let Some(record) = self.format_record(command) else {
            return Ok(());
        };

        // Whole record in a single write
        let line = format!("[{}] {}\n", Local::now().format(TIMESTAMP_FORMAT), record);
        self.out.write_all(line.as_bytes())?;
        self.out.flush()?;
        Ok(())
    }
}
