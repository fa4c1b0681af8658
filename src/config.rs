//! Configuration for chanlog
//!
//! Centralized connection settings with sensible defaults.

use crate::error::{ChanlogError, Result};

/// Default capacity of every listener mailbox
pub const DEFAULT_MAILBOX_CAPACITY: usize = 16;

/// Connection configuration
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Server
    // -------------------------------------------------------------------------
    /// IRC server address (host:port)
    pub server_addr: String,

    // -------------------------------------------------------------------------
    // Registration
    // -------------------------------------------------------------------------
    /// Nickname sent with NICK
    pub nick: String,

    /// Username sent with USER
    pub username: String,

    /// Real name sent as the trailing USER parameter
    pub realname: String,

    // -------------------------------------------------------------------------
    // Dispatch
    // -------------------------------------------------------------------------
    /// Queue depth of each listener mailbox before commands are dropped
    pub mailbox_capacity: usize,

    /// Register the built-in PING responder on connect
    pub auto_pong: bool,

    // -------------------------------------------------------------------------
    // Socket
    // -------------------------------------------------------------------------
    /// Connect timeout (milliseconds, 0 = OS default)
    pub connect_timeout_ms: u64,

    /// Read timeout (milliseconds, 0 = block forever)
    pub read_timeout_ms: u64,

    /// Write timeout (milliseconds, 0 = block forever)
    pub write_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_addr: "127.0.0.1:6667".to_string(),
            nick: "chanlog".to_string(),
            username: "chanlog".to_string(),
            realname: "chanlog IRC archiver".to_string(),
            mailbox_capacity: DEFAULT_MAILBOX_CAPACITY,
            auto_pong: true,
            connect_timeout_ms: 10_000,
            read_timeout_ms: 0,
            write_timeout_ms: 5000,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check that the registration fields can be put on the wire
    pub fn validate(&self) -> Result<()> {
        if self.nick.is_empty() || self.nick.contains(' ') {
            return Err(ChanlogError::Config(format!(
                "invalid nick {:?}",
                self.nick
            )));
        }
        if self.username.is_empty() || self.username.contains(' ') {
            return Err(ChanlogError::Config(format!(
                "invalid username {:?}",
                self.username
            )));
        }
        if self.mailbox_capacity == 0 {
            return Err(ChanlogError::Config(
                "mailbox capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the server address (host:port)
    pub fn server_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.server_addr = addr.into();
        self
    }

    /// Set the nickname
    pub fn nick(mut self, nick: impl Into<String>) -> Self {
        self.config.nick = nick.into();
        self
    }

    /// Set the username
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.config.username = username.into();
        self
    }

    /// Set the real name
    pub fn realname(mut self, realname: impl Into<String>) -> Self {
        self.config.realname = realname.into();
        self
    }

    /// Set the per-listener mailbox capacity
    pub fn mailbox_capacity(mut self, capacity: usize) -> Self {
        self.config.mailbox_capacity = capacity;
        self
    }

    /// Enable or disable the built-in PING responder
    pub fn auto_pong(mut self, enabled: bool) -> Self {
        self.config.auto_pong = enabled;
        self
    }

    /// Set the connect timeout (in milliseconds)
    pub fn connect_timeout_ms(mut self, ms: u64) -> Self {
        self.config.connect_timeout_ms = ms;
        self
    }

    /// Set the read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
