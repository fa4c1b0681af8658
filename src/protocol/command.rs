//! Command definitions
//!
//! One IRC protocol message, inbound or outbound.

use std::fmt;

/// A single IRC message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Origin prefix (server name or `nick!user@host`), absent on
    /// client-originated commands
    pub source: Option<String>,

    /// Command verb or three-digit numeric reply
    pub verb: String,

    /// Parameters; only the last one may contain spaces
    pub args: Vec<String>,
}

impl Command {
    /// Create a client-originated command
    pub fn new<I, S>(verb: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            source: None,
            verb: verb.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Attach an origin prefix
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Get the argument at `index`, if present
    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str)
    }

    /// Check the verb, ignoring ASCII case
    pub fn is(&self, verb: &str) -> bool {
        self.verb.eq_ignore_ascii_case(verb)
    }

    // =========================================================================
    // Constructors for the commands a client sends
    // =========================================================================

    pub fn nick(nick: impl Into<String>) -> Self {
        Self::client("NICK", vec![nick.into()])
    }

    /// `USER <username> 0 * :<realname>`
    pub fn user(username: impl Into<String>, realname: impl Into<String>) -> Self {
        Self::client(
            "USER",
            vec![username.into(), "0".to_string(), "*".to_string(), realname.into()],
        )
    }

    pub fn join(channel: impl Into<String>) -> Self {
        Self::client("JOIN", vec![channel.into()])
    }

    pub fn part(channel: impl Into<String>) -> Self {
        Self::client("PART", vec![channel.into()])
    }

    pub fn privmsg(target: impl Into<String>, text: impl Into<String>) -> Self {
        Self::client("PRIVMSG", vec![target.into(), text.into()])
    }

    pub fn pong(token: impl Into<String>) -> Self {
        Self::client("PONG", vec![token.into()])
    }

    pub fn quit(message: impl Into<String>) -> Self {
        Self::client("QUIT", vec![message.into()])
    }

    fn client(verb: &str, args: Vec<String>) -> Self {
        Self {
            source: None,
            verb: verb.to_string(),
            args,
        }
    }
}

/// Human-readable form for logs; not validated, use
/// [`serialize`](super::serialize) for the wire
impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(source) = &self.source {
            write!(f, ":{} ", source)?;
        }
        write!(f, "{}", self.verb)?;
        if let Some((last, rest)) = self.args.split_last() {
            for arg in rest {
                write!(f, " {}", arg)?;
            }
            write!(f, " :{}", last)?;
        }
        Ok(())
    }
}
