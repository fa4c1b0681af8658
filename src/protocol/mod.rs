//! Protocol Module
//!
//! The IRC line format and its structured representation.
//!
//! ## Line Format
//! ```text
//! :nick!user@host PRIVMSG #chat :hello world\r\n
//! └──── source ──┘ └─verb─┘ └arg┘ └─trailing─┘
//! ```
//!
//! ### Commands the client relies on
//! - NICK, USER: registration handshake
//! - JOIN, PART, TOPIC, PRIVMSG, QUIT: channel activity
//! - PING / PONG: keepalive

mod command;
mod codec;

pub use command::Command;
pub use codec::{parse, serialize, read_line, write_command, LINE_ENDING, MAX_LINE_LENGTH};
