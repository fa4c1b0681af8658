//! Protocol codec
//!
//! Conversion between raw IRC lines and [`Command`] values.
//!
//! ## Wire Format
//!
//! ```text
//! [':' source SP] verb *( SP arg ) [ SP ':' trailing ] CRLF
//! ```
//!
//! Only the trailing parameter may contain spaces. It is marked with a
//! leading colon, which is not part of its value.

use std::io::{self, BufRead, Read, Write};

use super::Command;
use crate::error::{ChanlogError, ParseError, Result, SerializeError};

/// Line terminator appended to every serialized command
pub const LINE_ENDING: &str = "\r\n";

/// Maximum inbound line length in bytes, not counting the final `\n`
pub const MAX_LINE_LENGTH: usize = 8192;

// =============================================================================
// Parsing
// =============================================================================

/// Parse one raw line (with or without its terminator) into a command
pub fn parse(raw: &str) -> std::result::Result<Command, ParseError> {
    let line = strip_line_ending(raw);
    let tokens: Vec<&str> = line.split(' ').collect();

    if tokens.len() < 2 {
        return Err(ParseError::TooFewTokens(tokens.len()));
    }

    let (source, verb, args_start) = match tokens[0].strip_prefix(':') {
        Some("") => return Err(ParseError::EmptySource),
        Some(source) => (Some(source.to_string()), tokens[1], 2),
        None => (None, tokens[0], 1),
    };

    if verb.is_empty() {
        return Err(ParseError::EmptyCommand);
    }

    let rest = &tokens[args_start..];
    let mut args = Vec::with_capacity(rest.len());
    for (index, token) in rest.iter().enumerate() {
        if let Some(first) = token.strip_prefix(':') {
            let mut trailing = first.to_string();
            for word in &rest[index + 1..] {
                trailing.push(' ');
                trailing.push_str(word);
            }
            args.push(trailing);
            break;
        }
        args.push((*token).to_string());
    }

    Ok(Command {
        source,
        verb: verb.to_string(),
        args,
    })
}

fn strip_line_ending(raw: &str) -> &str {
    raw.strip_suffix("\r\n")
        .or_else(|| raw.strip_suffix('\n'))
        .unwrap_or(raw)
}

// =============================================================================
// Serialization
// =============================================================================

/// Serialize a command to a CRLF-terminated wire line
pub fn serialize(command: &Command) -> std::result::Result<String, SerializeError> {
    if command.verb.is_empty()
        || command.verb.starts_with(':')
        || command.verb.contains([' ', '\r', '\n'])
    {
        return Err(SerializeError::InvalidVerb(command.verb.clone()));
    }

    let mut out = String::with_capacity(64);

    if let Some(source) = &command.source {
        if source.is_empty() || source.contains([' ', '\r', '\n']) {
            return Err(SerializeError::InvalidSource(source.clone()));
        }
        out.push(':');
        out.push_str(source);
        out.push(' ');
    }
    out.push_str(&command.verb);

    if let Some((last, rest)) = command.args.split_last() {
        for (index, arg) in rest.iter().enumerate() {
            check_line_break(arg, index)?;
            if arg.contains(' ') {
                return Err(SerializeError::SpaceInArgument { index });
            }
            if arg.is_empty() {
                return Err(SerializeError::EmptyArgument { index });
            }
            if arg.starts_with(':') {
                return Err(SerializeError::ColonPrefixedArgument { index });
            }
            out.push(' ');
            out.push_str(arg);
        }

        check_line_break(last, rest.len())?;
        out.push(' ');
        if last.is_empty() || last.contains(' ') || last.starts_with(':') {
            out.push(':');
        }
        out.push_str(last);
    }

    out.push_str(LINE_ENDING);
    Ok(out)
}

fn check_line_break(arg: &str, index: usize) -> std::result::Result<(), SerializeError> {
    if arg.contains(['\r', '\n']) {
        return Err(SerializeError::LineBreak { index });
    }
    Ok(())
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Read one `\n`-terminated line from a stream
///
/// Invalid UTF-8 is replaced rather than rejected. Returns `None` at EOF.
/// A line longer than [`MAX_LINE_LENGTH`] fails with `InvalidData`.
pub fn read_line<R: BufRead>(reader: &mut R) -> io::Result<Option<String>> {
    let mut buf = Vec::with_capacity(512);
    let limit = MAX_LINE_LENGTH as u64 + 1;

    let read = reader.by_ref().take(limit).read_until(b'\n', &mut buf)?;
    if read == 0 {
        return Ok(None);
    }
    if read > MAX_LINE_LENGTH && buf.last() != Some(&b'\n') {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("line exceeds {} bytes", MAX_LINE_LENGTH),
        ));
    }

    Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
}

/// Serialize a command and write it to a stream as one line
///
/// Nothing is written if serialization fails. I/O failures are reported as
/// [`ChanlogError::Write`].
pub fn write_command<W: Write>(writer: &mut W, command: &Command) -> Result<()> {
    let line = serialize(command)?;
    writer
        .write_all(line.as_bytes())
        .and_then(|()| writer.flush())
        .map_err(ChanlogError::Write)
}
