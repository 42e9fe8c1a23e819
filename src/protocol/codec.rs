//! Protocol codec
//!
//! Encoding and decoding functions for the line protocol.
//!
//! ## Wire Format
//!
//! ### Request Format
//! ```text
//! VERB ARG1 ARG2 ... KL/<major>.<minor>\n
//! ```
//!
//! ### Requests by Verb
//! - TOGGLE:   `TOGGLE <name>`
//! - SET:      `SET <name> <CMD> [<ARG>]` (command and arg upper-cased)
//! - TRANSMIT: `TRANSMIT <topic> <message>` or `TRANSMIT <code> <pulse>`
//! - ADD:      `ADD <name> <topic> <type-id> [<cmds>]` or `ADD <name> <on> <off> <pulse>`
//! - DELETE:   `DELETE <name>`
//! - SNIFF:    `SNIFF`
//! - LIST:     `LIST`
//! - STATUS:   `STATUS <name>`
//! - UPDATE:   `UPDATE NAME|TOPIC|STATE <name> [<value>]`
//! - Q:        `Q` (no version token)
//!
//! ### Reply Format
//! ```text
//! KL/<major>.<minor> <status> <tokens...>\n
//! [body line]*          (LIST: <count> lines, STATUS: until ".")
//! ```

use std::io::{BufRead, ErrorKind, Write};

use crate::error::{KlError, Result};
use super::{Command, ProtocolVersion, Reply, Status};

/// Line terminating a sentinel-delimited body
pub const SENTINEL: &str = ".";

/// The quit line, sent at the end of every session
pub const QUIT_LINE: &str = "Q\n";

/// Upper bound on lines reserved up front for a counted body
const MAX_PREALLOC_LINES: usize = 64;

/// How a variable-length reply body ends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockEnd {
    /// Exactly this many lines follow the header
    Count(usize),

    /// Lines follow until one equals [`SENTINEL`]
    ///
    /// Deprecated for `LIST`, where the header now declares a count. Still
    /// used by `STATUS`.
    Sentinel,
}

// =============================================================================
// Request Encoding
// =============================================================================

/// Render a command as one request line, newline included
pub fn encode_command(command: &Command, version: ProtocolVersion) -> String {
    let verb = command.verb().as_str();

    let args: Vec<String> = match command {
        Command::Toggle { name } => vec![name.clone()],
        Command::Set { name, command, arg } => {
            let mut args = vec![name.clone(), command.to_ascii_uppercase()];
            if let Some(arg) = arg {
                args.push(arg.to_ascii_uppercase());
            }
            args
        }
        Command::Transmit { topic, message } => vec![topic.clone(), message.clone()],
        Command::TransmitCode { code, pulse } => vec![code.to_string(), pulse.to_string()],
        Command::AddDevice {
            name,
            topic,
            device_type,
            commands,
        } => {
            let mut args = vec![name.clone(), topic.clone(), device_type.id().to_string()];
            if let Some(commands) = commands {
                args.push(commands.clone());
            }
            args
        }
        Command::AddCodes {
            name,
            on_code,
            off_code,
            pulse,
        } => vec![
            name.clone(),
            on_code.to_string(),
            off_code.to_string(),
            pulse.to_string(),
        ],
        Command::Delete { name } => vec![name.clone()],
        Command::Sniff | Command::List => Vec::new(),
        Command::Status { name } => vec![name.clone()],
        Command::Update { field, name, value } => {
            let mut args = vec![field.as_str().to_string(), name.clone()];
            if let Some(value) = value {
                args.push(value.clone());
            }
            args
        }
        Command::Quit => return QUIT_LINE.to_string(),
    };

    let mut line = String::with_capacity(64);
    line.push_str(verb);
    for arg in &args {
        line.push(' ');
        line.push_str(arg);
    }
    line.push(' ');
    line.push_str(&version.to_string());
    line.push('\n');

    line
}

// =============================================================================
// Reply Decoding
// =============================================================================

/// Decode one reply line
///
/// The second token is the status code. Unknown codes decode to
/// [`Status::Unrecognized`] rather than failing.
pub fn decode_reply(line: &str) -> Result<Reply> {
    let mut tokens = line.split_whitespace();

    let (tag, status_token) = match (tokens.next(), tokens.next()) {
        (Some(tag), Some(status)) => (tag, status),
        _ => {
            return Err(KlError::MalformedReply(format!(
                "expected at least 2 tokens, got {:?}",
                line.trim_end()
            )))
        }
    };

    if !status_token.bytes().all(|b| b.is_ascii_digit()) {
        return Err(KlError::MalformedReply(format!(
            "status is not a number: {:?}",
            status_token
        )));
    }

    let code = status_token.parse::<u16>().map_err(|_| {
        KlError::MalformedReply(format!("status out of range: {:?}", status_token))
    })?;

    Ok(Reply {
        tag: tag.to_string(),
        status: Status::from_code(code),
        tokens: tokens.map(str::to_string).collect(),
    })
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Read one line, without its line terminator
///
/// End of stream before a line is a transport error.
pub fn read_line<R: BufRead>(reader: &mut R) -> Result<String> {
    let mut line = String::new();
    let read = reader.read_line(&mut line)?;

    if read == 0 {
        return Err(KlError::Transport(std::io::Error::new(
            ErrorKind::UnexpectedEof,
            "hub closed the connection",
        )));
    }

    let trimmed = line.trim_end_matches(['\n', '\r']).len();
    line.truncate(trimmed);
    Ok(line)
}

/// Read and decode one reply line
pub fn read_reply<R: BufRead>(reader: &mut R) -> Result<Reply> {
    let line = read_line(reader)?;
    let reply = decode_reply(&line)?;
    tracing::trace!(status = reply.status.code(), "reply: {}", line);
    Ok(reply)
}

/// Read a reply body
///
/// A count-delimited body that hits end of stream or a sentinel early is an
/// error, never a short result.
pub fn read_block<R: BufRead>(reader: &mut R, end: BlockEnd) -> Result<Vec<String>> {
    match end {
        BlockEnd::Count(count) => {
            // The count comes from the hub, only trust it as far as a hint
            let mut lines = Vec::with_capacity(count.min(MAX_PREALLOC_LINES));
            while lines.len() < count {
                let line = read_line(reader)?;
                if line == SENTINEL {
                    return Err(KlError::MalformedReply(format!(
                        "body ended after {} of {} lines",
                        lines.len(),
                        count
                    )));
                }
                lines.push(line);
            }
            Ok(lines)
        }
        BlockEnd::Sentinel => {
            let mut lines = Vec::new();
            loop {
                let line = read_line(reader)?;
                if line == SENTINEL {
                    return Ok(lines);
                }
                lines.push(line);
            }
        }
    }
}

/// Write a command to a stream
pub fn write_command<W: Write>(
    writer: &mut W,
    command: &Command,
    version: ProtocolVersion,
) -> Result<()> {
    command.validate()?;

    let line = encode_command(command, version);
    tracing::debug!("request: {}", line.trim_end());

    writer.write_all(line.as_bytes())?;
    writer.flush()?;
    Ok(())
}
