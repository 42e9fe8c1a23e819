//! Hub Session
//!
//! Owns the connection for one invocation and guarantees the quit line.

use std::io::{BufRead, BufReader, BufWriter, Write};
use std::net::TcpStream;
use std::time::Duration;

use crate::config::Config;
use crate::error::Result;
use crate::protocol::{
    read_block, read_reply, write_command, BlockEnd, Command, ProtocolVersion, Reply, QUIT_LINE,
};

/// Session over a TCP connection
pub type HubSession = Session<BufReader<TcpStream>, BufWriter<TcpStream>>;

/// A request/reply session with the hub
///
/// Dropping the session writes `Q` (best effort) unless [`Session::close`]
/// already did, so the hub can release the connection slot no matter how
/// the command ended.
pub struct Session<R: BufRead, W: Write> {
    /// Reply stream
    reader: R,

    /// Request stream
    writer: W,

    /// Version token appended to every request
    version: ProtocolVersion,

    /// Peer address for logging
    peer_addr: String,

    /// Set once the quit line has been attempted
    closed: bool,
}

impl HubSession {
    /// Connect to the hub named in `config`
    ///
    /// Sets up buffered I/O and configures timeouts
    pub fn connect(config: &Config) -> Result<Self> {
        let addr = config.hub_addr();
        tracing::debug!("Connecting to hub at {}", addr);

        let stream = TcpStream::connect(addr)?;

        // Disable Nagle's algorithm, every request is one short line
        stream.set_nodelay(true)?;

        // Clone stream for separate read/write handles
        let read_stream = stream.try_clone()?;
        let write_stream = stream;

        let mut session = Session::new(
            BufReader::new(read_stream),
            BufWriter::new(write_stream),
            config.protocol,
        );
        session.peer_addr = addr.to_string();
        session.set_timeouts(config.read_timeout_ms, config.write_timeout_ms)?;

        Ok(session)
    }

    /// Configure connection timeouts (0 leaves a direction blocking)
    pub fn set_timeouts(&mut self, read_ms: u64, write_ms: u64) -> Result<()> {
        let read_stream = self.reader.get_ref();
        let write_stream = self.writer.get_ref();

        if read_ms > 0 {
            read_stream.set_read_timeout(Some(Duration::from_millis(read_ms)))?;
        }
        if write_ms > 0 {
            write_stream.set_write_timeout(Some(Duration::from_millis(write_ms)))?;
        }

        Ok(())
    }
}

impl<R: BufRead, W: Write> Session<R, W> {
    /// Wrap an already-open reader/writer pair
    pub fn new(reader: R, writer: W, version: ProtocolVersion) -> Self {
        Self {
            reader,
            writer,
            version,
            peer_addr: "hub".to_string(),
            closed: false,
        }
    }

    /// Protocol version used for requests
    pub fn version(&self) -> ProtocolVersion {
        self.version
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }

    /// Write one request line
    ///
    /// Requests in a form the configured protocol generation does not speak
    /// are refused before anything is written.
    pub fn send(&mut self, command: &Command) -> Result<()> {
        command.check_generation(self.version)?;
        write_command(&mut self.writer, command, self.version)
    }

    /// Read one reply line
    pub fn read_reply(&mut self) -> Result<Reply> {
        read_reply(&mut self.reader)
    }

    /// Write a request and read its reply
    pub fn request(&mut self, command: &Command) -> Result<Reply> {
        self.send(command)?;
        let reply = self.read_reply()?;
        tracing::debug!(
            "{} -> {} from {}",
            command.verb(),
            reply.status,
            self.peer_addr
        );
        Ok(reply)
    }

    /// Read the body following a header reply
    pub fn read_block(&mut self, end: BlockEnd) -> Result<Vec<String>> {
        read_block(&mut self.reader, end)
    }

    /// End the session, reporting whether the quit line went out
    pub fn close(mut self) -> Result<()> {
        self.send_quit()
    }

    fn send_quit(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        tracing::trace!("Sending quit to {}", self.peer_addr);
        self.writer.write_all(QUIT_LINE.as_bytes())?;
        self.writer.flush()?;
        Ok(())
    }
}

impl<R: BufRead, W: Write> Drop for Session<R, W> {
    fn drop(&mut self) {
        if let Err(e) = self.send_quit() {
            tracing::debug!("Could not send quit to {}: {}", self.peer_addr, e);
        }
    }
}
