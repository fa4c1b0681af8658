//! Connection
//!
//! Owns the socket to one IRC server, runs the reader thread and exposes
//! the write path.

use std::fmt;
use std::io::{self, BufReader, BufWriter};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::Mutex;

use super::dispatcher::{Dispatcher, Mailbox};
use super::termination::{Disconnect, Termination};
use crate::config::Config;
use crate::error::{ChanlogError, Result};
use crate::listener::{self, AutoPong, CommandSink, Listener};
use crate::protocol::{parse, read_line, write_command, Command};

/// Lifecycle of a connection: `Idle → Connecting → Open → Closed`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Idle,
    Connecting,
    Open,
    Closed,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Idle => "idle",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Open => "open",
            ConnectionState::Closed => "closed",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A client connection to one IRC server
///
/// ## Threads
///
/// - One reader thread, started by [`connect`](Self::connect), owns the read
///   half of the socket and publishes every parsed line to the dispatcher.
/// - One thread per attached listener drains that listener's mailbox.
/// - [`send`](Self::send) may be called from any thread; the write half sits
///   behind a mutex so lines never interleave.
///
/// Cloning is cheap and every clone refers to the same connection.
#[derive(Clone)]
pub struct Connection {
    shared: Arc<Shared>,
}

struct Shared {
    config: Config,
    state: Mutex<ConnectionState>,

    /// Buffered write half, `None` unless open
    writer: Mutex<Option<BufWriter<TcpStream>>>,

    /// Handle kept only to shut the socket down
    socket: Mutex<Option<TcpStream>>,

    reader: Mutex<Option<JoinHandle<()>>>,
    dispatcher: Dispatcher,
    termination: Termination,
}

impl Connection {
    /// Create an idle connection; nothing is dialed until `connect`
    pub fn new(config: Config) -> Self {
        let dispatcher = Dispatcher::new(config.mailbox_capacity);
        Self {
            shared: Arc::new(Shared {
                config,
                state: Mutex::new(ConnectionState::Idle),
                writer: Mutex::new(None),
                socket: Mutex::new(None),
                reader: Mutex::new(None),
                dispatcher,
                termination: Termination::new(),
            }),
        }
    }

    /// Dial the server, start reading and register
    ///
    /// Steps:
    /// 1. Open the TCP stream (no retry; on failure the state goes back to idle)
    /// 2. Start the reader thread
    /// 3. Attach the PING responder (unless disabled)
    /// 4. Send `NICK` then `USER`
    pub fn connect(&self) -> Result<()> {
        let config = &self.shared.config;
        config.validate()?;

        {
            let mut state = self.shared.state.lock();
            if *state != ConnectionState::Idle {
                return Err(ChanlogError::InvalidState(state.as_str()));
            }
            *state = ConnectionState::Connecting;
        }

        tracing::info!("Connecting to {}", config.server_addr);

        let (reader, writer, socket) = match open_stream(config) {
            Ok(parts) => parts,
            Err(source) => {
                *self.shared.state.lock() = ConnectionState::Idle;
                return Err(ChanlogError::Connect {
                    addr: config.server_addr.clone(),
                    source,
                });
            }
        };

        {
            let mut state = self.shared.state.lock();
            if *state != ConnectionState::Connecting {
                // shut down while dialing
                let _ = socket.shutdown(Shutdown::Both);
                return Err(ChanlogError::InvalidState(state.as_str()));
            }
            *self.shared.writer.lock() = Some(writer);
            *self.shared.socket.lock() = Some(socket);
            *state = ConnectionState::Open;
        }

        tracing::info!("Connected to {}", config.server_addr);

        let shared = Arc::clone(&self.shared);
        let handle = thread::Builder::new()
            .name("irc-reader".to_string())
            .spawn(move || read_loop(shared, reader));
        match handle {
            Ok(handle) => *self.shared.reader.lock() = Some(handle),
            Err(e) => {
                self.shared.close(Disconnect::from_io(&e));
                return Err(e.into());
            }
        }

        if config.auto_pong {
            self.attach(AutoPong::new(self.clone()))?;
        }

        self.send(&Command::nick(config.nick.as_str()))?;
        self.send(&Command::user(config.username.as_str(), config.realname.as_str()))?;

        Ok(())
    }

    /// Serialize and write one command
    ///
    /// Malformed commands fail with the codec's error before anything is
    /// written.
    pub fn send(&self, command: &Command) -> Result<()> {
        let mut guard = self.shared.writer.lock();
        let writer = guard.as_mut().ok_or(ChanlogError::NotConnected)?;

        tracing::trace!(">> {}", command);
        write_command(writer, command)
    }

    /// Register a mailbox that receives every inbound command
    ///
    /// Valid before and after `connect`.
    pub fn add_listener(&self) -> Mailbox {
        self.shared.dispatcher.register()
    }

    /// Register a mailbox with its own capacity
    pub fn add_listener_with_capacity(&self, capacity: usize) -> Mailbox {
        self.shared.dispatcher.register_with_capacity(capacity)
    }

    /// Register a mailbox and run `listener` on it in its own thread
    pub fn attach<L: Listener>(&self, listener: L) -> Result<JoinHandle<()>> {
        listener::spawn(listener, self.add_listener())
    }

    /// Close the connection
    ///
    /// Fires the termination signal (unless it already fired), shuts the
    /// socket down and waits for the reader thread. Idempotent.
    pub fn shutdown(&self) {
        self.shared.close(Disconnect::Shutdown);

        let handle = self.shared.reader.lock().take();
        if let Some(handle) = handle {
            if handle.thread().id() != thread::current().id() && handle.join().is_err() {
                tracing::warn!("Reader thread panicked");
            }
        }
    }

    /// Handle on the termination signal
    pub fn termination(&self) -> Termination {
        self.shared.termination.clone()
    }

    /// Block until the connection closes
    pub fn wait(&self) -> Disconnect {
        self.shared.termination.wait()
    }

    pub fn state(&self) -> ConnectionState {
        *self.shared.state.lock()
    }

    pub fn config(&self) -> &Config {
        &self.shared.config
    }

    /// Number of mailboxes still registered
    pub fn listener_count(&self) -> usize {
        self.shared.dispatcher.listener_count()
    }
}

impl CommandSink for Connection {
    fn send(&self, command: &Command) -> Result<()> {
        Connection::send(self, command)
    }
}

impl Shared {
    /// Move to `Closed`; only the first reason reaches the signal
    fn close(&self, reason: Disconnect) {
        let first = self.termination.fire(reason);
        *self.state.lock() = ConnectionState::Closed;

        if let Some(socket) = self.socket.lock().take() {
            let _ = socket.shutdown(Shutdown::Both);
        }
        self.writer.lock().take();
        self.dispatcher.close();

        if first {
            if let Some(reason) = self.termination.reason() {
                tracing::info!("Connection to {} closed: {:?}", self.config.server_addr, reason);
            }
        }
    }
}

/// Body of the reader thread
fn read_loop(shared: Arc<Shared>, mut reader: BufReader<TcpStream>) {
    tracing::debug!("Reader started");

    let reason = loop {
        let line = match read_line(&mut reader) {
            Ok(Some(line)) => line,
            Ok(None) => break Disconnect::EndOfStream,
            Err(e) => {
                tracing::debug!("Read error: {}", e);
                break Disconnect::from_io(&e);
            }
        };

        let trimmed = line.trim_end_matches(['\r', '\n']);
        if trimmed.is_empty() {
            continue;
        }
        tracing::trace!("<< {}", trimmed);

        match parse(&line) {
            Ok(command) => shared.dispatcher.publish(&command),
            Err(e) => tracing::warn!("Skipping malformed line {:?}: {}", trimmed, e),
        }
    };

    shared.close(reason);
    tracing::debug!("Reader stopped");
}

/// Dial and split the stream into buffered halves plus a shutdown handle
fn open_stream(
    config: &Config,
) -> io::Result<(BufReader<TcpStream>, BufWriter<TcpStream>, TcpStream)> {
    let stream = dial(&config.server_addr, config.connect_timeout_ms)?;

    // Disable Nagle's algorithm so short lines go out immediately
    stream.set_nodelay(true)?;

    // A read that times out closes the connection
    if config.read_timeout_ms > 0 {
        stream.set_read_timeout(Some(Duration::from_millis(config.read_timeout_ms)))?;
    }
    if config.write_timeout_ms > 0 {
        stream.set_write_timeout(Some(Duration::from_millis(config.write_timeout_ms)))?;
    }

    let read_stream = stream.try_clone()?;
    let write_stream = stream.try_clone()?;

    Ok((
        BufReader::new(read_stream),
        BufWriter::new(write_stream),
        stream,
    ))
}

fn dial(addr: &str, timeout_ms: u64) -> io::Result<TcpStream> {
    if timeout_ms == 0 {
        return TcpStream::connect(addr);
    }

    let timeout = Duration::from_millis(timeout_ms);
    let mut last_err = None;
    for socket_addr in addr.to_socket_addrs()? {
        match TcpStream::connect_timeout(&socket_addr, timeout) {
            Ok(stream) => return Ok(stream),
            Err(e) => last_err = Some(e),
        }
    }

    Err(last_err.unwrap_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} did not resolve to any address", addr),
        )
    }))
}
