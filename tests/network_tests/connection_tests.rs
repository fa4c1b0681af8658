//! Tests for Connection
//!
//! These tests verify, against a loopback server:
//! - Registration handshake and state transitions
//! - Keepalive replies
//! - Termination on EOF and on explicit shutdown
//! - Error surfacing for connect and send
//! - Line atomicity under concurrent senders
//! - Reader throughput with a stalled listener

#[path = "../common/mod.rs"]
mod common;

use std::collections::HashSet;
use std::io;
use std::net::TcpListener;
use std::sync::Arc;
use std::thread;

use chanlog::protocol::{parse, Command, MAX_LINE_LENGTH};
use chanlog::{ChanlogError, Config, Connection, ConnectionState, Disconnect, SerializeError};
use common::{FakeServer, TIMEOUT};

// =============================================================================
// Lifecycle Tests
// =============================================================================

#[test]
fn test_connect_sends_handshake() {
    let server = FakeServer::bind();
    let connection = Connection::new(server.config());
    assert_eq!(connection.state(), ConnectionState::Idle);

    connection.connect().unwrap();
    let mut peer = server.accept();

    assert_eq!(peer.read_line(), "NICK tester\r\n");
    assert_eq!(peer.read_line(), "USER tester 0 * :Test Client\r\n");
    assert_eq!(connection.state(), ConnectionState::Open);

    connection.shutdown();
}

#[test]
fn test_connect_twice_is_rejected() {
    let server = FakeServer::bind();
    let connection = Connection::new(server.config());
    connection.connect().unwrap();

    assert!(matches!(
        connection.connect(),
        Err(ChanlogError::InvalidState("open"))
    ));

    connection.shutdown();
}

#[test]
fn test_connect_failure_returns_to_idle() {
    // Bind then drop to get a port nobody listens on
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().to_string()
    };
    let connection = Connection::new(Config::builder().server_addr(addr).build());

    assert!(matches!(
        connection.connect(),
        Err(ChanlogError::Connect { .. })
    ));
    assert_eq!(connection.state(), ConnectionState::Idle);
    assert!(!connection.termination().is_fired());
}

#[test]
fn test_invalid_config_is_rejected_before_dialing() {
    let connection = Connection::new(Config::builder().nick("two words").build());

    assert!(matches!(connection.connect(), Err(ChanlogError::Config(_))));
    assert_eq!(connection.state(), ConnectionState::Idle);
}

#[test]
fn test_server_close_fires_termination() {
    let server = FakeServer::bind();
    let connection = Connection::new(server.config());
    let mailbox = connection.add_listener();
    connection.connect().unwrap();

    let mut peer = server.accept();
    peer.expect_handshake();
    peer.close();

    assert_eq!(
        connection.termination().wait_timeout(TIMEOUT),
        Some(Disconnect::EndOfStream)
    );
    assert_eq!(connection.wait(), Disconnect::EndOfStream);
    assert_eq!(connection.state(), ConnectionState::Closed);

    // Mailboxes close with the connection
    assert_eq!(mailbox.recv_timeout(TIMEOUT), None);
    assert!(matches!(
        connection.send(&Command::join("#chat")),
        Err(ChanlogError::NotConnected)
    ));
}

#[test]
fn test_oversized_line_is_fatal() {
    let server = FakeServer::bind();
    let connection = Connection::new(server.config());
    connection.connect().unwrap();

    let mut peer = server.accept();
    peer.expect_handshake();
    peer.send_raw(&"x".repeat(MAX_LINE_LENGTH * 2));

    match connection.termination().wait_timeout(TIMEOUT) {
        Some(Disconnect::ReadFailed { kind, .. }) => {
            assert_eq!(kind, io::ErrorKind::InvalidData)
        }
        other => panic!("expected read failure, got {:?}", other),
    }
    assert_eq!(connection.state(), ConnectionState::Closed);
}

#[test]
fn test_shutdown_fires_once_for_all_waiters() {
    let server = FakeServer::bind();
    let connection = Connection::new(server.config());
    connection.connect().unwrap();
    let _peer = server.accept();

    let waiters: Vec<_> = (0..3)
        .map(|_| {
            let termination = connection.termination();
            thread::spawn(move || termination.wait())
        })
        .collect();

    connection.shutdown();
    connection.shutdown();

    for waiter in waiters {
        assert_eq!(waiter.join().unwrap(), Disconnect::Shutdown);
    }
    assert_eq!(connection.termination().reason(), Some(Disconnect::Shutdown));
    assert_eq!(connection.state(), ConnectionState::Closed);
}

// =============================================================================
// Dispatch Tests
// =============================================================================

#[test]
fn test_listener_added_before_connect_receives_commands() {
    let server = FakeServer::bind();
    let connection = Connection::new(server.config());
    let mailbox = connection.add_listener();
    connection.connect().unwrap();

    let mut peer = server.accept();
    peer.expect_handshake();
    peer.send_raw(":bob!b@host PRIVMSG #chat :hello world\r\n");

    let cmd = mailbox.recv_timeout(TIMEOUT).unwrap();
    assert_eq!(cmd.source.as_deref(), Some("bob!b@host"));
    assert_eq!(cmd.args, vec!["#chat", "hello world"]);

    connection.shutdown();
}

#[test]
fn test_listener_added_after_connect_receives_commands() {
    let server = FakeServer::bind();
    let connection = Connection::new(server.config());
    connection.connect().unwrap();
    let mut peer = server.accept();
    peer.expect_handshake();

    let mailbox = connection.add_listener();
    peer.send_raw(":bob JOIN #chat\r\n");

    assert_eq!(mailbox.recv_timeout(TIMEOUT).unwrap().verb, "JOIN");

    connection.shutdown();
}

#[test]
fn test_malformed_lines_are_skipped() {
    let server = FakeServer::bind();
    let connection = Connection::new(server.config());
    let mailbox = connection.add_listener();
    connection.connect().unwrap();

    let mut peer = server.accept();
    peer.expect_handshake();
    peer.send_raw("GARBAGE\r\n\r\n:bob JOIN #chat\r\n");

    assert_eq!(mailbox.recv_timeout(TIMEOUT).unwrap().verb, "JOIN");
    assert_eq!(connection.state(), ConnectionState::Open);

    connection.shutdown();
}

#[test]
fn test_auto_pong_replies_to_ping() {
    let server = FakeServer::bind();
    let connection = Connection::new(server.config());
    connection.connect().unwrap();

    let mut peer = server.accept();
    peer.expect_handshake();
    peer.send_raw("PING :irc.example.net\r\n");

    assert_eq!(peer.read_line(), "PONG irc.example.net\r\n");

    connection.shutdown();
}

#[test]
fn test_auto_pong_can_be_disabled() {
    let server = FakeServer::bind();
    let config = Config {
        auto_pong: false,
        ..server.config()
    };
    let connection = Connection::new(config);
    connection.connect().unwrap();

    let mut peer = server.accept();
    peer.expect_handshake();
    assert_eq!(connection.listener_count(), 0);

    connection.shutdown();
}

#[test]
fn test_slow_listener_does_not_stall_reader() {
    let server = FakeServer::bind();
    let connection = Connection::new(server.config());
    let slow = connection.add_listener_with_capacity(4);
    let fast = connection.add_listener_with_capacity(128);
    connection.connect().unwrap();

    let mut peer = server.accept();
    peer.expect_handshake();

    let mut burst = String::new();
    for n in 0..50 {
        burst.push_str(&format!(":bob PRIVMSG #chat :message {}\r\n", n));
    }
    peer.send_raw(&burst);

    for n in 0..50 {
        let cmd = fast.recv_timeout(TIMEOUT).unwrap();
        assert_eq!(cmd.args[1], format!("message {}", n));
    }

    // slow was registered first, so its offers are done by now
    assert_eq!(slow.dropped(), 46);
    assert_eq!(slow.len(), 4);
    assert_eq!(fast.dropped(), 0);

    connection.shutdown();
}

// =============================================================================
// Send Tests
// =============================================================================

#[test]
fn test_send_before_connect_fails() {
    let connection = Connection::new(Config::default());

    assert!(matches!(
        connection.send(&Command::join("#chat")),
        Err(ChanlogError::NotConnected)
    ));
}

#[test]
fn test_send_returns_serialize_error_verbatim() {
    let server = FakeServer::bind();
    let connection = Connection::new(server.config());
    connection.connect().unwrap();
    let mut peer = server.accept();
    peer.expect_handshake();

    let result = connection.send(&Command::new("PRIVMSG", ["#chat room", "hi"]));
    assert!(matches!(
        result,
        Err(ChanlogError::Serialize(SerializeError::SpaceInArgument { index: 0 }))
    ));

    // Nothing was written for the bad command
    connection.send(&Command::join("#chat")).unwrap();
    assert_eq!(peer.read_line(), "JOIN #chat\r\n");

    connection.shutdown();
}

#[test]
fn test_concurrent_sends_do_not_interleave() {
    const PER_THREAD: usize = 200;

    let server = FakeServer::bind();
    let connection = Connection::new(server.config());
    connection.connect().unwrap();
    let mut peer = server.accept();
    peer.expect_handshake();

    let filler = "x".repeat(300);
    let filler = Arc::new(filler);
    let senders: Vec<_> = (0..2)
        .map(|id| {
            let connection = connection.clone();
            let filler = Arc::clone(&filler);
            thread::spawn(move || {
                for n in 0..PER_THREAD {
                    let text = format!("sender {} line {} {}", id, n, filler);
                    connection.send(&Command::privmsg("#chat", text)).unwrap();
                }
            })
        })
        .collect();

    let mut seen = HashSet::new();
    for _ in 0..PER_THREAD * 2 {
        let line = peer.read_line();
        let cmd = parse(&line).unwrap();
        assert_eq!(cmd.verb, "PRIVMSG");
        assert!(cmd.args[1].ends_with(filler.as_str()), "torn line {:?}", line);
        assert!(seen.insert(cmd.args[1].clone()));
    }

    for sender in senders {
        sender.join().unwrap();
    }
    connection.shutdown();
}
