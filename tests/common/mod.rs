//! Loopback IRC server for connection tests

#![allow(dead_code)]

use std::io::{BufRead, BufReader, Write};
use std::net::{Shutdown, TcpListener, TcpStream};
use std::time::Duration;

use chanlog::Config;

pub const TIMEOUT: Duration = Duration::from_secs(5);

pub struct FakeServer {
    listener: TcpListener,
}

impl FakeServer {
    pub fn bind() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        Self { listener }
    }

    pub fn addr(&self) -> String {
        self.listener.local_addr().unwrap().to_string()
    }

    /// Config pointing at this server
    pub fn config(&self) -> Config {
        Config::builder()
            .server_addr(self.addr())
            .nick("tester")
            .username("tester")
            .realname("Test Client")
            .build()
    }

    pub fn accept(&self) -> Peer {
        let (stream, _) = self.listener.accept().unwrap();
        stream.set_read_timeout(Some(TIMEOUT)).unwrap();
        Peer {
            reader: BufReader::new(stream.try_clone().unwrap()),
            writer: stream,
        }
    }
}

/// Server side of one accepted client
pub struct Peer {
    reader: BufReader<TcpStream>,
    writer: TcpStream,
}

impl Peer {
    /// Next line from the client, terminator included
    pub fn read_line(&mut self) -> String {
        let mut line = String::new();
        self.reader.read_line(&mut line).unwrap();
        line
    }

    /// Consume NICK and USER, returning them
    pub fn expect_handshake(&mut self) -> (String, String) {
        let nick = self.read_line();
        let user = self.read_line();
        assert!(nick.starts_with("NICK "), "unexpected {:?}", nick);
        assert!(user.starts_with("USER "), "unexpected {:?}", user);
        (nick, user)
    }

    pub fn send_raw(&mut self, line: &str) {
        self.writer.write_all(line.as_bytes()).unwrap();
        self.writer.flush().unwrap();
    }

    pub fn close(self) {
        let _ = self.writer.shutdown(Shutdown::Both);
    }
}
