//! Termination Signal
//!
//! Single-shot notification that a connection has closed, observable by
//! any number of threads.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

/// Why a connection closed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disconnect {
    /// The server closed the stream
    EndOfStream,

    /// Reading from the socket failed
    ReadFailed { kind: io::ErrorKind, message: String },

    /// [`Connection::shutdown`](super::Connection::shutdown) was called
    Shutdown,
}

impl Disconnect {
    pub(crate) fn from_io(err: &io::Error) -> Self {
        Disconnect::ReadFailed {
            kind: err.kind(),
            message: err.to_string(),
        }
    }

    /// True for closes that were not caused by an error
    pub fn is_clean(&self) -> bool {
        !matches!(self, Disconnect::ReadFailed { .. })
    }
}

/// Cloneable handle on a connection's termination signal
///
/// The first [`fire`](Termination::fire) wins; every later call is ignored
/// and every waiter sees that first reason.
#[derive(Debug, Clone, Default)]
pub struct Termination {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    reason: Mutex<Option<Disconnect>>,
    fired: Condvar,
}

impl Termination {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the signal. Returns false if it had already fired.
    pub fn fire(&self, reason: Disconnect) -> bool {
        let mut slot = self.inner.reason.lock();
        if slot.is_some() {
            return false;
        }
        *slot = Some(reason);
        self.inner.fired.notify_all();
        true
    }

    /// Block until the signal fires
    pub fn wait(&self) -> Disconnect {
        let mut slot = self.inner.reason.lock();
        loop {
            if let Some(reason) = slot.as_ref() {
                return reason.clone();
            }
            self.inner.fired.wait(&mut slot);
        }
    }

    /// Block until the signal fires or `timeout` elapses
    pub fn wait_timeout(&self, timeout: Duration) -> Option<Disconnect> {
        let mut slot = self.inner.reason.lock();
        if slot.is_none() {
            let _ = self.inner.fired.wait_while_for(&mut slot, |r| r.is_none(), timeout);
        }
        slot.clone()
    }

    /// The reason, if the signal has fired
    pub fn reason(&self) -> Option<Disconnect> {
        self.inner.reason.lock().clone()
    }

    pub fn is_fired(&self) -> bool {
        self.inner.reason.lock().is_some()
    }
}
