//! Dispatcher
//!
//! Fans inbound commands out to per-listener mailboxes.
//!
//! ## Overflow Policy: drop newest
//!
//! `publish` never blocks. When a mailbox is full the incoming command is
//! discarded for that listener only and its drop counter is bumped, so one
//! slow listener cannot stall the socket reader.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender, TrySendError};
use parking_lot::Mutex;

use crate::protocol::Command;

/// Consumer end of a listener's bounded queue
///
/// Commands arrive in socket order. Once the connection closes and the
/// queue is drained, `recv` returns `None`.
pub struct Mailbox {
    id: u64,
    receiver: Receiver<Command>,
    dropped: Arc<AtomicU64>,
}

impl Mailbox {
    /// Block until the next command, or `None` once closed and empty
    pub fn recv(&self) -> Option<Command> {
        self.receiver.recv().ok()
    }

    /// Like `recv`, giving up after `timeout`
    pub fn recv_timeout(&self, timeout: Duration) -> Option<Command> {
        match self.receiver.recv_timeout(timeout) {
            Ok(command) => Some(command),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    pub fn try_recv(&self) -> Option<Command> {
        self.receiver.try_recv().ok()
    }

    /// Iterate until the mailbox is closed
    pub fn iter(&self) -> impl Iterator<Item = Command> + '_ {
        self.receiver.iter()
    }

    /// Number of commands discarded because this mailbox was full
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.receiver.capacity().unwrap_or(0)
    }

    pub fn id(&self) -> u64 {
        self.id
    }
}

/// Producer side held by the dispatcher
struct Subscriber {
    id: u64,
    sender: Sender<Command>,
    dropped: Arc<AtomicU64>,
}

#[derive(Default)]
struct Registry {
    subscribers: Vec<Subscriber>,
    next_id: u64,
    closed: bool,
}

/// Owns every mailbox sender for one connection
pub struct Dispatcher {
    registry: Mutex<Registry>,
    capacity: usize,
}

impl Dispatcher {
    /// Create a dispatcher whose mailboxes hold `capacity` commands
    pub fn new(capacity: usize) -> Self {
        Self {
            registry: Mutex::new(Registry::default()),
            capacity: capacity.max(1),
        }
    }

    /// Register a mailbox with the default capacity
    pub fn register(&self) -> Mailbox {
        self.register_with_capacity(self.capacity)
    }

    /// Register a mailbox with an explicit capacity
    ///
    /// After [`close`](Self::close) the returned mailbox is already closed.
    pub fn register_with_capacity(&self, capacity: usize) -> Mailbox {
        let (sender, receiver) = channel::bounded(capacity.max(1));
        let dropped = Arc::new(AtomicU64::new(0));

        let mut registry = self.registry.lock();
        let id = registry.next_id;
        registry.next_id += 1;

        if registry.closed {
            tracing::debug!("Mailbox {} registered after close", id);
        } else {
            registry.subscribers.push(Subscriber {
                id,
                sender,
                dropped: Arc::clone(&dropped),
            });
            tracing::debug!("Registered mailbox {} (capacity {})", id, capacity);
        }

        Mailbox {
            id,
            receiver,
            dropped,
        }
    }

    /// Offer a command to every mailbox without blocking
    pub fn publish(&self, command: &Command) {
        let mut registry = self.registry.lock();
        if registry.closed {
            return;
        }

        registry.subscribers.retain(|sub| {
            match sub.sender.try_send(command.clone()) {
                Ok(()) => true,
                Err(TrySendError::Full(_)) => {
                    let total = sub.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                    tracing::warn!(
                        "Mailbox {} full, dropped {} ({} dropped so far)",
                        sub.id,
                        command.verb,
                        total
                    );
                    true
                }
                Err(TrySendError::Disconnected(_)) => {
                    tracing::debug!("Mailbox {} consumer gone, unregistering", sub.id);
                    false
                }
            }
        });
    }

    /// Drop every sender so consumers see their mailbox close
    pub fn close(&self) {
        let mut registry = self.registry.lock();
        if !registry.closed {
            registry.closed = true;
            registry.subscribers.clear();
            tracing::debug!("Dispatcher closed");
        }
    }

    /// Number of live mailboxes
    pub fn listener_count(&self) -> usize {
        self.registry.lock().subscribers.len()
    }

    pub fn is_closed(&self) -> bool {
        self.registry.lock().closed
    }
}
