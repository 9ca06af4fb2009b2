//! A single client connection as seen by the game session.
//!
//! The session never touches sockets directly. Each connection carries:
//! - its id and peer address
//! - the display name, empty until the registry promotes it
//! - a `LineReassembler` for inbound bytes
//! - a `ClientSink` that queues outbound bytes for the transport
//!
//! Dropping a `Connection` drops its sink, which is how the transport learns
//! that the handle should be closed.

use log::trace;
use std::fmt;
use std::io;
use std::net::SocketAddr;
use tokio::sync::mpsc;
use wordsrv_shared::{LineReassembler, Message};

/// Stable identifier for one accepted connection, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Outbound half of a connection.
///
/// An error means the bytes will never reach the peer; the caller is expected
/// to disconnect the connection.
pub trait ClientSink: Send {
    fn deliver(&mut self, payload: &[u8]) -> io::Result<()>;
}

/// Queue drained by the connection's writer task.
impl ClientSink for mpsc::UnboundedSender<Vec<u8>> {
    fn deliver(&mut self, payload: &[u8]) -> io::Result<()> {
        self.send(payload.to_vec()).map_err(|_| {
            io::Error::new(io::ErrorKind::BrokenPipe, "connection writer has stopped")
        })
    }
}

pub struct Connection {
    id: ConnectionId,
    addr: SocketAddr,
    name: String,
    inbox: LineReassembler,
    sink: Box<dyn ClientSink>,
}

impl Connection {
    pub fn new(
        id: ConnectionId,
        addr: SocketAddr,
        line_capacity: usize,
        sink: Box<dyn ClientSink>,
    ) -> Self {
        Self {
            id,
            addr,
            name: String::new(),
            inbox: LineReassembler::new(line_capacity),
            sink,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_named(&self) -> bool {
        !self.name.is_empty()
    }

    pub(crate) fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    pub fn inbox(&self) -> &LineReassembler {
        &self.inbox
    }

    pub fn inbox_mut(&mut self) -> &mut LineReassembler {
        &mut self.inbox
    }

    /// Queues one protocol line for this peer.
    pub fn send(&mut self, message: &Message<'_>) -> io::Result<()> {
        trace!("-> {} {:?}", self.id, message);
        self.sink.deliver(message.to_wire().as_bytes())
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("addr", &self.addr)
            .field("name", &self.name)
            .field("buffered", &self.inbox.buffered())
            .finish()
    }
}
