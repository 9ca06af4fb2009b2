//! Fan-out of protocol lines to players.
//!
//! A failed write never stops delivery to anyone else. The failing connection
//! is remembered, skipped by every later send in the same dispatch, and handed
//! back through `take_failed` so the session can disconnect it once the
//! current handler has finished its own notifications.

use crate::connection::ConnectionId;
use crate::registry::ConnectionRegistry;
use log::warn;
use std::io;
use wordsrv_shared::Message;

#[derive(Debug, Default)]
pub struct Broadcaster {
    failed: Vec<ConnectionId>,
}

impl Broadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sends `message` to every Active connection, in turn-ring order.
    ///
    /// Returns how many connections accepted the message.
    pub fn broadcast(&mut self, registry: &mut ConnectionRegistry, message: &Message<'_>) -> usize {
        self.broadcast_each(registry, |_| message.clone())
    }

    /// Sends each Active connection the message `compose` builds for it.
    ///
    /// Used where the holder of a turn or the winner sees different text
    /// from everyone else.
    pub fn broadcast_each<'m, F>(&mut self, registry: &mut ConnectionRegistry, mut compose: F) -> usize
    where
        F: FnMut(ConnectionId) -> Message<'m>,
    {
        let mut delivered = 0;

        for id in registry.snapshot_active() {
            if self.is_failed(id) {
                continue;
            }
            let Some(connection) = registry.get_mut(id) else {
                continue;
            };

            match connection.send(&compose(id)) {
                Ok(()) => delivered += 1,
                Err(e) => {
                    warn!("Write to {} failed: {}", id, e);
                    self.mark_failed(id);
                }
            }
        }

        delivered
    }

    /// Sends `message` to one connection, Pending or Active.
    ///
    /// A failure is recorded like a broadcast failure and also returned.
    pub fn unicast(
        &mut self,
        registry: &mut ConnectionRegistry,
        id: ConnectionId,
        message: &Message<'_>,
    ) -> io::Result<()> {
        if self.is_failed(id) {
            return Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "connection already failed",
            ));
        }

        let connection = registry.get_mut(id).ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("no connection {}", id))
        })?;

        connection.send(message).map_err(|e| {
            warn!("Write to {} failed: {}", id, e);
            self.mark_failed(id);
            e
        })
    }

    pub fn mark_failed(&mut self, id: ConnectionId) {
        if !self.failed.contains(&id) {
            self.failed.push(id);
        }
    }

    pub fn is_failed(&self, id: ConnectionId) -> bool {
        self.failed.contains(&id)
    }

    /// Drains the connections whose writes failed, oldest first.
    pub fn take_failed(&mut self) -> Vec<ConnectionId> {
        std::mem::take(&mut self.failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::{ClientSink, Connection};
    use std::net::SocketAddr;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Recorder {
        lines: Arc<Mutex<Vec<String>>>,
        broken: bool,
    }

    impl ClientSink for Recorder {
        fn deliver(&mut self, payload: &[u8]) -> io::Result<()> {
            if self.broken {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "peer gone"));
            }
            self.lines
                .lock()
                .unwrap()
                .push(String::from_utf8_lossy(payload).into_owned());
            Ok(())
        }
    }

    impl Recorder {
        fn lines(&self) -> Vec<String> {
            self.lines.lock().unwrap().clone()
        }
    }

    fn test_addr() -> SocketAddr {
        "127.0.0.1:8080".parse().unwrap()
    }

    fn registry(players: &[(u64, &str, &Recorder)]) -> ConnectionRegistry {
        let mut registry = ConnectionRegistry::new(30);
        for (id, name, sink) in players {
            let conn = Connection::new(ConnectionId(*id), test_addr(), 64, Box::new((*sink).clone()));
            registry.add_active(conn, name).unwrap();
        }
        registry
    }

    #[test]
    fn test_broadcast_reaches_every_active_player() {
        let (a, b) = (Recorder::default(), Recorder::default());
        let mut registry = registry(&[(1, "a", &a), (2, "b", &b)]);
        let mut broadcaster = Broadcaster::new();

        let delivered = broadcaster.broadcast(&mut registry, &Message::NewGame);

        assert_eq!(delivered, 2);
        assert_eq!(a.lines(), vec!["Start a new game.\r\n"]);
        assert_eq!(b.lines(), vec!["Start a new game.\r\n"]);
        assert!(broadcaster.take_failed().is_empty());
    }

    #[test]
    fn test_broadcast_skips_pending() {
        let a = Recorder::default();
        let pending = Recorder::default();
        let mut registry = registry(&[(1, "a", &a)]);
        registry.add_pending(Connection::new(
            ConnectionId(2),
            test_addr(),
            64,
            Box::new(pending.clone()),
        ));

        Broadcaster::new().broadcast(&mut registry, &Message::NewGame);

        assert_eq!(a.lines().len(), 1);
        assert!(pending.lines().is_empty());
    }

    #[test]
    fn test_failed_write_does_not_stop_broadcast() {
        let a = Recorder::default();
        let b = Recorder {
            broken: true,
            ..Recorder::default()
        };
        let c = Recorder::default();
        let mut registry = registry(&[(1, "a", &a), (2, "b", &b), (3, "c", &c)]);
        let mut broadcaster = Broadcaster::new();

        let delivered = broadcaster.broadcast(&mut registry, &Message::NewGame);

        assert_eq!(delivered, 2);
        assert_eq!(a.lines().len(), 1);
        assert_eq!(c.lines().len(), 1);
        assert_eq!(broadcaster.take_failed(), vec![ConnectionId(2)]);
        assert_eq!(registry.active_len(), 3);
    }

    #[test]
    fn test_failed_connection_is_skipped_afterwards() {
        let b = Recorder {
            broken: true,
            ..Recorder::default()
        };
        let mut registry = registry(&[(2, "b", &b)]);
        let mut broadcaster = Broadcaster::new();

        broadcaster.broadcast(&mut registry, &Message::NewGame);
        assert_eq!(broadcaster.broadcast(&mut registry, &Message::NewGame), 0);
        assert!(broadcaster
            .unicast(&mut registry, ConnectionId(2), &Message::YourGuess)
            .is_err());

        assert_eq!(broadcaster.take_failed(), vec![ConnectionId(2)]);
    }

    #[test]
    fn test_broadcast_each_personalizes() {
        let (a, b) = (Recorder::default(), Recorder::default());
        let mut registry = registry(&[(1, "a", &a), (2, "b", &b)]);

        Broadcaster::new().broadcast_each(&mut registry, |id| {
            if id == ConnectionId(1) {
                Message::YourGuess
            } else {
                Message::TurnOf { name: "a" }
            }
        });

        assert_eq!(a.lines(), vec!["Your guess?\r\n"]);
        assert_eq!(b.lines(), vec!["It's a's turn.\r\n"]);
    }

    #[test]
    fn test_unicast() {
        let a = Recorder::default();
        let mut registry = registry(&[(1, "a", &a)]);
        let mut broadcaster = Broadcaster::new();

        broadcaster
            .unicast(&mut registry, ConnectionId(1), &Message::NotYourTurn)
            .unwrap();
        let missing = broadcaster.unicast(&mut registry, ConnectionId(9), &Message::NotYourTurn);

        assert_eq!(a.lines(), vec!["Not your turn.\r\n"]);
        assert_eq!(missing.unwrap_err().kind(), io::ErrorKind::NotFound);
        assert!(broadcaster.take_failed().is_empty());
    }
}
