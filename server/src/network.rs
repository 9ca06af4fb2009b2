//! Server network layer: TCP accept loop, per-connection I/O tasks and the
//! single reactor task that owns all game state

use crate::config::ServerConfig;
use crate::connection::ConnectionId;
use crate::dictionary::WordSource;
use crate::error::ServerError;
use crate::session::GameSession;
use log::{debug, error, info, warn};
use std::collections::HashMap;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpListener, TcpSocket, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Events sent from connection tasks to the reactor
#[derive(Debug)]
pub enum NetworkEvent {
    Data { id: ConnectionId, bytes: Vec<u8> },
    Closed { id: ConnectionId },
    ReadFailed { id: ConnectionId, error: io::Error },
    WriteFailed { id: ConnectionId, error: io::Error },
}

/// Listening socket plus the reactor state
pub struct Server<W> {
    listener: TcpListener,
    session: GameSession<W>,
    read_chunk: usize,

    // Communication channels
    event_tx: mpsc::UnboundedSender<NetworkEvent>,
    event_rx: mpsc::UnboundedReceiver<NetworkEvent>,

    readers: HashMap<ConnectionId, JoinHandle<()>>,
}

impl<W: WordSource> Server<W> {
    pub async fn bind(config: &ServerConfig, words: W) -> Result<Self, ServerError> {
        config.validate()?;
        let addr = config.socket_addr()?;

        let socket = if addr.is_ipv4() {
            TcpSocket::new_v4()?
        } else {
            TcpSocket::new_v6()?
        };
        socket.set_reuseaddr(true)?;
        socket.bind(addr)?;
        let listener = socket.listen(config.backlog)?;
        info!("Listening on {}", listener.local_addr()?);

        let (event_tx, event_rx) = mpsc::unbounded_channel();

        Ok(Server {
            listener,
            session: GameSession::new(config, words),
            read_chunk: config.line_capacity,
            event_tx,
            event_rx,
            readers: HashMap::new(),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn session(&self) -> &GameSession<W> {
        &self.session
    }

    /// Main reactor loop. Returns only if the event channel closes.
    ///
    /// Exactly one event is handled at a time, to completion, so the session
    /// needs no locking.
    pub async fn run(mut self) -> Result<(), ServerError> {
        info!("Server started successfully");

        loop {
            tokio::select! {
                accepted = self.listener.accept() => {
                    match accepted {
                        Ok((stream, addr)) => self.handle_accept(stream, addr),
                        Err(e) => {
                            error!("accept failed: {}", e);
                            tokio::time::sleep(Duration::from_millis(10)).await;
                        }
                    }
                },

                event = self.event_rx.recv() => {
                    match event {
                        Some(event) => self.handle_event(event),
                        None => {
                            info!("Event channel closed, shutting down");
                            break;
                        }
                    }
                },
            }

            self.close_removed();
        }

        Ok(())
    }

    fn handle_accept(&mut self, stream: TcpStream, addr: SocketAddr) {
        let id = self.session.next_connection_id();
        if let Err(e) = stream.set_nodelay(true) {
            debug!("set_nodelay on {} failed: {}", id, e);
        }

        let (read_half, write_half) = stream.into_split();
        let (out_tx, out_rx) = mpsc::unbounded_channel();

        spawn_writer(id, write_half, out_rx, self.event_tx.clone());
        let reader = spawn_reader(id, read_half, self.read_chunk, self.event_tx.clone());
        self.readers.insert(id, reader);

        self.session.on_accept(id, addr, Box::new(out_tx));
    }

    fn handle_event(&mut self, event: NetworkEvent) {
        match event {
            NetworkEvent::Data { id, bytes } => self.session.on_read(id, Ok(&bytes)),
            NetworkEvent::Closed { id } => self.session.on_read(id, Ok(&[])),
            NetworkEvent::ReadFailed { id, error } => self.session.on_read(id, Err(error)),
            NetworkEvent::WriteFailed { id, error } => {
                warn!("Write to {} failed: {}", id, error);
                self.session.on_write_failed(id);
            }
        }
    }

    /// Stops the reader of every connection the session dropped. The writer
    /// ends by itself once the session's sender is gone.
    fn close_removed(&mut self) {
        for id in self.session.take_closed() {
            if let Some(reader) = self.readers.remove(&id) {
                reader.abort();
            }
        }
    }
}

/// Spawns the task forwarding everything read from one connection
pub fn spawn_reader<R>(
    id: ConnectionId,
    mut reader: R,
    chunk: usize,
    events: mpsc::UnboundedSender<NetworkEvent>,
) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buffer = vec![0u8; chunk.max(1)];

        loop {
            let event = match reader.read(&mut buffer).await {
                Ok(0) => NetworkEvent::Closed { id },
                Ok(len) => NetworkEvent::Data {
                    id,
                    bytes: buffer[..len].to_vec(),
                },
                Err(error) => NetworkEvent::ReadFailed { id, error },
            };

            let last = !matches!(event, NetworkEvent::Data { .. });
            if events.send(event).is_err() || last {
                break;
            }
        }
    })
}

/// Spawns the task writing queued lines to one connection
///
/// The task shuts the stream down once every sender is dropped, and reports
/// the first failed write before exiting.
pub fn spawn_writer<Wr>(
    id: ConnectionId,
    mut writer: Wr,
    mut outbound: mpsc::UnboundedReceiver<Vec<u8>>,
    events: mpsc::UnboundedSender<NetworkEvent>,
) -> JoinHandle<()>
where
    Wr: AsyncWrite + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        while let Some(payload) = outbound.recv().await {
            if let Err(error) = writer.write_all(&payload).await {
                let _ = events.send(NetworkEvent::WriteFailed { id, error });
                return;
            }
        }

        if let Err(e) = writer.shutdown().await {
            debug!("shutdown of {} failed: {}", id, e);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::io::Builder;

    #[tokio::test]
    async fn test_reader_forwards_chunks_then_close() {
        let mock = Builder::new().read(b"hi\r").read(b"\nbye\r\n").build();
        let (tx, mut rx) = mpsc::unbounded_channel();

        spawn_reader(ConnectionId(1), mock, 64, tx).await.unwrap();

        match rx.recv().await.unwrap() {
            NetworkEvent::Data { id, bytes } => {
                assert_eq!(id, ConnectionId(1));
                assert_eq!(bytes, b"hi\r".to_vec());
            }
            other => panic!("unexpected event {:?}", other),
        }
        match rx.recv().await.unwrap() {
            NetworkEvent::Data { bytes, .. } => assert_eq!(bytes, b"\nbye\r\n".to_vec()),
            other => panic!("unexpected event {:?}", other),
        }
        assert!(matches!(
            rx.recv().await.unwrap(),
            NetworkEvent::Closed { .. }
        ));
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_reader_reports_error() {
        let mock = Builder::new()
            .read_error(io::Error::new(io::ErrorKind::ConnectionReset, "reset"))
            .build();
        let (tx, mut rx) = mpsc::unbounded_channel();

        spawn_reader(ConnectionId(3), mock, 64, tx).await.unwrap();

        match rx.recv().await.unwrap() {
            NetworkEvent::ReadFailed { id, error } => {
                assert_eq!(id, ConnectionId(3));
                assert_eq!(error.kind(), io::ErrorKind::ConnectionReset);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_writer_writes_queued_lines() {
        let mock = Builder::new()
            .write(b"Your guess?\r\n")
            .write(b"Not your turn.\r\n")
            .build();
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let (event_tx, mut event_rx) = mpsc::unbounded_channel();

        let writer = spawn_writer(ConnectionId(1), mock, out_rx, event_tx);
        out_tx.send(b"Your guess?\r\n".to_vec()).unwrap();
        out_tx.send(b"Not your turn.\r\n".to_vec()).unwrap();
        drop(out_tx);

        writer.await.unwrap();
        assert!(event_rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_writer_reports_failure() {
        let mock = Builder::new()
            .write_error(io::Error::new(io::ErrorKind::BrokenPipe, "gone"))
            .build();
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let (event_tx, mut event_rx) = mpsc::unbounded_channel();

        let writer = spawn_writer(ConnectionId(5), mock, out_rx, event_tx);
        out_tx.send(b"Your guess?\r\n".to_vec()).unwrap();
        writer.await.unwrap();

        match event_rx.recv().await.unwrap() {
            NetworkEvent::WriteFailed { id, error } => {
                assert_eq!(id, ConnectionId(5));
                assert_eq!(error.kind(), io::ErrorKind::BrokenPipe);
            }
            other => panic!("unexpected event {:?}", other),
        }
        assert!(out_tx.send(b"more".to_vec()).is_err());
    }
}
