//! Protocol engine driven by the event loop.
//!
//! `GameSession` owns the registry, the round state and the word source, and
//! exposes one handler per transport event. It never blocks and never touches
//! a socket, so the whole protocol can be driven from tests with in-memory
//! sinks. Every handler runs to completion:
//!
//! 1. feed the bytes to the connection's line reassembler
//! 2. route each completed line to naming (Pending) or guessing (Active)
//! 3. apply the change to shared state and notify players
//! 4. disconnect every connection whose write failed along the way
//!
//! Per-connection faults end as a message to that client or a disconnect of
//! that client only. Nothing here can stop the server from serving others.

use crate::broadcast::Broadcaster;
use crate::config::ServerConfig;
use crate::connection::{ClientSink, Connection, ConnectionId};
use crate::dictionary::WordSource;
use crate::error::GuessError;
use crate::game::{GameState, GuessOutcome};
use crate::registry::{Classification, ConnectionRegistry};
use log::{debug, info, warn};
use std::io;
use std::net::SocketAddr;
use wordsrv_shared::{Message, ReadOutcome};

pub struct GameSession<W> {
    registry: ConnectionRegistry,
    game: GameState,
    words: W,
    outbox: Broadcaster,
    welcome: String,
    line_capacity: usize,
    next_id: u64,
    closed: Vec<ConnectionId>,
}

impl<W: WordSource> GameSession<W> {
    pub fn new(config: &ServerConfig, mut words: W) -> Self {
        let game = GameState::new(words.next_word(), config.max_guesses);
        Self {
            registry: ConnectionRegistry::new(config.max_name_len),
            game,
            words,
            outbox: Broadcaster::new(),
            welcome: config.welcome.clone(),
            line_capacity: config.line_capacity,
            next_id: 1,
            closed: Vec::new(),
        }
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    pub fn game(&self) -> &GameState {
        &self.game
    }

    /// Name of the player holding the turn, if any.
    pub fn turn_holder(&self) -> Option<&str> {
        self.game
            .turn()
            .and_then(|id| self.registry.active(id))
            .map(Connection::name)
    }

    pub fn next_connection_id(&mut self) -> ConnectionId {
        let id = ConnectionId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Ids removed since the last call; the transport closes their handles.
    pub fn take_closed(&mut self) -> Vec<ConnectionId> {
        std::mem::take(&mut self.closed)
    }

    /// A new connection was accepted: register it as Pending and greet it.
    pub fn on_accept(&mut self, id: ConnectionId, addr: SocketAddr, sink: Box<dyn ClientSink>) {
        info!("A new client is connecting from {}", addr);
        let connection = Connection::new(id, addr, self.line_capacity, sink);
        self.registry.add_pending(connection);

        let welcome = self.welcome.clone();
        let _ = self
            .outbox
            .unicast(&mut self.registry, id, &Message::Welcome(&welcome));
        self.reap();
    }

    /// Result of one read on connection `id`. `Ok(&[])` means end of stream.
    pub fn on_read(&mut self, id: ConnectionId, read: io::Result<&[u8]>) {
        let outcome = match self.registry.get_mut(id) {
            Some(connection) => {
                if let Ok(bytes) = &read {
                    debug!("Read {} bytes from {}", bytes.len(), id);
                }
                connection.inbox_mut().feed_read(read)
            }
            None => {
                debug!("Ignoring read for unknown connection {}", id);
                return;
            }
        };

        match outcome {
            Ok(ReadOutcome::Line(line)) => {
                self.handle_line(id, line);
                self.drain_lines(id);
            }
            Ok(ReadOutcome::Pending) => {}
            Ok(ReadOutcome::PeerClosed) => {
                debug!("Connection {} closed by peer", id);
                self.disconnect(id);
            }
            Ok(ReadOutcome::IoError(e)) => {
                warn!("Read from {} failed: {}", id, e);
                self.disconnect(id);
            }
            Err(overflow) => {
                self.handle_overflow(id, overflow.capacity);
                self.drain_lines(id);
            }
        }

        self.reap();
    }

    /// The transport could not write to `id`.
    pub fn on_write_failed(&mut self, id: ConnectionId) {
        if self.registry.classify(id) != Classification::Unknown {
            warn!("Writer for {} failed", id);
            self.outbox.mark_failed(id);
        }
        self.reap();
    }

    fn drain_lines(&mut self, id: ConnectionId) {
        loop {
            let next = match self.registry.get_mut(id) {
                Some(connection) => connection.inbox_mut().next_line(),
                None => return,
            };

            match next {
                Ok(Some(line)) => self.handle_line(id, line),
                Ok(None) => return,
                Err(overflow) => self.handle_overflow(id, overflow.capacity),
            }
        }
    }

    fn handle_line(&mut self, id: ConnectionId, line: String) {
        match self.registry.classify(id) {
            Classification::Pending => self.handle_name(id, &line),
            Classification::Active => self.handle_guess(id, &line),
            Classification::Unknown => {}
        }
    }

    /// An oversized line counts as bad input, not as a reason to disconnect.
    fn handle_overflow(&mut self, id: ConnectionId, capacity: usize) {
        warn!("Connection {} sent a line longer than {} bytes", id, capacity);
        let reply = match self.registry.classify(id) {
            Classification::Pending => Message::NamePrompt,
            Classification::Active => Message::InvalidInput,
            Classification::Unknown => return,
        };
        let _ = self.outbox.unicast(&mut self.registry, id, &reply);
    }

    fn handle_name(&mut self, id: ConnectionId, name: &str) {
        if name.is_empty() {
            return;
        }

        if let Err(e) = self.registry.promote(id, name) {
            debug!("Rejected name from {}: {}", id, e);
            let _ = self
                .outbox
                .unicast(&mut self.registry, id, &Message::NamePrompt);
            return;
        }

        info!("{} has joined.", name);
        if self.game.turn().is_none() {
            self.game.set_turn(Some(id));
        }

        self.outbox
            .broadcast(&mut self.registry, &Message::Joined { name });
        let status = self.game.render_status();
        let _ = self
            .outbox
            .unicast(&mut self.registry, id, &Message::Status(&status));
        self.announce_turn();
    }

    fn handle_guess(&mut self, id: ConnectionId, input: &str) {
        let Some(name) = self.registry.active(id).map(|c| c.name().to_string()) else {
            return;
        };

        let outcome = match self.game.apply_guess(id, input) {
            Ok(outcome) => outcome,
            Err(GuessError::NotYourTurn) => {
                info!("Player {} tries to guess out of turn.", name);
                let _ = self
                    .outbox
                    .unicast(&mut self.registry, id, &Message::NotYourTurn);
                return;
            }
            Err(GuessError::InvalidGuess) => {
                debug!("Invalid guess {:?} from {}", input, name);
                let _ = self
                    .outbox
                    .unicast(&mut self.registry, id, &Message::InvalidInput);
                return;
            }
        };

        match outcome {
            GuessOutcome::Correct { letter, solved } => {
                info!("{} guesses: {}", name, letter);
                self.outbox
                    .broadcast(&mut self.registry, &Message::Guessed { name: &name, letter });
                if solved {
                    self.finish_won(id, &name);
                }
            }
            GuessOutcome::Incorrect {
                letter,
                guesses_left,
            } => {
                info!("{} not in the word, {} guesses left", letter, guesses_left);
                let _ = self
                    .outbox
                    .unicast(&mut self.registry, id, &Message::NotInWord { letter });
                self.outbox
                    .broadcast(&mut self.registry, &Message::Guessed { name: &name, letter });

                let ring = self.registry.snapshot_active();
                self.game.advance_turn(&ring);

                if self.game.is_lost() {
                    self.finish_lost();
                }
            }
        }

        self.broadcast_status();
        self.announce_turn();
    }

    fn finish_won(&mut self, winner: ConnectionId, name: &str) {
        let word = self.game.word().to_string();
        info!("{} won! The word is: {}", name, word);

        self.outbox.broadcast_each(&mut self.registry, |id| {
            if id == winner {
                Message::YouWon { word: &word }
            } else {
                Message::Won { name, word: &word }
            }
        });
        self.start_new_round();
    }

    fn finish_lost(&mut self) {
        let word = self.game.word().to_string();
        info!("The word was {}. Game over.", word);

        self.outbox
            .broadcast(&mut self.registry, &Message::GameOver { word: &word });
        self.start_new_round();
    }

    fn start_new_round(&mut self) {
        self.outbox.broadcast(&mut self.registry, &Message::NewGame);
        let word = self.words.next_word();
        self.game.reset_round(word);
    }

    fn broadcast_status(&mut self) {
        let status = self.game.render_status();
        self.outbox
            .broadcast(&mut self.registry, &Message::Status(&status));
    }

    /// Tells the holder to guess and everyone else whose turn it is.
    fn announce_turn(&mut self) {
        let Some(holder) = self.game.turn() else {
            return;
        };
        let Some(name) = self.registry.active(holder).map(|c| c.name().to_string()) else {
            return;
        };
        info!("It's {}'s turn.", name);

        self.outbox.broadcast_each(&mut self.registry, |id| {
            if id == holder {
                Message::YourGuess
            } else {
                Message::TurnOf { name: &name }
            }
        });
    }

    /// Removes `id`, closes its handle and repairs the turn ring.
    ///
    /// Leaving Active players are announced to the rest; if the leaver held
    /// the turn it passes to the next player in ring order.
    fn disconnect(&mut self, id: ConnectionId) {
        let held_turn = self.game.turn() == Some(id);
        let successor = self
            .registry
            .next_in_ring(id)
            .filter(|next| *next != id);

        let Some(connection) = self.registry.remove(id) else {
            return;
        };
        self.closed.push(id);
        info!("Removing client {} {}", id, connection.addr());

        if !connection.is_named() {
            return;
        }

        if held_turn {
            self.game.set_turn(successor);
        }

        let name = connection.name().to_string();
        drop(connection);
        info!("{} has quitted.", name);
        self.outbox
            .broadcast(&mut self.registry, &Message::Quit { name: &name });

        if self.registry.active_len() > 0 {
            self.announce_turn();
        }
    }

    /// Disconnects every connection whose write failed, including failures
    /// caused by the disconnect notices themselves.
    fn reap(&mut self) {
        loop {
            let failed = self.outbox.take_failed();
            if failed.is_empty() {
                return;
            }
            for id in failed {
                self.disconnect(id);
            }
        }
    }
}
