//! Connection bookkeeping for the word game server
//!
//! Every live connection belongs to exactly one of two collections:
//! - **Pending**: accepted, but no acceptable display name yet. Pending
//!   connections get no turns and no broadcasts.
//! - **Active**: named players taking part in the game.
//!
//! Promotion moves a connection from Pending to Active; it is never copied.
//! Active connections are additionally kept in an ordered turn ring. A newly
//! promoted player is inserted at the *front* of the ring while turns advance
//! toward the *back* and wrap around, so a newcomer waits until the current
//! pass over the ring wraps before getting a turn.

use crate::connection::{Connection, ConnectionId};
use crate::error::RegistryError;
use log::info;
use std::collections::HashMap;

/// Which collection currently owns a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Pending,
    Active,
    Unknown,
}

/// Owns every live connection, keyed by id
pub struct ConnectionRegistry {
    /// Connections still choosing a name
    pending: HashMap<ConnectionId, Connection>,
    /// Named players
    active: HashMap<ConnectionId, Connection>,
    /// Turn ring over `active`, front first
    order: Vec<ConnectionId>,
    /// Names must be strictly shorter than this
    max_name_len: usize,
}

impl ConnectionRegistry {
    /// Creates an empty registry enforcing the given name length limit
    pub fn new(max_name_len: usize) -> Self {
        Self {
            pending: HashMap::new(),
            active: HashMap::new(),
            order: Vec::new(),
            max_name_len,
        }
    }

    /// Registers a freshly accepted connection as Pending
    pub fn add_pending(&mut self, connection: Connection) {
        info!(
            "Adding client {} from {}",
            connection.id(),
            connection.addr()
        );
        self.pending.insert(connection.id(), connection);
    }

    /// Inserts a connection straight into Active under `name`
    ///
    /// Fails with `NameConflict` if another player already uses the name and
    /// `InvalidName` if it is empty, blank or too long. The connection is
    /// dropped on failure.
    pub fn add_active(&mut self, mut connection: Connection, name: &str) -> Result<(), RegistryError> {
        self.check_name(name)?;
        connection.set_name(name);
        self.order.insert(0, connection.id());
        self.active.insert(connection.id(), connection);
        Ok(())
    }

    /// Moves a Pending connection into Active under `name`
    ///
    /// On any error the connection stays Pending and untouched.
    pub fn promote(&mut self, id: ConnectionId, name: &str) -> Result<(), RegistryError> {
        match self.classify(id) {
            Classification::Pending => {}
            Classification::Active => return Err(RegistryError::NotPending(id)),
            Classification::Unknown => return Err(RegistryError::UnknownConnection(id)),
        }

        self.check_name(name)?;

        let connection = self
            .pending
            .remove(&id)
            .ok_or(RegistryError::UnknownConnection(id))?;
        self.add_active(connection, name)
    }

    /// Removes a connection from whichever collection holds it
    ///
    /// Returns the connection so the caller can read its name before it is
    /// dropped, or `None` if the id is not registered.
    pub fn remove(&mut self, id: ConnectionId) -> Option<Connection> {
        if let Some(connection) = self.pending.remove(&id) {
            return Some(connection);
        }

        let connection = self.active.remove(&id)?;
        self.order.retain(|other| *other != id);
        Some(connection)
    }

    /// Reports which collection owns `id`
    pub fn classify(&self, id: ConnectionId) -> Classification {
        if self.active.contains_key(&id) {
            Classification::Active
        } else if self.pending.contains_key(&id) {
            Classification::Pending
        } else {
            Classification::Unknown
        }
    }

    /// Turn-ring order of Active ids at this moment
    ///
    /// The returned vector is a copy, so it stays stable while handlers add or
    /// remove connections during one dispatch.
    pub fn snapshot_active(&self) -> Vec<ConnectionId> {
        self.order.clone()
    }

    /// The player after `id` in the turn ring, wrapping to the front
    ///
    /// Returns `id` itself when it is the only player and `None` when it is
    /// not Active.
    pub fn next_in_ring(&self, id: ConnectionId) -> Option<ConnectionId> {
        let index = self.order.iter().position(|other| *other == id)?;
        Some(self.order[(index + 1) % self.order.len()])
    }

    /// Looks a connection up in either collection
    pub fn get(&self, id: ConnectionId) -> Option<&Connection> {
        self.active.get(&id).or_else(|| self.pending.get(&id))
    }

    /// Mutable lookup in either collection
    pub fn get_mut(&mut self, id: ConnectionId) -> Option<&mut Connection> {
        match self.active.get_mut(&id) {
            Some(connection) => Some(connection),
            None => self.pending.get_mut(&id),
        }
    }

    /// Looks up an Active player
    pub fn active(&self, id: ConnectionId) -> Option<&Connection> {
        self.active.get(&id)
    }

    /// True if an Active player already uses `name`
    pub fn is_name_taken(&self, name: &str) -> bool {
        self.active.values().any(|connection| connection.name() == name)
    }

    /// Checks the length and content rules for a display name
    pub fn is_valid_name(&self, name: &str) -> bool {
        !name.is_empty()
            && name.len() < self.max_name_len
            && !name.chars().all(char::is_whitespace)
    }

    /// Number of named players
    pub fn active_len(&self) -> usize {
        self.active.len()
    }

    /// Number of connections still choosing a name
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Total live connections
    pub fn len(&self) -> usize {
        self.active.len() + self.pending.len()
    }

    /// Returns true if nothing is connected
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_name(&self, name: &str) -> Result<(), RegistryError> {
        if !self.is_valid_name(name) {
            return Err(RegistryError::InvalidName);
        }
        if self.is_name_taken(name) {
            return Err(RegistryError::NameConflict(name.to_string()));
        }
        Ok(())
    }
}
