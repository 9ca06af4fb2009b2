//! Error types for the word game server.
//!
//! `ServerError` covers startup and other process-level failures. The rest
//! describe per-connection faults; the session turns those into a message
//! for the offending client or a disconnect, never into a process exit.

use crate::connection::ConnectionId;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("dictionary error: {0}")]
    Dictionary(#[from] DictionaryError),

    #[error("configuration error: {0}")]
    Config(String),
}

#[derive(Debug, Error)]
pub enum DictionaryError {
    #[error("cannot read dictionary {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("dictionary {path} has no usable words")]
    Empty { path: String },
}

/// Why a display name was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("name {0:?} is already taken")]
    NameConflict(String),

    #[error("name is empty, blank or too long")]
    InvalidName,

    #[error("connection {0} is not registered")]
    UnknownConnection(ConnectionId),

    #[error("connection {0} is not waiting for a name")]
    NotPending(ConnectionId),
}

/// Why a guess was refused. The round is left untouched in both cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GuessError {
    #[error("guess made out of turn")]
    NotYourTurn,

    #[error("guess is not a single new lowercase letter")]
    InvalidGuess,
}
