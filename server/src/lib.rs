//! # Word Game Server Library
//!
//! This library provides the server for a turn-based, multiplayer letter
//! guessing game played over plain TCP. Players connect with any line-based
//! client (telnet, netcat), pick a name and take turns guessing letters of a
//! hidden word.
//!
//! ## Core Responsibilities
//!
//! ### Connection Lifecycle
//! Every connection starts out Pending. It is greeted, asked for a name, and
//! becomes an Active player once it sends a valid name that nobody else is
//! using. Pending connections never see game traffic.
//!
//! ### Turn-Based Play
//! Exactly one Active player holds the turn whenever anyone is playing. A
//! correct guess keeps the turn, a wrong guess passes it on, and the turn
//! also moves when its holder leaves.
//!
//! ### Broadcasting
//! Every change to the round is sent to all Active players. A player whose
//! socket fails is disconnected after the current event has been handled,
//! without disturbing delivery to anyone else.
//!
//! ## Architecture Design
//!
//! ### Single Reactor
//! All game state is owned by one task that handles one event at a time:
//! a new connection, some bytes from a connection, or a failed read or
//! write. Per-connection reader and writer tasks only move bytes; they never
//! touch the game.
//!
//! ### Line Protocol
//! Input arrives as an unframed byte stream and is cut into CRLF-terminated
//! lines by a bounded reassembler (see `wordsrv_shared::LineReassembler`).
//! All output is CRLF-terminated text.
//!
//! ## Module Organization
//!
//! - `config`: runtime settings and their validation
//! - `connection`: one client connection, its name, inbox and output sink
//! - `registry`: Pending and Active connections plus the turn ring order
//! - `game`: the round state machine and the turn pointer
//! - `dictionary`: where new words come from
//! - `broadcast`: fan-out of messages with failure isolation
//! - `session`: the protocol handlers tying the above together
//! - `network`: the tokio TCP listener, connection tasks and reactor loop
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use wordsrv::config::ServerConfig;
//! use wordsrv::dictionary::Dictionary;
//! use wordsrv::network::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig::default();
//!     let words = Dictionary::load("words.txt")?;
//!
//!     let server = Server::bind(&config, words).await?;
//!     server.run().await?;
//!
//!     Ok(())
//! }
//! ```

pub mod broadcast;
pub mod config;
pub mod connection;
pub mod dictionary;
pub mod error;
pub mod game;
pub mod network;
pub mod registry;
pub mod session;
