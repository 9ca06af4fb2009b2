//! Server settings.
//!
//! Defaults mirror the protocol constants in `wordsrv_shared`; `main` overrides
//! the ones exposed on the command line.

use crate::error::ServerError;
use std::net::{IpAddr, SocketAddr};
use wordsrv_shared::{DEFAULT_PORT, MAX_BUF, MAX_GUESSES, MAX_NAME, MAX_QUEUE, WELCOME_MSG};

/// Smallest line buffer that still fits a one-letter guess and its CRLF.
const MIN_LINE_CAPACITY: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address to bind the listener to
    pub host: String,
    /// Port to listen on, 0 picks an ephemeral port
    pub port: u16,
    /// Pending-connection queue depth handed to listen()
    pub backlog: u32,
    /// Wrong guesses allowed per round
    pub max_guesses: u32,
    /// Per-connection input buffer size in bytes, terminator included
    pub line_capacity: usize,
    /// Names must be strictly shorter than this
    pub max_name_len: usize,
    /// Banner sent to every new connection
    pub welcome: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            backlog: MAX_QUEUE,
            max_guesses: MAX_GUESSES,
            line_capacity: MAX_BUF,
            max_name_len: MAX_NAME,
            welcome: WELCOME_MSG.to_string(),
        }
    }
}

impl ServerConfig {
    pub fn validate(&self) -> Result<(), ServerError> {
        self.socket_addr()?;

        if self.max_guesses == 0 {
            return Err(ServerError::Config(
                "max guesses must be at least 1".to_string(),
            ));
        }
        if self.line_capacity < MIN_LINE_CAPACITY {
            return Err(ServerError::Config(format!(
                "line capacity must be at least {} bytes",
                MIN_LINE_CAPACITY
            )));
        }
        if self.max_name_len < 2 {
            return Err(ServerError::Config(
                "max name length must allow at least one character".to_string(),
            ));
        }
        if self.backlog == 0 {
            return Err(ServerError::Config("backlog must be positive".to_string()));
        }

        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ServerError> {
        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|e| ServerError::Config(format!("invalid host {:?}: {}", self.host, e)))?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_protocol_constants() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 58231);
        assert_eq!(config.backlog, 5);
        assert_eq!(config.max_guesses, 4);
        assert_eq!(config.line_capacity, 256);
        assert_eq!(config.max_name_len, 30);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_socket_addr() {
        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 9000,
            ..ServerConfig::default()
        };
        assert_eq!(
            config.socket_addr().unwrap(),
            "127.0.0.1:9000".parse::<SocketAddr>().unwrap()
        );

        let v6 = ServerConfig {
            host: "::1".to_string(),
            ..ServerConfig::default()
        };
        assert!(v6.socket_addr().unwrap().is_ipv6());
    }

    #[test]
    fn test_invalid_host() {
        let config = ServerConfig {
            host: "not-an-address".to_string(),
            ..ServerConfig::default()
        };
        assert!(matches!(config.validate(), Err(ServerError::Config(_))));
    }

    #[test]
    fn test_invalid_limits() {
        let cases = vec![
            ServerConfig {
                max_guesses: 0,
                ..ServerConfig::default()
            },
            ServerConfig {
                line_capacity: 3,
                ..ServerConfig::default()
            },
            ServerConfig {
                max_name_len: 1,
                ..ServerConfig::default()
            },
            ServerConfig {
                backlog: 0,
                ..ServerConfig::default()
            },
        ];

        for config in cases {
            assert!(
                matches!(config.validate(), Err(ServerError::Config(_))),
                "accepted {:?}",
                config
            );
        }
    }
}
