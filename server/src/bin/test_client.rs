//! Scripted player for smoke-testing a running server.
//!
//! Joins under the given name and answers every "Your guess?" with the most
//! common English letter not yet tried this round.

use clap::Parser;
use log::{debug, info, warn};
use std::collections::HashSet;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use wordsrv_shared::{CRLF, DEFAULT_PORT};

const LETTERS_BY_FREQUENCY: &str = "etaoinshrdlcumwfgypbvkjxqz";

#[derive(Parser, Debug)]
#[clap(author, version, about = "Scripted word game player")]
struct Args {
    /// Server address
    #[clap(short = 'H', long, default_value = "127.0.0.1")]
    host: String,
    /// Server port
    #[clap(short, long, env = "WORDSRV_PORT", default_value_t = DEFAULT_PORT)]
    port: u16,
    /// Name to join with
    #[clap(short, long, default_value = "bot")]
    name: String,
    /// Leave after this many finished rounds
    #[clap(short, long, default_value_t = 3)]
    rounds: u32,
}

#[derive(Default)]
struct Player {
    tried: HashSet<char>,
    rounds_done: u32,
}

impl Player {
    fn next_guess(&mut self) -> Option<char> {
        let letter = LETTERS_BY_FREQUENCY
            .chars()
            .find(|c| !self.tried.contains(c))?;
        self.tried.insert(letter);
        Some(letter)
    }

    /// Keeps track of letters anyone has guessed, so they are not repeated.
    fn observe(&mut self, line: &str) {
        if let Some((_, rest)) = line.split_once(" guesses: ") {
            if let Some(letter) = rest.chars().next() {
                self.tried.insert(letter);
            }
        } else if line == "Start a new game." {
            self.tried.clear();
            self.rounds_done += 1;
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let address = format!("{}:{}", args.host, args.port);

    let stream = TcpStream::connect(&address).await?;
    info!("Connected to {}", address);

    let (read_half, mut write_half) = stream.into_split();
    let mut lines = BufReader::new(read_half).lines();
    let mut player = Player::default();

    while let Some(line) = lines.next_line().await? {
        info!("< {}", line);

        let reply = if line.starts_with("Welcome") || line == "What's your name ?" {
            Some(args.name.clone())
        } else if line == "Your guess?" {
            match player.next_guess() {
                Some(letter) => Some(letter.to_string()),
                None => {
                    warn!("Ran out of letters to guess");
                    break;
                }
            }
        } else {
            player.observe(&line);
            None
        };

        if let Some(reply) = reply {
            debug!("> {}", reply);
            write_half
                .write_all(format!("{}{}", reply, CRLF).as_bytes())
                .await?;
        }

        if player.rounds_done >= args.rounds {
            info!("Played {} rounds, leaving", player.rounds_done);
            break;
        }
    }

    Ok(())
}
