use clap::Parser;
use log::{error, info};
use std::path::PathBuf;
use wordsrv::config::ServerConfig;
use wordsrv::dictionary::Dictionary;
use wordsrv::network::Server;
use wordsrv_shared::{DEFAULT_PORT, MAX_GUESSES};

/// Command line arguments
#[derive(Parser, Debug)]
#[clap(author, version, about = "Turn-based multiplayer word guessing server")]
struct Args {
    /// Word list, one lowercase word per line
    dictionary: PathBuf,
    /// Server IP address to bind to
    #[clap(short = 'H', long, default_value = "0.0.0.0")]
    host: String,
    /// Server port to listen on
    #[clap(short, long, env = "WORDSRV_PORT", default_value_t = DEFAULT_PORT)]
    port: u16,
    /// Wrong guesses allowed per round
    #[clap(short, long, default_value_t = MAX_GUESSES)]
    max_guesses: u32,
}

/// Main-method of the application.
/// Parses command-line arguments, loads the word list and runs the server until it
/// stops or Ctrl+C is pressed.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let config = ServerConfig {
        host: args.host,
        port: args.port,
        max_guesses: args.max_guesses,
        ..ServerConfig::default()
    };
    config.validate()?;

    let words = Dictionary::load(&args.dictionary)?;
    let server = Server::bind(&config, words).await?;
    info!("Word game server ready on {}", server.local_addr()?);

    // Handle shutdown gracefully
    tokio::select! {
        result = server.run() => {
            if let Err(e) = result {
                error!("Server stopped: {}", e);
                return Err(e.into());
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down gracefully...");
        }
    }

    Ok(())
}
