use std::fmt;

mod line;

pub use line::{LineReassembler, OverflowError, ReadOutcome};

pub const CRLF: &str = "\r\n";
pub const DEFAULT_PORT: u16 = 58231;
pub const MAX_QUEUE: u32 = 5;
pub const MAX_BUF: usize = 256;
pub const MAX_NAME: usize = 30;
pub const MAX_GUESSES: u32 = 4;
pub const WELCOME_MSG: &str = "Welcome to our word game. What is your name? ";

/// Every line the server can put on the wire.
///
/// `Display` renders the text without the terminator; `to_wire` appends CRLF.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message<'a> {
    Welcome(&'a str),
    NamePrompt,
    Joined { name: &'a str },
    Status(&'a str),
    YourGuess,
    TurnOf { name: &'a str },
    Guessed { name: &'a str, letter: char },
    NotInWord { letter: char },
    YouWon { word: &'a str },
    Won { name: &'a str, word: &'a str },
    GameOver { word: &'a str },
    NewGame,
    Quit { name: &'a str },
    InvalidInput,
    NotYourTurn,
}

impl Message<'_> {
    pub fn to_wire(&self) -> String {
        format!("{self}{CRLF}")
    }
}

impl fmt::Display for Message<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Message::Welcome(banner) => f.write_str(banner),
            Message::NamePrompt => f.write_str("What's your name ?"),
            Message::Joined { name } => write!(f, "{name} has joined."),
            Message::Status(board) => f.write_str(board.trim_end_matches(CRLF)),
            Message::YourGuess => f.write_str("Your guess?"),
            Message::TurnOf { name } => write!(f, "It's {name}'s turn."),
            Message::Guessed { name, letter } => write!(f, "{name} guesses: {letter}"),
            Message::NotInWord { letter } => write!(f, "{letter} not in the word."),
            Message::YouWon { word } => write!(f, "You won! The word is: {word}"),
            Message::Won { name, word } => write!(f, "{name} won! The word is: {word}"),
            Message::GameOver { word } => write!(f, "The word was {word}. Game over."),
            Message::NewGame => f.write_str("Start a new game."),
            Message::Quit { name } => write!(f, "{name} has quitted."),
            Message::InvalidInput => f.write_str("Invalid Input.Try again"),
            Message::NotYourTurn => f.write_str("Not your turn."),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_prompts() {
        assert_eq!(Message::NamePrompt.to_wire(), "What's your name ?\r\n");
        assert_eq!(Message::YourGuess.to_wire(), "Your guess?\r\n");
        assert_eq!(Message::InvalidInput.to_wire(), "Invalid Input.Try again\r\n");
        assert_eq!(Message::NotYourTurn.to_wire(), "Not your turn.\r\n");
        assert_eq!(Message::NewGame.to_wire(), "Start a new game.\r\n");
    }

    #[test]
    fn test_player_messages() {
        assert_eq!(
            Message::Joined { name: "ada" }.to_wire(),
            "ada has joined.\r\n"
        );
        assert_eq!(
            Message::TurnOf { name: "ada" }.to_wire(),
            "It's ada's turn.\r\n"
        );
        assert_eq!(
            Message::Guessed {
                name: "ada",
                letter: 'q'
            }
            .to_wire(),
            "ada guesses: q\r\n"
        );
        assert_eq!(
            Message::NotInWord { letter: 'q' }.to_wire(),
            "q not in the word.\r\n"
        );
        assert_eq!(Message::Quit { name: "ada" }.to_wire(), "ada has quitted.\r\n");
    }

    #[test]
    fn test_round_end_messages() {
        assert_eq!(
            Message::YouWon { word: "cat" }.to_wire(),
            "You won! The word is: cat\r\n"
        );
        assert_eq!(
            Message::Won {
                name: "ada",
                word: "cat"
            }
            .to_wire(),
            "ada won! The word is: cat\r\n"
        );
        assert_eq!(
            Message::GameOver { word: "cat" }.to_wire(),
            "The word was cat. Game over.\r\n"
        );
    }

    #[test]
    fn test_status_board_gets_single_terminator() {
        let board = "line one\r\nline two\r\n";
        assert_eq!(Message::Status(board).to_wire(), "line one\r\nline two\r\n");
        assert_eq!(Message::Status("plain").to_wire(), "plain\r\n");
    }

    #[test]
    fn test_welcome_banner() {
        assert_eq!(
            Message::Welcome(WELCOME_MSG).to_wire(),
            "Welcome to our word game. What is your name? \r\n"
        );
    }
}
