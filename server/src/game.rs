use crate::connection::ConnectionId;
use crate::error::GuessError;
use log::info;

/// Mask character for letters nobody has guessed yet.
pub const PLACEHOLDER: char = '-';

const ALPHABET: usize = 26;

/// Result of a guess that passed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuessOutcome {
    /// Letter is in the word; `solved` is set once no placeholder remains.
    Correct { letter: char, solved: bool },
    /// Letter is not in the word; one guess was spent.
    Incorrect { letter: char, guesses_left: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundState {
    InProgress,
    Won,
    Lost,
}

/// Shared state of the current round plus the turn pointer.
///
/// The turn pointer survives `reset_round`; the round's word, mask, guessed
/// letters and guess counter do not.
#[derive(Debug, Clone)]
pub struct GameState {
    word: String,
    mask: Vec<char>,
    guessed: [bool; ALPHABET],
    guesses_left: u32,
    max_guesses: u32,
    turn: Option<ConnectionId>,
}

impl GameState {
    pub fn new(word: String, max_guesses: u32) -> Self {
        let mask = vec![PLACEHOLDER; word.chars().count()];
        Self {
            word,
            mask,
            guessed: [false; ALPHABET],
            guesses_left: max_guesses,
            max_guesses,
            turn: None,
        }
    }

    pub fn word(&self) -> &str {
        &self.word
    }

    pub fn mask(&self) -> String {
        self.mask.iter().collect()
    }

    pub fn guesses_left(&self) -> u32 {
        self.guesses_left
    }

    pub fn max_guesses(&self) -> u32 {
        self.max_guesses
    }

    pub fn turn(&self) -> Option<ConnectionId> {
        self.turn
    }

    pub fn set_turn(&mut self, turn: Option<ConnectionId>) {
        self.turn = turn;
    }

    pub fn has_guessed(&self, letter: char) -> bool {
        letter_index(letter).is_some_and(|i| self.guessed[i])
    }

    /// Letters tried this round, alphabetical.
    pub fn guessed_letters(&self) -> Vec<char> {
        ('a'..='z').filter(|c| self.has_guessed(*c)).collect()
    }

    /// Applies one line of input from `player` as a guess.
    ///
    /// The turn is checked before the input itself, so anyone but the turn
    /// holder gets `NotYourTurn` whatever they typed. Errors leave the round
    /// exactly as it was.
    pub fn apply_guess(
        &mut self,
        player: ConnectionId,
        input: &str,
    ) -> Result<GuessOutcome, GuessError> {
        if self.turn != Some(player) {
            return Err(GuessError::NotYourTurn);
        }

        let letter = parse_letter(input).ok_or(GuessError::InvalidGuess)?;
        let index = letter_index(letter).ok_or(GuessError::InvalidGuess)?;
        if self.guessed[index] {
            return Err(GuessError::InvalidGuess);
        }
        self.guessed[index] = true;

        let mut hit = false;
        for (slot, c) in self.mask.iter_mut().zip(self.word.chars()) {
            if c == letter {
                *slot = c;
                hit = true;
            }
        }

        if hit {
            Ok(GuessOutcome::Correct {
                letter,
                solved: self.is_won(),
            })
        } else {
            self.guesses_left = self.guesses_left.saturating_sub(1);
            Ok(GuessOutcome::Incorrect {
                letter,
                guesses_left: self.guesses_left,
            })
        }
    }

    pub fn is_won(&self) -> bool {
        !self.mask.contains(&PLACEHOLDER)
    }

    pub fn is_lost(&self) -> bool {
        self.guesses_left == 0
    }

    pub fn state(&self) -> RoundState {
        if self.is_won() {
            RoundState::Won
        } else if self.is_lost() {
            RoundState::Lost
        } else {
            RoundState::InProgress
        }
    }

    /// Moves the turn to the player after the current holder in `ring`.
    ///
    /// Wraps from the back of the ring to the front. If the holder is no
    /// longer in the ring the front player gets the turn, and an empty ring
    /// clears the pointer.
    pub fn advance_turn(&mut self, ring: &[ConnectionId]) {
        self.turn = match ring.len() {
            0 => None,
            len => {
                let next = self
                    .turn
                    .and_then(|holder| ring.iter().position(|id| *id == holder))
                    .map_or(0, |index| (index + 1) % len);
                Some(ring[next])
            }
        };
    }

    /// Starts a fresh round on `word`, keeping the turn pointer.
    pub fn reset_round(&mut self, word: String) {
        info!("New round with a {} letter word", word.chars().count());
        self.mask = vec![PLACEHOLDER; word.chars().count()];
        self.word = word;
        self.guessed = [false; ALPHABET];
        self.guesses_left = self.max_guesses;
    }

    /// Board shown to players after every change to the round.
    pub fn render_status(&self) -> String {
        let letters: Vec<String> = self
            .guessed_letters()
            .iter()
            .map(char::to_string)
            .collect();

        format!(
            "***************\r\n\
             Word to guess: {}\r\n\
             Guesses remaining: {}\r\n\
             Letters guessed: {}\r\n\
             ***************",
            self.mask(),
            self.guesses_left,
            letters.join(" ")
        )
    }
}

/// A guess is exactly one lowercase ASCII letter.
fn parse_letter(input: &str) -> Option<char> {
    let mut chars = input.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_lowercase() => Some(c),
        _ => None,
    }
}

fn letter_index(letter: char) -> Option<usize> {
    letter
        .is_ascii_lowercase()
        .then(|| (letter as u8 - b'a') as usize)
}
