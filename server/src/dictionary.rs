//! Word sources for new rounds.
//!
//! The server only needs "give me the next word"; `Dictionary` answers that
//! with a uniformly random pick from a word-list file.

use crate::error::DictionaryError;
use log::{info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fs;
use std::path::Path;

/// Supplies the target word for each round.
pub trait WordSource {
    fn next_word(&mut self) -> String;
}

/// Word list loaded from a file, one word per line.
#[derive(Debug)]
pub struct Dictionary {
    words: Vec<String>,
    rng: StdRng,
}

impl Dictionary {
    /// Loads every usable word from `path`.
    ///
    /// Lines are trimmed; anything that is not entirely lowercase ASCII
    /// letters is skipped. A file with no usable line is an error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DictionaryError> {
        let path = path.as_ref();
        let display = path.display().to_string();

        let contents = fs::read_to_string(path).map_err(|source| DictionaryError::Io {
            path: display.clone(),
            source,
        })?;

        let total = contents.lines().count();
        let words: Vec<String> = contents
            .lines()
            .map(str::trim)
            .filter(|word| is_playable(word))
            .map(str::to_string)
            .collect();

        if words.is_empty() {
            return Err(DictionaryError::Empty { path: display });
        }
        if words.len() < total {
            warn!(
                "Skipped {} unusable lines in {}",
                total - words.len(),
                display
            );
        }
        info!("Loaded {} words from {}", words.len(), display);

        Ok(Self {
            words,
            rng: StdRng::from_entropy(),
        })
    }

    /// Builds a dictionary from an in-memory list with a fixed seed.
    pub fn from_words(words: Vec<String>, seed: u64) -> Result<Self, DictionaryError> {
        let words: Vec<String> = words.into_iter().filter(|w| is_playable(w)).collect();
        if words.is_empty() {
            return Err(DictionaryError::Empty {
                path: "<memory>".to_string(),
            });
        }

        Ok(Self {
            words,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.iter().any(|w| w == word)
    }
}

impl WordSource for Dictionary {
    fn next_word(&mut self) -> String {
        // never empty: both constructors reject an empty list
        let index = self.rng.gen_range(0..self.words.len());
        self.words[index].clone()
    }
}

fn is_playable(word: &str) -> bool {
    !word.is_empty() && word.bytes().all(|b| b.is_ascii_lowercase())
}
