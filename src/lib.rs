#![doc = include_str!("../README.md")]

use std::path::PathBuf;

use thiserror::Error;

pub mod words;
pub use words::Corpus;

pub mod puzzle;
pub use puzzle::Feedback;

pub mod episode;
pub use episode::{Episode, Grid};

pub mod reward;
pub use reward::RewardConfig;

pub mod observation;
pub use observation::{Observation, ObservationMode, Space};

pub mod config;
pub use config::{EnvConfig, Verbosity};

pub mod env;
pub use env::{Environment, Step, WordleEnv};

pub mod harness;
pub use harness::{Harness, Policy, Record, Summary};

#[cfg(test)]
mod mock;

/// The number of letters in every word.
pub const WORD_LEN: usize = 5;

/// The number of guesses an episode allows, which is also the grid height.
pub const MAX_GUESSES: usize = 6;

/// The number of grid channels: guessed letters and feedback.
pub const CHANNELS: usize = 2;

pub type Result<T, E = WordleError> = std::result::Result<T, E>;

/// The errors that `wordle_gym` can produce.
#[derive(Debug, Error)]
pub enum WordleError {
    #[error("environment configuration is invalid")]
    Config {
        #[from]
        kind: ConfigError,
    },

    #[error("word corpus could not be loaded")]
    Corpus {
        #[from]
        kind: CorpusError,
    },

    /// The action passed to [`WordleEnv::step()`] does not index into the
    /// vocabulary.
    #[error("action {action} is outside the vocabulary of {vocabulary} words")]
    InvalidAction { action: usize, vocabulary: usize },

    /// The word is not part of the environment's corpus.
    #[error("the string \"{0}\" is not in the corpus")]
    NotInCorpus(String),

    /// Every row of the grid is written; the environment must be reset.
    #[error("the episode has already evaluated six guesses")]
    OutOfGuesses,

    #[error("general IO error")]
    Printing(#[from] std::io::Error),

    #[error("the evaluation harness encountered an error")]
    Harness {
        #[from]
        kind: HarnessError,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read configuration file {0:?}")]
    Io(PathBuf, #[source] std::io::Error),

    /// Raised for malformed documents and for missing required keys.
    #[error("could not parse configuration document")]
    Parse(#[from] serde_json::Error),

    #[error("the value {value:?} is not valid for {key}")]
    InvalidValue { key: &'static str, value: String },
}

#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("could not read word list {0:?}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("the word list {0:?} contains no words")]
    Empty(PathBuf),

    /// Every word must be exactly [`WORD_LEN`] lowercase ascii letters.
    #[error("line {line} of the word list holds \"{word}\", which is not a five letter lowercase word")]
    MalformedWord { line: usize, word: String },
}

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("the harness was asked to run zero episodes")]
    NoEpisodes,

    #[error("the policy {0} chose an action outside the vocabulary")]
    PolicyFailed(String),
}
