//! Environment configuration and the document it is read from.
//!
//! The configuration document groups keys under two sections:
//!
//! ```json
//! {
//!   "rl_env": {
//!     "WIN_REWARD": 100,
//!     "RIGHT_LETTER_REWARD": 5,
//!     "RIGHT_POSITION_REWARD": 10,
//!     "PENALTY": -20,
//!     "VERBOSITY": "INFO",
//!     "SIMPLIFY_CORPUS": false,
//!     "OBSERVATION_MODE": "GRID",
//!     "SEED": 7
//!   },
//!   "word_file_paths": { "valid_words_file_path": "words.txt" }
//! }
//! ```
//!
//! The reward keys and the word list path are required. Everything else has
//! a default.

use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use log::LevelFilter;
use serde::{Deserialize, Serialize};

use crate::{observation::ObservationMode, reward::RewardConfig, ConfigError, Result};

/// How much an environment logs.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verbosity {
    Debug,
    Info,
    #[default]
    #[serde(alias = "WARN")]
    Warning,
    Error,
}

impl Verbosity {
    pub fn level_filter(self) -> LevelFilter {
        match self {
            Verbosity::Debug => LevelFilter::Debug,
            Verbosity::Info => LevelFilter::Info,
            Verbosity::Warning => LevelFilter::Warn,
            Verbosity::Error => LevelFilter::Error,
        }
    }
}

impl FromStr for Verbosity {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DEBUG" => Ok(Verbosity::Debug),
            "INFO" => Ok(Verbosity::Info),
            "WARNING" | "WARN" => Ok(Verbosity::Warning),
            "ERROR" => Ok(Verbosity::Error),
            _ => Err(ConfigError::InvalidValue {
                key: "VERBOSITY",
                value: s.to_string(),
            }),
        }
    }
}

impl FromStr for ObservationMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "FLAT" => Ok(ObservationMode::Flat),
            "GOAL" => Ok(ObservationMode::Goal),
            "GRID" => Ok(ObservationMode::Grid),
            _ => Err(ConfigError::InvalidValue {
                key: "OBSERVATION_MODE",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Deserialize)]
struct Document {
    rl_env: RlEnv,
    word_file_paths: WordFilePaths,
}

#[derive(Deserialize)]
struct RlEnv {
    #[serde(flatten)]
    rewards: RewardConfig,
    #[serde(rename = "VERBOSITY")]
    verbosity: Option<String>,
    #[serde(rename = "SIMPLIFY_CORPUS", default)]
    simplify_corpus: bool,
    #[serde(rename = "OBSERVATION_MODE")]
    observation_mode: Option<String>,
    #[serde(rename = "SEED")]
    seed: Option<u64>,
}

#[derive(Deserialize)]
struct WordFilePaths {
    valid_words_file_path: PathBuf,
}

/// Everything a [`WordleEnv`](crate::WordleEnv) needs to be built.
///
/// Read one from a document with [`from_path()`](Self::from_path()), or
/// build one in code. The builder methods consume the configuration and
/// return a new one.
///
/// # Examples
///
/// ```rust
/// use wordle_gym::{EnvConfig, ObservationMode, RewardConfig, Verbosity};
///
/// let rewards = RewardConfig {
///     win_reward: 100,
///     right_letter_reward: 5,
///     right_position_reward: 10,
///     penalty: -20,
/// };
/// let config = EnvConfig::new(rewards, "words.txt")
///     .mode(ObservationMode::Flat)
///     .verbosity(Verbosity::Debug)
///     .seed(7);
///
/// assert_eq!(config.observation_mode, ObservationMode::Flat);
/// assert!(!config.simplify_corpus);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EnvConfig {
    pub rewards: RewardConfig,
    pub verbosity: Verbosity,
    pub simplify_corpus: bool,
    pub observation_mode: ObservationMode,
    pub valid_words_path: PathBuf,
    /// Seeds answer selection and corpus simplification. Without a seed the
    /// environment draws from entropy.
    pub seed: Option<u64>,
}

impl EnvConfig {
    /// Creates a configuration with default verbosity, the full corpus, and
    /// grid observations.
    pub fn new(rewards: RewardConfig, valid_words_path: impl Into<PathBuf>) -> Self {
        EnvConfig {
            rewards,
            verbosity: Verbosity::default(),
            simplify_corpus: false,
            observation_mode: ObservationMode::default(),
            valid_words_path: valid_words_path.into(),
            seed: None,
        }
    }

    /// Reads a JSON configuration document from `path`.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents =
            fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_json_str(&contents)
    }

    /// Parses a JSON configuration document.
    pub fn from_json_str(document: &str) -> Result<Self> {
        let Document {
            rl_env,
            word_file_paths,
        } = serde_json::from_str(document).map_err(ConfigError::from)?;

        let verbosity = rl_env
            .verbosity
            .as_deref()
            .map(str::parse::<Verbosity>)
            .transpose()?
            .unwrap_or_default();
        let observation_mode = rl_env
            .observation_mode
            .as_deref()
            .map(str::parse::<ObservationMode>)
            .transpose()?
            .unwrap_or_default();

        Ok(EnvConfig {
            rewards: rl_env.rewards,
            verbosity,
            simplify_corpus: rl_env.simplify_corpus,
            observation_mode,
            valid_words_path: word_file_paths.valid_words_file_path,
            seed: rl_env.seed,
        })
    }

    pub fn verbosity(self, verbosity: Verbosity) -> Self {
        EnvConfig { verbosity, ..self }
    }

    /// Keeps only a small random subsample of the word list.
    pub fn simplify(self, simplify_corpus: bool) -> Self {
        EnvConfig {
            simplify_corpus,
            ..self
        }
    }

    pub fn mode(self, observation_mode: ObservationMode) -> Self {
        EnvConfig {
            observation_mode,
            ..self
        }
    }

    pub fn seed(self, seed: u64) -> Self {
        EnvConfig {
            seed: Some(seed),
            ..self
        }
    }
}
