//! The state of a single game: its answer, the guess grid, and termination.

use std::{fmt::Display, ops::Deref};

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{
    puzzle::{decode, evaluate, is_win, Codes, Feedback},
    CHANNELS, MAX_GUESSES, WORD_LEN,
};

/// The grid channel holding guessed letter codes.
pub const GUESS_CHANNEL: usize = 0;

/// The grid channel holding feedback codes.
pub const FEEDBACK_CHANNEL: usize = 1;

/// The number of cells in a grid.
pub const GRID_LEN: usize = CHANNELS * MAX_GUESSES * WORD_LEN;

/// The guess history of a game, indexed as `[channel][row][column]`.
///
/// Row `i` of [`GUESS_CHANNEL`] holds the letter codes of the `i`th guess
/// and row `i` of [`FEEDBACK_CHANNEL`] holds its [`Feedback`] codes. Rows
/// that have not been guessed yet are all zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Grid {
    cells: [[[u8; WORD_LEN]; MAX_GUESSES]; CHANNELS],
}

impl Grid {
    /// Creates an all-zero grid.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn write_row(&mut self, row: usize, guess: &Codes, feedback: &[Feedback; WORD_LEN]) {
        self.cells[GUESS_CHANNEL][row] = *guess;
        self.cells[FEEDBACK_CHANNEL][row] = feedback.map(Feedback::code);
    }

    /// Reads the feedback of a written row.
    ///
    /// Returns `None` for rows that hold no feedback, such as the zeroed rows
    /// past the current guess.
    pub fn feedback(&self, row: usize) -> Option<[Feedback; WORD_LEN]> {
        let codes = self.cells.get(FEEDBACK_CHANNEL)?.get(row)?;
        let mut res = [Feedback::Absent; WORD_LEN];
        for (f, &code) in res.iter_mut().zip(codes) {
            *f = Feedback::from_code(code)?;
        }
        Some(res)
    }

    /// Flattens the grid channel-major, then row-major.
    pub fn flatten(&self) -> Vec<u8> {
        self.cells.iter().flatten().flatten().copied().collect()
    }
}

impl Deref for Grid {
    type Target = [[[u8; WORD_LEN]; MAX_GUESSES]; CHANNELS];

    fn deref(&self) -> &Self::Target {
        &self.cells
    }
}

impl From<[[[u8; WORD_LEN]; MAX_GUESSES]; CHANNELS]> for Grid {
    fn from(cells: [[[u8; WORD_LEN]; MAX_GUESSES]; CHANNELS]) -> Self {
        Self { cells }
    }
}

impl Display for Grid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (guess, feedback) in self[GUESS_CHANNEL].iter().zip(&self[FEEDBACK_CHANNEL]) {
            let letters: String = guess.iter().map(|&c| decode(c).unwrap_or('.')).collect();
            let marks = feedback
                .iter()
                .map(|&c| Feedback::from_code(c).map_or(".".to_string(), |f| f.to_string()))
                .join("");
            writeln!(f, "{} {}", letters, marks)?;
        }
        Ok(())
    }
}

/// One play-through, from a reset until the next reset.
///
/// A new episode is created for every reset rather than cleared in place.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Episode {
    target: String,
    target_codes: Codes,
    step_count: usize,
    grid: Grid,
    total_reward: i64,
    last_guess: Option<String>,
}

impl Episode {
    /// Starts an episode with an empty grid and the given answer.
    pub fn new(target: impl Into<String>, target_codes: Codes) -> Self {
        Episode {
            target: target.into(),
            target_codes,
            step_count: 0,
            grid: Grid::new(),
            total_reward: 0,
            last_guess: None,
        }
    }

    /// Grades `guess` and writes it into the next free row.
    ///
    /// Returns the feedback and the row it was written to. The step count is
    /// not advanced; call [`advance()`](Self::advance()) once the reward for
    /// the row has been computed.
    ///
    /// # Panics
    ///
    /// Panics if all [`MAX_GUESSES`] rows are already written.
    pub(crate) fn record_guess(&mut self, word: &str, guess: &Codes) -> (usize, [Feedback; WORD_LEN]) {
        let row = self.step_count;
        let feedback = evaluate(guess, &self.target_codes);
        self.grid.write_row(row, guess, &feedback);
        self.last_guess = Some(word.to_string());
        (row, feedback)
    }

    pub(crate) fn advance(&mut self, reward: i64) {
        self.total_reward += reward;
        self.step_count += 1;
    }

    /// Returns true once the episode is over.
    ///
    /// An episode ends after [`MAX_GUESSES`] guesses or as soon as a written
    /// row is correct at every position. Unwritten rows never count as wins.
    pub fn is_done(&self) -> bool {
        self.step_count >= MAX_GUESSES
            || (0..self.step_count)
                .filter_map(|row| self.grid.feedback(row))
                .any(|row| is_win(&row))
    }

    /// Returns true if the episode ended with a correct guess.
    pub fn is_won(&self) -> bool {
        self.step_count
            .checked_sub(1)
            .and_then(|row| self.grid.feedback(row))
            .map_or(false, |row| is_win(&row))
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn target_codes(&self) -> &Codes {
        &self.target_codes
    }

    /// The number of guesses made so far.
    pub fn step_count(&self) -> usize {
        self.step_count
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// The sum of every reward given this episode.
    pub fn total_reward(&self) -> i64 {
        self.total_reward
    }

    pub fn last_guess(&self) -> Option<&str> {
        self.last_guess.as_deref()
    }
}
