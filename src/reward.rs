//! Reward shaping for a single guess.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{
    episode::{Grid, GUESS_CHANNEL},
    puzzle::{is_win, Feedback},
};

/// The reward magnitudes of an environment.
///
/// None of these have defaults; every one must be configured.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RewardConfig {
    /// Reward for guessing the answer on the first try. Later wins earn this
    /// divided by the number of guesses taken.
    #[serde(rename = "WIN_REWARD")]
    pub win_reward: i64,

    /// Reward for each distinct letter that is present at the wrong position.
    #[serde(rename = "RIGHT_LETTER_REWARD")]
    pub right_letter_reward: i64,

    /// Reward for each letter at the correct position.
    #[serde(rename = "RIGHT_POSITION_REWARD")]
    pub right_position_reward: i64,

    /// Reward for repeating the previous row's feedback.
    #[serde(rename = "PENALTY")]
    pub penalty: i64,
}

/// The reward for one guess, tagged with the rule that produced it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Scored {
    /// The feedback repeated the previous row, so the penalty applies.
    Repeat(i64),

    /// Every letter was correct.
    Win(i64),

    /// The sum of per-letter rewards.
    Letters(i64),
}

impl Scored {
    pub fn value(self) -> i64 {
        match self {
            Scored::Repeat(v) | Scored::Win(v) | Scored::Letters(v) => v,
        }
    }
}

impl RewardConfig {
    /// Scores the guess just written into `row` of `grid`.
    ///
    /// Rows before `row` must already be written and rows after it are
    /// ignored. The rules apply in order:
    ///
    /// 1. If the feedback equals the feedback of the row before it, the
    ///    reward is [`penalty`](Self::penalty). Only feedback is compared, so
    ///    two different words with the same feedback also count as a repeat.
    /// 2. If every letter is correct, the reward is
    ///    `win_reward / (row + 1)`, rounded half to even.
    /// 3. Otherwise each correct letter earns
    ///    [`right_position_reward`](Self::right_position_reward) and each
    ///    distinct letter that is present elsewhere earns
    ///    [`right_letter_reward`](Self::right_letter_reward) once.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use wordle_gym::{reward::Scored, Grid, RewardConfig};
    ///
    /// let rewards = RewardConfig {
    ///     win_reward: 100,
    ///     right_letter_reward: 5,
    ///     right_position_reward: 10,
    ///     penalty: -20,
    /// };
    ///
    /// // an unwritten row earns nothing
    /// assert_eq!(rewards.score(&Grid::new(), 0), Scored::Letters(0));
    /// ```
    pub fn score(&self, grid: &Grid, row: usize) -> Scored {
        let feedback = match grid.feedback(row) {
            Some(f) => f,
            None => return Scored::Letters(0),
        };

        if row > 0 && grid.feedback(row - 1) == Some(feedback) {
            return Scored::Repeat(self.penalty);
        }

        if is_win(&feedback) {
            return Scored::Win(self.win_bonus(row));
        }

        let mut used = HashSet::new();
        let reward = feedback
            .iter()
            .zip(&grid[GUESS_CHANNEL][row])
            .map(|(f, letter)| match f {
                Feedback::Correct => self.right_position_reward,
                Feedback::Present if used.insert(*letter) => self.right_letter_reward,
                Feedback::Present | Feedback::Absent => 0,
            })
            .sum();

        Scored::Letters(reward)
    }

    /// The reward for a win on the guess written into `row`.
    pub fn win_bonus(&self, row: usize) -> i64 {
        (self.win_reward as f64 / (row + 1) as f64).round_ties_even() as i64
    }
}
