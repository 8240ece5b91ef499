//! The shapes an environment can report its grid in.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::{
    episode::{Episode, Grid, FEEDBACK_CHANNEL, GRID_LEN, GUESS_CHANNEL},
    puzzle::Feedback,
    CHANNELS, MAX_GUESSES, WORD_LEN,
};

/// Which shape observations take, fixed when the environment is built.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ObservationMode {
    /// The grid flattened into one vector of [`GRID_LEN`] codes.
    Flat,

    /// The grid together with achieved and desired goals, for
    /// goal-relabeling learners.
    Goal,

    /// The `(2, 6, 5)` grid as is.
    #[default]
    Grid,
}

impl ObservationMode {
    /// Projects the state of `episode` into this mode's shape.
    ///
    /// This only reads the episode.
    pub fn encode(self, episode: &Episode) -> Observation {
        let grid = *episode.grid();
        match self {
            ObservationMode::Flat => Observation::Flat(grid.flatten()),
            ObservationMode::Goal => Observation::Goal(GoalObservation {
                observation: grid,
                achieved_goal: grid,
                desired_goal: desired_goal(episode),
            }),
            ObservationMode::Grid => Observation::Grid(grid),
        }
    }

    /// Describes the observations this mode produces.
    pub fn space(self) -> Space {
        let grid = Space::grid();
        match self {
            ObservationMode::Flat => Space::Box {
                low: 0,
                high: Feedback::MAX_CODE,
                shape: vec![GRID_LEN],
            },
            ObservationMode::Goal => Space::Dict(vec![
                ("observation", grid.clone()),
                ("achieved_goal", grid.clone()),
                ("desired_goal", grid),
            ]),
            ObservationMode::Grid => grid,
        }
    }
}

impl Display for ObservationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ObservationMode::Flat => "FLAT",
            ObservationMode::Goal => "GOAL",
            ObservationMode::Grid => "GRID",
        };
        write!(f, "{}", name)
    }
}

/// The grid a win would produce at the current step.
///
/// The answer's letter codes fill the guess channel of the current row and
/// the feedback channel of that row is all [`Feedback::Correct`]. Every other
/// row is zero. Once all rows are used the goal stays on the last row.
pub fn desired_goal(episode: &Episode) -> Grid {
    let row = episode.step_count().min(MAX_GUESSES - 1);
    let mut cells = [[[0; WORD_LEN]; MAX_GUESSES]; CHANNELS];
    cells[GUESS_CHANNEL][row] = *episode.target_codes();
    cells[FEEDBACK_CHANNEL][row] = [Feedback::Correct.code(); WORD_LEN];
    Grid::from(cells)
}

/// The grid as seen by a goal-relabeling learner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GoalObservation {
    pub observation: Grid,
    pub achieved_goal: Grid,
    pub desired_goal: Grid,
}

/// An observation in one of the [`ObservationMode`] shapes.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Observation {
    Flat(Vec<u8>),
    Goal(GoalObservation),
    Grid(Grid),
}

impl Observation {
    /// The mode that produces observations of this shape.
    pub fn mode(&self) -> ObservationMode {
        match self {
            Observation::Flat(_) => ObservationMode::Flat,
            Observation::Goal(_) => ObservationMode::Goal,
            Observation::Grid(_) => ObservationMode::Grid,
        }
    }

    /// The current grid, flattened channel-major, then row-major.
    ///
    /// For goal observations this is the `observation` entry.
    pub fn flatten(&self) -> Vec<u8> {
        match self {
            Observation::Flat(v) => v.clone(),
            Observation::Goal(goal) => goal.observation.flatten(),
            Observation::Grid(grid) => grid.flatten(),
        }
    }
}

/// A description of valid actions or observations.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Space {
    /// Integers in `0..n`.
    Discrete { n: usize },

    /// Arrays of `shape` whose every entry lies in `low..=high`.
    Box {
        low: u8,
        high: u8,
        shape: Vec<usize>,
    },

    /// Named sub-spaces.
    Dict(Vec<(&'static str, Space)>),
}

impl Space {
    fn grid() -> Self {
        Space::Box {
            low: 0,
            high: Feedback::MAX_CODE,
            shape: vec![CHANNELS, MAX_GUESSES, WORD_LEN],
        }
    }

    /// The shape of a box space, or `None` for other spaces.
    pub fn shape(&self) -> Option<&[usize]> {
        match self {
            Space::Box { shape, .. } => Some(shape),
            _ => None,
        }
    }

    /// Returns true if `action` is a member of this discrete space.
    pub fn contains_action(&self, action: usize) -> bool {
        matches!(self, Space::Discrete { n } if action < *n)
    }

    /// Returns true if `obs` has this space's shape and bounds.
    pub fn contains(&self, obs: &Observation) -> bool {
        match (self, obs) {
            (Space::Box { shape, .. }, Observation::Flat(v)) => {
                shape.as_slice() == [v.len()] && self.bounds(v)
            }
            (Space::Box { shape, .. }, Observation::Grid(grid)) => {
                shape.as_slice() == [CHANNELS, MAX_GUESSES, WORD_LEN]
                    && self.bounds(&grid.flatten())
            }
            (Space::Dict(entries), Observation::Goal(goal)) => {
                entries.len() == 3
                    && entries.iter().all(|(name, space)| {
                        let grid = match *name {
                            "observation" => goal.observation,
                            "achieved_goal" => goal.achieved_goal,
                            "desired_goal" => goal.desired_goal,
                            _ => return false,
                        };
                        space.contains(&Observation::Grid(grid))
                    })
            }
            _ => false,
        }
    }

    fn bounds(&self, values: &[u8]) -> bool {
        match self {
            Space::Box { low, high, .. } => values.iter().all(|v| (low..=high).contains(&v)),
            _ => false,
        }
    }
}
