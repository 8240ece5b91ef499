//! A harness for evaluating a policy over many episodes.

use std::{fmt::Display, ops::Deref, sync::Arc};

#[cfg(feature = "parallel")]
use either::Either;
#[cfg(feature = "parallel")]
use indicatif::ParallelProgressIterator;
use rand::{rngs::StdRng, Rng, RngCore, SeedableRng};
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use crate::{
    config::EnvConfig,
    env::{EnvLogger, Environment, WordleEnv},
    observation::{Observation, Space},
    words::Corpus,
    HarnessError, Result, WordleError, MAX_GUESSES,
};

/// Something that picks actions for a [`WordleEnv`].
///
/// The harness formats policies with [`Display`] when reporting, so do not
/// use linebreaks there.
pub trait Policy: Display + Sync {
    /// Chooses an action from `action_space` after seeing `observation`.
    fn act(&self, observation: &Observation, action_space: &Space, rng: &mut dyn RngCore)
        -> usize;
}

/// Runs a policy over many episodes and records how it did.
///
/// Every episode plays in its own [`WordleEnv`], and all of them share one
/// [`Corpus`]. The configuration methods consume the harness and return a
/// new one.
///
/// # Examples
///
/// ```rust
/// # use std::{fmt::Display, sync::Arc};
/// # use rand::RngCore;
/// use wordle_gym::{Corpus, EnvConfig, Harness, Observation, Policy, RewardConfig, Space};
///
/// struct First;
///
/// impl Display for First {
///     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
///         write!(f, "First")
///     }
/// }
///
/// impl Policy for First {
///     fn act(&self, _: &Observation, _: &Space, _: &mut dyn RngCore) -> usize {
///         0
///     }
/// }
///
/// let rewards = RewardConfig {
///     win_reward: 100,
///     right_letter_reward: 5,
///     right_position_reward: 10,
///     penalty: -20,
/// };
/// let corpus = Arc::new(Corpus::from_words(["apple"])?);
/// let harness = Harness::new(EnvConfig::new(rewards, "words.txt"))
///     .quiet()
///     .episodes(5);
///
/// let record = harness.run(corpus, &First)?;
/// assert_eq!(record.summary().mean_reward, 100.);
/// #
/// # Ok::<_, wordle_gym::WordleError>(())
/// ```
#[derive(Clone, Debug)]
pub struct Harness {
    config: EnvConfig,
    verbose: bool,
    episodes: usize,
}

impl Harness {
    /// Creates a harness that builds environments from `config`.
    ///
    /// Defaults:
    /// 1. quiet mode
    /// 2. runs 10 episodes
    ///
    /// When `config` has a seed, every run of the harness plays the same
    /// answers.
    pub fn new(config: EnvConfig) -> Self {
        Harness {
            config,
            verbose: false,
            episodes: 10,
        }
    }

    /// Shows a progress bar while running.
    pub fn verbose(self) -> Self {
        Harness {
            verbose: true,
            ..self
        }
    }

    pub fn quiet(self) -> Self {
        Harness {
            verbose: false,
            ..self
        }
    }

    /// Sets the number of episodes to run.
    pub fn episodes(self, episodes: usize) -> Self {
        Harness { episodes, ..self }
    }

    /// Runs `policy` and records every episode, in order.
    pub fn run(&self, corpus: Arc<Corpus>, policy: &dyn Policy) -> Result<Record> {
        if self.episodes == 0 {
            return Err(HarnessError::NoEpisodes.into());
        }

        let base = match self.config.seed {
            Some(seed) => seed,
            None => rand::thread_rng().gen(),
        };
        let seeds: Vec<u64> = (0..self.episodes as u64)
            .map(|i| base.wrapping_add(i))
            .collect();

        #[cfg(feature = "parallel")]
        let outcomes = {
            let iter = seeds.par_iter();
            let iter = if self.verbose {
                Either::Left(iter.progress_count(self.episodes as u64))
            } else {
                Either::Right(iter)
            };
            iter.map(|&seed| self.run_episode(corpus.clone(), policy, seed))
                .collect::<Result<Vec<_>>>()?
        };

        #[cfg(not(feature = "parallel"))]
        let outcomes = seeds
            .iter()
            .map(|&seed| self.run_episode(corpus.clone(), policy, seed))
            .collect::<Result<Vec<_>>>()?;

        let record = Record {
            policy_name: policy.to_string(),
            outcomes,
        };
        let logger =
            EnvLogger::with_target("wordle_gym::harness", self.config.verbosity.level_filter());
        logger.info(format_args!(
            "evaluated {} over {} episodes",
            record.policy_name,
            record.len()
        ));
        Ok(record)
    }

    fn run_episode(&self, corpus: Arc<Corpus>, policy: &dyn Policy, seed: u64) -> Result<Outcome> {
        let mut env = WordleEnv::with_corpus(corpus, &self.config.clone().seed(seed))?;
        let mut rng = StdRng::seed_from_u64(seed.rotate_left(32));
        let action_space = env.action_space();

        let mut observation = env.reset();
        loop {
            let action = policy.act(&observation, &action_space, &mut rng);
            let step = env.step(action).map_err(|e| match e {
                WordleError::InvalidAction { .. } => {
                    HarnessError::PolicyFailed(policy.to_string()).into()
                }
                other => other,
            })?;
            observation = step.observation;
            if step.done {
                break;
            }
        }

        let episode = env.episode();
        Ok(Outcome {
            target: episode.target().to_string(),
            total_reward: episode.total_reward(),
            guesses: episode.step_count(),
            won: episode.is_won(),
        })
    }
}

/// The result of one evaluated episode.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Outcome {
    pub target: String,
    pub total_reward: i64,
    pub guesses: usize,
    pub won: bool,
}

impl Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.won {
            write!(f, "{} won in {}", self.target, self.guesses)?;
        } else {
            write!(f, "{} lost", self.target)?;
        }
        write!(f, ", total reward {}", self.total_reward)
    }
}

/// Every episode a [`Harness`] ran for one policy.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Record {
    policy_name: String,
    outcomes: Vec<Outcome>,
}

impl Deref for Record {
    type Target = [Outcome];

    fn deref(&self) -> &Self::Target {
        &self.outcomes
    }
}

impl Record {
    /// Gets the name of the policy that produced this record.
    pub fn policy_name(&self) -> &str {
        &self.policy_name
    }

    /// Computes aggregate statistics over every episode.
    pub fn summary(&self) -> Summary<'_> {
        let rewards: Vec<f64> = self.iter().map(|o| o.total_reward as f64).collect();
        let mut bins = [0; MAX_GUESSES];
        self.iter()
            .filter(|o| o.won)
            .for_each(|o| bins[o.guesses - 1] += 1);

        Summary {
            policy_name: &self.policy_name,
            num_episodes: self.len() as u32,
            num_won: bins.iter().sum(),
            mean_reward: rewards.iter().mean(),
            std_reward: rewards.iter().population_std_dev(),
            histogram: bins.into(),
        }
    }

    /// Prints the summary and then every episode, one per row.
    ///
    /// Lost episodes are marked in red.
    #[cfg(feature = "fancy")]
    pub fn print(&self) {
        use comfy_table::{presets::UTF8_FULL, Cell, CellAlignment, Color, Table};

        let mut table = Table::new();
        if table.is_tty() {
            table.load_preset(UTF8_FULL);
        }
        table.set_header(vec!["episode", "answer", "guesses", "total reward"]);
        for (i, outcome) in self.iter().enumerate() {
            let guesses = if outcome.won {
                Cell::new(outcome.guesses)
            } else {
                Cell::new("lost").fg(Color::Red)
            };
            table.add_row(vec![
                Cell::new(i + 1),
                Cell::new(&outcome.target),
                guesses,
                Cell::new(outcome.total_reward).set_alignment(CellAlignment::Right),
            ]);
        }

        print!("{}", self.summary());
        println!("{}", table);
    }

    /// Prints the summary and then every episode, one per line.
    #[cfg(not(feature = "fancy"))]
    pub fn print(&self) {
        print!("{}", self.summary());
        for (i, outcome) in self.iter().enumerate() {
            println!("{:>6}  {}", i + 1, outcome);
        }
    }
}

/// Aggregate statistics of a [`Record`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary<'a> {
    pub policy_name: &'a str,
    pub num_episodes: u32,
    pub num_won: u32,
    /// The mean total reward per episode.
    pub mean_reward: f64,
    /// The population standard deviation of total reward per episode.
    pub std_reward: f64,
    /// How many won episodes took each number of guesses.
    pub histogram: Histogram,
}

impl<'a> Summary<'a> {
    /// Gets the fraction of episodes that were won.
    pub fn frac_won(&self) -> f32 {
        (self.num_won as f32) / (self.num_episodes as f32)
    }

    /// Gets the average number of guesses in won episodes.
    pub fn mean_guesses(&self) -> f32 {
        let guesses: u32 = self
            .histogram
            .iter()
            .enumerate()
            .map(|(i, v)| (i as u32 + 1) * v)
            .sum();
        (guesses as f32) / (self.num_won as f32)
    }
}

impl<'a> Display for Summary<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{:-^80}", self.policy_name)?;
        writeln!(f, "Ran {} episodes", self.num_episodes)?;
        writeln!(
            f,
            "mean_reward={:.2} +/- {:.2}",
            self.mean_reward, self.std_reward
        )?;
        writeln!(
            f,
            "Won {}, or {:.1}%, and lost {}",
            self.num_won,
            self.frac_won() * 100.,
            self.num_episodes - self.num_won
        )?;
        if self.num_won > 0 {
            writeln!(
                f,
                "Wins took {:.2} guesses on average",
                self.mean_guesses()
            )?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Histogram {
    bins: [u32; MAX_GUESSES],
}

impl From<[u32; MAX_GUESSES]> for Histogram {
    fn from(other: [u32; MAX_GUESSES]) -> Self {
        Self { bins: other }
    }
}

impl Deref for Histogram {
    type Target = [u32; MAX_GUESSES];

    fn deref(&self) -> &Self::Target {
        &self.bins
    }
}

impl Histogram {
    /// The length of the bar drawn for the most common guess count.
    const BAR_WIDTH: usize = 50;
}

impl Display for Histogram {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let wins: u32 = self.iter().sum();
        let tallest = u64::from(self.iter().copied().max().unwrap_or(0).max(1));

        for (guesses, &count) in (1..).zip(self.iter()) {
            let len = u64::from(count) * Self::BAR_WIDTH as u64 / tallest;
            let bar = "■".repeat(len as usize);
            let share = if wins == 0 {
                0.
            } else {
                100. * count as f32 / wins as f32
            };
            writeln!(
                f,
                "won in {}: {:<width$} {} ({:.1}%)",
                guesses,
                bar,
                count,
                share,
                width = Self::BAR_WIDTH
            )?;
        }

        Ok(())
    }
}
