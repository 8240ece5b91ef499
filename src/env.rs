//! The Wordle environment and the interface training drivers use.

use std::{
    fmt::{self, Display},
    io::Write,
    path::Path,
    sync::Arc,
};

use log::{Level, LevelFilter};
use rand::{rngs::StdRng, SeedableRng};
use serde_json::{Map, Value};

use crate::{
    config::EnvConfig,
    episode::Episode,
    observation::{Observation, ObservationMode, Space},
    puzzle::Feedback,
    reward::{RewardConfig, Scored},
    words::Corpus,
    CorpusError, Result, WordleError, MAX_GUESSES,
};

/// The result of one [`Environment::step()`].
#[derive(Clone, Debug, PartialEq)]
pub struct Step<O> {
    pub observation: O,
    pub reward: i64,
    pub done: bool,
    /// Always empty for [`WordleEnv`].
    pub info: Map<String, Value>,
}

/// A sequential decision environment.
///
/// Drivers call [`reset()`](Self::reset()) to start an episode and then
/// [`step()`](Self::step()) until it reports `done`.
pub trait Environment {
    type Observation;
    type Action;

    /// Describes the actions [`step()`](Self::step()) accepts.
    fn action_space(&self) -> Space;

    /// Describes the observations this environment returns.
    fn observation_space(&self) -> Space;

    /// Starts a new episode and returns its first observation.
    fn reset(&mut self) -> Self::Observation;

    /// Applies `action` to the current episode.
    fn step(&mut self, action: Self::Action) -> Result<Step<Self::Observation>>;

    /// Prints the state of the current episode for a human.
    fn render(&self) -> Result<()>;
}

/// Logging that only reaches the global logger when this instance's
/// verbosity allows it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct EnvLogger {
    target: &'static str,
    level: LevelFilter,
}

impl EnvLogger {
    pub(crate) fn new(level: LevelFilter) -> Self {
        Self::with_target("wordle_gym::env", level)
    }

    pub(crate) fn with_target(target: &'static str, level: LevelFilter) -> Self {
        EnvLogger { target, level }
    }

    pub(crate) fn enabled(&self, level: Level) -> bool {
        level <= self.level
    }

    pub(crate) fn log(&self, level: Level, args: fmt::Arguments) {
        if self.enabled(level) {
            log::log!(target: self.target, level, "{}", args);
        }
    }

    pub(crate) fn debug(&self, args: fmt::Arguments) {
        self.log(Level::Debug, args)
    }

    pub(crate) fn info(&self, args: fmt::Arguments) {
        self.log(Level::Info, args)
    }
}

/// A game of Wordle, played one guess at a time.
///
/// Action `i` guesses the `i`th word of the [`Corpus`]. Each step grades the
/// guess, writes it into the grid, scores it with the environment's
/// [`RewardConfig`], and reports the grid in the configured
/// [`ObservationMode`].
///
/// Several environments can share one corpus, for example to evaluate
/// episodes on different threads; see [`with_corpus()`](Self::with_corpus()).
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use wordle_gym::{Corpus, EnvConfig, Environment, RewardConfig, WordleEnv};
///
/// let rewards = RewardConfig {
///     win_reward: 100,
///     right_letter_reward: 5,
///     right_position_reward: 10,
///     penalty: -20,
/// };
/// let corpus = Arc::new(Corpus::from_words(["apple"])?);
/// let mut env = WordleEnv::with_corpus(corpus, &EnvConfig::new(rewards, "words.txt"))?;
///
/// env.reset();
/// let step = env.step(0)?;
/// assert_eq!(step.reward, 100);
/// assert!(step.done);
/// #
/// # Ok::<_, wordle_gym::WordleError>(())
/// ```
#[derive(Clone, Debug)]
pub struct WordleEnv {
    corpus: Arc<Corpus>,
    rewards: RewardConfig,
    mode: ObservationMode,
    episode: Episode,
    rng: StdRng,
    logger: EnvLogger,
}

impl WordleEnv {
    /// Builds an environment from a configuration, loading its word list.
    pub fn new(config: &EnvConfig) -> Result<Self> {
        let mut rng = Self::rng(config);
        let corpus = Corpus::load(&config.valid_words_path, config.simplify_corpus, &mut rng)?;
        let env = Self::build(Arc::new(corpus), config, rng)?;
        env.logger.info(format_args!(
            "loaded {} words from {}",
            env.corpus.len(),
            config.valid_words_path.display()
        ));
        Ok(env)
    }

    /// Builds an environment from a configuration document at `path`.
    pub fn from_config_path(path: impl AsRef<Path>) -> Result<Self> {
        Self::new(&EnvConfig::from_path(path)?)
    }

    /// Builds an environment that shares an already loaded corpus.
    ///
    /// The word list path and simplification settings of `config` are not
    /// used; `corpus` is taken as is. It must not be empty.
    pub fn with_corpus(corpus: Arc<Corpus>, config: &EnvConfig) -> Result<Self> {
        Self::build(corpus, config, Self::rng(config))
    }

    fn rng(config: &EnvConfig) -> StdRng {
        match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    fn build(corpus: Arc<Corpus>, config: &EnvConfig, mut rng: StdRng) -> Result<Self> {
        let episode = Self::draw_episode(&corpus, &mut rng)
            .ok_or_else(|| CorpusError::Empty(config.valid_words_path.clone()))?;
        let logger = EnvLogger::new(config.verbosity.level_filter());
        logger.info(format_args!(
            "built environment with {} words and {} observations",
            corpus.len(),
            config.observation_mode
        ));

        Ok(WordleEnv {
            corpus,
            rewards: config.rewards,
            mode: config.observation_mode,
            episode,
            rng,
            logger,
        })
    }

    fn draw_episode(corpus: &Corpus, rng: &mut StdRng) -> Option<Episode> {
        corpus
            .choose(rng)
            .map(|i| Episode::new(&corpus[i], corpus.codes(i)))
    }

    fn episode_for(corpus: &Corpus, target: &str) -> Result<Episode> {
        let index = corpus
            .position(target)
            .ok_or_else(|| WordleError::NotInCorpus(target.to_string()))?;
        Ok(Episode::new(target, corpus.codes(index)))
    }

    /// Starts a new episode whose answer is `target` instead of a random word.
    ///
    /// Returns an error if `target` is not in the corpus.
    pub fn reset_to(&mut self, target: &str) -> Result<Observation> {
        self.episode = Self::episode_for(&self.corpus, target)?;
        self.logger
            .debug(format_args!("reset with chosen answer {}", target));
        Ok(self.observe())
    }

    /// Encodes the current episode without changing it.
    pub fn observe(&self) -> Observation {
        self.mode.encode(&self.episode)
    }

    pub fn corpus(&self) -> &Arc<Corpus> {
        &self.corpus
    }

    pub fn episode(&self) -> &Episode {
        &self.episode
    }

    pub fn mode(&self) -> ObservationMode {
        self.mode
    }

    pub fn rewards(&self) -> &RewardConfig {
        &self.rewards
    }

    /// Writes the output of [`render()`](Environment::render()) to `out`.
    ///
    /// This is the [`Display`] form, with the last guess and the grid
    /// colored by feedback when the `fancy` feature is on.
    pub fn render_to(&self, out: &mut impl Write) -> Result<()> {
        let mut report = String::new();
        self.report(&mut report, true)
            .map_err(|_| std::io::Error::other("could not format the episode"))?;
        out.write_all(report.as_bytes())?;
        Ok(())
    }

    /// Writes the answer once the episode is over, the last guess, the total
    /// reward, and the final grid.
    fn report(&self, f: &mut impl fmt::Write, styled: bool) -> fmt::Result {
        let episode = &self.episode;
        if episode.is_done() {
            writeln!(f, "Correct word: {}", episode.target())?;
        }
        let guess = if styled {
            self.last_guess_display()
        } else {
            episode.last_guess().unwrap_or_default().to_string()
        };
        writeln!(f, "Guessed word: {}", guess)?;
        writeln!(f, "Total reward: {}", episode.total_reward())?;
        if episode.is_done() {
            let grid = if styled {
                self.grid_display()
            } else {
                episode.grid().to_string()
            };
            write!(f, "{}", grid)?;
        }
        Ok(())
    }

    #[cfg(feature = "fancy")]
    fn last_guess_display(&self) -> String {
        use owo_colors::{AnsiColors, OwoColorize, Stream};

        let (guess, feedback) = match self.last_guess() {
            Some(last) => last,
            None => return String::new(),
        };
        guess
            .chars()
            .zip(feedback)
            .map(|(c, f)| {
                let color = match f {
                    Feedback::Correct => AnsiColors::Green,
                    Feedback::Present => AnsiColors::Yellow,
                    Feedback::Absent => AnsiColors::BrightBlack,
                };
                c.if_supports_color(Stream::Stdout, |text| text.color(color))
                    .to_string()
            })
            .collect()
    }

    #[cfg(not(feature = "fancy"))]
    fn last_guess_display(&self) -> String {
        self.episode.last_guess().unwrap_or_default().to_string()
    }

    fn last_guess(&self) -> Option<(&str, [Feedback; crate::WORD_LEN])> {
        let row = self.episode.step_count().checked_sub(1)?;
        let feedback = self.episode.grid().feedback(row)?;
        Some((self.episode.last_guess()?, feedback))
    }

    #[cfg(feature = "fancy")]
    fn grid_display(&self) -> String {
        use comfy_table::{Cell, Color, Row, Table};

        use crate::{
            episode::{FEEDBACK_CHANNEL, GUESS_CHANNEL},
            puzzle::decode,
        };

        let grid = self.episode.grid();
        let mut table = Table::new();
        if table.is_tty() {
            table.load_preset(comfy_table::presets::UTF8_FULL);
        }
        for (guess, feedback) in grid[GUESS_CHANNEL].iter().zip(&grid[FEEDBACK_CHANNEL]) {
            let mut row = Row::new();
            for (&letter, &code) in guess.iter().zip(feedback) {
                let mut cell = Cell::new(decode(letter).unwrap_or(' '));
                match Feedback::from_code(code) {
                    Some(Feedback::Correct) => cell = cell.bg(Color::Green).fg(Color::Black),
                    Some(Feedback::Present) => cell = cell.bg(Color::Yellow).fg(Color::Black),
                    _ => {}
                }
                row.add_cell(cell);
            }
            table.add_row(row);
        }
        format!("{}\n", table)
    }

    #[cfg(not(feature = "fancy"))]
    fn grid_display(&self) -> String {
        self.episode.grid().to_string()
    }
}

impl Environment for WordleEnv {
    type Observation = Observation;
    type Action = usize;

    fn action_space(&self) -> Space {
        Space::Discrete {
            n: self.corpus.len(),
        }
    }

    fn observation_space(&self) -> Space {
        self.mode.space()
    }

    fn reset(&mut self) -> Observation {
        // the corpus of a built environment is never empty
        if let Some(episode) = Self::draw_episode(&self.corpus, &mut self.rng) {
            self.episode = episode;
        }
        self.logger
            .debug(format_args!("reset with answer {}", self.episode.target()));
        self.observe()
    }

    /// Guesses the word at index `action` of the corpus.
    ///
    /// Returns [`WordleError::InvalidAction`] if `action` is outside the
    /// corpus and [`WordleError::OutOfGuesses`] if the grid is already full.
    /// In both cases the episode is left untouched.
    fn step(&mut self, action: usize) -> Result<Step<Observation>> {
        if action >= self.corpus.len() {
            return Err(WordleError::InvalidAction {
                action,
                vocabulary: self.corpus.len(),
            });
        }
        if self.episode.step_count() >= MAX_GUESSES {
            return Err(WordleError::OutOfGuesses);
        }

        let word = &self.corpus[action];
        let (row, feedback) = self.episode.record_guess(word, &self.corpus.codes(action));
        let scored = self.rewards.score(self.episode.grid(), row);
        if let Scored::Repeat(penalty) = scored {
            self.logger.debug(format_args!(
                "guess {} repeated the previous feedback, penalty {}",
                word, penalty
            ));
        }

        let reward = scored.value();
        self.episode.advance(reward);
        let done = self.episode.is_done();

        if self.logger.enabled(Level::Debug) {
            let marks: String = feedback.iter().map(Feedback::to_string).collect();
            self.logger.debug(format_args!(
                "guess {} of {}: {} {} reward {}",
                row + 1,
                MAX_GUESSES,
                word,
                marks,
                reward
            ));
        }
        if done {
            self.logger.info(format_args!(
                "episode over after {} guesses, answer {}, {}, total reward {}",
                self.episode.step_count(),
                self.episode.target(),
                if self.episode.is_won() { "won" } else { "lost" },
                self.episode.total_reward()
            ));
        }

        Ok(Step {
            observation: self.observe(),
            reward,
            done,
            info: Map::new(),
        })
    }

    fn render(&self) -> Result<()> {
        let stdout = std::io::stdout();
        let mut lock = stdout.lock();
        self.render_to(&mut lock)
    }
}

impl Display for WordleEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.report(f, false)
    }
}

#[cfg(test)]
mod test {
    use tempfile::NamedTempFile;

    use super::*;
    use crate::{
        episode::{FEEDBACK_CHANNEL, GUESS_CHANNEL},
        mock::captured_logs,
        puzzle::encode,
        Grid, Verbosity, WORD_LEN,
    };

    const REWARDS: RewardConfig = RewardConfig {
        win_reward: 100,
        right_letter_reward: 5,
        right_position_reward: 10,
        penalty: -20,
    };

    const WORDS: [&str; 5] = ["apple", "plane", "xxxxx", "zzzzz", "crane"];

    fn env(mode: ObservationMode) -> WordleEnv {
        let corpus = Arc::new(Corpus::from_words(WORDS).unwrap());
        let config = EnvConfig::new(REWARDS, "words.txt").mode(mode).seed(9);
        WordleEnv::with_corpus(corpus, &config).unwrap()
    }

    fn action(word: &str) -> usize {
        WORDS.iter().position(|w| *w == word).unwrap()
    }

    fn word_file() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        for word in WORDS {
            writeln!(file, "{}", word).unwrap();
        }
        file
    }

    #[test]
    fn reset_clears_the_episode() {
        let mut env = env(ObservationMode::Grid);
        env.reset_to("apple").unwrap();
        env.step(action("plane")).unwrap();

        let obs = env.reset();
        assert_eq!(obs, Observation::Grid(Grid::new()));
        assert_eq!(env.episode().step_count(), 0);
        assert_eq!(env.episode().total_reward(), 0);
        assert!(WORDS.contains(&env.episode().target()));
    }

    #[test]
    fn reset_draws_every_word_eventually() {
        let mut env = env(ObservationMode::Grid);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..200 {
            env.reset();
            seen.insert(env.episode().target().to_string());
        }
        assert_eq!(seen.len(), WORDS.len());
    }

    #[test]
    fn first_guess_win() {
        let mut env = env(ObservationMode::Grid);
        env.reset_to("apple").unwrap();
        let step = env.step(action("apple")).unwrap();

        assert_eq!(step.reward, 100);
        assert!(step.done);
        assert!(step.info.is_empty());
        match step.observation {
            Observation::Grid(grid) => assert_eq!(grid[FEEDBACK_CHANNEL][0], [29; WORD_LEN]),
            other => panic!("expected a grid, got {:?}", other),
        }
    }

    #[test]
    fn miss_is_not_done() {
        let mut env = env(ObservationMode::Grid);
        env.reset_to("apple").unwrap();
        let step = env.step(action("xxxxx")).unwrap();

        assert_eq!(step.reward, 0);
        assert!(!step.done);
        assert_eq!(env.episode().grid()[FEEDBACK_CHANNEL][0], [27; WORD_LEN]);
    }

    #[test]
    fn six_misses_end_the_episode() {
        let mut env = env(ObservationMode::Grid);
        env.reset_to("apple").unwrap();

        let guesses = ["plane", "xxxxx", "crane", "zzzzz", "plane", "xxxxx"];
        for (i, guess) in guesses.iter().enumerate() {
            let step = env.step(action(guess)).unwrap();
            assert_eq!(step.done, i == MAX_GUESSES - 1);
        }
        assert_eq!(env.episode().step_count(), MAX_GUESSES);

        assert!(matches!(
            env.step(action("apple")),
            Err(WordleError::OutOfGuesses)
        ));
        assert_eq!(env.episode().step_count(), MAX_GUESSES);
    }

    #[test]
    fn later_win_is_scaled() {
        let mut env = env(ObservationMode::Grid);
        env.reset_to("apple").unwrap();
        env.step(action("xxxxx")).unwrap();
        env.step(action("plane")).unwrap();
        let step = env.step(action("apple")).unwrap();

        assert!(step.done);
        assert_eq!(step.reward, 33);
        assert_eq!(env.episode().total_reward(), 25 + 33);
    }

    #[test]
    fn identical_feedback_is_penalized() {
        let mut env = env(ObservationMode::Grid);
        env.reset_to("apple").unwrap();
        env.step(action("xxxxx")).unwrap();
        let step = env.step(action("zzzzz")).unwrap();

        assert_eq!(step.reward, -20);
        assert!(!step.done);
    }

    #[test]
    fn invalid_action_leaves_episode_alone() {
        let mut env = env(ObservationMode::Grid);
        env.reset_to("apple").unwrap();
        let before = env.episode().clone();

        match env.step(WORDS.len()) {
            Err(WordleError::InvalidAction { action, vocabulary }) => {
                assert_eq!(action, WORDS.len());
                assert_eq!(vocabulary, WORDS.len());
            }
            other => panic!("expected an invalid action, got {:?}", other),
        }
        assert_eq!(env.episode(), &before);
    }

    #[test]
    fn unknown_target_is_rejected() {
        let mut env = env(ObservationMode::Grid);
        assert!(matches!(
            env.reset_to("grape"),
            Err(WordleError::NotInCorpus(word)) if word == "grape"
        ));
    }

    #[test]
    fn flat_matches_flattened_grid() {
        let mut grid_env = env(ObservationMode::Grid);
        let mut flat_env = env(ObservationMode::Flat);
        grid_env.reset_to("crane").unwrap();
        flat_env.reset_to("crane").unwrap();

        for guess in ["plane", "apple", "crane"] {
            let grid = grid_env.step(action(guess)).unwrap();
            let flat = flat_env.step(action(guess)).unwrap();

            assert_eq!(grid.reward, flat.reward);
            assert_eq!(grid.done, flat.done);
            assert_eq!(Observation::Flat(grid.observation.flatten()), flat.observation);
        }
    }

    #[test]
    fn goal_mode_wants_a_win_on_the_next_row() {
        let mut env = env(ObservationMode::Goal);
        env.reset_to("crane").unwrap();
        let step = env.step(action("plane")).unwrap();

        let goal = match step.observation {
            Observation::Goal(goal) => goal,
            other => panic!("expected a goal observation, got {:?}", other),
        };
        assert_eq!(goal.observation, *env.episode().grid());
        assert_eq!(goal.achieved_goal, goal.observation);
        assert_eq!(goal.desired_goal[GUESS_CHANNEL][1], encode("crane").unwrap());
        assert_eq!(goal.desired_goal[FEEDBACK_CHANNEL][1], [29; WORD_LEN]);
        assert_eq!(goal.desired_goal[GUESS_CHANNEL][0], [0; WORD_LEN]);
    }

    #[test]
    fn spaces() {
        let env = env(ObservationMode::Grid);
        assert_eq!(env.action_space(), Space::Discrete { n: WORDS.len() });
        assert_eq!(env.observation_space().shape(), Some(&[2, 6, 5][..]));
        assert!(env.observation_space().contains(&env.observe()));
    }

    #[test]
    fn seeded_environments_agree() {
        let mut a = env(ObservationMode::Grid);
        let mut b = env(ObservationMode::Grid);
        for _ in 0..20 {
            a.reset();
            b.reset();
            assert_eq!(a.episode().target(), b.episode().target());
        }
    }

    #[test]
    fn empty_corpus_is_rejected() {
        let corpus = Arc::new(Corpus::from_words(Vec::<&str>::new()).unwrap());
        let config = EnvConfig::new(REWARDS, "words.txt");
        assert!(matches!(
            WordleEnv::with_corpus(corpus, &config),
            Err(WordleError::Corpus {
                kind: CorpusError::Empty(_)
            })
        ));
    }

    #[test]
    fn builds_from_config_document() {
        let mut words = NamedTempFile::new().unwrap();
        for i in 0..30_u8 {
            writeln!(words, "{}bcde", (b'a' + i % 26) as char).unwrap();
            writeln!(words, "x{}yzz", (b'a' + i % 26) as char).unwrap();
        }

        let mut config = NamedTempFile::new().unwrap();
        write!(
            config,
            r#"{{
                "rl_env": {{
                    "WIN_REWARD": 100,
                    "RIGHT_LETTER_REWARD": 5,
                    "RIGHT_POSITION_REWARD": 10,
                    "PENALTY": -20,
                    "VERBOSITY": "DEBUG",
                    "SIMPLIFY_CORPUS": true,
                    "OBSERVATION_MODE": "FLAT",
                    "SEED": 1
                }},
                "word_file_paths": {{ "valid_words_file_path": {:?} }}
            }}"#,
            words.path()
        )
        .unwrap();

        let mut env = WordleEnv::from_config_path(config.path()).unwrap();
        assert_eq!(env.corpus().len(), crate::words::SIMPLIFIED_LEN);
        assert_eq!(env.mode(), ObservationMode::Flat);
        assert!(env.logger.enabled(Level::Debug));
        assert_eq!(env.reset(), Observation::Flat(vec![0; crate::episode::GRID_LEN]));
    }

    #[test]
    fn logger_respects_verbosity() {
        let logger = EnvLogger::new(LevelFilter::Warn);
        assert!(logger.enabled(Level::Error));
        assert!(logger.enabled(Level::Warn));
        assert!(!logger.enabled(Level::Info));
        assert!(!logger.enabled(Level::Debug));
    }

    #[test]
    fn corpus_load_is_logged_per_instance() {
        let records = captured_logs();
        let quiet_words = word_file();
        let loud_words = word_file();

        WordleEnv::new(&EnvConfig::new(REWARDS, quiet_words.path()).verbosity(Verbosity::Error))
            .unwrap();
        WordleEnv::new(&EnvConfig::new(REWARDS, loud_words.path()).verbosity(Verbosity::Info))
            .unwrap();

        let records = records.lock().unwrap();
        let mentions = |file: &NamedTempFile| {
            let path = file.path().display().to_string();
            records.iter().filter(|r| r.contains(&path)).count()
        };
        assert_eq!(mentions(&quiet_words), 0);
        assert_eq!(mentions(&loud_words), 1);
        let loud_path = loud_words.path().display().to_string();
        assert!(records
            .iter()
            .any(|r| r.starts_with("INFO loaded 5 words") && r.contains(&loud_path)));
    }

    #[test]
    fn render_reveals_answer_once_done() {
        let mut env = env(ObservationMode::Grid);
        env.reset_to("apple").unwrap();
        env.step(action("plane")).unwrap();

        let shown = env.to_string();
        assert!(!shown.contains("Correct word"));
        assert!(shown.contains("Guessed word: plane"));
        assert!(shown.contains("Total reward: 25"));

        assert_eq!(shown.lines().count(), 2);

        env.step(action("apple")).unwrap();
        let mut out = Vec::new();
        env.render_to(&mut out).unwrap();
        let rendered = String::from_utf8(out).unwrap();
        assert!(rendered.contains("Correct word: apple"));
        assert!(rendered.contains("Total reward: 75"));

        let shown = env.to_string();
        assert!(shown.starts_with("Correct word: apple\nGuessed word: apple\nTotal reward: 75\n"));
        assert!(shown.ends_with(&env.episode().grid().to_string()));
    }
}
