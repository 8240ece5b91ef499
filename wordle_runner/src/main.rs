use std::{fmt::Display, path::PathBuf, process::ExitCode, sync::Arc};

use clap::{Parser, Subcommand};
use env_logger::Builder;
use log::error;
use rand::{rngs::StdRng, Rng, RngCore, SeedableRng};
use wordle_gym::{
    Corpus, EnvConfig, Environment, Harness, Observation, Policy, Space, Verbosity, WordleEnv,
    WordleError,
};

#[derive(Parser)]
#[command(name = "wordle_runner")]
#[command(about = "Play and evaluate policies in the Wordle environment", version)]
struct Cli {
    /// Path to the JSON environment configuration
    #[arg(short, long)]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run many episodes and report reward statistics
    Evaluate {
        /// Number of episodes to run
        #[arg(short, long, default_value = "100")]
        episodes: usize,

        /// Show a progress bar and a table of every episode
        #[arg(short, long)]
        verbose: bool,
    },

    /// Play one episode, printing every guess
    Play,
}

/// Guesses uniformly at random.
struct Random;

impl Display for Random {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Random")
    }
}

impl Policy for Random {
    fn act(&self, _: &Observation, action_space: &Space, rng: &mut dyn RngCore) -> usize {
        match action_space {
            Space::Discrete { n } => rng.gen_range(0..*n),
            _ => 0,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match EnvConfig::from_path(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    log_builder(config.verbosity).parse_default_env().init();

    let res = match cli.command.unwrap_or(Commands::Play) {
        Commands::Evaluate { episodes, verbose } => evaluate(config, episodes, verbose),
        Commands::Play => play(config),
    };
    match res {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Lets through what the configured verbosity allows. `RUST_LOG` still
/// overrides it when parsed on top.
fn log_builder(verbosity: Verbosity) -> Builder {
    let mut builder = Builder::new();
    builder.filter_level(verbosity.level_filter());
    builder
}

/// Seeds the policy's choices from the configured seed, if there is one.
fn policy_rng(config: &EnvConfig) -> StdRng {
    match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

fn evaluate(config: EnvConfig, episodes: usize, verbose: bool) -> Result<(), WordleError> {
    let env = WordleEnv::new(&config)?;
    let corpus: Arc<Corpus> = env.corpus().clone();

    let harness = Harness::new(config).episodes(episodes);
    let harness = if verbose { harness.verbose() } else { harness };
    let record = harness.run(corpus, &Random)?;

    if verbose {
        record.print();
    } else {
        print!("{}", record.summary());
    }
    print!("{}", record.summary().histogram);
    Ok(())
}

fn play(config: EnvConfig) -> Result<(), WordleError> {
    let mut env = WordleEnv::new(&config)?;
    let mut rng = policy_rng(&config);
    let action_space = env.action_space();

    let mut observation = env.reset();
    loop {
        let action = Random.act(&observation, &action_space, &mut rng);
        let step = env.step(action)?;
        println!(
            "guess {}: {} (reward {})",
            env.episode().step_count(),
            &env.corpus()[action],
            step.reward
        );
        observation = step.observation;
        if step.done {
            break;
        }
    }

    println!("{}", env.episode().grid());
    env.render()
}

#[cfg(test)]
mod test {
    use wordle_gym::RewardConfig;

    use super::*;

    fn config() -> EnvConfig {
        let rewards = RewardConfig {
            win_reward: 100,
            right_letter_reward: 5,
            right_position_reward: 10,
            penalty: -20,
        };
        EnvConfig::new(rewards, "words.txt")
    }

    #[test]
    fn logging_follows_configured_verbosity() {
        for verbosity in [
            Verbosity::Debug,
            Verbosity::Info,
            Verbosity::Warning,
            Verbosity::Error,
        ] {
            let logger = log_builder(verbosity).build();
            assert_eq!(logger.filter(), verbosity.level_filter());
        }
    }

    #[test]
    fn seeded_play_repeats_its_guesses() {
        let config = config().seed(17);
        let space = Space::Discrete { n: 1000 };
        let observation = Observation::Flat(vec![0; 60]);

        let mut a = policy_rng(&config);
        let mut b = policy_rng(&config);
        let first: Vec<usize> = (0..6)
            .map(|_| Random.act(&observation, &space, &mut a))
            .collect();
        let second: Vec<usize> = (0..6)
            .map(|_| Random.act(&observation, &space, &mut b))
            .collect();
        assert_eq!(first, second);
    }
}
