use std::{
    fmt::Display,
    sync::{Mutex, Once},
};

use log::{LevelFilter, Log, Metadata, Record};
use rand::RngCore;

use crate::{
    harness::Policy,
    observation::{Observation, Space},
    words::Corpus,
    MAX_GUESSES, WORD_LEN,
};

/// Guesses a fixed list of words in order, one per written row.
///
/// Words missing from the corpus become out-of-range actions.
#[derive(Debug, Clone)]
pub(crate) struct Mock {
    guesses: Vec<&'static str>,
    actions: Vec<usize>,
}

impl Mock {
    pub(crate) fn new(corpus: &Corpus, guesses: Vec<&'static str>) -> Self {
        let actions = guesses
            .iter()
            .map(|word| corpus.position(word).unwrap_or(usize::MAX))
            .collect();
        Self { guesses, actions }
    }
}

impl Policy for Mock {
    fn act(&self, observation: &Observation, _: &Space, _: &mut dyn RngCore) -> usize {
        let written = observation.flatten()[..MAX_GUESSES * WORD_LEN]
            .chunks(WORD_LEN)
            .filter(|row| row.iter().any(|&c| c != 0))
            .count();
        self.actions[written % self.actions.len()]
    }
}

impl Display for Mock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Mock {:?}", self.guesses)
    }
}

/// Keeps every log record as `"<LEVEL> <message>"`.
struct Capture(Mutex<Vec<String>>);

impl Log for Capture {
    fn enabled(&self, _: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        self.0
            .lock()
            .unwrap()
            .push(format!("{} {}", record.level(), record.args()));
    }

    fn flush(&self) {}
}

static CAPTURE: Capture = Capture(Mutex::new(Vec::new()));

/// Installs a global logger that records everything and returns its records.
///
/// Tests run concurrently, so look for records that only one test can emit.
pub(crate) fn captured_logs() -> &'static Mutex<Vec<String>> {
    static INSTALL: Once = Once::new();
    INSTALL.call_once(|| {
        if log::set_logger(&CAPTURE).is_ok() {
            log::set_max_level(LevelFilter::Trace);
        }
    });
    &CAPTURE.0
}
