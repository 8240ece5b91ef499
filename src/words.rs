//! The word corpus that supplies both actions and answers.

use std::{
    fs,
    ops::{Deref, Index},
    path::Path,
};

use rand::{seq::index::sample, Rng};

use crate::{
    puzzle::{encode, Codes},
    CorpusError, Result,
};

/// The number of words kept when a corpus is simplified.
pub const SIMPLIFIED_LEN: usize = 20;

/// An immutable, ordered list of five letter words.
///
/// The corpus is the action vocabulary of a [`WordleEnv`](crate::WordleEnv):
/// action `i` guesses `corpus[i]`. It is also the pool that answers are drawn
/// from. Once loaded it is never mutated, so it can be shared between
/// environments behind an [`Arc`](std::sync::Arc).
///
/// # Examples
///
/// ```rust
/// use wordle_gym::Corpus;
///
/// let corpus = Corpus::from_words(["apple", "plane", "crane"])?;
/// assert_eq!(corpus.len(), 3);
/// assert_eq!(&corpus[1], "plane");
///
/// assert!(Corpus::from_words(["apples"]).is_err());
/// #
/// # Ok::<_, wordle_gym::WordleError>(())
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Corpus {
    words: Vec<String>,
    codes: Vec<Codes>,
}

impl Corpus {
    /// Reads a newline-delimited word list from `path`.
    ///
    /// Lines are trimmed and blank lines are skipped. Every other line must
    /// be a five letter lowercase word. When `simplify` is true, only
    /// [`SIMPLIFIED_LEN`] words chosen uniformly at random with `rng` are
    /// kept, in file order.
    pub fn load<R: Rng + ?Sized>(
        path: impl AsRef<Path>,
        simplify: bool,
        rng: &mut R,
    ) -> Result<Self> {
        let path = path.as_ref();
        let contents =
            fs::read_to_string(path).map_err(|e| CorpusError::Io(path.to_path_buf(), e))?;

        let corpus = Self::parse(&contents)?;
        if corpus.is_empty() {
            return Err(CorpusError::Empty(path.to_path_buf()).into());
        }

        if simplify {
            Ok(corpus.simplify(rng))
        } else {
            Ok(corpus)
        }
    }

    /// Builds a corpus from words already in memory.
    ///
    /// Applies the same validation as [`load()`](Self::load()), except that
    /// an empty corpus is allowed here and rejected by the environment.
    pub fn from_words<S: AsRef<str>>(words: impl IntoIterator<Item = S>) -> Result<Self> {
        words
            .into_iter()
            .enumerate()
            .map(|(i, w)| validate(i + 1, w.as_ref().trim()))
            .collect::<Result<Corpus>>()
    }

    fn parse(contents: &str) -> Result<Self> {
        contents
            .lines()
            .enumerate()
            .map(|(i, line)| (i + 1, line.trim()))
            .filter(|(_, line)| !line.is_empty())
            .map(|(line, word)| validate(line, word))
            .collect::<Result<Corpus>>()
    }

    /// Keeps a uniform random subsample of at most [`SIMPLIFIED_LEN`] words.
    pub fn simplify<R: Rng + ?Sized>(&self, rng: &mut R) -> Self {
        let amount = SIMPLIFIED_LEN.min(self.words.len());
        let mut chosen = sample(rng, self.words.len(), amount).into_vec();
        chosen.sort_unstable();

        chosen
            .into_iter()
            .map(|i| (self.words[i].clone(), self.codes[i]))
            .collect()
    }

    /// Picks the index of one word uniformly at random.
    ///
    /// Returns `None` only when the corpus is empty.
    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<usize> {
        if self.words.is_empty() {
            None
        } else {
            Some(rng.gen_range(0..self.words.len()))
        }
    }

    /// The letter codes of the word at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds, like slice indexing.
    pub fn codes(&self, index: usize) -> Codes {
        self.codes[index]
    }

    /// Finds the action index of `word`, if it is in the corpus.
    pub fn position(&self, word: &str) -> Option<usize> {
        self.words.iter().position(|w| w == word)
    }
}

fn validate(line: usize, word: &str) -> Result<(String, Codes)> {
    encode(word)
        .map(|codes| (word.to_string(), codes))
        .ok_or_else(|| {
            CorpusError::MalformedWord {
                line,
                word: word.to_string(),
            }
            .into()
        })
}

impl FromIterator<(String, Codes)> for Corpus {
    fn from_iter<T: IntoIterator<Item = (String, Codes)>>(iter: T) -> Self {
        let (words, codes) = iter.into_iter().unzip();
        Corpus { words, codes }
    }
}

impl Deref for Corpus {
    type Target = [String];

    fn deref(&self) -> &Self::Target {
        &self.words
    }
}

impl Index<usize> for Corpus {
    type Output = str;

    fn index(&self, index: usize) -> &Self::Output {
        &self.words[index]
    }
}
