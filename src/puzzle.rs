//! Letter codes and guess evaluation.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::WORD_LEN;

/// A word as the grid stores it: one code per letter, `a` = 1 through `z` = 26.
pub type Codes = [u8; WORD_LEN];

/// Encodes a five letter lowercase word into letter codes.
///
/// Returns `None` if `word` is the wrong length or contains anything but
/// lowercase ascii letters.
///
/// # Examples
///
/// ```rust
/// use wordle_gym::puzzle::encode;
///
/// assert_eq!(encode("apple"), Some([1, 16, 16, 12, 5]));
/// assert_eq!(encode("Apple"), None);
/// assert_eq!(encode("apples"), None);
/// ```
pub fn encode(word: &str) -> Option<Codes> {
    let bytes = word.as_bytes();
    if bytes.len() != WORD_LEN || !bytes.iter().all(u8::is_ascii_lowercase) {
        return None;
    }

    let mut codes = [0; WORD_LEN];
    for (code, b) in codes.iter_mut().zip(bytes) {
        *code = b - b'a' + 1;
    }
    Some(codes)
}

/// Turns a letter code back into its letter, or `None` for codes outside 1..=26.
pub fn decode(code: u8) -> Option<char> {
    (1..=26).contains(&code).then(|| (b'a' + code - 1) as char)
}

/// How a guessed letter relates to the answer.
///
/// The discriminants are the codes written into the feedback channel of the
/// grid, chosen so they never collide with letter codes.
#[derive(
    Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Hash, Serialize, Deserialize,
)]
#[repr(u8)]
pub enum Feedback {
    /// The letter does not appear anywhere in the answer.
    Absent = 27,

    /// The letter appears in the answer, but not at this position.
    Present = 28,

    /// The letter is at this position in the answer.
    Correct = 29,
}

impl Feedback {
    /// The largest code that can appear anywhere in a grid.
    pub const MAX_CODE: u8 = Feedback::Correct as u8;

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            27 => Some(Feedback::Absent),
            28 => Some(Feedback::Present),
            29 => Some(Feedback::Correct),
            _ => None,
        }
    }
}

impl Display for Feedback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let c = match self {
            Feedback::Absent => '-',
            Feedback::Present => 'y',
            Feedback::Correct => 'g',
        };
        write!(f, "{}", c)
    }
}

/// Grades `guess` against `target`, one [`Feedback`] per position.
///
/// A letter at the same position as in the target is [`Feedback::Correct`].
/// Otherwise it is [`Feedback::Present`] if it occurs anywhere in the
/// target. Occurrences are not consumed: guessing `spool` against `sober`
/// marks both `o`s as present, even though the answer holds only one `o`,
/// unlike the newspaper game.
///
/// # Examples
///
/// ```rust
/// use wordle_gym::puzzle::{encode, evaluate};
/// use wordle_gym::Feedback::*;
///
/// let target = encode("apple").unwrap();
/// let guess = encode("plane").unwrap();
/// assert_eq!(
///     evaluate(&guess, &target),
///     [Present, Present, Present, Absent, Correct]
/// );
/// ```
pub fn evaluate(guess: &Codes, target: &Codes) -> [Feedback; WORD_LEN] {
    let mut res = [Feedback::Absent; WORD_LEN];
    for (i, (g, t)) in guess.iter().zip(target).enumerate() {
        if g == t {
            res[i] = Feedback::Correct;
        } else if target.contains(g) {
            res[i] = Feedback::Present;
        }
    }
    res
}

/// Returns true when every position of a feedback row is correct.
pub fn is_win(row: &[Feedback]) -> bool {
    row.iter().all(|&f| f == Feedback::Correct)
}
