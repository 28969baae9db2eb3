//! Secret sequences and guess scoring.
//!
//! The server only generates the secret and hands it to both players;
//! scoring happens on each client. Both live here so the two sides agree
//! on what a symbol sequence is.

use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::Settings;

/// Produces the secret sequence shared by both players of a session.
///
/// Uniqueness across games is not required; implementations only need to
/// respect the sequence length and symbol alphabet in [`Settings`].
pub trait SecretGenerator: Send + Sync + 'static {
    /// Generates one secret of `settings.sequence_length()` symbols.
    fn generate(&self, settings: &Settings) -> Vec<String>;
}

/// Draws each symbol uniformly at random, repeats allowed.
#[derive(Debug, Default)]
pub struct RandomSecret {
    /// `None` uses the thread-local RNG.
    seeded: Option<Mutex<StdRng>>,
}

impl RandomSecret {
    /// A generator backed by the thread-local RNG.
    pub fn new() -> Self {
        Self::default()
    }

    /// A reproducible generator: the same seed yields the same secrets.
    pub fn seeded(seed: u64) -> Self {
        Self {
            seeded: Some(Mutex::new(StdRng::seed_from_u64(seed))),
        }
    }
}

fn draw(rng: &mut impl Rng, settings: &Settings) -> Vec<String> {
    let symbols = settings.symbols();
    (0..settings.sequence_length())
        .map(|_| symbols[rng.random_range(0..symbols.len())].clone())
        .collect()
}

impl SecretGenerator for RandomSecret {
    fn generate(&self, settings: &Settings) -> Vec<String> {
        match &self.seeded {
            Some(rng) => {
                let mut rng = rng.lock().unwrap_or_else(|e| e.into_inner());
                draw(&mut *rng, settings)
            }
            None => draw(&mut rand::rng(), settings),
        }
    }
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

/// How close a guess came to the secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Feedback {
    /// Right symbol in the right position.
    pub correct: usize,
    /// Right symbol in the wrong position.
    pub misplaced: usize,
}

impl fmt::Display for Feedback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Correct: {}, Misplaced: {}", self.correct, self.misplaced)
    }
}

/// Scores `guess` against `secret`.
///
/// Exact matches are counted first. Each remaining symbol counts as
/// misplaced at most as many times as it is left unmatched in both the
/// secret and the guess. Positions beyond the shorter sequence are ignored.
pub fn score_guess<S: AsRef<str>>(guess: &[S], secret: &[S]) -> Feedback {
    let mut correct = 0;
    let mut secret_left: HashMap<&str, usize> = HashMap::new();
    let mut guess_left: HashMap<&str, usize> = HashMap::new();

    for (g, s) in guess.iter().zip(secret) {
        let (g, s) = (g.as_ref(), s.as_ref());
        if g == s {
            correct += 1;
        } else {
            *secret_left.entry(s).or_default() += 1;
            *guess_left.entry(g).or_default() += 1;
        }
    }

    let misplaced = guess_left
        .iter()
        .map(|(symbol, n)| secret_left.get(symbol).map_or(0, |m| (*n).min(*m)))
        .sum();

    Feedback { correct, misplaced }
}
