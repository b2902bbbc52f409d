//! Shuffled word pool for the guessing game.
//!
//! # Responsibility
//! - Hand out words from a fixed list in random order.
//! - Refill and reshuffle the list once every word has been used.
//!
//! # Invariants
//! - The pool is never empty between calls; `next_word` never returns `""`.
//! - Refills do not try to avoid repeating the word handed out last.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// The fixed game vocabulary.
pub const GAME_WORDS: [&str; 21] = [
    "queen",
    "hospital",
    "basketball",
    "cat",
    "change",
    "snail",
    "soup",
    "calendar",
    "sad",
    "desk",
    "guitar",
    "home",
    "railway",
    "zebra",
    "jelly",
    "car",
    "crow",
    "trade",
    "bag",
    "roll",
    "bubble",
];

/// Shuffled word source with automatic refill.
#[derive(Debug)]
pub struct WordPool {
    remaining: Vec<&'static str>,
    refills: u32,
    rng: StdRng,
}

impl WordPool {
    /// Creates a pool seeded from OS entropy.
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    /// Creates a pool with deterministic ordering for the given seed.
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(rng: StdRng) -> Self {
        let mut pool = Self {
            remaining: Vec::with_capacity(GAME_WORDS.len()),
            refills: 0,
            rng,
        };
        pool.reset();
        pool
    }

    /// Takes the next word and refills the pool when it runs dry.
    pub fn next_word(&mut self) -> &'static str {
        // `reset` always leaves the pool full, so `pop` only misses if the
        // vocabulary itself is empty.
        let word = self.remaining.pop().unwrap_or(GAME_WORDS[0]);
        if self.remaining.is_empty() {
            self.reset();
            self.refills += 1;
        }
        word
    }

    /// Words left before the next refill.
    pub fn remaining(&self) -> usize {
        self.remaining.len()
    }

    /// How many times the pool has been refilled since creation.
    pub fn refill_count(&self) -> u32 {
        self.refills
    }

    fn reset(&mut self) {
        self.remaining.clear();
        self.remaining.extend_from_slice(&GAME_WORDS);
        self.remaining.shuffle(&mut self.rng);
    }
}

impl Default for WordPool {
    fn default() -> Self {
        Self::new()
    }
}
