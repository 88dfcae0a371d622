//! Deterministic random number generation
//!
//! The whole run shares one ChaCha stream, seeded once from the scenario
//! seed and handed explicitly to every consumer.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// The single random stream used by seeding and by every system.
pub type SimRng = ChaCha8Rng;

pub fn seeded(seed: u64) -> SimRng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// Helper functions for common random operations
pub trait RngExt {
    /// Uniform draw in `[0, 1)`.
    fn unit(&mut self) -> f64;
    /// True with the given probability. Never true for `p <= 0`.
    fn chance(&mut self, probability: f64) -> bool;
}

impl<R: Rng> RngExt for R {
    fn unit(&mut self) -> f64 {
        self.gen::<f64>()
    }

    fn chance(&mut self, probability: f64) -> bool {
        self.gen::<f64>() < probability
    }
}

/// Walk a cumulative distribution and return the first bucket whose mass
/// exceeds `roll`. The last bucket absorbs floating-point overflow.
///
/// Panics on an empty table.
pub fn weighted_pick<T: Copy>(table: &[(T, f64)], roll: f64) -> T {
    let mut cumulative = 0.0;
    for &(value, mass) in table {
        cumulative += mass;
        if roll < cumulative {
            return value;
        }
    }
    table[table.len() - 1].0
}

/// Threshold selection used by world seeding: the first entry whose running
/// total reaches `roll` wins, and a roll past the total selects nothing.
pub fn threshold_pick<T: Copy>(table: &[(T, f64)], roll: f64) -> Option<T> {
    let mut cumulative = 0.0;
    for &(value, probability) in table {
        cumulative += probability;
        if roll <= cumulative {
            return Some(value);
        }
    }
    None
}
