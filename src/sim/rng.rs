//! Seeded random source shared by every modifier
//!
//! One generator per game manager. Subsystems borrow it mutably for the
//! duration of a single call so draws happen in a fixed order each tick.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

/// Process-wide game RNG (PCG32, seedable for replay and tests)
#[derive(Debug, Clone)]
pub struct GameRng {
    seed: u64,
    inner: Pcg32,
}

impl GameRng {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            inner: Pcg32::seed_from_u64(seed),
        }
    }

    /// Seed this generator was created with
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Uniform float in [0, 1)
    pub fn next_f32(&mut self) -> f32 {
        self.inner.random::<f32>()
    }

    /// Uniform float in [min, max)
    pub fn range_f32(&mut self, min: f32, max: f32) -> f32 {
        if max <= min {
            return min;
        }
        self.inner.random_range(min..max)
    }

    /// Uniform index in [0, len). `len` must be non-zero.
    pub fn index(&mut self, len: usize) -> usize {
        self.inner.random_range(0..len)
    }

    /// Coin flip
    pub fn chance(&mut self, probability: f32) -> bool {
        self.next_f32() < probability
    }

    /// Cumulative-weight walk over `(item, weight)` pairs.
    ///
    /// `pick = r * total`; each weight is subtracted in turn and the first one
    /// that drives the remainder to `<= 0` wins. Rounding can exhaust the
    /// table with a sliver left over, in which case `fallback` is returned.
    pub fn weighted_pick<T: Copy>(&mut self, table: &[(T, f32)], fallback: T) -> T {
        let roll = self.next_f32();
        weighted_walk(table, roll, fallback)
    }
}

/// Deterministic half of [`GameRng::weighted_pick`], given the unit roll
pub fn weighted_walk<T: Copy>(table: &[(T, f32)], roll: f32, fallback: T) -> T {
    let total: f32 = table.iter().map(|(_, w)| w.max(0.0)).sum();
    if total <= 0.0 {
        return fallback;
    }

    let mut remainder = roll * total;
    for &(item, weight) in table {
        let weight = weight.max(0.0);
        if weight == 0.0 {
            continue;
        }
        remainder -= weight;
        if remainder <= 0.0 {
            return item;
        }
    }
    fallback
}
