use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Seeded pseudo-random generator owned by a single sampler.
///
/// The draw sequence is fully determined by the seed; reseeding with the
/// same value replays it from the start.
#[derive(Debug, Clone)]
pub struct RandomSource {
    seed: u64,
    rng: SmallRng,
}

impl RandomSource {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Restart the generator from `seed`.
    pub fn reseed(&mut self, seed: u64) {
        self.seed = seed;
        self.rng = SmallRng::seed_from_u64(seed);
    }

    /// Seed of the current draw sequence
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Uniform draw in `[0, 1)`
    #[inline]
    pub fn uniform(&mut self) -> f64 {
        self.rng.random::<f64>()
    }

    /// Uniform integer in `0..n` (`n` must be positive)
    #[inline]
    pub fn index(&mut self, n: usize) -> usize {
        debug_assert!(n > 0);
        self.rng.random_range(0..n)
    }
}

impl Default for RandomSource {
    fn default() -> Self {
        Self::new(42)
    }
}
