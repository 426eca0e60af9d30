//! Deterministic RNG utilities for reproducible tests.

use nalgebra::Vector3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Create a deterministic `ChaCha8Rng` from a seed.
pub fn seeded_rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// `n` vectors with components uniform in `[-scale, scale)`.
pub fn random_vectors(n: usize, seed: u64, scale: f32) -> Vec<Vector3<f32>> {
    let mut rng = seeded_rng(seed);
    (0..n)
        .map(|_| {
            Vector3::new(
                rng.gen_range(-scale..scale),
                rng.gen_range(-scale..scale),
                rng.gen_range(-scale..scale),
            )
        })
        .collect()
}
