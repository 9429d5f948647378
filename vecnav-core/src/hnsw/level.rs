//! Random layer assignment for new nodes.
//!
//! Serial inserts draw from a single seeded generator so builds replay
//! exactly. Rayon workers draw from their own generators, derived from the
//! same seed with SplitMix64.

use std::sync::Mutex;

use rand::{Rng, SeedableRng, distributions::Standard, rngs::SmallRng};
use rayon::{current_num_threads, current_thread_index};

use super::error::HnswError;

/// SplitMix64 increment (the 64-bit golden ratio) used for per-worker seed
/// derivation.
const WORKER_SEED_SPACING: u64 = 0x9E37_79B9_7F4A_7C15;
const SPLITMIX_MULT_A: u64 = 0xBF58_476D_1CE4_E5B9;
const SPLITMIX_MULT_B: u64 = 0x94D0_49BB_1331_11EB;

#[inline]
fn mix_worker_seed(base_seed: u64, worker_index: usize) -> u64 {
    splitmix64(base_seed ^ ((worker_index as u64 + 1).wrapping_mul(WORKER_SEED_SPACING)))
}

#[inline]
fn splitmix64(mut state: u64) -> u64 {
    state = state.wrapping_add(WORKER_SEED_SPACING);
    state = (state ^ (state >> 30)).wrapping_mul(SPLITMIX_MULT_A);
    state = (state ^ (state >> 27)).wrapping_mul(SPLITMIX_MULT_B);
    state ^ (state >> 31)
}

/// Draws node levels from `floor(-ln(u) * mL)`.
#[derive(Debug)]
pub(crate) struct LevelSampler {
    multiplier: f64,
    max_level: usize,
    rng: Mutex<SmallRng>,
    worker_rngs: Vec<Mutex<SmallRng>>,
}

impl LevelSampler {
    pub(crate) fn new(seed: u64, multiplier: f64, max_level: usize) -> Self {
        let worker_rngs = (0..current_num_threads())
            .map(|idx| Mutex::new(SmallRng::seed_from_u64(mix_worker_seed(seed, idx))))
            .collect();
        Self {
            multiplier,
            max_level,
            rng: Mutex::new(SmallRng::seed_from_u64(seed)),
            worker_rngs,
        }
    }

    pub(crate) fn sample(&self) -> Result<usize, HnswError> {
        if let Some(index) = current_thread_index() {
            if let Some(rng) = self.worker_rngs.get(index) {
                let mut guard = rng
                    .lock()
                    .map_err(|_| HnswError::poisoned("worker rng mutex"))?;
                return Ok(self.sample_from(&mut guard));
            }
        }

        let mut rng = self
            .rng
            .lock()
            .map_err(|_| HnswError::poisoned("rng mutex"))?;
        Ok(self.sample_from(&mut rng))
    }

    pub(crate) fn sample_from(&self, rng: &mut SmallRng) -> usize {
        let mut draw: f64 = rng.sample(Standard);
        // `Standard` yields [0, 1); ln(0) is unbounded.
        while draw <= 0.0 {
            draw = rng.sample(Standard);
        }
        level_for_draw(draw, self.multiplier, self.max_level)
    }
}

/// Maps a uniform draw in `(0, 1)` to a level, capped at `max_level`.
pub(crate) fn level_for_draw(draw: f64, multiplier: f64, max_level: usize) -> usize {
    let raw = (-draw.ln() * multiplier).floor();
    if !raw.is_finite() || raw <= 0.0 {
        return 0;
    }
    if raw >= max_level as f64 {
        return max_level;
    }
    raw as usize
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(0.9, 0)]
    #[case(0.5, 0)]
    #[case(0.05, 1)]
    #[case(0.002, 2)]
    fn maps_draws_to_levels(#[case] draw: f64, #[case] expected: usize) {
        let multiplier = 16_f64.ln().recip();
        assert_eq!(level_for_draw(draw, multiplier, 16), expected);
    }

    #[test]
    fn caps_levels_at_max_level() {
        assert_eq!(level_for_draw(1.0e-300, 1.0, 4), 4);
    }

    #[test]
    fn equal_seeds_replay_levels() {
        let multiplier = 4_f64.ln().recip();
        let left = LevelSampler::new(42, multiplier, 16);
        let right = LevelSampler::new(42, multiplier, 16);
        let mut left_rng = SmallRng::seed_from_u64(42);
        let mut right_rng = SmallRng::seed_from_u64(42);
        let a: Vec<_> = (0..256).map(|_| left.sample_from(&mut left_rng)).collect();
        let b: Vec<_> = (0..256).map(|_| right.sample_from(&mut right_rng)).collect();
        assert_eq!(a, b);
        assert!(a.iter().any(|&level| level > 0), "expected some upper layers");
    }

    #[test]
    fn worker_seeds_differ() {
        assert_ne!(mix_worker_seed(7, 0), mix_worker_seed(7, 1));
    }
}
