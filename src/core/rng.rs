//! Deterministic random number generation.
//!
//! The only sampled outcomes in the engine are accuracy and critical
//! rolls. Both use a seeded ChaCha8 stream so a battle replays
//! identically from the same seed, and the stream position is
//! serializable for O(1) checkpointing.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Deterministic RNG for accuracy and critical rolls.
#[derive(Clone, Debug)]
pub struct BattleRng {
    inner: ChaCha8Rng,
    seed: u64,
}

impl BattleRng {
    /// Create a new RNG with the given seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    /// Roll a chance in `[0, 1]`.
    ///
    /// `p >= 1` succeeds and `p <= 0` fails without consuming the
    /// stream, so certain outcomes never perturb replay determinism.
    pub fn roll(&mut self, p: f64) -> bool {
        if p >= 1.0 {
            return true;
        }
        if p <= 0.0 {
            return false;
        }
        self.inner.gen_bool(p)
    }

    /// Get the current state for serialization.
    #[must_use]
    pub fn state(&self) -> BattleRngState {
        BattleRngState {
            seed: self.seed,
            word_pos: self.inner.get_word_pos(),
        }
    }

    /// Restore from a saved state.
    #[must_use]
    pub fn from_state(state: &BattleRngState) -> Self {
        let mut inner = ChaCha8Rng::seed_from_u64(state.seed);
        inner.set_word_pos(state.word_pos);
        Self {
            inner,
            seed: state.seed,
        }
    }
}

/// Serializable RNG state for checkpointing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleRngState {
    /// Original seed.
    pub seed: u64,
    /// ChaCha8 word position (128-bit counter).
    pub word_pos: u128,
}
