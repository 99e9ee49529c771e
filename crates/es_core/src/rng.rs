// crates/es_core/src/rng.rs
//
// Deterministic RNG for a simulation run.
// Focus: stable seeding, unbiased integer ranges, word-index crumbs for ties.
//
// - One seed drives every draw of a run: electorate sampling, axis shuffles,
//   region draws, campaign drift and random tie-breaks.
// - Integer ranges use rejection sampling (no modulo bias).
// - `SimRng` implements `RngCore`, so `rand_distr` distributions sample from
//   it directly and every consumed word is counted.

use smol_str::SmolStr;

use serde::{Deserialize, Serialize};

use rand_chacha::ChaCha20Rng;
use rand_core::{Error as RandError, RngCore, SeedableRng};
use rand_distr::Distribution;

/// A single logged decision for a tie, including context and the RNG word index.
///
/// `word_index` is **1-based** and refers to the accepted word that decided
/// the pick (rejected draws are counted but not logged).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TieCrumb {
    /// Stable, human-readable context (e.g. "seat:7").
    pub ctx: SmolStr,
    /// Chosen index in the contender set (0-based).
    pub pick: usize,
    /// 1-based index of the deciding 64-bit word.
    pub word_index: u128,
}

/// Seeded ChaCha20 stream.
///
/// The `u64` seed maps to the 32-byte ChaCha seed as `seed.to_le_bytes()` in
/// the first 8 bytes, the rest zero.
#[derive(Debug, Clone)]
pub struct SimRng {
    rng: ChaCha20Rng,
    words_consumed: u128,
}

impl SimRng {
    #[inline]
    pub fn from_seed_u64(seed: u64) -> Self {
        let mut seed32 = [0u8; 32];
        seed32[..8].copy_from_slice(&seed.to_le_bytes());
        Self {
            rng: ChaCha20Rng::from_seed(seed32),
            words_consumed: 0,
        }
    }

    /// Total number of words drawn so far (saturating).
    #[inline]
    pub fn words_consumed(&self) -> u128 {
        self.words_consumed
    }

    #[inline]
    fn bump(&mut self, words: u128) {
        self.words_consumed = self.words_consumed.saturating_add(words);
    }

    /// Unbiased integer in `[0, n)`; `None` if `n == 0`.
    ///
    /// `threshold = 2^64 mod n`; accept `x >= threshold`, then `x % n` is uniform.
    #[inline]
    pub fn gen_range(&mut self, n: u64) -> Option<u64> {
        self.gen_range_with_index(n).map(|(v, _)| v)
    }

    /// Same as `gen_range`, also returning the 1-based index of the deciding word.
    pub fn gen_range_with_index(&mut self, n: u64) -> Option<(u64, u128)> {
        if n == 0 {
            return None;
        }
        let threshold = n.wrapping_neg() % n;
        loop {
            let x = self.next_u64();
            if x >= threshold {
                return Some((x % n, self.words_consumed));
            }
        }
    }

    /// Pick an index in `[0, n)` and return the crumb that records it.
    pub fn pick_index_with_crumb(&mut self, ctx: &str, n: usize) -> Option<(usize, TieCrumb)> {
        let (v, word_index) = self.gen_range_with_index(n as u64)?;
        let pick = v as usize;
        Some((
            pick,
            TieCrumb {
                ctx: SmolStr::new(ctx),
                pick,
                word_index,
            },
        ))
    }

    #[inline]
    pub fn choose_index(&mut self, n: usize) -> Option<usize> {
        self.gen_range(n as u64).map(|v| v as usize)
    }

    /// Fisher–Yates: for i in (1..len).rev() { j ~ U{0..=i}; swap(i, j) }.
    pub fn shuffle_in_place<T>(&mut self, slice: &mut [T]) {
        for i in (1..slice.len()).rev() {
            if let Some(j) = self.choose_index(i + 1) {
                slice.swap(i, j);
            }
        }
    }

    /// Uniform float in `[0, 1)` from the top 53 bits of one word.
    #[inline]
    pub fn next_unit_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Uniform float in `[lo, hi)`.
    #[inline]
    pub fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_unit_f64()
    }

    /// Draw one value from any `rand_distr` distribution over `f64`.
    #[inline]
    pub fn sample<D: Distribution<f64>>(&mut self, dist: &D) -> f64 {
        dist.sample(self)
    }
}

impl RngCore for SimRng {
    #[inline]
    fn next_u32(&mut self) -> u32 {
        self.bump(1);
        self.rng.next_u32()
    }

    #[inline]
    fn next_u64(&mut self) -> u64 {
        self.bump(1);
        self.rng.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.bump(dest.len().div_ceil(8) as u128);
        self.rng.fill_bytes(dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), RandError> {
        self.bump(dest.len().div_ceil(8) as u128);
        self.rng.try_fill_bytes(dest)
    }
}
