//! Projection sources: deterministic ternary generators.
//!
//! A projection column is a run of values in {-1, 0, +1} drawn from a source
//! seeded with the column's path hash. Following the sparse random projection
//! of Achlioptas (2003), values are drawn with odds:
//!
//! | value | odds |
//! |-------|------|
//! | +1    | 1/6  |
//! | -1    | 1/6  |
//! | 0     | 2/3  |
//!
//! Two interchangeable sources are provided:
//! - [`Lfsr32`]: a 32-bit Galois LFSR. Allocation-free and very fast.
//!   Seeded from the low 32 bits of the seed, falling back to the high bits
//!   and then to 1 when those are zero.
//! - [`PrngSource`]: a seeded ChaCha8 stream.

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Threshold below which an LFSR output maps to +1 (⌊2^32 / 6⌋).
pub const PLUS_ONE_THRESHOLD: u64 = (1u64 << 32) / 6;

/// Threshold below which an LFSR output maps to -1.
pub const MINUS_ONE_THRESHOLD: u64 = 2 * PLUS_ONE_THRESHOLD;

/// Maximal-period feedback polynomial for [`Lfsr32`].
pub const LFSR32_POLYNOMIAL: u32 = 0x8000_0057;

/// A deterministic generator of ternary projection values.
pub trait ProjectionSource {
    /// Create a source from a 64-bit seed. Same seed, same sequence.
    ///
    /// [`Lfsr32`] keeps only the low 32 bits of the seed as its register.
    /// When those are all zero it uses the high 32 bits instead, and 1 when
    /// the whole seed is zero, since a zero register never leaves zero.
    fn from_seed(seed: u64) -> Self
    where
        Self: Sized;

    /// Next value in {-1, 0, +1}.
    fn next_ternary(&mut self) -> i8;
}

/// 32-bit Galois linear-feedback shift register.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Lfsr32 {
    state: u32,
}

impl Lfsr32 {
    /// Create a register from the low 32 bits of `seed`.
    ///
    /// The all-zero state is a fixed point of the recurrence, so a seed
    /// with zero low bits falls back to its high bits, then to 1.
    pub fn new(seed: u64) -> Self {
        let mut state = seed as u32;
        if state == 0 {
            state = (seed >> 32) as u32;
        }
        if state == 0 {
            state = 1;
        }
        Self { state }
    }

    /// Current register state.
    pub fn state(&self) -> u32 {
        self.state
    }

    /// Advance the register and return the new state widened to 64 bits.
    #[inline]
    pub fn next_u64(&mut self) -> u64 {
        let s = self.state;
        self.state = (s >> 1) ^ ((s & 1).wrapping_neg() & LFSR32_POLYNOMIAL);
        self.state as u64
    }
}

impl ProjectionSource for Lfsr32 {
    fn from_seed(seed: u64) -> Self {
        Self::new(seed)
    }

    #[inline]
    fn next_ternary(&mut self) -> i8 {
        let r = self.next_u64();
        if r < PLUS_ONE_THRESHOLD {
            1
        } else if r < MINUS_ONE_THRESHOLD {
            -1
        } else {
            0
        }
    }
}

/// General-purpose seeded PRNG source (ChaCha8).
#[derive(Clone, Debug)]
pub struct PrngSource {
    rng: ChaCha8Rng,
}

impl ProjectionSource for PrngSource {
    fn from_seed(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    #[inline]
    fn next_ternary(&mut self) -> i8 {
        match self.rng.next_u64() % 6 {
            0 => 1,
            1 => -1,
            _ => 0,
        }
    }
}

/// Which projection source a vectorizer uses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// [`Lfsr32`]
    #[default]
    Lfsr,
    /// [`PrngSource`]
    Prng,
}

impl SourceKind {
    /// Build a fresh source of this kind for `seed`.
    pub fn generate(self, seed: u64) -> Source {
        match self {
            SourceKind::Lfsr => Source::Lfsr(Lfsr32::new(seed)),
            SourceKind::Prng => Source::Prng(PrngSource::from_seed(seed)),
        }
    }
}

/// A source of either kind, dispatched without boxing.
#[derive(Clone, Debug)]
pub enum Source {
    Lfsr(Lfsr32),
    Prng(PrngSource),
}

impl Source {
    /// Fill `column` with ternary values.
    pub fn fill(&mut self, column: &mut [i8]) {
        for v in column.iter_mut() {
            *v = self.next_ternary();
        }
    }
}

impl ProjectionSource for Source {
    fn from_seed(seed: u64) -> Self {
        SourceKind::default().generate(seed)
    }

    #[inline]
    fn next_ternary(&mut self) -> i8 {
        match self {
            Source::Lfsr(s) => s.next_ternary(),
            Source::Prng(s) => s.next_ternary(),
        }
    }
}
