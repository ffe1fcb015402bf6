//! Injectable randomness.
//!
//! Every stochastic step of the simulation draws from a `RandomSource`, so a
//! run can use OS entropy, a fixed seed, or a scripted sequence in tests.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of uniform samples in `[0, 1)`.
pub trait RandomSource: Send {
    fn next_f32(&mut self) -> f32;

    /// Uniform sample in `[lo, hi)`.
    fn range(&mut self, lo: f32, hi: f32) -> f32 {
        lo + (hi - lo) * self.next_f32()
    }

    /// Symmetric perturbation in `[-amplitude, amplitude)`.
    fn symmetric(&mut self, amplitude: f32) -> f32 {
        (self.next_f32() - 0.5) * 2.0 * amplitude
    }

    /// Uniform index in `0..len`. Returns 0 for an empty range.
    fn index(&mut self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        ((self.next_f32() * len as f32) as usize).min(len - 1)
    }

    /// True with probability `p`.
    fn chance(&mut self, p: f32) -> bool {
        self.next_f32() < p
    }
}

impl<R: RandomSource + ?Sized> RandomSource for Box<R> {
    fn next_f32(&mut self) -> f32 {
        (**self).next_f32()
    }
}

impl<R: RandomSource + ?Sized> RandomSource for &mut R {
    fn next_f32(&mut self) -> f32 {
        (**self).next_f32()
    }
}

/// `StdRng`-backed source, either from entropy or a fixed seed.
#[derive(Debug, Clone)]
pub struct StdRandom {
    rng: StdRng,
}

impl StdRandom {
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for StdRandom {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl RandomSource for StdRandom {
    fn next_f32(&mut self) -> f32 {
        self.rng.gen::<f32>()
    }
}

/// Replays a fixed sequence of samples, cycling when exhausted.
///
/// Values are clamped into `[0, 1)`; an empty script always yields 0.0.
#[derive(Debug, Clone, Default)]
pub struct ScriptedRandom {
    values: Vec<f32>,
    cursor: usize,
}

impl ScriptedRandom {
    pub fn new(values: impl IntoIterator<Item = f32>) -> Self {
        let values = values
            .into_iter()
            .map(|v| if v.is_finite() { v.clamp(0.0, 0.999_999) } else { 0.0 })
            .collect();
        Self { values, cursor: 0 }
    }

    /// Always yields the same value.
    pub fn constant(value: f32) -> Self {
        Self::new([value])
    }

    /// Number of samples drawn so far.
    pub fn draws(&self) -> usize {
        self.cursor
    }
}

impl RandomSource for ScriptedRandom {
    fn next_f32(&mut self) -> f32 {
        if self.values.is_empty() {
            return 0.0;
        }
        let v = self.values[self.cursor % self.values.len()];
        self.cursor += 1;
        v
    }
}
