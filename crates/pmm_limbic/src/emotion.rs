//! Emotion dynamics: pressure-driven VAD regulation
//!
//! Memory pressure is the only stimulus. Each axis relaxes exponentially
//! toward a target derived from pressure:
//!
//! - valence   → 1 − 2p   (empty memory feels good, full memory feels bad)
//! - arousal   → 2p − 1   (load excites)
//! - dominance → 1 during an expansion, otherwise 0.5 − p
//!
//! Dominance moves at half the rate of the other two axes, and every axis
//! gets a small symmetric jitter so the gauges never sit perfectly still.

use pmm_core::affect::clamp_axis;
use pmm_core::{EmotionComponent, EmotionVector, RandomSource};
use serde::{Deserialize, Serialize};

pub const DEFAULT_LEARNING_RATE: f32 = 0.1;
pub const MIN_LEARNING_RATE: f32 = 0.01;
pub const MAX_LEARNING_RATE: f32 = 1.0;

/// Amplitude of the per-axis jitter.
pub const NOISE_AMPLITUDE: f32 = 0.025;

/// Unclamped, noise-free target the engine relaxes toward.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmotionTarget {
    pub valence: f32,
    pub arousal: f32,
    pub dominance: f32,
}

impl EmotionTarget {
    pub fn from_pressure(pressure: f32, is_expanding: bool) -> Self {
        Self {
            valence: 1.0 - 2.0 * pressure,
            arousal: 2.0 * pressure - 1.0,
            dominance: if is_expanding { 1.0 } else { 0.5 - pressure },
        }
    }
}

/// Maps pressure to affect. Owns only its learning rate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmotionEngine {
    learning_rate: f32,
}

impl Default for EmotionEngine {
    fn default() -> Self {
        Self {
            learning_rate: DEFAULT_LEARNING_RATE,
        }
    }
}

impl EmotionEngine {
    pub fn new(learning_rate: f32) -> Self {
        let mut engine = Self::default();
        engine.set_learning_rate(learning_rate);
        engine
    }

    pub fn learning_rate(&self) -> f32 {
        self.learning_rate
    }

    /// Set the smoothing rate, clamped into [0.01, 1.0]. NaN keeps the
    /// current rate.
    pub fn set_learning_rate(&mut self, rate: f32) {
        if rate.is_nan() {
            tracing::warn!("Ignoring NaN emotion learning rate");
            return;
        }
        self.learning_rate = rate.clamp(MIN_LEARNING_RATE, MAX_LEARNING_RATE);
    }

    /// One smoothing step toward the pressure target.
    pub fn predict(
        &self,
        prev: &EmotionVector,
        pressure: f32,
        is_expanding: bool,
        rng: &mut dyn RandomSource,
    ) -> EmotionVector {
        let pressure = if pressure.is_finite() {
            pressure.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let target = EmotionTarget::from_pressure(pressure, is_expanding);
        let rate = self.learning_rate;

        let valence = relax(prev.valence, target.valence, rate, rng.symmetric(NOISE_AMPLITUDE));
        let arousal = relax(prev.arousal, target.arousal, rate, rng.symmetric(NOISE_AMPLITUDE));
        let dominance = relax(
            prev.dominance,
            target.dominance,
            rate * 0.5,
            rng.symmetric(NOISE_AMPLITUDE),
        );

        EmotionVector {
            valence,
            arousal,
            dominance,
        }
    }

    /// Direct-set one axis, bypassing smoothing.
    pub fn override_component(
        &self,
        prev: &EmotionVector,
        component: EmotionComponent,
        value: f32,
    ) -> EmotionVector {
        prev.with_component(component, value)
    }
}

#[inline]
fn relax(current: f32, target: f32, rate: f32, noise: f32) -> f32 {
    clamp_axis(current + (target - current) * rate + noise)
}
