//! Property-based tests for the emotion engine.
//!
//! Verifies that the VAD output always stays inside the [-1, 1] cube and that
//! the pressure targets follow their closed forms.

use pmm_core::{EmotionVector, StdRandom};
use pmm_limbic::{EmotionEngine, EmotionTarget};
use proptest::prelude::*;

fn arb_emotion() -> impl Strategy<Value = EmotionVector> {
    (-1.0f32..=1.0, -1.0f32..=1.0, -1.0f32..=1.0)
        .prop_map(|(v, a, d)| EmotionVector::new(v, a, d))
}

proptest! {
    /// **Core invariant**: every predicted component is in [-1, 1].
    #[test]
    fn predict_always_bounded(
        prev in arb_emotion(),
        pressure in prop::num::f32::ANY,
        expanding in any::<bool>(),
        rate in 0.0f32..=2.0,
        seed in any::<u64>(),
    ) {
        let engine = EmotionEngine::new(rate);
        let mut rng = StdRandom::seeded(seed);
        let next = engine.predict(&prev, pressure, expanding, &mut rng);
        prop_assert!(next.is_bounded(), "out of bounds: {:?}", next);
    }

    /// Targets follow 1 − 2p and 2p − 1 exactly.
    #[test]
    fn targets_closed_form(p in 0.0f32..=1.0, expanding in any::<bool>()) {
        let t = EmotionTarget::from_pressure(p, expanding);
        prop_assert_eq!(t.valence, 1.0 - 2.0 * p);
        prop_assert_eq!(t.arousal, 2.0 * p - 1.0);
        if expanding {
            prop_assert_eq!(t.dominance, 1.0);
        } else {
            prop_assert_eq!(t.dominance, 0.5 - p);
        }
    }

    /// A long run under constant pressure settles near the target valence.
    #[test]
    fn settles_near_target(p in 0.0f32..=1.0, seed in any::<u64>()) {
        let engine = EmotionEngine::new(0.3);
        let mut rng = StdRandom::seeded(seed);
        let mut e = EmotionVector::neutral();
        for _ in 0..200 {
            e = engine.predict(&e, p, false, &mut rng);
        }
        // Jitter of ±0.025 per step keeps it within a small band
        prop_assert!((e.valence - (1.0 - 2.0 * p)).abs() < 0.2);
    }
}
