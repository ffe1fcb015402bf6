//! Property-based tests for pmm_core.
//!
//! Invariants of the affect model, the history window and the slot decoder
//! that must hold for all inputs.

use pmm_core::ring::RingBuffer;
use pmm_core::{decode_slot, BrainConfig, EmotionComponent, EmotionVector, Snapshot};
use proptest::prelude::*;

// ============================================================================
// Strategies
// ============================================================================

fn arb_emotion() -> impl Strategy<Value = EmotionVector> {
    (-1.0f32..=1.0, -1.0f32..=1.0, -1.0f32..=1.0)
        .prop_map(|(v, a, d)| EmotionVector::new(v, a, d))
}

fn arb_component() -> impl Strategy<Value = EmotionComponent> {
    prop_oneof![
        Just(EmotionComponent::Valence),
        Just(EmotionComponent::Arousal),
        Just(EmotionComponent::Dominance),
    ]
}

fn arb_valid_config() -> impl Strategy<Value = BrainConfig> {
    (1usize..=64, 0u32..=4, 0.1f32..=0.99).prop_map(|(start, doublings, threshold)| BrainConfig {
        start_mem_slots: start,
        max_mem_slots: start << doublings,
        expansion_threshold: threshold,
        ..Default::default()
    })
}

// ============================================================================
// Affect
// ============================================================================

proptest! {
    /// Overrides with any finite or extreme value stay inside the cube.
    #[test]
    fn override_always_bounded(
        e in arb_emotion(),
        component in arb_component(),
        value in prop::num::f32::ANY,
    ) {
        let next = e.with_component(component, value);
        prop_assert!(next.is_bounded(), "override produced {:?}", next);
    }

    /// Override touches exactly one axis.
    #[test]
    fn override_touches_one_axis(e in arb_emotion(), component in arb_component(), value in -1.0f32..=1.0) {
        let next = e.with_component(component, value);
        for other in EmotionComponent::ALL {
            if other != component {
                prop_assert_eq!(next.get(other), e.get(other));
            }
        }
        prop_assert!((next.get(component) - value).abs() < 1e-6);
    }

    /// Mood derivation never panics.
    #[test]
    fn mood_is_total(e in arb_emotion()) {
        let _ = e.mood().as_str();
    }
}

// ============================================================================
// Ring buffer
// ============================================================================

proptest! {
    /// The window keeps exactly the newest `capacity` items in order.
    #[test]
    fn ring_keeps_newest_in_order(items in prop::collection::vec(any::<u16>(), 0..100), cap in 1usize..30) {
        let mut buf = RingBuffer::new(cap);
        buf.extend(items.iter().copied());
        prop_assert!(buf.len() <= cap);
        let skip = items.len().saturating_sub(cap);
        prop_assert_eq!(buf.to_vec(), items[skip..].to_vec());
    }
}

// ============================================================================
// Decoder
// ============================================================================

proptest! {
    /// Content depends on index alone; usage only moves confidence.
    #[test]
    fn decoder_keyed_on_index(index in 0usize..100_000, u1 in 0.0f32..=1.0, u2 in 0.0f32..=1.0, tick in 0u64..5000) {
        let a = decode_slot(index, u1, tick);
        let b = decode_slot(index, u2, tick);
        prop_assert_eq!(a.kind, b.kind);
        prop_assert_eq!(a.concepts, b.concepts);
        prop_assert_eq!(a.vector, b.vector);
        prop_assert_eq!(a.age, b.age);
        prop_assert!((a.confidence - u1).abs() < 1e-6);
    }
}

// ============================================================================
// Config + snapshot
// ============================================================================

proptest! {
    /// Any accepted config yields a snapshot satisfying the invariants.
    #[test]
    fn initial_snapshot_valid(cfg in arb_valid_config()) {
        prop_assert!(cfg.validate().is_ok());
        let s = Snapshot::initial(&cfg);
        prop_assert!(s.check_invariants());
        prop_assert_eq!(s.memory_capacity, cfg.start_mem_slots);
    }

    /// Start above max is always refused.
    #[test]
    fn start_above_max_rejected(max in 1usize..1000, extra in 1usize..1000) {
        let cfg = BrainConfig {
            start_mem_slots: max + extra,
            max_mem_slots: max,
            expansion_threshold: 0.5,
            ..Default::default()
        };
        prop_assert!(cfg.validate().is_err());
    }
}
