//! Slot content decoder.
//!
//! Turns a raw slot into display-only "decoded" content. Kind, concepts and
//! the synthetic embedding depend on the slot index alone, so inspecting the
//! same slot twice reads the same memory. Confidence tracks live usage.

use crate::state::sanitize_usage;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Width of the synthetic embedding.
pub const DECODED_VECTOR_DIM: usize = 8;

const SEED_STRIDE: u64 = 1337;
const MAX_AGE: u64 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MemoryKind {
    Sensory,
    Spatial,
    Entity,
    Intent,
}

impl MemoryKind {
    pub const ALL: [MemoryKind; 4] = [Self::Sensory, Self::Spatial, Self::Entity, Self::Intent];

    /// Fixed vocabulary for this kind.
    pub fn concepts(&self) -> &'static [&'static str; 5] {
        match self {
            Self::Sensory => &[
                "Loud Noise",
                "Flash of Light",
                "Smell of Smoke",
                "Vibration",
                "Temperature Drop",
            ],
            Self::Spatial => &[
                "Blocked Path",
                "Open Area",
                "High Elevation",
                "Corner",
                "Narrow Corridor",
            ],
            Self::Entity => &[
                "Goblin Scavenger",
                "Player Character",
                "Unknown NPC",
                "Loot Chest",
                "Trap Mechanism",
            ],
            Self::Intent => &[
                "Attack Target",
                "Flee to Cover",
                "Patrol Route",
                "Interact with Object",
                "Idle/Wait",
            ],
        }
    }
}

impl fmt::Display for MemoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Sensory => "SENSORY",
            Self::Spatial => "SPATIAL",
            Self::Entity => "ENTITY",
            Self::Intent => "INTENT",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodedMemory {
    pub kind: MemoryKind,
    /// Primary and secondary concept; may be the same label.
    pub concepts: [&'static str; 2],
    pub vector: [f32; DECODED_VECTOR_DIM],
    pub confidence: f32,
    /// Ticks since the memory was written.
    pub age: u64,
}

/// Decode slot `index` as observed at `observed_at_tick` with live `usage`.
pub fn decode_slot(index: usize, usage: f32, observed_at_tick: u64) -> DecodedMemory {
    let mut rng = StdRng::seed_from_u64((index as u64).wrapping_mul(SEED_STRIDE));

    let kind = MemoryKind::ALL[rng.gen_range(0..MemoryKind::ALL.len())];
    let vocabulary = kind.concepts();
    let primary = vocabulary[rng.gen_range(0..vocabulary.len())];
    let secondary = vocabulary[rng.gen_range(0..vocabulary.len())];

    let mut vector = [0.0f32; DECODED_VECTOR_DIM];
    for v in vector.iter_mut() {
        *v = rng.gen::<f32>();
    }

    // A slot cannot be older than the run observing it.
    let age = rng.gen_range(0..MAX_AGE).min(observed_at_tick);

    DecodedMemory {
        kind,
        concepts: [primary, secondary],
        vector,
        confidence: sanitize_usage(usage),
        age,
    }
}
