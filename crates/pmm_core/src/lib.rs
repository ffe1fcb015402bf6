//! # PMM Core
//!
//! Shared vocabulary of the plastic-memory-module simulation: the snapshot
//! value the dashboard renders, the VAD affect model, brain configuration and
//! its validation, the bounded history windows, the slot decoder and the
//! injectable random source every stochastic step draws from.

pub mod affect;
pub mod config;
pub mod decoder;
pub mod error;
pub mod ring;
pub mod rng;
pub mod state;

pub use affect::{EmotionComponent, EmotionVector, MoodLabel};
pub use config::{BrainConfig, EmotionConfig, HeartbeatSettings, PmmConfig};
pub use decoder::{decode_slot, DecodedMemory, MemoryKind};
pub use error::ConfigError;
pub use ring::RingBuffer;
pub use rng::{RandomSource, ScriptedRandom, StdRandom};
pub use state::{
    Action, ChatMessage, MessageVariant, Mode, PressureSample, Sender, Snapshot, TrainingMetrics,
};
