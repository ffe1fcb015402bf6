//! # PMM Limbic System
//!
//! Fast, non-verbal state regulation for the simulated brain.
//!
//! ## Architecture
//!
//! - `emotion`: the VAD dynamics engine, driven by memory pressure
//! - `heartbeat`: auto-run periods per simulation mode
//!
//! The engine holds no state beyond its learning rate; the previous emotion
//! always comes in from the snapshot, so independent simulations never share
//! affect.

pub mod emotion;
mod heartbeat;

pub use emotion::{EmotionEngine, EmotionTarget};
pub use heartbeat::HeartbeatConfig;
