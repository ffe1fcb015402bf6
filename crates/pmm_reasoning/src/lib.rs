//! # PMM Reasoning
//!
//! The "slow" side of the simulated brain: the cortex heads that advance the
//! thought and workspace vectors, the chat engine that speaks in a tone picked
//! from the current affect, and the synthetic teacher that scores training
//! ticks.

pub mod chat;
pub mod cortex;
pub mod teacher;

pub use chat::{ChatEngine, Intent, Tone};
pub use cortex::{Cortex, CortexOutput};
pub use teacher::{StudentOutputs, SyntheticTeacher, TeacherTargets};
