//! # PMM Memory
//!
//! The plastic memory module itself: slot usage dynamics, pressure
//! measurement and capacity doubling, wired together with the emotion engine
//! and the cortex heads into one tick.
//!
//! - `controller`: the `Simulator` tick state machine and the manual
//!   operations (flush, forced expansion, chat, emotion override)
//! - `session`: a `Session` that owns one run, and a `SessionHandle` that
//!   drives it from a tokio heartbeat task

pub mod controller;
pub mod error;
pub mod session;

pub use controller::{Simulator, AI_REPLY_DELAY_MS};
pub use error::SessionError;
pub use session::{Session, SessionHandle, SessionStatus, MAX_STEP_BATCH};
