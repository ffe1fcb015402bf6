//! Simulation snapshot: the whole observable state of one run at one tick.
//!
//! A `Snapshot` is a value. Transitions take `&Snapshot` and build a new one;
//! nothing that backs an already-published snapshot is mutated afterwards.

use crate::affect::EmotionVector;
use crate::config::BrainConfig;
use crate::ring::{RingBuffer, DEFAULT_WINDOW};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Usage above which a slot counts toward pressure.
pub const ACTIVITY_EPSILON: f32 = 0.05;

/// Width of the global workspace and its recurrent state.
pub const WORKSPACE_DIM: usize = 64;

/// Guard against NaN and Infinity in slot values.
#[inline]
pub fn sanitize_usage(v: f32) -> f32 {
    if v.is_finite() {
        v.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Fraction of slots above `ACTIVITY_EPSILON`. Empty input has zero pressure.
pub fn pressure_of(slots: &[f32]) -> f32 {
    if slots.is_empty() {
        return 0.0;
    }
    let used = slots.iter().filter(|u| **u > ACTIVITY_EPSILON).count();
    used as f32 / slots.len() as f32
}

// =============================================================================
// Labels
// =============================================================================

/// Closed set of actions the action head can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    BootSequence,
    Idle,
    MoveForward,
    TurnLeft,
    TurnRight,
    Attack,
    Defend,
    Interact,
    UseItem,
    Reload,
    Jump,
    Crouch,
    ScanArea,
}

impl Action {
    /// Actions that can be sampled. `BootSequence` only labels a fresh run.
    pub const SAMPLEABLE: [Action; 12] = [
        Action::Idle,
        Action::MoveForward,
        Action::TurnLeft,
        Action::TurnRight,
        Action::Attack,
        Action::Defend,
        Action::Interact,
        Action::UseItem,
        Action::Reload,
        Action::Jump,
        Action::Crouch,
        Action::ScanArea,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BootSequence => "BOOT_SEQUENCE",
            Self::Idle => "IDLE",
            Self::MoveForward => "MOVE_FORWARD",
            Self::TurnLeft => "TURN_LEFT",
            Self::TurnRight => "TURN_RIGHT",
            Self::Attack => "ATTACK",
            Self::Defend => "DEFEND",
            Self::Interact => "INTERACT",
            Self::UseItem => "USE_ITEM",
            Self::Reload => "RELOAD",
            Self::Jump => "JUMP",
            Self::Crouch => "CROUCH",
            Self::ScanArea => "SCAN_AREA",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which tick variant the host is driving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Mode {
    #[default]
    Inference,
    Training,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inference => f.write_str("INFERENCE"),
            Self::Training => f.write_str("TRAINING"),
        }
    }
}

impl std::str::FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "inference" | "infer" | "i" => Ok(Self::Inference),
            "training" | "train" | "distillation" | "t" => Ok(Self::Training),
            other => Err(format!("unknown mode: {other}")),
        }
    }
}

// =============================================================================
// Chat
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Sender {
    User,
    Ai,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageVariant {
    #[default]
    Default,
    Alert,
    Success,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub sender: Sender,
    pub text: String,
    /// Unix timestamp in milliseconds
    pub timestamp: i64,
    #[serde(default)]
    pub variant: MessageVariant,
}

impl ChatMessage {
    pub fn new(sender: Sender, text: impl Into<String>, timestamp: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender,
            text: text.into(),
            timestamp,
            variant: MessageVariant::Default,
        }
    }

    pub fn with_variant(mut self, variant: MessageVariant) -> Self {
        self.variant = variant;
        self
    }
}

// =============================================================================
// Telemetry
// =============================================================================

/// One point of the pressure chart.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PressureSample {
    pub tick: u64,
    pub pressure: f32,
}

/// Distillation losses reported by a training tick.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TrainingMetrics {
    pub step: u64,
    pub total_loss: f32,
    pub loss_act: f32,
    pub loss_val: f32,
    pub loss_emo: f32,
    pub loss_ws: f32,
}

// =============================================================================
// Snapshot
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub tick: u64,
    pub memory_capacity: usize,
    /// Per-slot utilization in [0, 1]; length always equals `memory_capacity`.
    pub memory_slots: Vec<f32>,
    pub current_pressure: f32,
    pub pressure_history: RingBuffer<PressureSample>,
    pub thought_vector: Vec<f32>,
    pub workspace_vector: Vec<f32>,
    /// Hidden state of the workspace recurrence.
    pub recurrent_state: Vec<f32>,
    /// Last output of the value head.
    pub value_estimate: f32,
    pub emotion: EmotionVector,
    pub last_action: Action,
    pub logs: RingBuffer<String>,
    pub chat_history: Vec<ChatMessage>,
    pub is_expanding: bool,
    pub training_metrics: Option<TrainingMetrics>,
}

impl Snapshot {
    /// Fresh run: zeroed slots, neutral emotion, boot log and greeting.
    pub fn initial(config: &BrainConfig) -> Self {
        let capacity = config.start_mem_slots.max(1);
        let mut logs = RingBuffer::new(DEFAULT_WINDOW);
        logs.push("[SYSTEM] Cortex Initialized.".to_string());

        Self {
            tick: 0,
            memory_capacity: capacity,
            memory_slots: vec![0.0; capacity],
            current_pressure: 0.0,
            pressure_history: RingBuffer::filled(DEFAULT_WINDOW, PressureSample::default()),
            thought_vector: vec![0.0; config.thought_dim],
            workspace_vector: vec![0.0; WORKSPACE_DIM],
            recurrent_state: vec![0.0; WORKSPACE_DIM],
            value_estimate: 0.0,
            emotion: EmotionVector::neutral(),
            last_action: Action::BootSequence,
            logs,
            chat_history: vec![ChatMessage::new(
                Sender::System,
                "Neural link established. Terminal active.",
                chrono::Utc::now().timestamp_millis(),
            )],
            is_expanding: false,
            training_metrics: Some(TrainingMetrics::default()),
        }
    }

    /// Slots currently above the activity epsilon.
    pub fn used_slots(&self) -> usize {
        self.memory_slots
            .iter()
            .filter(|u| **u > ACTIVITY_EPSILON)
            .count()
    }

    /// Indices of slots at or below the activity epsilon.
    pub fn idle_slots(&self) -> Vec<usize> {
        self.memory_slots
            .iter()
            .enumerate()
            .filter(|(_, u)| **u <= ACTIVITY_EPSILON)
            .map(|(i, _)| i)
            .collect()
    }

    /// Whether doubling would still fit under the configured ceiling.
    pub fn can_expand(&self, config: &BrainConfig) -> bool {
        self.memory_capacity
            .checked_mul(2)
            .is_some_and(|doubled| doubled <= config.max_mem_slots)
    }

    /// Double capacity and zero-extend the slots. Callers check `can_expand`.
    pub(crate) fn double_capacity(&mut self) -> (usize, usize) {
        let old = self.memory_capacity;
        let new = old * 2;
        self.memory_capacity = new;
        self.memory_slots.resize(new, 0.0);
        self.is_expanding = true;
        (old, new)
    }

    pub fn push_log(&mut self, line: impl Into<String>) {
        self.logs.push(line.into());
    }

    /// Structural invariants every published snapshot satisfies.
    pub fn check_invariants(&self) -> bool {
        self.memory_slots.len() == self.memory_capacity
            && self.pressure_history.len() <= self.pressure_history.capacity()
            && self.logs.len() <= self.logs.capacity()
            && self.emotion.is_bounded()
            && self
                .memory_slots
                .iter()
                .all(|u| u.is_finite() && (0.0..=1.0).contains(u))
    }
}

/// Expand in place on a snapshot under construction, logging the two
/// expansion lines. Returns false when the ceiling blocks the expansion.
pub fn expand_with_logs(
    next: &mut Snapshot,
    config: &BrainConfig,
    warning: impl FnOnce(usize) -> String,
    confirmation: impl FnOnce(usize, usize) -> String,
) -> bool {
    if !next.can_expand(config) {
        return false;
    }
    let old_capacity = next.memory_capacity;
    next.push_log(warning(old_capacity));
    let (old, new) = next.double_capacity();
    next.push_log(confirmation(old, new));
    true
}
