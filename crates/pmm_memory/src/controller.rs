//! Capacity controller: the tick state machine
//!
//! Every operation takes the previous snapshot by reference and returns a new
//! one. The simulator owns the engines and the random source; it holds no
//! simulation state of its own, so several independent runs can share one
//! simulator or each own one.
//!
//! A tick:
//! 1. decays and writes slots (mode-specific)
//! 2. measures pressure
//! 3. doubles capacity if pressure crosses the threshold and the ceiling allows
//! 4. relaxes the emotion toward the pressure target
//! 5. advances the cortex vectors and samples an action
//! 6. (training) scores the outputs against a synthetic teacher
//! 7. records history and logs

use chrono::Utc;
use pmm_core::state::{expand_with_logs, pressure_of, sanitize_usage};
use pmm_core::{
    decode_slot, BrainConfig, ChatMessage, DecodedMemory, EmotionComponent, Mode, PressureSample,
    RandomSource, Sender, Snapshot, StdRandom,
};
use pmm_limbic::EmotionEngine;
use pmm_reasoning::{ChatEngine, Cortex, StudentOutputs, SyntheticTeacher};
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Per-tick usage decay in inference mode.
const INFERENCE_DECAY: f32 = 0.02;
/// Random writes per inference tick are drawn from `0..INFERENCE_WRITE_SPAN`.
const INFERENCE_WRITE_SPAN: usize = 3;
/// Extra writes per tick while the stress flag is on.
const STRESS_EXTRA_WRITES: usize = 5;

/// Per-tick usage decay in training mode.
const TRAINING_DECAY: f32 = 0.002;
/// Usage added by the single training write.
const TRAINING_WRITE_INCREMENT: f32 = 0.3;

/// Probability of an ambient event log line on a calm inference tick.
const AMBIENT_EVENT_CHANCE: f32 = 0.1;
const AMBIENT_EVENTS: [&str; 4] = [
    "[MEM] Re-indexing...",
    "[VISION] Object tracking stable",
    "[PLAN] Updating thought vector",
    "[PMM] Garbage collection",
];

/// Training steps between loss summaries in the log.
const LOSS_LOG_EVERY: u64 = 10;

/// Gap between a user message and the reply, so ordering by timestamp is stable.
pub const AI_REPLY_DELAY_MS: i64 = 100;

pub struct Simulator {
    emotion: EmotionEngine,
    chat: ChatEngine,
    cortex: Cortex,
    teacher: SyntheticTeacher,
    rng: Box<dyn RandomSource>,
}

impl Default for Simulator {
    fn default() -> Self {
        Self::new(Box::new(StdRandom::from_entropy()))
    }
}

impl std::fmt::Debug for Simulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulator")
            .field("emotion", &self.emotion)
            .finish_non_exhaustive()
    }
}

impl Simulator {
    pub fn new(rng: Box<dyn RandomSource>) -> Self {
        Self {
            emotion: EmotionEngine::default(),
            chat: ChatEngine::new(),
            cortex: Cortex::new(),
            teacher: SyntheticTeacher::default(),
            rng,
        }
    }

    /// Reproducible simulator seeded with `seed`.
    pub fn seeded(seed: u64) -> Self {
        Self::new(Box::new(StdRandom::seeded(seed)))
    }

    pub fn with_emotion_engine(mut self, engine: EmotionEngine) -> Self {
        self.emotion = engine;
        self
    }

    pub fn emotion_engine(&self) -> &EmotionEngine {
        &self.emotion
    }

    pub fn emotion_engine_mut(&mut self) -> &mut EmotionEngine {
        &mut self.emotion
    }

    /// Full reset from `config`.
    pub fn initialize(&self, config: &BrainConfig) -> Snapshot {
        info!(
            "Initializing PMM: {} slots (max {}), threshold {:.2}",
            config.start_mem_slots, config.max_mem_slots, config.expansion_threshold
        );
        Snapshot::initial(config)
    }

    /// Advance one tick. `stress` only affects inference ticks.
    pub fn tick(
        &mut self,
        prev: &Snapshot,
        config: &BrainConfig,
        mode: Mode,
        stress: bool,
    ) -> Snapshot {
        let mut next = prev.clone();
        next.tick = prev.tick + 1;
        next.is_expanding = false;

        // 1. Slot usage
        match mode {
            Mode::Inference => self.perturb_inference(&mut next.memory_slots, stress),
            Mode::Training => self.perturb_training(&mut next.memory_slots),
        }

        // 2. Pressure
        let pressure = pressure_of(&next.memory_slots);
        next.current_pressure = pressure;

        // 3. Expansion, at most once per tick
        if pressure > config.expansion_threshold {
            let expanded = match mode {
                Mode::Inference => expand_with_logs(
                    &mut next,
                    config,
                    |_| format!("[SYSTEM] CRITICAL PRESSURE {:.0}%", pressure * 100.0),
                    |old, new| format!("[SYSTEM] EXPANDING PMM: {old} -> {new} SLOTS"),
                ),
                Mode::Training => expand_with_logs(
                    &mut next,
                    config,
                    |_| {
                        format!(
                            "[TRAINER] Pressure {:.1}% > {:.0}%",
                            pressure * 100.0,
                            config.expansion_threshold * 100.0
                        )
                    },
                    |_, new| format!("[TRAINER] Expanding Memory -> {new}"),
                ),
            };
            if expanded {
                info!(
                    "PMM expanded to {} slots at tick {} (pressure {:.2})",
                    next.memory_capacity, next.tick, pressure
                );
            } else {
                debug!(
                    "Pressure {:.2} over threshold but capacity {} is at the ceiling",
                    pressure, next.memory_capacity
                );
            }
        }

        // 4. Emotion
        next.emotion = self.emotion.predict(
            &prev.emotion,
            pressure,
            next.is_expanding,
            self.rng.as_mut(),
        );

        // 5 + 6. Cortex
        let out = self.cortex.forward(
            &prev.thought_vector,
            &prev.workspace_vector,
            &prev.recurrent_state,
            prev.value_estimate,
            self.rng.as_mut(),
        );

        match mode {
            Mode::Inference => {
                next.training_metrics = None;
                if !stress && self.rng.chance(AMBIENT_EVENT_CHANCE) {
                    let event = AMBIENT_EVENTS[self.rng.index(AMBIENT_EVENTS.len())];
                    next.push_log(event);
                }
            }
            Mode::Training => {
                let targets = self.teacher.predict(self.rng.as_mut());
                let metrics = self.teacher.evaluate(
                    next.tick,
                    &StudentOutputs {
                        action: out.action,
                        value: out.value,
                        emotion: &next.emotion,
                        workspace: &out.workspace,
                    },
                    &targets,
                    self.rng.as_mut(),
                );
                if next.tick % LOSS_LOG_EVERY == 0 {
                    next.push_log(format!(
                        "Step {}: Loss {:.4} (Act {:.2}, Val {:.2})",
                        next.tick, metrics.total_loss, metrics.loss_act, metrics.loss_val
                    ));
                }
                next.training_metrics = Some(metrics);
            }
        }

        next.thought_vector = out.thought;
        next.workspace_vector = out.workspace;
        next.recurrent_state = out.recurrent;
        next.value_estimate = out.value;
        next.last_action = out.action;

        // 7. History
        next.pressure_history.push(PressureSample {
            tick: next.tick,
            pressure,
        });

        debug!(
            "tick {} [{}]: pressure {:.3}, capacity {}, action {}",
            next.tick, mode, pressure, next.memory_capacity, next.last_action
        );
        next
    }

    /// Decay every slot, then write 0–2 random slots to full usage (+5 under stress).
    fn perturb_inference(&mut self, slots: &mut [f32], stress: bool) {
        for usage in slots.iter_mut() {
            *usage = (sanitize_usage(*usage) - INFERENCE_DECAY).max(0.0);
        }
        let mut writes = self.rng.index(INFERENCE_WRITE_SPAN);
        if stress {
            writes += STRESS_EXTRA_WRITES;
        }
        for _ in 0..writes {
            let idx = self.rng.index(slots.len());
            if let Some(usage) = slots.get_mut(idx) {
                *usage = 1.0;
            }
        }
    }

    /// Light decay, then increment one random slot.
    fn perturb_training(&mut self, slots: &mut [f32]) {
        for usage in slots.iter_mut() {
            *usage = (sanitize_usage(*usage) - TRAINING_DECAY).max(0.0);
        }
        let idx = self.rng.index(slots.len());
        if let Some(usage) = slots.get_mut(idx) {
            *usage = (*usage + TRAINING_WRITE_INCREMENT).min(1.0);
        }
    }

    /// Zero the given slots. Out-of-range indices are skipped; if nothing was
    /// flushed the snapshot comes back unchanged and nothing is logged.
    pub fn flush_slots(&self, prev: &Snapshot, indices: &[usize]) -> Snapshot {
        let valid: BTreeSet<usize> = indices
            .iter()
            .copied()
            .filter(|i| *i < prev.memory_slots.len())
            .collect();

        if valid.is_empty() {
            debug!("Flush ignored: no valid slot indices in {:?}", indices);
            return prev.clone();
        }

        let mut next = prev.clone();
        for &i in &valid {
            next.memory_slots[i] = 0.0;
        }
        next.current_pressure = pressure_of(&next.memory_slots);

        let line = match valid.iter().next() {
            Some(only) if valid.len() == 1 => {
                format!("[MANUAL] Flushed memory slot 0x{only:04X}")
            }
            _ => format!("[MANUAL] Bulk flushed {} memory slots", valid.len()),
        };
        info!("{}", line);
        next.push_log(line);
        next
    }

    /// Zero every idle slot in one bulk flush. No-op when nothing is idle.
    pub fn compress(&self, prev: &Snapshot) -> Snapshot {
        self.flush_slots(prev, &prev.idle_slots())
    }

    /// Double capacity on demand. No-op at the ceiling.
    pub fn force_expand(&self, prev: &Snapshot, config: &BrainConfig) -> Snapshot {
        if !prev.can_expand(config) {
            debug!(
                "Force expansion ignored: capacity {} at ceiling {}",
                prev.memory_capacity, config.max_mem_slots
            );
            return prev.clone();
        }

        let mut next = prev.clone();
        expand_with_logs(
            &mut next,
            config,
            |_| "[MANUAL] Override: Force Expansion Triggered.".to_string(),
            |_, new| format!("[SYSTEM] Hot-swap complete. New Capacity: {new} slots."),
        );
        next.current_pressure = pressure_of(&next.memory_slots);
        info!("Forced expansion to {} slots", next.memory_capacity);
        next
    }

    /// Append the user's message and the generated reply. Blank input is ignored.
    pub fn send_message(&mut self, prev: &Snapshot, text: &str) -> Snapshot {
        let text = text.trim();
        if text.is_empty() {
            return prev.clone();
        }

        let reply = self.chat.respond(
            text,
            &prev.emotion,
            prev.current_pressure,
            prev.last_action,
            self.rng.as_mut(),
        );
        let variant = self.chat.variant_for(text, prev.current_pressure);

        let now = Utc::now().timestamp_millis();
        let mut next = prev.clone();
        next.chat_history.push(ChatMessage::new(Sender::User, text, now));
        next.chat_history.push(
            ChatMessage::new(Sender::Ai, reply, now + AI_REPLY_DELAY_MS).with_variant(variant),
        );
        next
    }

    /// Direct-set one emotion axis, clamped to [-1, 1].
    pub fn override_emotion(
        &self,
        prev: &Snapshot,
        component: EmotionComponent,
        value: f32,
    ) -> Snapshot {
        let mut next = prev.clone();
        next.emotion = self
            .emotion
            .override_component(&prev.emotion, component, value);
        next
    }

    /// Decode slot `index` of `snapshot`, or `None` if it is out of range.
    pub fn decode_slot(&self, snapshot: &Snapshot, index: usize) -> Option<DecodedMemory> {
        snapshot
            .memory_slots
            .get(index)
            .map(|usage| decode_slot(index, *usage, snapshot.tick))
    }
}
