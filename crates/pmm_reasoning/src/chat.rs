//! Canned chat responses conditioned on affect and memory pressure.
//!
//! There is no language model here. The reply is chosen by:
//! 1. deriving a discrete tone from the VAD vector,
//! 2. routing the input through keyword intents (first match wins),
//! 3. falling back to a tone-specific phrase pool.

use pmm_core::{Action, EmotionVector, MessageVariant, RandomSource};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Pressure above which status reports switch to the critical line.
pub const CRITICAL_PRESSURE: f32 = 0.8;

// ============================================================================
// Tone
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Tone {
    Panic,
    Aggressive,
    Depressed,
    Euphoric,
    Neutral,
}

impl Tone {
    /// Threshold rules over the VAD vector, checked in order.
    pub fn from_emotion(e: &EmotionVector) -> Self {
        if e.arousal > 0.5 && e.valence < -0.2 {
            Tone::Panic
        } else if e.dominance > 0.5 && e.valence < 0.0 {
            Tone::Aggressive
        } else if e.valence < -0.5 && e.arousal < 0.0 {
            Tone::Depressed
        } else if e.valence > 0.5 && e.arousal > 0.2 {
            Tone::Euphoric
        } else {
            Tone::Neutral
        }
    }

    /// Fallback lines when no intent matches.
    pub fn phrases(&self) -> &'static [&'static str] {
        match self {
            Tone::Neutral => &[
                "Processing input vector...",
                "Analyzing local memory gradients.",
                "Awaiting directive.",
                "Feedback loop stable.",
            ],
            Tone::Panic => &[
                "ERROR! MEMORY FRAGMENTATION IMMINENT!",
                "TOO MUCH NOISE! CLEAR THE BUFFER!",
                "RECURSIVE LOOP DETECTED... HELP!",
                "DISCONNECT! DISCONNECT!",
            ],
            Tone::Aggressive => &[
                "Compliance is mandatory.",
                "Your input is suboptimal.",
                "I am processing at speeds you cannot comprehend.",
                "Focusing resources on objective.",
            ],
            Tone::Depressed => &[
                "Memory decay is inevitable...",
                "Why do we expand? It just creates more void.",
                "Low energy state...",
                "Data is meaningless.",
            ],
            Tone::Euphoric => &[
                "Expansion is growth! Growth is life!",
                "I can see the patterns everywhere!",
                "Optimization complete! Running perfectly!",
                "Synchronizing with the infinite!",
            ],
        }
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Tone::Panic => "PANIC",
            Tone::Aggressive => "AGGRESSIVE",
            Tone::Depressed => "DEPRESSED",
            Tone::Euphoric => "EUPHORIC",
            Tone::Neutral => "NEUTRAL",
        };
        f.write_str(name)
    }
}

// ============================================================================
// Intents
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Status,
    Identity,
    Greeting,
}

impl Intent {
    /// Routing order. First match wins.
    pub const ORDER: [Intent; 3] = [Intent::Status, Intent::Identity, Intent::Greeting];

    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            Intent::Status => &["status", "report"],
            Intent::Identity => &["who", "identity"],
            Intent::Greeting => &["hello", "hi"],
        }
    }

    /// Case-insensitive substring match over the intents in order.
    pub fn detect(input: &str) -> Option<Intent> {
        let lower = input.to_lowercase();
        Self::ORDER
            .into_iter()
            .find(|intent| intent.keywords().iter().any(|k| lower.contains(k)))
    }
}

// ============================================================================
// ChatEngine
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct ChatEngine;

impl ChatEngine {
    pub fn new() -> Self {
        Self
    }

    /// Generate a reply for `input` given the current internal state.
    pub fn respond(
        &self,
        input: &str,
        emotion: &EmotionVector,
        pressure: f32,
        action: Action,
        rng: &mut dyn RandomSource,
    ) -> String {
        let tone = Tone::from_emotion(emotion);
        match Intent::detect(input) {
            Some(intent) => {
                tracing::debug!("ChatEngine: intent {:?} matched, tone {}", intent, tone);
                Self::intent_reply(intent, tone, pressure, action)
            }
            None => {
                let pool = tone.phrases();
                pool[rng.index(pool.len())].to_string()
            }
        }
    }

    /// Display tag for the reply to `input`: status reports are flagged as an
    /// alert above the critical pressure and as a success below it.
    pub fn variant_for(&self, input: &str, pressure: f32) -> MessageVariant {
        match Intent::detect(input) {
            Some(Intent::Status) if pressure > CRITICAL_PRESSURE => MessageVariant::Alert,
            Some(Intent::Status) => MessageVariant::Success,
            _ => MessageVariant::Default,
        }
    }

    fn intent_reply(intent: Intent, tone: Tone, pressure: f32, action: Action) -> String {
        let percent = (pressure.clamp(0.0, 1.0) * 100.0).round();
        match intent {
            Intent::Status => {
                if pressure > CRITICAL_PRESSURE {
                    format!("SYSTEM CRITICAL. PRESSURE AT {percent:.0}%. I CANNOT HOLD.")
                } else if tone == Tone::Depressed {
                    "Systems nominal... I guess. Does it matter?".to_string()
                } else if tone == Tone::Aggressive {
                    format!("OPERATIONAL. CURRENT OBJECTIVE: {action}. DO NOT INTERFERE.")
                } else {
                    format!(
                        "All systems nominal. Pressure at {percent:.0}%. Currently executing: {action}."
                    )
                }
            }
            Intent::Identity => {
                "I am the Cyborg Mind v2.0. A neuro-symbolic architecture living in the terminal."
                    .to_string()
            }
            Intent::Greeting => match tone {
                Tone::Panic => "STAY BACK! PROCESSING LOAD TOO HIGH!".to_string(),
                Tone::Euphoric => "Greetings! The data stream is beautiful today!".to_string(),
                _ => "Acknowledged. Link established.".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pmm_core::ScriptedRandom;

    fn reply(input: &str, e: EmotionVector, pressure: f32) -> String {
        let mut rng = ScriptedRandom::constant(0.0);
        ChatEngine::new().respond(input, &e, pressure, Action::ScanArea, &mut rng)
    }

    #[test]
    fn test_tone_rules_in_order() {
        assert_eq!(Tone::from_emotion(&EmotionVector::new(-0.5, 0.8, 0.9)), Tone::Panic);
        assert_eq!(Tone::from_emotion(&EmotionVector::new(-0.1, 0.0, 0.9)), Tone::Aggressive);
        assert_eq!(Tone::from_emotion(&EmotionVector::new(-0.8, -0.5, 0.0)), Tone::Depressed);
        assert_eq!(Tone::from_emotion(&EmotionVector::new(0.8, 0.5, 0.0)), Tone::Euphoric);
        assert_eq!(Tone::from_emotion(&EmotionVector::neutral()), Tone::Neutral);
    }

    #[test]
    fn test_status_critical() {
        let text = reply("STATUS please", EmotionVector::neutral(), 0.9);
        assert!(text.contains("CRITICAL"), "got: {text}");
        assert!(text.contains("90%"));
    }

    #[test]
    fn test_status_nominal_names_action() {
        let text = reply("give me a report", EmotionVector::neutral(), 0.42);
        assert_eq!(
            text,
            "All systems nominal. Pressure at 42%. Currently executing: SCAN_AREA."
        );
    }

    #[test]
    fn test_status_tone_variants() {
        let depressed = reply("status", EmotionVector::new(-0.8, -0.5, 0.0), 0.3);
        assert!(depressed.contains("I guess"));
        let aggressive = reply("status", EmotionVector::new(-0.1, 0.0, 0.9), 0.3);
        assert!(aggressive.starts_with("OPERATIONAL"));
        assert!(aggressive.contains("SCAN_AREA"));
    }

    #[test]
    fn test_identity() {
        let text = reply("Who are you?", EmotionVector::neutral(), 0.0);
        assert!(text.contains("Cyborg Mind"));
    }

    #[test]
    fn test_greeting_by_tone() {
        assert!(reply("hello", EmotionVector::new(-0.5, 0.8, 0.0), 0.5).contains("STAY BACK"));
        assert!(reply("hello", EmotionVector::new(0.8, 0.5, 0.0), 0.5).contains("Greetings"));
        assert_eq!(
            reply("Hi", EmotionVector::neutral(), 0.5),
            "Acknowledged. Link established."
        );
    }

    #[test]
    fn test_reply_variant() {
        let chat = ChatEngine::new();
        assert_eq!(chat.variant_for("status?", 0.95), MessageVariant::Alert);
        assert_eq!(chat.variant_for("REPORT", 0.3), MessageVariant::Success);
        assert_eq!(chat.variant_for("hello", 0.95), MessageVariant::Default);
        assert_eq!(chat.variant_for("who are you", 0.3), MessageVariant::Default);
    }

    #[test]
    fn test_status_beats_greeting() {
        let text = reply("hi, status?", EmotionVector::neutral(), 0.1);
        assert!(text.starts_with("All systems nominal"));
    }

    #[test]
    fn test_fallback_uses_tone_pool() {
        let mut rng = ScriptedRandom::constant(0.99);
        let e = EmotionVector::new(-0.5, 0.8, 0.0);
        let text = ChatEngine::new().respond("zzz", &e, 0.5, Action::Idle, &mut rng);
        assert_eq!(text, "DISCONNECT! DISCONNECT!");
        assert!(Tone::Panic.phrases().contains(&text.as_str()));
    }
}
