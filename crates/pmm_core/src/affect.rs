//! Affect model: Valence × Arousal × Dominance (VAD)
//!
//! The emotion state is a point in a 3D cube where every axis spans
//! [-1.0, 1.0]. Discrete mood labels are derived from regions of that cube
//! for display only; the dynamics always work on the continuous vector.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Continuous VAD emotion state.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EmotionVector {
    /// Valence: negative/positive (-1.0 to 1.0)
    pub valence: f32,

    /// Arousal: calm/excited (-1.0 to 1.0)
    pub arousal: f32,

    /// Dominance: submissive/dominant (-1.0 to 1.0)
    pub dominance: f32,
}

impl EmotionVector {
    pub fn new(valence: f32, arousal: f32, dominance: f32) -> Self {
        Self {
            valence: clamp_axis(valence),
            arousal: clamp_axis(arousal),
            dominance: clamp_axis(dominance),
        }
    }

    pub fn neutral() -> Self {
        Self::default()
    }

    pub fn get(&self, component: EmotionComponent) -> f32 {
        match component {
            EmotionComponent::Valence => self.valence,
            EmotionComponent::Arousal => self.arousal,
            EmotionComponent::Dominance => self.dominance,
        }
    }

    /// Return a copy with one component replaced and clamped.
    ///
    /// Non-finite values leave the vector unchanged.
    pub fn with_component(&self, component: EmotionComponent, value: f32) -> Self {
        if !value.is_finite() {
            tracing::warn!("Ignoring non-finite {} override: {}", component, value);
            return *self;
        }
        let mut next = *self;
        let slot = match component {
            EmotionComponent::Valence => &mut next.valence,
            EmotionComponent::Arousal => &mut next.arousal,
            EmotionComponent::Dominance => &mut next.dominance,
        };
        *slot = clamp_axis(value);
        next
    }

    pub fn as_array(&self) -> [f32; 3] {
        [self.valence, self.arousal, self.dominance]
    }

    pub fn is_bounded(&self) -> bool {
        self.as_array()
            .iter()
            .all(|v| v.is_finite() && (-1.0..=1.0).contains(v))
    }

    /// Display mood for the current point. Regions are checked in order,
    /// first match wins.
    pub fn mood(&self) -> MoodLabel {
        let (v, a, d) = (self.valence, self.arousal, self.dominance);
        if a > 0.6 && v < -0.2 {
            MoodLabel::PanicStress
        } else if a > 0.5 && v > 0.5 {
            MoodLabel::Euphoric
        } else if v > 0.6 && a < 0.0 {
            MoodLabel::Content
        } else if v < -0.6 {
            MoodLabel::Depressed
        } else if d > 0.7 {
            MoodLabel::Confident
        } else if a < -0.6 {
            MoodLabel::Lethargic
        } else {
            MoodLabel::Neutral
        }
    }
}

/// Clamp one axis into [-1.0, 1.0], mapping NaN to the neutral origin.
#[inline]
pub fn clamp_axis(v: f32) -> f32 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(-1.0, 1.0)
    }
}

/// Addressable axis of the VAD vector (manual override target).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmotionComponent {
    Valence,
    Arousal,
    Dominance,
}

impl EmotionComponent {
    pub const ALL: [EmotionComponent; 3] = [Self::Valence, Self::Arousal, Self::Dominance];
}

impl fmt::Display for EmotionComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Valence => "valence",
            Self::Arousal => "arousal",
            Self::Dominance => "dominance",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for EmotionComponent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "valence" | "v" => Ok(Self::Valence),
            "arousal" | "a" => Ok(Self::Arousal),
            "dominance" | "d" => Ok(Self::Dominance),
            other => Err(format!("unknown emotion component: {other}")),
        }
    }
}

/// Categorical mood shown next to the VAD gauges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MoodLabel {
    PanicStress,
    Euphoric,
    Content,
    Depressed,
    Confident,
    Lethargic,
    Neutral,
}

impl MoodLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PanicStress => "PANIC / STRESS",
            Self::Euphoric => "EUPHORIC",
            Self::Content => "CONTENT",
            Self::Depressed => "DEPRESSED",
            Self::Confident => "CONFIDENT",
            Self::Lethargic => "LETHARGIC",
            Self::Neutral => "NEUTRAL / OBSERVING",
        }
    }
}

impl fmt::Display for MoodLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
