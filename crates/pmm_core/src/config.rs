use crate::error::ConfigError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Lowest accepted expansion threshold.
pub const MIN_EXPANSION_THRESHOLD: f32 = 0.1;
/// Highest accepted expansion threshold.
pub const MAX_EXPANSION_THRESHOLD: f32 = 0.99;
/// Largest accepted `max_mem_slots`.
pub const MAX_SLOT_CEILING: usize = 1 << 20;
/// Largest accepted `obs_dim` and `thought_dim`.
pub const MAX_VECTOR_DIM: usize = 1024;

// ============================================================================
// Top-level config
// ============================================================================

/// Everything the host reads at startup: the brain shape plus tuning for the
/// emotion engine and the heartbeat.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PmmConfig {
    pub brain: BrainConfig,
    pub emotion: EmotionConfig,
    pub heartbeat: HeartbeatSettings,
}

impl PmmConfig {
    /// Load config from a TOML file, falling back to defaults for missing fields.
    /// After loading, env var overrides are applied and the brain section is
    /// validated.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;
        let mut config: PmmConfig =
            toml::from_str(&content).with_context(|| "Failed to parse TOML config")?;
        config.apply_env_overrides();
        config
            .brain
            .validate()
            .with_context(|| "Invalid [brain] section")?;
        Ok(config)
    }

    /// Try to load from path; if the file is missing or invalid, return
    /// defaults with env overrides.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::info!("Config file not found or invalid ({:#}), using defaults", e);
                let mut cfg = Self::default();
                cfg.apply_env_overrides();
                if cfg.brain.validate().is_err() {
                    tracing::warn!("Env overrides produced an invalid brain config, ignoring them");
                    cfg.brain = BrainConfig::default();
                }
                cfg
            }
        }
    }

    /// Apply environment variable overrides on top of file-based config.
    fn apply_env_overrides(&mut self) {
        if let Some(n) = env_parse("PMM_START_MEM_SLOTS") {
            self.brain.start_mem_slots = n;
        }
        if let Some(n) = env_parse("PMM_MAX_MEM_SLOTS") {
            self.brain.max_mem_slots = n;
        }
        if let Some(n) = env_parse("PMM_EXPANSION_THRESHOLD") {
            self.brain.expansion_threshold = n;
        }
        if let Some(n) = env_parse("PMM_EMOTION_LEARNING_RATE") {
            self.emotion.learning_rate = n;
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

// ============================================================================
// Sub-configs
// ============================================================================

/// Shape of the simulated brain. Immutable for the lifetime of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrainConfig {
    pub obs_dim: usize,
    pub thought_dim: usize,
    pub start_mem_slots: usize,
    pub max_mem_slots: usize,
    /// Pressure above which capacity doubles.
    pub expansion_threshold: f32,
}

impl Default for BrainConfig {
    fn default() -> Self {
        Self {
            obs_dim: 96,
            thought_dim: 32,
            start_mem_slots: 256,
            max_mem_slots: 2048,
            expansion_threshold: 0.85,
        }
    }
}

impl BrainConfig {
    /// Reject configurations the controller cannot run.
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.start_mem_slots > self.max_mem_slots {
            return Err(ConfigError::StartExceedsMax {
                start: self.start_mem_slots,
                max: self.max_mem_slots,
            });
        }
        if self.max_mem_slots > MAX_SLOT_CEILING {
            return Err(ConfigError::SlotCeilingTooLarge {
                max: self.max_mem_slots,
                limit: MAX_SLOT_CEILING,
            });
        }
        for (field, value) in [("obs_dim", self.obs_dim), ("thought_dim", self.thought_dim)] {
            if value > MAX_VECTOR_DIM {
                return Err(ConfigError::DimensionTooLarge {
                    field,
                    value,
                    limit: MAX_VECTOR_DIM,
                });
            }
        }
        if !(MIN_EXPANSION_THRESHOLD..=MAX_EXPANSION_THRESHOLD).contains(&self.expansion_threshold)
        {
            return Err(ConfigError::ThresholdOutOfRange {
                value: self.expansion_threshold,
                min: MIN_EXPANSION_THRESHOLD,
                max: MAX_EXPANSION_THRESHOLD,
            });
        }
        if self.start_mem_slots < 1 {
            return Err(ConfigError::NoSlots);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmotionConfig {
    /// Smoothing rate toward the pressure-driven target, clamped to [0.01, 1.0].
    pub learning_rate: f32,
}

impl Default for EmotionConfig {
    fn default() -> Self {
        Self { learning_rate: 0.1 }
    }
}

/// Timer periods for auto-run, per mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HeartbeatSettings {
    pub inference_interval_ms: u64,
    pub training_interval_ms: u64,
}

impl Default for HeartbeatSettings {
    fn default() -> Self {
        Self {
            inference_interval_ms: 500,
            training_interval_ms: 200,
        }
    }
}

impl HeartbeatSettings {
    pub fn inference_interval(&self) -> Duration {
        Duration::from_millis(self.inference_interval_ms.max(1))
    }

    pub fn training_interval(&self) -> Duration {
        Duration::from_millis(self.training_interval_ms.max(1))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = PmmConfig::default();
        assert_eq!(cfg.brain.start_mem_slots, 256);
        assert_eq!(cfg.brain.max_mem_slots, 2048);
        assert!((cfg.brain.expansion_threshold - 0.85).abs() < 1e-6);
        assert!((cfg.emotion.learning_rate - 0.1).abs() < 1e-6);
        assert_eq!(cfg.heartbeat.inference_interval_ms, 500);
        assert_eq!(cfg.heartbeat.training_interval_ms, 200);
        assert!(cfg.brain.validate().is_ok());
    }

    #[test]
    fn test_validate_start_exceeds_max() {
        let cfg = BrainConfig {
            start_mem_slots: 10,
            max_mem_slots: 5,
            expansion_threshold: 0.5,
            ..Default::default()
        };
        let err = cfg.validate().unwrap_err();
        assert_eq!(err, ConfigError::StartExceedsMax { start: 10, max: 5 });
        assert!(err.to_string().contains("cannot be greater"));
    }

    #[test]
    fn test_validate_threshold_bounds() {
        let mut cfg = BrainConfig::default();
        cfg.expansion_threshold = 0.05;
        assert!(matches!(cfg.validate(), Err(ConfigError::ThresholdOutOfRange { .. })));
        cfg.expansion_threshold = 1.0;
        assert!(matches!(cfg.validate(), Err(ConfigError::ThresholdOutOfRange { .. })));
        cfg.expansion_threshold = f32::NAN;
        assert!(cfg.validate().is_err());
        cfg.expansion_threshold = 0.1;
        assert!(cfg.validate().is_ok());
        cfg.expansion_threshold = 0.99;
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_validate_zero_slots() {
        let cfg = BrainConfig {
            start_mem_slots: 0,
            ..Default::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::NoSlots));
    }

    #[test]
    fn test_validate_upper_bounds() {
        let huge = BrainConfig {
            start_mem_slots: usize::MAX / 2,
            max_mem_slots: usize::MAX / 2,
            expansion_threshold: 0.5,
            ..Default::default()
        };
        assert_eq!(
            huge.validate(),
            Err(ConfigError::SlotCeilingTooLarge {
                max: usize::MAX / 2,
                limit: MAX_SLOT_CEILING,
            })
        );

        let at_ceiling = BrainConfig {
            start_mem_slots: 8,
            max_mem_slots: MAX_SLOT_CEILING,
            ..Default::default()
        };
        assert!(at_ceiling.validate().is_ok());

        let wide = BrainConfig {
            thought_dim: MAX_VECTOR_DIM + 1,
            ..Default::default()
        };
        let err = wide.validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::DimensionTooLarge {
                field: "thought_dim",
                ..
            }
        ));
        assert!(err.to_string().contains("thought_dim"));

        let wide_obs = BrainConfig {
            obs_dim: usize::MAX,
            ..Default::default()
        };
        assert!(matches!(
            wide_obs.validate(),
            Err(ConfigError::DimensionTooLarge { field: "obs_dim", .. })
        ));
    }

    #[test]
    fn test_parse_minimal_toml() {
        let toml_str = r#"
[brain]
start_mem_slots = 4
max_mem_slots = 16
"#;
        let cfg: PmmConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.brain.start_mem_slots, 4);
        assert_eq!(cfg.brain.max_mem_slots, 16);
        // Defaults for unspecified fields
        assert_eq!(cfg.brain.thought_dim, 32);
        assert_eq!(cfg.heartbeat.inference_interval_ms, 500);
    }

    #[test]
    fn test_parse_full_toml() {
        let toml_str = r#"
[brain]
obs_dim = 48
thought_dim = 16
start_mem_slots = 8
max_mem_slots = 64
expansion_threshold = 0.6

[emotion]
learning_rate = 0.25

[heartbeat]
inference_interval_ms = 100
training_interval_ms = 50
"#;
        let cfg: PmmConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.brain.obs_dim, 48);
        assert_eq!(cfg.brain.thought_dim, 16);
        assert!((cfg.emotion.learning_rate - 0.25).abs() < 1e-6);
        assert_eq!(cfg.heartbeat.training_interval(), Duration::from_millis(50));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("pmm.toml");
        std::fs::write(&path, "[brain]\nstart_mem_slots = 8\nmax_mem_slots = 32\n").unwrap();
        let cfg = PmmConfig::load(&path).unwrap();
        assert_eq!(cfg.brain.start_mem_slots, 8);
        assert_eq!(cfg.brain.max_mem_slots, 32);

        std::fs::write(&path, "[brain]\nstart_mem_slots = 10\nmax_mem_slots = 5\n").unwrap();
        let err = PmmConfig::load(&path).unwrap_err();
        assert!(format!("{err:#}").contains("cannot be greater than max memory"));

        std::fs::write(&path, "[brain\nnot toml").unwrap();
        assert!(PmmConfig::load(&path).is_err());
    }

    #[test]
    fn test_env_overrides_and_defaults() {
        std::env::set_var("PMM_EXPANSION_THRESHOLD", "0.7");
        let mut cfg = PmmConfig::default();
        cfg.apply_env_overrides();
        assert!((cfg.brain.expansion_threshold - 0.7).abs() < 1e-6);
        std::env::remove_var("PMM_EXPANSION_THRESHOLD");

        let cfg = PmmConfig::load_or_default("/nonexistent/pmm.toml");
        assert_eq!(cfg.brain, BrainConfig::default());
    }
}
