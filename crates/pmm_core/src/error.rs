//! Error types for the PMM core library.

use thiserror::Error;

/// Reasons a `BrainConfig` is refused before it replaces the running one.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Start capacity larger than the ceiling.
    #[error("Start memory ({start}) cannot be greater than max memory ({max})")]
    StartExceedsMax { start: usize, max: usize },

    /// Expansion threshold outside the accepted band.
    #[error("Threshold must be between {min} and {max}, got {value}")]
    ThresholdOutOfRange { value: f32, min: f32, max: f32 },

    /// Slot ceiling past what a snapshot can allocate.
    #[error("Max memory ({max}) exceeds the supported ceiling of {limit} slots")]
    SlotCeilingTooLarge { max: usize, limit: usize },

    /// Observation or thought width past the supported size.
    #[error("{field} ({value}) exceeds the supported maximum of {limit}")]
    DimensionTooLarge {
        field: &'static str,
        value: usize,
        limit: usize,
    },

    /// Start capacity of zero slots.
    #[error("Memory slots must be positive")]
    NoSlots,
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, ConfigError>;
