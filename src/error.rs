//! Unified error type for the crate.
//!
//! Geometry never fails: degenerate traces produce empty heat maps. Errors are
//! reserved for invalid configuration, the wearable-data collaborator, and
//! malformed sync payloads.

use thiserror::Error;

/// Errors surfaced by the analytics pipeline.
#[derive(Error, Debug, Clone, PartialEq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Error))]
#[cfg_attr(feature = "ffi", uniffi(flat_error))]
pub enum HeatmapError {
    /// Heat map configuration would break tone mapping or binning.
    #[error("invalid heatmap configuration: {0}")]
    InvalidHeatmapConfig(String),

    /// Heart-rate zone configuration is unusable (non-positive max HR, thresholds not increasing).
    #[error("invalid zone configuration: {0}")]
    InvalidZoneConfig(String),

    /// The wearable store has no workout with this id.
    #[error("workout not found: {0}")]
    WorkoutNotFound(String),

    /// A query against the wearable-data source failed.
    #[error("health data source error: {0}")]
    Source(String),

    /// A sync update refers to a match this device does not know.
    #[error("match not found: {0}")]
    MatchNotFound(String),

    /// A sync payload from the watch is missing required fields or has bad values.
    #[error("malformed sync payload: {0}")]
    MalformedPayload(String),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, HeatmapError>;
