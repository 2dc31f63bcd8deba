#![forbid(unsafe_code)]

//! Engine configuration and construction-time validation.
//!
//! Configuration errors are programmer errors: they abort eagerly at
//! construction boundaries. Everything per-tick is total and never fails.

use std::fmt;

use spindle_core::{GestureConfig, LayoutConfig};

/// Default simulation rate.
pub const DEFAULT_FPS: f64 = 60.0;

/// Default boundary safety margin for wrap and visibility comparisons.
pub const DEFAULT_JOINT_SAFETY: f64 = 0.1;

/// Default deferred-work ring capacity.
pub const DEFAULT_SEQUENCER_CAPACITY: usize = 64;

/// Everything the engine accepts from the host at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Fixed simulation rate, steps per second. Must be finite and > 0.
    pub fps: f64,
    /// Friction coefficient in `(0, 1)`.
    pub friction: f64,
    /// Boundary safety margin for seam and edge comparisons.
    pub joint_safety: f64,
    /// Gesture thresholds and timeouts.
    pub gesture: GestureConfig,
    /// Static layout parameters.
    pub layout: LayoutConfig,
    /// Capacity of the deferred-work sequencer ring. Must be a non-zero
    /// power of two.
    pub sequencer_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fps: DEFAULT_FPS,
            friction: spindle_core::DEFAULT_FRICTION,
            joint_safety: DEFAULT_JOINT_SAFETY,
            gesture: GestureConfig::default(),
            layout: LayoutConfig::default(),
            sequencer_capacity: DEFAULT_SEQUENCER_CAPACITY,
        }
    }
}

impl EngineConfig {
    /// Check every construction-time constraint.
    ///
    /// # Errors
    /// Returns the first violated constraint.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.fps.is_finite() || self.fps <= 0.0 {
            return Err(ConfigError::InvalidFps(self.fps));
        }
        if !self.friction.is_finite() || self.friction <= 0.0 || self.friction >= 1.0 {
            return Err(ConfigError::InvalidFriction(self.friction));
        }
        Ok(())
    }
}

/// Construction-time configuration failures.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConfigError {
    /// Simulation rate must be finite and positive.
    InvalidFps(f64),
    /// Friction must lie strictly between 0 and 1.
    InvalidFriction(f64),
    /// The host viewport has no usable area.
    EmptyViewport,
    /// Sequencer capacity must be a non-zero power of two.
    InvalidSequencerCapacity(usize),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidFps(fps) => write!(f, "invalid fps value: {fps}"),
            Self::InvalidFriction(friction) => {
                write!(f, "friction must be in (0, 1), got {friction}")
            }
            Self::EmptyViewport => write!(f, "viewport has no usable area"),
            Self::InvalidSequencerCapacity(n) => {
                write!(f, "sequencer capacity must be a non-zero power of two, got {n}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
