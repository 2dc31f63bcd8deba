#![forbid(unsafe_code)]

//! Spindle public facade crate.
//!
//! This crate provides the stable, ergonomic surface area for hosts. It
//! re-exports the engine and its supporting types from the internal crates
//! and offers a lightweight prelude for day-to-day usage.
//!
//! A typical host builds an [`Engine`] once, forwards pointer/wheel/resize
//! events into [`Engine::handle_event`], and calls [`Engine::on_frame`] from
//! its display callback, reading back the scroll offset, slot assignments,
//! and visibility transitions each frame.

use std::fmt;

// --- Core re-exports -------------------------------------------------------

pub use spindle_core::{
    Axis, BitSet8, BitSet16, BitSet32, BitSetError, DragTracker, EngineFlags, GestureConfig,
    GestureEvent, GesturePhase, GestureSource, LayoutConfig, LayoutMetrics, MotionIntegrator,
    MotionState, PointerSample, Slot, SlotPool, ViewportRect, WheelNormalizer, XBitSet,
};

// --- Runtime re-exports ----------------------------------------------------

pub use spindle_runtime::{
    ConfigError, Engine, EngineConfig, FramePlan, FrameScheduler, HostEvent, LoopVirtualizer,
    Phase, PhaseBuilder, PhaseRunner, Pipeline, SequenceDirection, SequenceHandle, SequencerError,
    SlotAssignment, StepFn, StepOutcome, TaskSequencer, TimeParams, VisibilityRecord,
    VisibilityTracker,
    VisibilityTransition, WrapOp,
};

// --- Errors ---------------------------------------------------------------

/// Top-level error type for spindle hosts.
#[derive(Debug)]
pub enum Error {
    /// Engine construction or configuration failure.
    Config(ConfigError),
    /// Deferred-work sequencer failure.
    Sequencer(SequencerError),
    /// Bit set serialization failure.
    BitSet(BitSetError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(err) => write!(f, "{err}"),
            Self::Sequencer(err) => write!(f, "{err}"),
            Self::BitSet(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Sequencer(err) => Some(err),
            Self::BitSet(err) => Some(err),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

impl From<SequencerError> for Error {
    fn from(err: SequencerError) -> Self {
        Self::Sequencer(err)
    }
}

impl From<BitSetError> for Error {
    fn from(err: BitSetError) -> Self {
        Self::BitSet(err)
    }
}

/// Standard result type for spindle APIs.
pub type Result<T> = std::result::Result<T, Error>;

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    //! Everything a host needs to drive an engine.
    pub use crate::{
        Engine, EngineConfig, Error, HostEvent, PointerSample, Result, SlotAssignment,
        ViewportRect, VisibilityRecord, VisibilityTransition,
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_converts_and_chains() {
        let err: Error = ConfigError::EmptyViewport.into();
        assert!(matches!(err, Error::Config(_)));
        assert!(std::error::Error::source(&err).is_some());
        assert!(format!("{err}").contains("viewport"));
    }

    #[test]
    fn facade_builds_a_working_engine() -> Result<()> {
        let mut engine = Engine::new(EngineConfig::default(), ViewportRect::new(1280.0, 800.0))?;
        engine.start();
        assert!(engine.on_frame(0.0));
        Ok(())
    }

    #[test]
    fn sequencer_error_converts() {
        let err: Error = SequencerError::Full.into();
        assert!(matches!(err, Error::Sequencer(SequencerError::Full)));
    }
}
