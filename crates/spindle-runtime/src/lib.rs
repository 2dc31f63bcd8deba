#![forbid(unsafe_code)]

//! Spindle Runtime
//!
//! This crate composes the leaf types from `spindle-core` into a running
//! engine: a fixed-timestep frame scheduler, a phase pipeline that orders
//! per-tick work, the loop virtualizer that makes a fixed slot pool read as
//! an unbounded strip, a visibility tracker, a deferred-work sequencer, and
//! the [`Engine`] facade that wires them all to a host event surface.
//!
//! # Key Components
//!
//! - [`FrameScheduler`] - Fixed-timestep accumulator decoupling simulation
//!   rate from display callbacks
//! - [`Pipeline`] / [`PhaseBuilder`] - Ordered, guarded per-tick transforms
//! - [`LoopVirtualizer`] - Wrap-boundary detection and atomic slot remap
//! - [`VisibilityTracker`] - Per-slot enter/exit transition records
//! - [`TaskSequencer`] - One-step-per-tick FIFO for staggered host work
//! - [`Engine`] - Composition root exposing the host event/output surface
//!
//! # How it fits in the system
//! The runtime is the orchestrator: host callbacks (pointer, wheel, resize,
//! visibility, frame) enter through [`Engine`], flow through the four
//! pipeline phases, and leave as a scroll offset, slot assignments, and
//! visibility records for the host to apply.

pub mod config;
pub mod engine;
pub mod pipeline;
pub mod scheduler;
pub mod sequencer;
pub mod virtualizer;
pub mod visibility;

pub use config::{ConfigError, EngineConfig};
pub use engine::{Engine, EngineState, HostEvent, SlotAssignment};
pub use pipeline::{PhaseBuilder, PhaseRunner, Pipeline, Phase};
pub use scheduler::{FramePlan, FrameScheduler, TimeParams};
pub use sequencer::{
    SequenceDirection, SequenceHandle, SequencerError, StepFn, StepOutcome, TaskSequencer,
};
pub use virtualizer::{LoopVirtualizer, WrapOp};
pub use visibility::{VisibilityRecord, VisibilityTracker, VisibilityTransition};
