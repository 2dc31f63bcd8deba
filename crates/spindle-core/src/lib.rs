#![forbid(unsafe_code)]

//! Core: motion simulation, layout metrics, slot pool, and input normalization.
//!
//! # Role in Spindle
//! `spindle-core` is the leaf layer. It owns the 1D motion state and its
//! fixed-tick friction integrator, the layout metrics derived from a viewport
//! rectangle, the pooled slot records that virtualize an unbounded content
//! strip, and the gesture state machines that turn raw pointer/wheel input
//! into a small closed set of delta events.
//!
//! # How it fits in the system
//! The runtime (`spindle-runtime`) composes these pieces into a phase
//! pipeline driven by a fixed-timestep scheduler. Nothing in this crate
//! touches a clock or a host surface: timestamps arrive as host-supplied
//! milliseconds, which keeps every component deterministic under test.

pub mod axis;
pub mod bitset;
pub mod flags;
pub mod gesture;
pub mod layout;
pub mod motion;
pub mod slot;

pub use axis::Axis;
pub use bitset::{BitSet8, BitSet16, BitSet32, BitSetError, XBitSet};
pub use flags::EngineFlags;
pub use gesture::{
    DragTracker, GestureConfig, GestureEvent, GesturePhase, GestureSource, PointerSample,
    WheelNormalizer,
};
pub use layout::{LayoutConfig, LayoutMetrics, ViewportRect};
pub use motion::{MotionIntegrator, MotionState, DEFAULT_FRICTION, SETTLE_THRESHOLD};
pub use slot::{Slot, SlotPool};
