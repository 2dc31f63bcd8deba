#![forbid(unsafe_code)]

//! Process-wide engine dirty flags.
//!
//! A packed flag set shared across phases within a tick. Gestures set
//! `INTERACTED`, the Input-phase guard reads it, and the Cleanup phase
//! clears it.

use bitflags::bitflags;

bitflags! {
    /// Dirty flags consumed by phase guards.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct EngineFlags: u8 {
        /// A drag interaction is in progress.
        const GESTURE_RUNNING = 0b0000_0001;
        /// Input arrived since the last Cleanup phase.
        const INTERACTED = 0b0000_0010;
    }
}
