#![forbid(unsafe_code)]

//! Per-slot viewport intersection with edge-transition records.
//!
//! Each render tick the tracker computes every slot's rendered position
//! from the motion offset, its static strip position, and its wrap-copy
//! translation, then compares the in-view verdict against the previously
//! observed one. Only changes produce records, so the host sees a stream
//! of enter/exit transitions rather than a full per-frame bitmap.
//!
//! The edge thresholds carry the joint-safety margin, keeping a slot that
//! sits exactly on an edge from flapping between states.

use spindle_core::{LayoutMetrics, SlotPool};

/// Direction of a visibility change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibilityTransition {
    /// The slot intersected the viewport this tick.
    Entered,
    /// The slot left the viewport this tick.
    Exited,
}

/// One transition, keyed by the slot's pool identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibilityRecord {
    /// `real_index` of the slot that changed.
    pub index: usize,
    /// Which way it changed.
    pub transition: VisibilityTransition,
}

/// Detects per-slot enter/exit transitions against the viewport.
#[derive(Debug, Clone)]
pub struct VisibilityTracker {
    pitch: f64,
    period: f64,
    /// A slot is in view while its position lies in `(top_edge, bottom_edge)`.
    top_edge: f64,
    bottom_edge: f64,
    in_view: Vec<bool>,
    records: Vec<VisibilityRecord>,
}

impl VisibilityTracker {
    /// Create a tracker for the given layout. Every slot starts out of
    /// view, so the first tick reports the initially visible set.
    #[must_use]
    pub fn new(metrics: &LayoutMetrics, joint_safety: f64) -> Self {
        Self {
            pitch: metrics.slot_pitch(),
            period: metrics.wrap_period(),
            top_edge: -metrics.slot_height - metrics.container_gap + joint_safety,
            bottom_edge: metrics.viewport_height + metrics.container_gap - joint_safety,
            in_view: vec![false; metrics.total_slots],
            records: Vec::new(),
        }
    }

    /// Compare current positions against the cached verdicts, appending a
    /// record per transition.
    pub fn tick(&mut self, offset: f64, pool: &SlotPool) {
        for slot in pool.slots() {
            let position = offset
                + slot.real_index as f64 * self.pitch
                + f64::from(slot.viewport_offset) * self.period;
            let inside = position > self.top_edge && position < self.bottom_edge;

            let seen = &mut self.in_view[slot.real_index];
            if inside != *seen {
                *seen = inside;
                self.records.push(VisibilityRecord {
                    index: slot.real_index,
                    transition: if inside {
                        VisibilityTransition::Entered
                    } else {
                        VisibilityTransition::Exited
                    },
                });
            }
        }
    }

    /// Whether a slot was in view as of the last tick.
    #[must_use]
    pub fn is_in_view(&self, real_index: usize) -> bool {
        self.in_view.get(real_index).copied().unwrap_or(false)
    }

    /// Drain the accumulated transition records.
    pub fn take_records(&mut self) -> Vec<VisibilityRecord> {
        std::mem::take(&mut self.records)
    }
}
