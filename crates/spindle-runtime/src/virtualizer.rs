#![forbid(unsafe_code)]

//! Wrap-boundary detection and atomic slot remapping.
//!
//! The strip of pooled slots is finite; the scroll space is not. When the
//! interpolated offset crosses a content bound, the virtualizer translates
//! every motion scalar by one full strip period and, in the same tick,
//! remaps the slots nearest the seam to the adjacent wrap copy
//! (`viewport_offset` ±1, `virtual_index` shifted by the pool size). The
//! per-slot translation implied by a `viewport_offset` unit equals the
//! motion jump, so for every slot whose offset changes with the jump the
//! two cancel and its rendered position is unchanged. Slots that do move
//! are off-screen when they do.
//!
//! # Invariants
//!
//! 1. Jump and remap are applied within one `tick` call; no intermediate
//!    state is ever rendered.
//! 2. `virtual_index mod total_slots` always equals `real_index`: wraps
//!    shift indices by whole pool multiples.
//! 3. With no ghost slots the virtualizer is a structural no-op.
//!
//! # Failure Modes
//!
//! None at runtime: all arithmetic is total. A viewport taller than the
//! ghost buffer can cover would under-fill the seam band, which layout
//! sizing (`ghost_slots = ghost_mult × materialized_slots`) prevents.

use spindle_core::{LayoutMetrics, MotionState, SlotPool};
use tracing::debug;

/// Which seam remap is currently applied to the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WrapOp {
    /// No boundary slots are remapped.
    #[default]
    None,
    /// The trailing slots render one period early, filling the space
    /// before the strip start.
    ShiftedUp,
    /// The leading slots render one period late, filling the space past
    /// the strip end.
    ShiftedDown,
}

/// Detects wrap crossings and applies the jump + remap pair.
#[derive(Debug, Clone)]
pub struct LoopVirtualizer {
    joint_safety: f64,
    /// Last applied operation, stored explicitly so re-application with
    /// unchanged motion is a cheap no-op.
    last_op: WrapOp,
}

impl LoopVirtualizer {
    /// Create a virtualizer with the given boundary safety margin.
    #[must_use]
    pub fn new(joint_safety: f64) -> Self {
        Self {
            joint_safety,
            last_op: WrapOp::None,
        }
    }

    /// The currently applied seam operation.
    #[inline]
    #[must_use]
    pub fn last_op(&self) -> WrapOp {
        self.last_op
    }

    /// Forget the applied operation, e.g. after the pool itself was
    /// rebuilt on a layout change.
    pub fn reset(&mut self) {
        self.last_op = WrapOp::None;
    }

    /// Inspect the motion offset against the content bounds and wrap if a
    /// seam was crossed. Returns whether anything changed.
    pub fn tick(
        &mut self,
        motion: &mut MotionState,
        metrics: &LayoutMetrics,
        pool: &mut SlotPool,
    ) -> bool {
        if metrics.ghost_slots == 0 || pool.is_empty() {
            return false;
        }

        let period = metrics.wrap_period();
        let viewport = metrics.viewport_height;
        let content = metrics.content_height;

        // Direction-gated period jump at the scroll bounds. The top bound
        // is 0; the bottom bound is where the strip end meets the viewport
        // bottom. The safety margin keeps the comparison off the exact
        // seam.
        let top_bound = self.joint_safety;
        let bottom_bound = viewport - content + self.joint_safety;
        let jumped = match motion.direction {
            1 if motion.offset >= top_bound => {
                motion.translate(-period);
                true
            }
            -1 if motion.offset <= bottom_bound => {
                motion.translate(period);
                true
            }
            _ => false,
        };

        // Seam band from the post-jump offset. Within `[0, viewport]` the
        // space before the strip start is on screen; at or below
        // `viewport - period` the wrap copy of the strip head is.
        let desired = if motion.offset >= 0.0 && motion.offset <= viewport {
            WrapOp::ShiftedUp
        } else if motion.offset <= viewport - period {
            WrapOp::ShiftedDown
        } else {
            WrapOp::None
        };

        let remapped = desired != self.last_op;
        if remapped {
            let band = band_size(metrics).min(pool.len());
            let total = pool.len() as i64;

            pool.reset_wrap();
            match desired {
                WrapOp::ShiftedUp => {
                    let start = pool.len() - band;
                    for slot in &mut pool.slots_mut()[start..] {
                        slot.virtual_index -= total;
                        slot.viewport_offset = -1;
                    }
                }
                WrapOp::ShiftedDown => {
                    for slot in &mut pool.slots_mut()[..band] {
                        slot.virtual_index += total;
                        slot.viewport_offset = 1;
                    }
                }
                WrapOp::None => {}
            }

            debug!(
                from = ?self.last_op,
                to = ?desired,
                offset = motion.offset,
                jumped,
                "wrap seam remap"
            );
            self.last_op = desired;
        }

        jumped || remapped
    }
}

/// Slots needed to cover the viewport across a seam.
fn band_size(metrics: &LayoutMetrics) -> usize {
    if metrics.slot_height <= 0.0 {
        return 0;
    }
    (metrics.viewport_height / metrics.slot_height).ceil() as usize + 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use spindle_core::{LayoutConfig, ViewportRect};

    fn metrics() -> LayoutMetrics {
        LayoutMetrics::compute(&LayoutConfig::default(), ViewportRect::new(1280.0, 800.0))
    }

    fn rendered(offset: f64, metrics: &LayoutMetrics, pool: &SlotPool) -> Vec<f64> {
        pool.slots()
            .iter()
            .map(|s| {
                offset
                    + metrics.slot_position(s.real_index)
                    + f64::from(s.viewport_offset) * metrics.wrap_period()
            })
            .collect()
    }

    fn visible(positions: &[f64], metrics: &LayoutMetrics) -> Vec<usize> {
        positions
            .iter()
            .enumerate()
            .filter(|(_, p)| **p > -metrics.slot_height && **p < metrics.viewport_height)
            .map(|(i, _)| i)
            .collect()
    }

    #[test]
    fn rest_position_extends_the_strip_upward() {
        let m = metrics();
        let mut pool = SlotPool::new(m.total_slots);
        let mut motion = MotionState::new();
        let mut v = LoopVirtualizer::new(0.1);

        assert!(v.tick(&mut motion, &m, &mut pool));
        assert_eq!(v.last_op(), WrapOp::ShiftedUp);

        let total = pool.len() as i64;
        let wrapped: Vec<_> = pool
            .slots()
            .iter()
            .filter(|s| s.viewport_offset != 0)
            .collect();
        assert!(!wrapped.is_empty());
        for slot in wrapped {
            assert_eq!(slot.viewport_offset, -1);
            assert_eq!(slot.virtual_index, slot.real_index as i64 - total);
        }
        // The jump triggers are direction-gated; rest does not jump.
        assert_eq!(motion.offset, 0.0);
    }

    #[test]
    fn middle_of_strip_needs_no_remap() {
        let m = metrics();
        let mut pool = SlotPool::new(m.total_slots);
        let mut motion = MotionState::new();
        motion.current = -3.0 * m.viewport_height;
        motion.previous = motion.current;
        motion.offset = motion.current;
        let mut v = LoopVirtualizer::new(0.1);

        assert!(!v.tick(&mut motion, &m, &mut pool));
        assert!(pool.is_unwrapped());
    }

    #[test]
    fn backward_crossing_keeps_visible_slots_stationary() {
        let m = metrics();
        let mut pool = SlotPool::new(m.total_slots);
        let mut motion = MotionState::new();
        let mut v = LoopVirtualizer::new(0.1);

        // Approach the top seam from rest, then cross it moving backward.
        v.tick(&mut motion, &m, &mut pool);
        motion.current = 0.2;
        motion.previous = 0.15;
        motion.offset = 0.2;
        motion.direction = 1;

        let before = rendered(motion.offset, &m, &pool);
        let on_screen = visible(&before, &m);
        assert!(!on_screen.is_empty());

        assert!(v.tick(&mut motion, &m, &mut pool));
        let after = rendered(motion.offset, &m, &pool);

        assert!((motion.offset - (0.2 - m.wrap_period())).abs() < 1e-9);
        for index in on_screen {
            assert!(
                (before[index] - after[index]).abs() < 1e-9,
                "slot {index} moved across the seam"
            );
        }
    }

    #[test]
    fn forward_crossing_keeps_visible_slots_stationary() {
        let m = metrics();
        let mut pool = SlotPool::new(m.total_slots);
        let mut motion = MotionState::new();
        let mut v = LoopVirtualizer::new(0.1);

        // Deep in the strip, just past the bottom bound, moving forward.
        let bottom = m.viewport_height - m.content_height;
        motion.current = bottom + 0.05;
        motion.previous = motion.current + 0.1;
        motion.offset = motion.current;
        motion.direction = -1;

        // Prior tick inside the bottom band puts the head copy in place.
        let mut staged = motion.clone();
        staged.offset = m.viewport_height - m.wrap_period() - 1.0;
        staged.current = staged.offset;
        staged.direction = 0;
        v.tick(&mut staged, &m, &mut pool);
        assert_eq!(v.last_op(), WrapOp::ShiftedDown);

        let before = rendered(motion.offset, &m, &pool);
        let on_screen = visible(&before, &m);
        assert!(!on_screen.is_empty());

        assert!(v.tick(&mut motion, &m, &mut pool));
        let after = rendered(motion.offset, &m, &pool);

        for index in on_screen {
            assert!(
                (before[index] - after[index]).abs() < 1e-9,
                "slot {index} moved across the seam"
            );
        }
    }

    #[test]
    fn reapplication_without_motion_is_a_no_op() {
        let m = metrics();
        let mut pool = SlotPool::new(m.total_slots);
        let mut motion = MotionState::new();
        let mut v = LoopVirtualizer::new(0.1);

        assert!(v.tick(&mut motion, &m, &mut pool));
        assert!(!v.tick(&mut motion, &m, &mut pool));
        assert!(!v.tick(&mut motion, &m, &mut pool));
    }

    #[test]
    fn zero_ghost_slots_is_structurally_inert() {
        let config = LayoutConfig {
            ghost_mult: 0,
            ..LayoutConfig::default()
        };
        let m = LayoutMetrics::compute(&config, ViewportRect::new(1280.0, 800.0));
        let mut pool = SlotPool::new(m.total_slots);
        let mut motion = MotionState::new();
        motion.direction = 1;
        motion.offset = 5.0;
        motion.current = 5.0;
        let mut v = LoopVirtualizer::new(0.1);

        assert!(!v.tick(&mut motion, &m, &mut pool));
        assert!(pool.is_unwrapped());
        assert_eq!(motion.offset, 5.0);
    }

    #[test]
    fn virtual_indices_are_conserved_mod_total() {
        let m = metrics();
        let mut pool = SlotPool::new(m.total_slots);
        let mut motion = MotionState::new();
        let mut v = LoopVirtualizer::new(0.1);
        let total = pool.len() as i64;

        let offsets = [
            (0.0, 0),
            (0.3, 1),
            (-400.0, -1),
            (m.viewport_height - m.content_height - 0.5, -1),
            (-200.0, 1),
            (0.2, 1),
        ];
        for (offset, direction) in offsets {
            motion.offset = offset;
            motion.current = offset;
            motion.direction = direction;
            v.tick(&mut motion, &m, &mut pool);

            let mut residues: Vec<i64> = pool
                .slots()
                .iter()
                .map(|s| s.virtual_index.rem_euclid(total))
                .collect();
            residues.sort_unstable();
            let expected: Vec<i64> = (0..total).collect();
            assert_eq!(residues, expected);
        }
    }

    proptest! {
        /// Any scrub sequence preserves the virtual-index multiset mod the
        /// pool size and never remaps a slot further than one wrap copy.
        #[test]
        fn any_scrub_sequence_conserves_indices(
            ticks in proptest::collection::vec(
                (-7000.0_f64..1500.0, -1_i8..=1),
                1..48,
            )
        ) {
            let m = metrics();
            let mut pool = SlotPool::new(m.total_slots);
            let mut motion = MotionState::new();
            let mut v = LoopVirtualizer::new(0.1);
            let total = pool.len() as i64;

            for (offset, direction) in ticks {
                motion.offset = offset;
                motion.current = offset;
                motion.direction = direction;
                v.tick(&mut motion, &m, &mut pool);

                let mut residues: Vec<i64> = pool
                    .slots()
                    .iter()
                    .map(|s| s.virtual_index.rem_euclid(total))
                    .collect();
                residues.sort_unstable();
                prop_assert_eq!(residues, (0..total).collect::<Vec<_>>());
                for slot in pool.slots() {
                    prop_assert!(slot.viewport_offset.abs() <= 1);
                }
            }
        }
    }
}
