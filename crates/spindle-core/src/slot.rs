#![forbid(unsafe_code)]

//! The pooled slot records that virtualize an unbounded content strip.
//!
//! A fixed pool of [`Slot`]s is remapped onto a logically unbounded sequence
//! of content indices. `real_index` is a slot's immutable pool identity;
//! `virtual_index` is the content index it currently represents; and
//! `viewport_offset` records which wrap copy of the strip it renders
//! (-1 before, 0 within, +1 after).
//!
//! # Invariants
//!
//! 1. At any instant the pool partitions into at most three
//!    `viewport_offset` groups, and only the slots nearest a wrap boundary
//!    carry ±1.
//! 2. `virtual_index ≡ real_index (mod total)` always holds: wrap shifts
//!    move indices by whole multiples of the pool size.

/// One pooled renderable unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    /// Stable pool identity in `0..total`.
    pub real_index: usize,
    /// Logical content index currently represented.
    pub virtual_index: i64,
    /// Which wrap copy of the strip this slot renders: -1, 0, or +1.
    pub viewport_offset: i8,
}

impl Slot {
    /// A slot in its unwrapped home position.
    #[must_use]
    pub const fn new(real_index: usize) -> Self {
        Self {
            real_index,
            virtual_index: real_index as i64,
            viewport_offset: 0,
        }
    }

    /// Reset to the unwrapped home position.
    pub const fn reset(&mut self) {
        self.virtual_index = self.real_index as i64;
        self.viewport_offset = 0;
    }
}

/// The fixed pool of slots backing the infinite strip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotPool {
    slots: Vec<Slot>,
}

impl SlotPool {
    /// Create a pool of `total` slots, each at its home position.
    #[must_use]
    pub fn new(total: usize) -> Self {
        Self {
            slots: (0..total).map(Slot::new).collect(),
        }
    }

    /// Number of slots in the pool.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the pool is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Immutable view of all slots.
    #[inline]
    #[must_use]
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Mutable view of all slots.
    #[inline]
    pub fn slots_mut(&mut self) -> &mut [Slot] {
        &mut self.slots
    }

    /// Reset every slot to its home position.
    pub fn reset_wrap(&mut self) {
        for slot in &mut self.slots {
            slot.reset();
        }
    }

    /// Whether every slot sits at its home position.
    #[must_use]
    pub fn is_unwrapped(&self) -> bool {
        self.slots
            .iter()
            .all(|s| s.viewport_offset == 0 && s.virtual_index == s.real_index as i64)
    }
}
