#![forbid(unsafe_code)]

//! One-step-per-tick FIFO sequencer for deferred host work.
//!
//! Expensive per-item work (revealing the grid cells of a newly visible
//! slot, say) is enqueued as an ordered group of steps and drained at most
//! one step per tick, bounding per-frame cost to O(1) regardless of item
//! count. Groups drain strictly FIFO: the oldest live group finishes (or is
//! cancelled) before a newer one starts.
//!
//! Backed by a fixed circular buffer of power-of-two capacity so ring
//! arithmetic is a mask.
//!
//! # Invariants
//!
//! 1. `tick` executes at most one step, from the oldest pending group.
//! 2. A step reporting [`StepOutcome::Retry`] stays at the group cursor and
//!    runs again on a later tick; [`StepOutcome::Done`] advances the cursor.
//! 3. A cancelled group's remaining steps are skipped, never executed.

use std::fmt;

/// Result of running one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The step completed; advance to the next one.
    Done,
    /// Not finished; run this step again on a later tick.
    Retry,
}

/// Drain order of a group's steps relative to their declared order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceDirection {
    /// Steps run in declared order.
    Forward,
    /// Steps run back to front.
    Reverse,
}

/// One deferred unit of work.
pub type StepFn = Box<dyn FnMut() -> StepOutcome>;

/// Identifies an enqueued group for cancellation.
///
/// Carries the group's generation alongside its ring slot, so a handle kept
/// past its group's lifetime can never cancel a later occupant of the same
/// slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceHandle {
    slot: usize,
    generation: u64,
}

/// Construction and enqueue failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequencerError {
    /// Capacity must be a non-zero power of two.
    InvalidCapacity(usize),
    /// Every slot holds a live group.
    Full,
}

impl fmt::Display for SequencerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCapacity(n) => {
                write!(f, "sequencer capacity must be a non-zero power of two, got {n}")
            }
            Self::Full => write!(f, "sequencer buffer is full"),
        }
    }
}

impl std::error::Error for SequencerError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GroupStatus {
    Pending,
    Cancelled,
    Done,
}

struct Group {
    steps: Vec<StepFn>,
    cursor: usize,
    status: GroupStatus,
    generation: u64,
}

impl Group {
    fn is_reapable(&self) -> bool {
        self.status != GroupStatus::Pending || self.cursor >= self.steps.len()
    }
}

/// Fixed-capacity FIFO of step groups, drained one step per tick.
pub struct TaskSequencer {
    buffer: Vec<Option<Group>>,
    mask: usize,
    /// Next write slot (the back of the queue).
    head: usize,
    /// Oldest live slot (the front of the queue).
    top: usize,
    live: usize,
    /// Monotonic enqueue counter stamped into groups and handles.
    generation: u64,
}

impl TaskSequencer {
    /// Create a sequencer with the given ring capacity.
    ///
    /// # Errors
    /// Returns [`SequencerError::InvalidCapacity`] unless `capacity` is a
    /// non-zero power of two.
    pub fn new(capacity: usize) -> Result<Self, SequencerError> {
        if capacity == 0 || !capacity.is_power_of_two() {
            return Err(SequencerError::InvalidCapacity(capacity));
        }
        let mut buffer = Vec::with_capacity(capacity);
        buffer.resize_with(capacity, || None);
        Ok(Self {
            buffer,
            mask: capacity - 1,
            head: 0,
            top: capacity - 1,
            live: 0,
            generation: 0,
        })
    }

    /// Number of live groups.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.live
    }

    /// Whether no groups are queued.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Enqueue a group of steps at the back of the queue.
    ///
    /// # Errors
    /// Returns [`SequencerError::Full`] when every slot is occupied.
    pub fn enqueue(
        &mut self,
        mut steps: Vec<StepFn>,
        direction: SequenceDirection,
    ) -> Result<SequenceHandle, SequencerError> {
        if self.live == self.buffer.len() {
            return Err(SequencerError::Full);
        }
        if direction == SequenceDirection::Reverse {
            steps.reverse();
        }

        self.generation += 1;
        self.head = self.dec(self.head);
        self.buffer[self.head] = Some(Group {
            steps,
            cursor: 0,
            status: GroupStatus::Pending,
            generation: self.generation,
        });
        self.live += 1;
        self.advance_top();

        Ok(SequenceHandle {
            slot: self.head,
            generation: self.generation,
        })
    }

    /// Mark a group's remaining steps skipped. Safe to call repeatedly;
    /// a no-op for stale or already finished handles. The generation check
    /// keeps a kept-too-long handle from cancelling whatever group has since
    /// reused its ring slot.
    pub fn cancel(&mut self, handle: SequenceHandle) {
        if let Some(group) = &mut self.buffer[handle.slot & self.mask]
            && group.generation == handle.generation
            && group.status == GroupStatus::Pending
        {
            group.status = GroupStatus::Cancelled;
        }
    }

    /// Drain at most one step from the oldest pending group. Returns
    /// whether a step actually ran.
    pub fn tick(&mut self) -> bool {
        self.reap();

        let slot = self.top;
        let Some(group) = self.buffer[slot].as_mut() else {
            return false;
        };

        match (group.steps[group.cursor])() {
            StepOutcome::Done => {
                group.cursor += 1;
                if group.cursor >= group.steps.len() {
                    group.status = GroupStatus::Done;
                    self.buffer[slot] = None;
                    self.live -= 1;
                    self.advance_top();
                }
            }
            StepOutcome::Retry => {}
        }
        true
    }

    /// Free cancelled and exhausted groups at the front; they cost no work.
    fn reap(&mut self) {
        while self.live > 0 {
            let slot = self.top;
            let reap = match &self.buffer[slot] {
                Some(group) => group.is_reapable(),
                None => true,
            };
            if !reap {
                break;
            }
            self.buffer[slot] = None;
            self.live -= 1;
            self.advance_top();
        }
    }

    fn advance_top(&mut self) {
        if self.live == 0 {
            self.head = 0;
            self.top = 0;
            return;
        }
        let mut guard = self.buffer.len();
        while self.buffer[self.top].is_none() && guard > 0 {
            self.top = self.dec(self.top);
            guard -= 1;
        }
    }

    #[inline]
    fn dec(&self, i: usize) -> usize {
        i.wrapping_sub(1) & self.mask
    }
}

impl fmt::Debug for TaskSequencer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskSequencer")
            .field("capacity", &self.buffer.len())
            .field("live", &self.live)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    type Trace = Rc<RefCell<Vec<&'static str>>>;

    fn step(trace: &Trace, name: &'static str) -> StepFn {
        let trace = Rc::clone(trace);
        Box::new(move || {
            trace.borrow_mut().push(name);
            StepOutcome::Done
        })
    }

    #[test]
    fn rejects_bad_capacity() {
        assert!(matches!(
            TaskSequencer::new(0),
            Err(SequencerError::InvalidCapacity(0))
        ));
        assert!(TaskSequencer::new(3).is_err());
        assert!(TaskSequencer::new(64).is_ok());
    }

    #[test]
    fn one_step_per_tick() {
        let trace: Trace = Rc::default();
        let mut seq = TaskSequencer::new(8).unwrap();
        seq.enqueue(vec![step(&trace, "a"), step(&trace, "b")], SequenceDirection::Forward)
            .unwrap();

        assert!(seq.tick());
        assert_eq!(*trace.borrow(), vec!["a"]);
        assert!(seq.tick());
        assert_eq!(*trace.borrow(), vec!["a", "b"]);
        assert!(!seq.tick());
        assert!(seq.is_empty());
    }

    #[test]
    fn groups_drain_fifo() {
        let trace: Trace = Rc::default();
        let mut seq = TaskSequencer::new(8).unwrap();
        seq.enqueue(vec![step(&trace, "a1"), step(&trace, "a2")], SequenceDirection::Forward)
            .unwrap();
        seq.enqueue(vec![step(&trace, "b1")], SequenceDirection::Forward)
            .unwrap();

        for _ in 0..3 {
            seq.tick();
        }
        assert_eq!(*trace.borrow(), vec!["a1", "a2", "b1"]);
    }

    #[test]
    fn reverse_direction_flips_order() {
        let trace: Trace = Rc::default();
        let mut seq = TaskSequencer::new(8).unwrap();
        seq.enqueue(vec![step(&trace, "1"), step(&trace, "2"), step(&trace, "3")], SequenceDirection::Reverse)
            .unwrap();

        for _ in 0..3 {
            seq.tick();
        }
        assert_eq!(*trace.borrow(), vec!["3", "2", "1"]);
    }

    #[test]
    fn retry_keeps_the_step_at_the_front() {
        let trace: Trace = Rc::default();
        let mut seq = TaskSequencer::new(8).unwrap();

        let attempts = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&attempts);
        let flaky: StepFn = Box::new(move || {
            *counter.borrow_mut() += 1;
            if *counter.borrow() < 3 {
                StepOutcome::Retry
            } else {
                StepOutcome::Done
            }
        });

        seq.enqueue(vec![flaky, step(&trace, "after")], SequenceDirection::Forward)
            .unwrap();

        for _ in 0..4 {
            seq.tick();
        }
        assert_eq!(*attempts.borrow(), 3);
        assert_eq!(*trace.borrow(), vec!["after"]);
    }

    #[test]
    fn cancel_skips_remaining_steps() {
        let trace: Trace = Rc::default();
        let mut seq = TaskSequencer::new(8).unwrap();
        let handle = seq
            .enqueue(vec![step(&trace, "a1"), step(&trace, "a2")], SequenceDirection::Forward)
            .unwrap();
        seq.enqueue(vec![step(&trace, "b1")], SequenceDirection::Forward)
            .unwrap();

        seq.tick();
        seq.cancel(handle);
        seq.tick();

        // a2 never ran; the next group took over.
        assert_eq!(*trace.borrow(), vec!["a1", "b1"]);
    }

    #[test]
    fn cancel_is_repeat_safe() {
        let trace: Trace = Rc::default();
        let mut seq = TaskSequencer::new(8).unwrap();
        let handle = seq
            .enqueue(vec![step(&trace, "a")], SequenceDirection::Forward)
            .unwrap();
        seq.cancel(handle);
        seq.cancel(handle);
        assert!(!seq.tick());
        assert!(trace.borrow().is_empty());
    }

    #[test]
    fn full_buffer_rejects_enqueue() {
        let trace: Trace = Rc::default();
        let mut seq = TaskSequencer::new(2).unwrap();
        seq.enqueue(vec![step(&trace, "a")], SequenceDirection::Forward)
            .unwrap();
        seq.enqueue(vec![step(&trace, "b")], SequenceDirection::Forward)
            .unwrap();
        assert!(matches!(
            seq.enqueue(vec![step(&trace, "c")], SequenceDirection::Forward),
            Err(SequencerError::Full)
        ));
    }

    #[test]
    fn empty_group_costs_no_step() {
        let trace: Trace = Rc::default();
        let mut seq = TaskSequencer::new(8).unwrap();
        seq.enqueue(Vec::new(), SequenceDirection::Forward).unwrap();
        seq.enqueue(vec![step(&trace, "real")], SequenceDirection::Forward)
            .unwrap();

        assert!(seq.tick());
        assert_eq!(*trace.borrow(), vec!["real"]);
    }

    #[test]
    fn stale_handle_cannot_cancel_a_reused_slot() {
        let trace: Trace = Rc::default();
        let mut seq = TaskSequencer::new(2).unwrap();

        let stale = seq
            .enqueue(vec![step(&trace, "a")], SequenceDirection::Forward)
            .unwrap();
        seq.tick();
        assert!(seq.is_empty());

        // The drained ring hands the same slot to the next group; the old
        // handle's generation no longer matches, so it must not bite.
        seq.enqueue(vec![step(&trace, "b")], SequenceDirection::Forward)
            .unwrap();
        seq.cancel(stale);

        assert!(seq.tick());
        assert_eq!(*trace.borrow(), vec!["a", "b"]);
    }

    #[test]
    fn ring_reuses_freed_slots() {
        let trace: Trace = Rc::default();
        let mut seq = TaskSequencer::new(2).unwrap();
        for _ in 0..5 {
            seq.enqueue(vec![step(&trace, "x")], SequenceDirection::Forward)
                .unwrap();
            seq.tick();
            assert!(seq.is_empty());
        }
        assert_eq!(trace.borrow().len(), 5);
    }
}
