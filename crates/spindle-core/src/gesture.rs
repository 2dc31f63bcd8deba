#![forbid(unsafe_code)]

//! Gesture normalization: raw pointer/wheel input becomes delta events.
//!
//! Two independent state machines feed the same motion state through the
//! Input phase:
//!
//! - **Drag** walks `Initialize → Update → Finalize`. Pointer-down captures
//!   the origin sample; moves emit axis deltas and re-anchor the origin when
//!   the interaction pauses; release computes an acceleration over the last
//!   anchored window and yields a flick velocity only when the window is
//!   short and fast enough.
//! - **Wheel** is single-shot: every wheel sample becomes one `Update`
//!   event carrying the (inverted) axis delta.
//!
//! # Invariants
//!
//! 1. A release without a matching press produces acceleration 0, never a
//!    panic — transient input anomalies are expected.
//! 2. A drag paused longer than the re-anchor interval can never read as a
//!    flick: the origin moves forward, so the release window stays short.
//! 3. Click suppression triggers only after total travel exceeds the drag
//!    threshold, so plain clicks pass through untouched.

use crate::axis::Axis;

/// Milliseconds after which a stationary drag re-anchors its origin.
pub const REANCHOR_INTERVAL_MS: f64 = 170.0;

/// Travel (px) past which an interaction is a drag, not a click.
pub const DRAG_THRESHOLD_PX: f64 = 5.0;

/// Minimum |acceleration| for a release to count as a flick.
pub const FLICK_THRESHOLD: f64 = 0.01;

/// Multiplier from release acceleration to residual velocity.
pub const RELEASE_VELOCITY_SCALE: f64 = 10.0;

/// Thresholds and timeouts for gesture normalization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureConfig {
    /// Pause duration after which the drag origin re-anchors (default: 170ms).
    pub reanchor_interval_ms: f64,
    /// Travel distinguishing a drag from a click (default: 5px).
    pub drag_threshold_px: f64,
    /// Minimum |acceleration| for a flick (default: 0.01).
    pub flick_threshold: f64,
    /// Release acceleration → velocity multiplier (default: 10).
    pub release_velocity_scale: f64,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            reanchor_interval_ms: REANCHOR_INTERVAL_MS,
            drag_threshold_px: DRAG_THRESHOLD_PX,
            flick_threshold: FLICK_THRESHOLD,
            release_velocity_scale: RELEASE_VELOCITY_SCALE,
        }
    }
}

/// Which input device produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureSource {
    /// Pointer drag.
    Drag,
    /// Wheel tick.
    Wheel,
}

/// Where in its lifecycle a gesture event sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GesturePhase {
    /// Interaction began; motion should drop residual velocity.
    Initialize,
    /// Incremental movement; `delta` folds into the current position.
    Update,
    /// Interaction ended; `delta` is the residual (flick) velocity.
    Finalize,
}

/// One normalized input event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureEvent {
    /// Producing device.
    pub source: GestureSource,
    /// Lifecycle phase.
    pub phase: GesturePhase,
    /// Axis delta (Update) or residual velocity (Finalize).
    pub delta: f64,
}

/// A raw pointer sample from the host, in host pixels and milliseconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerSample {
    /// Horizontal position.
    pub x: f64,
    /// Vertical position.
    pub y: f64,
    /// Host display-clock timestamp.
    pub timestamp_ms: f64,
}

impl PointerSample {
    /// Construct a sample.
    #[must_use]
    pub const fn new(x: f64, y: f64, timestamp_ms: f64) -> Self {
        Self { x, y, timestamp_ms }
    }
}

// ---------------------------------------------------------------------------
// Drag
// ---------------------------------------------------------------------------

/// Stateful drag normalizer for one pointer source.
#[derive(Debug, Clone)]
pub struct DragTracker {
    config: GestureConfig,
    axis: Axis,
    /// Origin of the current flick window; re-anchored on pause.
    start: Option<PointerSample>,
    /// Most recent sample.
    last: Option<PointerSample>,
    pressed: bool,
    /// Total absolute travel since pointer-down.
    travel: f64,
    suppress_click: bool,
}

impl DragTracker {
    /// Create a tracker for the given axis and config.
    #[must_use]
    pub fn new(axis: Axis, config: GestureConfig) -> Self {
        Self {
            config,
            axis,
            start: None,
            last: None,
            pressed: false,
            travel: 0.0,
            suppress_click: false,
        }
    }

    /// Whether a press is currently held.
    #[inline]
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.pressed
    }

    /// Handle pointer-down: capture the origin and begin the interaction.
    pub fn pointer_down(&mut self, sample: PointerSample) -> GestureEvent {
        self.start = Some(sample);
        self.last = Some(sample);
        self.pressed = true;
        self.travel = 0.0;

        GestureEvent {
            source: GestureSource::Drag,
            phase: GesturePhase::Initialize,
            delta: 0.0,
        }
    }

    /// Handle pointer-move: emit the axis delta since the last sample.
    ///
    /// Returns `None` for moves without a held press. A move arriving more
    /// than the re-anchor interval after the origin re-anchors the origin,
    /// so a paused-then-resumed drag is not read as one long fast flick.
    pub fn pointer_move(&mut self, sample: PointerSample) -> Option<GestureEvent> {
        if !self.pressed {
            return None;
        }
        let last = self.last?;
        let start = self.start?;

        let diff = self.axis.pick(sample.x, sample.y) - self.axis.pick(last.x, last.y);
        let expired = sample.timestamp_ms - start.timestamp_ms > self.config.reanchor_interval_ms;

        self.travel += diff.abs();
        self.last = Some(sample);
        if expired {
            self.start = Some(sample);
        }

        Some(GestureEvent {
            source: GestureSource::Drag,
            phase: GesturePhase::Update,
            delta: self.axis.direction(diff),
        })
    }

    /// Handle pointer-up/cancel/leave: finalize with the flick velocity.
    pub fn pointer_up(&mut self, sample: PointerSample) -> GestureEvent {
        let acceleration = self.release_acceleration(sample);

        self.pressed = false;
        self.suppress_click = self.travel > self.config.drag_threshold_px;
        self.start = None;
        self.last = None;

        GestureEvent {
            source: GestureSource::Drag,
            phase: GesturePhase::Finalize,
            delta: self.config.release_velocity_scale * acceleration,
        }
    }

    /// Whether the synthetic click following this interaction should be
    /// swallowed. Consuming clears the flag.
    pub fn take_click_suppression(&mut self) -> bool {
        std::mem::replace(&mut self.suppress_click, false)
    }

    /// Return to the idle state.
    pub fn reset(&mut self) {
        self.start = None;
        self.last = None;
        self.pressed = false;
        self.travel = 0.0;
        self.suppress_click = false;
    }

    /// Acceleration over the anchored window, gated to flicks.
    ///
    /// Zero when: there is no matching press (defensive), the window has
    /// zero width, the window expired (paused drag), or the magnitude is
    /// below the flick threshold.
    fn release_acceleration(&self, sample: PointerSample) -> f64 {
        let (Some(start), Some(last)) = (self.start, self.last) else {
            return 0.0;
        };

        let diff_drag = self.axis.pick(last.x, last.y) - self.axis.pick(start.x, start.y);
        let diff_time = sample.timestamp_ms - start.timestamp_ms;
        if diff_time == 0.0 {
            return 0.0;
        }

        let expired = diff_time > self.config.reanchor_interval_ms;
        let acceleration = diff_drag / diff_time;
        if !expired && acceleration.abs() > self.config.flick_threshold {
            self.axis.direction(acceleration)
        } else {
            0.0
        }
    }
}

// ---------------------------------------------------------------------------
// Wheel
// ---------------------------------------------------------------------------

/// Stateless wheel normalizer: one event in, one `Update` event out.
#[derive(Debug, Clone, Copy)]
pub struct WheelNormalizer {
    axis: Axis,
}

impl WheelNormalizer {
    /// Create a normalizer for the given axis.
    #[must_use]
    pub const fn new(axis: Axis) -> Self {
        Self { axis }
    }

    /// Normalize a wheel sample. The delta sign is inverted so wheel-down
    /// scrolls content forward, matching natural scrolling.
    #[must_use]
    pub fn wheel(&self, delta_x: f64, delta_y: f64) -> GestureEvent {
        let delta = self.axis.pick(delta_x, delta_y);
        GestureEvent {
            source: GestureSource::Wheel,
            phase: GesturePhase::Update,
            delta: -delta,
        }
    }
}
