#![forbid(unsafe_code)]

//! Fixed-timestep frame scheduler.
//!
//! The host calls [`FrameScheduler::on_frame`] once per display callback
//! with the callback timestamp. The scheduler accumulates elapsed wall time
//! and converts it into a whole number of fixed simulation steps plus an
//! interpolation factor, decoupling the deterministic simulation rate from
//! the variable display refresh rate.
//!
//! # Invariants
//!
//! 1. At most [`MAX_STEPS_PER_FRAME`] simulation steps run per display
//!    frame; a long stall degrades smoothly instead of spiraling.
//! 2. `stop()` clears the accumulator and last timestamp, so a later
//!    `start()` never replays stale elapsed time.
//! 3. The first frame after a start runs exactly one step with `alpha = 0`.

use crate::config::ConfigError;

/// Runaway protection: cap on simulation steps per display frame.
pub const MAX_STEPS_PER_FRAME: u32 = 5;

/// Per-tick timing handed to pipeline transforms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeParams {
    /// Host display-clock timestamp of the current frame, in milliseconds.
    pub t: f64,
    /// Fixed simulation step, in milliseconds.
    pub dt: f64,
    /// Interpolation factor in `[0, 1)`: how far the accumulator has
    /// progressed into the next unsimulated step.
    pub alpha: f64,
}

/// What one display frame owes the simulation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FramePlan {
    /// Fixed simulation steps to run this frame.
    pub steps: u32,
    /// Interpolation factor for rendering after the steps.
    pub alpha: f64,
}

/// Fixed-timestep accumulator over host display callbacks.
#[derive(Debug, Clone)]
pub struct FrameScheduler {
    fixed_step_ms: f64,
    accumulator: f64,
    last_timestamp: Option<f64>,
    running: bool,
    resume_on_visible: bool,
}

impl FrameScheduler {
    /// Create a scheduler targeting `fps` simulation steps per second.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidFps`] when `fps` is not finite and
    /// positive.
    pub fn new(fps: f64) -> Result<Self, ConfigError> {
        if !fps.is_finite() || fps <= 0.0 {
            return Err(ConfigError::InvalidFps(fps));
        }
        Ok(Self {
            fixed_step_ms: 1000.0 / fps,
            accumulator: 0.0,
            last_timestamp: None,
            running: false,
            resume_on_visible: false,
        })
    }

    /// The fixed simulation step, in milliseconds.
    #[inline]
    #[must_use]
    pub fn fixed_step_ms(&self) -> f64 {
        self.fixed_step_ms
    }

    /// Whether frames are currently being consumed.
    #[inline]
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Begin consuming frames. Idempotent.
    pub fn start(&mut self) {
        self.running = true;
    }

    /// Stop consuming frames and discard accumulated time. Idempotent.
    pub fn stop(&mut self) {
        self.running = false;
        self.resume_on_visible = false;
        self.accumulator = 0.0;
        self.last_timestamp = None;
    }

    /// Host visibility change. Losing visibility pauses a running
    /// scheduler; regaining it resumes only if the loss paused it.
    pub fn set_visible(&mut self, visible: bool) {
        if visible {
            if self.resume_on_visible {
                self.running = true;
                self.resume_on_visible = false;
            }
        } else if self.running {
            self.stop();
            self.resume_on_visible = true;
        }
    }

    /// Consume one display callback. Returns `None` while stopped.
    pub fn on_frame(&mut self, timestamp_ms: f64) -> Option<FramePlan> {
        if !self.running {
            return None;
        }

        let mut steps = 0;
        let last = match self.last_timestamp {
            Some(last) => last,
            None => {
                // First frame after a start: run one step immediately so
                // the simulation is never a frame behind the display.
                self.last_timestamp = Some(timestamp_ms);
                steps = 1;
                timestamp_ms
            }
        };

        self.accumulator += timestamp_ms - last;
        self.last_timestamp = Some(timestamp_ms);

        while self.accumulator >= self.fixed_step_ms && steps < MAX_STEPS_PER_FRAME {
            self.accumulator -= self.fixed_step_ms;
            steps += 1;
        }
        if self.accumulator >= self.fixed_step_ms {
            // Hit the cap: drop the backlog so alpha stays in [0, 1) and a
            // long stall does not replay across later frames.
            self.accumulator %= self.fixed_step_ms;
        }

        Some(FramePlan {
            steps,
            alpha: self.accumulator / self.fixed_step_ms,
        })
    }
}
