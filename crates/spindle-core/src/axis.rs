#![forbid(unsafe_code)]

//! Scroll axis selection.
//!
//! The engine simulates one dimension. [`Axis`] picks the driven coordinate
//! out of 2D host input and applies the sign convention that makes positive
//! deltas mean "content moves toward the strip start" on both axes.

/// The axis a strip scrolls along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Axis {
    /// Content flows left/right; the X coordinate drives motion.
    Horizontal,
    /// Content flows up/down; the Y coordinate drives motion.
    #[default]
    Vertical,
}

impl Axis {
    /// Whether this is the vertical axis.
    #[inline]
    #[must_use]
    pub const fn is_vertical(self) -> bool {
        matches!(self, Self::Vertical)
    }

    /// Sign applied to raw deltas so that both axes share one convention.
    #[inline]
    #[must_use]
    pub const fn sign(self) -> f64 {
        match self {
            Self::Horizontal => -1.0,
            Self::Vertical => 1.0,
        }
    }

    /// Extract the driven coordinate from a 2D point.
    #[inline]
    #[must_use]
    pub const fn pick(self, x: f64, y: f64) -> f64 {
        match self {
            Self::Horizontal => x,
            Self::Vertical => y,
        }
    }

    /// Apply the axis sign to a raw delta.
    #[inline]
    #[must_use]
    pub const fn direction(self, delta: f64) -> f64 {
        delta * self.sign()
    }
}
