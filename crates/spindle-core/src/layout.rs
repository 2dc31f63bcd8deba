#![forbid(unsafe_code)]

//! Layout metrics derived from a viewport rectangle.
//!
//! [`LayoutMetrics`] is an immutable-per-recompute bundle: every derived
//! value is computed in one pass from a [`LayoutConfig`] and the current
//! [`ViewportRect`], and the whole bundle is replaced on resize. Partial
//! updates do not exist, so downstream components can never observe a
//! half-recomputed layout.
//!
//! # Invariants
//!
//! 1. `total_slots = materialized_slots + ghost_slots`.
//! 2. `materialized_slots` is odd and at least 3, so the visible window is
//!    always centered on a whole slot.
//! 3. `ghost_slots = ghost_mult × materialized_slots` — the wrap-capable
//!    buffer scales with the visible pool.

/// Width and height of the host viewport, in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportRect {
    /// Viewport width.
    pub width: f64,
    /// Viewport height.
    pub height: f64,
}

impl ViewportRect {
    /// Construct a viewport rectangle.
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Whether the rectangle has no usable area.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// Static layout parameters; combined with a [`ViewportRect`] to produce
/// [`LayoutMetrics`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutConfig {
    /// Edge length of one grid cell.
    pub cell_size: f64,
    /// Gap between grid cells inside a slot.
    pub grid_gap: f64,
    /// Horizontal/vertical padding inside each slot.
    pub slot_padding: [f64; 2],
    /// Gap between consecutive slots along the strip.
    pub container_gap: f64,
    /// Horizontal/vertical padding of the strip container.
    pub container_padding: [f64; 2],
    /// How many ghost (wrap-capable buffer) slots to materialize per
    /// visible slot.
    pub ghost_mult: usize,
    /// Upper bound on slot width.
    pub slot_max_width: f64,
    /// Slot height ceiling as a percentage of the viewport height.
    pub slot_max_height_percent: f64,
    /// Slot height floor, before viewport clamping.
    pub slot_min_height: f64,
    /// Total logical cells across the unbounded strip.
    pub total_cells: u64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            cell_size: 24.0,
            grid_gap: 8.0,
            slot_padding: [12.0, 12.0],
            container_gap: 12.0,
            container_padding: [12.0, 12.0],
            ghost_mult: 2,
            slot_max_width: 1024.0,
            slot_max_height_percent: 70.0,
            slot_min_height: 300.0,
            total_cells: 1_048_560,
        }
    }
}

/// Derived, immutable-per-recompute layout bundle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutMetrics {
    /// Edge length of one grid cell.
    pub cell_size: f64,
    /// Gap between grid cells inside a slot.
    pub grid_gap: f64,
    /// Grid rows per slot.
    pub rows: usize,
    /// Grid columns per slot.
    pub columns: usize,
    /// Cells rendered by one slot (`rows × columns`).
    pub cells_per_slot: usize,
    /// Computed slot width.
    pub slot_width: f64,
    /// Computed slot height.
    pub slot_height: f64,
    /// Slots that can be visible at once.
    pub materialized_slots: usize,
    /// Extra wrap-capable buffer slots.
    pub ghost_slots: usize,
    /// Pool size: `materialized_slots + ghost_slots`.
    pub total_slots: usize,
    /// Gap between consecutive slots along the strip.
    pub container_gap: f64,
    /// Horizontal/vertical padding of the strip container.
    pub container_padding: [f64; 2],
    /// Full strip width.
    pub content_width: f64,
    /// Full strip extent along the scroll axis.
    pub content_height: f64,
    /// Viewport extent along the scroll axis.
    pub viewport_height: f64,
    /// Total logical cells across the unbounded strip.
    pub total_cells: u64,
}

impl LayoutMetrics {
    /// Compute the full bundle from config and viewport. Never partial.
    #[must_use]
    pub fn compute(config: &LayoutConfig, viewport: ViewportRect) -> Self {
        let clamped_height = clamp_height(config, viewport);
        let columns = fit_count(available_width(config, viewport), config);
        let rows = fit_count(
            clamped_height - 2.0 * config.slot_padding[1],
            config,
        );
        let slot_width = span(columns, config.cell_size, config.grid_gap)
            + 2.0 * config.slot_padding[0];
        let slot_height =
            span(rows, config.cell_size, config.grid_gap) + 2.0 * config.slot_padding[1];

        let materialized_slots = materialized(viewport.height, clamped_height);
        let ghost_slots = config.ghost_mult * materialized_slots;
        let total_slots = materialized_slots + ghost_slots;

        let content_height = config.container_gap * (total_slots.saturating_sub(1)) as f64
            + 2.0 * config.container_padding[1]
            + total_slots as f64 * slot_height;

        Self {
            cell_size: config.cell_size,
            grid_gap: config.grid_gap,
            rows,
            columns,
            cells_per_slot: rows * columns,
            slot_width,
            slot_height,
            materialized_slots,
            ghost_slots,
            total_slots,
            container_gap: config.container_gap,
            container_padding: config.container_padding,
            content_width: slot_width,
            content_height,
            viewport_height: viewport.height,
            total_cells: config.total_cells,
        }
    }

    /// Distance between the leading edges of consecutive slots.
    #[inline]
    #[must_use]
    pub fn slot_pitch(&self) -> f64 {
        self.slot_height + self.container_gap
    }

    /// Full period of the slot strip: the distance after which slot
    /// positions repeat exactly.
    ///
    /// This is both the motion jump performed at a wrap seam and the
    /// translation applied per unit of `viewport_offset`, so a jump and a
    /// boundary-slot remap cancel exactly.
    #[inline]
    #[must_use]
    pub fn wrap_period(&self) -> f64 {
        self.total_slots as f64 * self.slot_pitch()
    }

    /// Static position of a slot's leading edge within the strip.
    #[inline]
    #[must_use]
    pub fn slot_position(&self, real_index: usize) -> f64 {
        real_index as f64 * self.slot_pitch()
    }
}

/// Clamp the slot height between the configured floor and the viewport,
/// targeting the configured percentage of viewport height.
fn clamp_height(config: &LayoutConfig, viewport: ViewportRect) -> f64 {
    let unclamped = viewport.height * (config.slot_max_height_percent / 100.0);
    unclamped.clamp(
        config.slot_min_height.min(viewport.height),
        viewport.height,
    )
}

/// Width available to grid columns after container and slot padding.
fn available_width(config: &LayoutConfig, viewport: ViewportRect) -> f64 {
    let viewport_based = viewport.width
        - 2.0 * config.container_padding[0]
        - 2.0 * config.slot_padding[0];
    let max_width_based = config.slot_max_width - 2.0 * config.slot_padding[0];
    viewport_based.min(max_width_based)
}

/// Largest count such that `count` cells and `count - 1` gaps fit.
fn fit_count(available: f64, config: &LayoutConfig) -> usize {
    let mut count = 1_usize;
    while (count + 1) as f64 * config.cell_size + count as f64 * config.grid_gap <= available {
        count += 1;
    }
    count
}

/// Extent of `count` cells separated by `gap`.
fn span(count: usize, cell: f64, gap: f64) -> f64 {
    count as f64 * cell + count.saturating_sub(1) as f64 * gap
}

/// Visible slot count: enough to cover the viewport, forced odd, at least 3.
fn materialized(viewport_height: f64, clamped_height: f64) -> usize {
    let mut count = (viewport_height / clamped_height).ceil().max(1.0) as usize;
    if count % 2 == 0 {
        count += 1;
    }
    count.max(3)
}
