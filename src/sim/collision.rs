//! Knife vs snake collision detection
//!
//! Two stages: a broad phase that looks up body segments through the
//! occupancy index in a ring of cells around the knife (sized from its
//! radius), and a narrow phase that tests the knife's circle against each
//! candidate segment's centre. Without an index the narrow phase runs over
//! every segment instead.

use glam::Vec2;

use super::body::Body;
use super::grid::GridPos;
use crate::consts::BROAD_PHASE_RANGE;
use crate::torus_delta;

/// Result of a collision check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitResult {
    Miss,
    /// Segment 0
    Head,
    /// Any other segment; carries its index
    Body(usize),
}

impl HitResult {
    fn from_index(index: usize) -> Self {
        if index == 0 {
            HitResult::Head
        } else {
            HitResult::Body(index)
        }
    }

    pub fn is_hit(&self) -> bool {
        !matches!(self, HitResult::Miss)
    }
}

/// Centre of a grid cell in continuous cell units
#[inline]
pub fn cell_center(cell: GridPos) -> Vec2 {
    Vec2::new(cell.x as f32 + 0.5, cell.y as f32 + 0.5)
}

/// Narrow phase: wrap-aware circle vs point test
#[inline]
pub fn circle_hits_point(center: Vec2, radius: f32, point: Vec2, width: f32, height: f32) -> bool {
    torus_delta(center, point, width, height).length_squared() < radius * radius
}

/// Broad phase: the `(2 * range + 1)²` wrapped cells around `center`
pub fn broad_phase_cells(center: Vec2, range: i32, width: i32, height: i32) -> impl Iterator<Item = GridPos> {
    let cx = center.x.floor() as i32;
    let cy = center.y.floor() as i32;
    (-range..=range).flat_map(move |dy| {
        (-range..=range).map(move |dx| GridPos::wrapped(cx + dx, cy + dy, width, height))
    })
}

/// Find the lowest-index segment touched by a circle
pub fn find_hit(center: Vec2, radius: f32, body: &Body) -> HitResult {
    if body.occupancy().is_some() {
        find_hit_indexed(center, radius, body)
    } else {
        find_hit_linear(center, radius, body)
    }
}

/// Ring range that reaches every cell whose centre can lie within `radius`.
///
/// Never below [`BROAD_PHASE_RANGE`], never wider than needed to cover the
/// whole board.
pub fn broad_phase_range(radius: f32, width: i32, height: i32) -> i32 {
    let covering = width.max(height) / 2;
    let needed = (radius + 0.5).ceil();
    let needed = if needed.is_finite() && needed < covering as f32 {
        needed as i32
    } else {
        covering
    };
    needed.max(BROAD_PHASE_RANGE).min(covering.max(BROAD_PHASE_RANGE))
}

/// Indexed lookup through the body's occupancy grid
pub fn find_hit_indexed(center: Vec2, radius: f32, body: &Body) -> HitResult {
    let (w, h) = (body.width(), body.height());
    let range = broad_phase_range(radius, w, h);
    // Rings wider than a tiny grid revisit cells; min() makes that a no-op
    let mut best: Option<usize> = None;

    for cell in broad_phase_cells(center, range, w, h) {
        if !body.occupied(cell) {
            continue;
        }
        if !circle_hits_point(center, radius, cell_center(cell), w as f32, h as f32) {
            continue;
        }
        if let Some(&lowest) = body.segments_at(cell).iter().min() {
            best = Some(best.map_or(lowest, |b| b.min(lowest)));
        }
    }

    best.map_or(HitResult::Miss, HitResult::from_index)
}

/// Fallback without an index: scan every segment, head first
pub fn find_hit_linear(center: Vec2, radius: f32, body: &Body) -> HitResult {
    let (w, h) = (body.width() as f32, body.height() as f32);
    body.segments()
        .iter()
        .position(|seg| circle_hits_point(center, radius, cell_center(seg.pos), w, h))
        .map_or(HitResult::Miss, HitResult::from_index)
}
