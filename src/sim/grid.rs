//! Toroidal grid geometry
//!
//! Every coordinate lives on a `width × height` torus: stepping off one edge
//! re-enters on the opposite one.

use serde::{Deserialize, Serialize};

/// Integer cell coordinate, always kept in `[0, width) × [0, height)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct GridPos {
    pub x: i32,
    pub y: i32,
}

impl GridPos {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Wrap arbitrary coordinates onto the torus
    #[inline]
    pub fn wrapped(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x: x.rem_euclid(width),
            y: y.rem_euclid(height),
        }
    }

    /// Offset by `(dx, dy)` and wrap
    #[inline]
    pub fn offset(self, dx: i32, dy: i32, width: i32, height: i32) -> Self {
        Self::wrapped(self.x + dx, self.y + dy, width, height)
    }

    /// Step one cell in `dir` and wrap
    #[inline]
    pub fn step(self, dir: Direction, width: i32, height: i32) -> Self {
        let (dx, dy) = dir.delta();
        self.offset(dx, dy, width, height)
    }

    /// Forward distance from `origin` to `self` along each axis, in `[0, extent)`
    #[inline]
    pub fn forward_from(self, origin: GridPos, width: i32, height: i32) -> (i32, i32) {
        (
            (self.x - origin.x).rem_euclid(width),
            (self.y - origin.y).rem_euclid(height),
        )
    }

    /// Shortest absolute distance to `other` along each axis
    #[inline]
    pub fn torus_distance(self, other: GridPos, width: i32, height: i32) -> (i32, i32) {
        let (fx, fy) = self.forward_from(other, width, height);
        (fx.min(width - fx), fy.min(height - fy))
    }
}

/// Direction of travel on the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    #[default]
    Right,
}

impl Direction {
    /// Unit delta, with `y` growing downward
    #[inline]
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    /// Parse a raw unit delta; anything else is rejected
    pub fn from_delta(dx: i32, dy: i32) -> Option<Self> {
        match (dx, dy) {
            (0, -1) => Some(Direction::Up),
            (0, 1) => Some(Direction::Down),
            (-1, 0) => Some(Direction::Left),
            (1, 0) => Some(Direction::Right),
            _ => None,
        }
    }

    #[inline]
    pub fn is_horizontal(self) -> bool {
        matches!(self, Direction::Left | Direction::Right)
    }

    /// True when `other` moves along the other axis
    #[inline]
    pub fn crosses(self, other: Direction) -> bool {
        self.is_horizontal() != other.is_horizontal()
    }
}

/// An axis-aligned rectangle of cells that may wrap across the edges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellRect {
    pub origin: GridPos,
    pub w: i32,
    pub h: i32,
}

impl CellRect {
    pub const fn new(origin: GridPos, w: i32, h: i32) -> Self {
        Self { origin, w, h }
    }

    /// Does the rectangle fit on the torus without covering a cell twice?
    pub fn fits(&self, width: i32, height: i32) -> bool {
        self.w >= 1 && self.h >= 1 && self.w <= width && self.h <= height
    }

    /// Wrap-aware point containment
    pub fn contains(&self, pos: GridPos, width: i32, height: i32) -> bool {
        let (fx, fy) = pos.forward_from(self.origin, width, height);
        fx < self.w && fy < self.h
    }

    /// Wrap-aware overlap test
    pub fn overlaps(&self, other: &CellRect, width: i32, height: i32) -> bool {
        let (ax, ay) = other.origin.forward_from(self.origin, width, height);
        let (bx, by) = self.origin.forward_from(other.origin, width, height);
        let x_overlap = ax < self.w || bx < other.w;
        let y_overlap = ay < self.h || by < other.h;
        x_overlap && y_overlap
    }

    /// Every (wrapped) cell covered by the rectangle
    pub fn cells(self, width: i32, height: i32) -> impl Iterator<Item = GridPos> {
        (0..self.h).flat_map(move |dy| {
            (0..self.w).map(move |dx| self.origin.offset(dx, dy, width, height))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_step_wraps_both_edges() {
        let p = GridPos::new(19, 0);
        assert_eq!(p.step(Direction::Right, 20, 20), GridPos::new(0, 0));
        assert_eq!(p.step(Direction::Up, 20, 20), GridPos::new(19, 19));
        assert_eq!(GridPos::new(0, 5).step(Direction::Left, 20, 20), GridPos::new(19, 5));
    }

    #[test]
    fn test_from_delta() {
        assert_eq!(Direction::from_delta(1, 0), Some(Direction::Right));
        assert_eq!(Direction::from_delta(0, -1), Some(Direction::Up));
        assert_eq!(Direction::from_delta(1, 1), None);
        assert_eq!(Direction::from_delta(2, 0), None);
    }

    #[test]
    fn test_rect_overlap_across_seam() {
        // 6x4 rect starting at x=18 covers columns 18,19,0,1,2,3
        let a = CellRect::new(GridPos::new(18, 0), 6, 4);
        let b = CellRect::new(GridPos::new(2, 3), 1, 1);
        let c = CellRect::new(GridPos::new(4, 0), 3, 3);
        assert!(a.overlaps(&b, 20, 20));
        assert!(b.overlaps(&a, 20, 20));
        assert!(!a.overlaps(&c, 20, 20));
        assert!(a.contains(GridPos::new(0, 2), 20, 20));
        assert!(!a.contains(GridPos::new(17, 2), 20, 20));
    }

    #[test]
    fn test_rect_cells_wrap() {
        let r = CellRect::new(GridPos::new(19, 19), 2, 2);
        let cells: Vec<_> = r.cells(20, 20).collect();
        assert_eq!(cells.len(), 4);
        assert!(cells.contains(&GridPos::new(0, 0)));
        assert!(cells.contains(&GridPos::new(19, 0)));
    }

    proptest! {
        #[test]
        fn prop_wrapped_is_in_range(x in -1000i32..1000, y in -1000i32..1000, w in 1i32..64, h in 1i32..64) {
            let p = GridPos::wrapped(x, y, w, h);
            prop_assert!(p.x >= 0 && p.x < w);
            prop_assert!(p.y >= 0 && p.y < h);
            prop_assert_eq!(p.x, x.rem_euclid(w));
            prop_assert_eq!(p.y, y.rem_euclid(h));
        }

        #[test]
        fn prop_overlap_matches_cell_intersection(
            ax in 0i32..12, ay in 0i32..12, aw in 1i32..7, ah in 1i32..7,
            bx in 0i32..12, by in 0i32..12, bw in 1i32..7, bh in 1i32..7,
        ) {
            let a = CellRect::new(GridPos::new(ax, ay), aw, ah);
            let b = CellRect::new(GridPos::new(bx, by), bw, bh);
            let shared = a.cells(12, 12).any(|c| b.contains(c, 12, 12));
            prop_assert_eq!(a.overlaps(&b, 12, 12), shared);
        }
    }
}
