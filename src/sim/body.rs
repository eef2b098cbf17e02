//! The snake body and its occupancy index
//!
//! Segments are stored head-first. Every segment carries an implicit serial
//! number (`head_serial - index`), and the occupancy grid stores serials rather
//! than indices. Prepending a head therefore shifts every index without
//! touching the grid: a move only updates the new head cell, the vacated tail
//! cell and, on growth, the cloned tail cell.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::food::{FoodKind, FoodSpawner};
use super::grid::{Direction, GridPos};

/// One body cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub pos: GridPos,
    /// Direction this segment was travelling when it became the head
    pub dir: Direction,
}

/// Serials of the segments occupying one cell
type Bucket = SmallVec<[u32; 4]>;

/// Cell → occupying segment serials, as a flat `width × height` array
#[derive(Debug, Clone)]
pub struct OccupancyGrid {
    width: i32,
    height: i32,
    cells: Vec<Bucket>,
}

impl OccupancyGrid {
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            cells: vec![Bucket::new(); (width * height) as usize],
        }
    }

    #[inline]
    fn slot(&self, pos: GridPos) -> usize {
        (pos.y * self.width + pos.x) as usize
    }

    #[inline]
    fn bucket(&self, pos: GridPos) -> &Bucket {
        &self.cells[self.slot(pos)]
    }

    fn insert(&mut self, pos: GridPos, serial: u32) {
        let slot = self.slot(pos);
        self.cells[slot].push(serial);
    }

    fn remove(&mut self, pos: GridPos, serial: u32) {
        let slot = self.slot(pos);
        let bucket = &mut self.cells[slot];
        if let Some(i) = bucket.iter().position(|&s| s == serial) {
            bucket.swap_remove(i);
        } else {
            log::warn!("Occupancy grid missing serial {} at {:?}", serial, pos);
        }
    }

    fn clear(&mut self) {
        for bucket in &mut self.cells {
            bucket.clear();
        }
    }

    /// Number of segments in the cell
    #[inline]
    pub fn count(&self, pos: GridPos) -> usize {
        self.bucket(pos).len()
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }
}

/// Result of one grid move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MoveOutcome {
    pub score_gain: u64,
    pub eaten: Option<FoodKind>,
}

/// The snake
#[derive(Debug, Clone)]
pub struct Body {
    segments: VecDeque<Segment>,
    /// Serial of the segment at index 0
    head_serial: u32,
    /// `None` when running without the spatial index (linear fallback)
    grid: Option<OccupancyGrid>,
    width: i32,
    height: i32,
    /// Direction applied by the last move
    dir: Direction,
    /// Buffered direction for the next move
    next_dir: Direction,
    /// Segments added per food eaten
    growth: usize,
}

impl Body {
    /// A straight body of `length` segments centred on the grid, heading right
    pub fn new(width: i32, height: i32, length: usize, growth: usize, indexed: bool) -> Self {
        let cx = width / 2;
        let cy = height / 2;
        let columns = width.max(1) as usize;
        let segments = (0..length.max(1))
            .map(|i| Segment {
                // Reduce before converting so long bodies keep wrapping
                pos: GridPos::wrapped(cx - (i % columns) as i32, cy, width, height),
                dir: Direction::Right,
            })
            .collect();
        Self::from_segments(width, height, segments, growth, indexed)
    }

    /// Build a body from explicit segments (head first).
    ///
    /// The head's `dir` becomes the current direction of travel.
    pub fn from_segments(
        width: i32,
        height: i32,
        segments: Vec<Segment>,
        growth: usize,
        indexed: bool,
    ) -> Self {
        let dir = segments.first().map(|s| s.dir).unwrap_or_default();
        let mut body = Self {
            segments: segments.into(),
            head_serial: 0,
            grid: indexed.then(|| OccupancyGrid::new(width, height)),
            width,
            height,
            dir,
            next_dir: dir,
            growth,
        };
        for seg in body.segments.iter_mut() {
            seg.pos = GridPos::wrapped(seg.pos.x, seg.pos.y, width, height);
        }
        body.rebuild_index();
        body
    }

    /// Same body without a spatial index
    pub fn unindexed(width: i32, height: i32, length: usize, growth: usize) -> Self {
        Self::new(width, height, length, growth, false)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn head(&self) -> Option<&Segment> {
        self.segments.front()
    }

    pub fn segment(&self, index: usize) -> Option<&Segment> {
        self.segments.get(index)
    }

    pub fn segments(&self) -> &VecDeque<Segment> {
        &self.segments
    }

    pub fn direction(&self) -> Direction {
        self.dir
    }

    pub fn next_direction(&self) -> Direction {
        self.next_dir
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn occupancy(&self) -> Option<&OccupancyGrid> {
        self.grid.as_ref()
    }

    /// Buffer a turn for the next move.
    ///
    /// Only turns onto the other axis are accepted; reversing along the
    /// current axis is ignored.
    pub fn set_direction(&mut self, dir: Direction) -> bool {
        if self.dir.crosses(dir) {
            self.next_dir = dir;
            true
        } else {
            false
        }
    }

    /// Segment indices occupying `pos`
    pub fn segments_at(&self, pos: GridPos) -> SmallVec<[usize; 4]> {
        match &self.grid {
            Some(grid) => grid
                .bucket(pos)
                .iter()
                .map(|&serial| self.index_of(serial))
                .collect(),
            None => self
                .segments
                .iter()
                .enumerate()
                .filter(|(_, s)| s.pos == pos)
                .map(|(i, _)| i)
                .collect(),
        }
    }

    /// Is any segment on `pos`?
    pub fn occupied(&self, pos: GridPos) -> bool {
        match &self.grid {
            Some(grid) => grid.count(pos) > 0,
            None => self.segments.iter().any(|s| s.pos == pos),
        }
    }

    /// Advance one cell, eating whatever the new head lands on.
    pub fn step(&mut self, food: &mut FoodSpawner) -> MoveOutcome {
        let Some(head) = self.segments.front().copied() else {
            return MoveOutcome::default();
        };

        self.dir = self.next_dir;
        let new_head = Segment {
            pos: head.pos.step(self.dir, self.width, self.height),
            dir: self.dir,
        };
        self.head_serial = self.head_serial.wrapping_add(1);
        self.segments.push_front(new_head);
        if let Some(grid) = &mut self.grid {
            grid.insert(new_head.pos, self.head_serial);
        }

        let hit = food.hit(new_head.pos, self.width, self.height);

        // The tail always moves up; growth re-adds clones of where it was
        let old_tail = self.pop_tail();

        match (hit, old_tail) {
            (Some(food_index), Some(tail)) => {
                let kind = food.consume(food_index);
                for _ in 0..self.growth {
                    self.push_tail(tail);
                }
                MoveOutcome {
                    score_gain: kind.points(),
                    eaten: Some(kind),
                }
            }
            _ => MoveOutcome::default(),
        }
    }

    /// True iff the head shares its cell with another segment
    pub fn check_self_collision(&self) -> bool {
        let Some(head) = self.segments.front() else {
            return false;
        };
        match &self.grid {
            Some(grid) => grid.count(head.pos) > 1,
            None => self.segments.iter().skip(1).any(|s| s.pos == head.pos),
        }
    }

    /// Remove every segment from `at` to the tail. The head is never removed,
    /// so `at` is clamped to 1. The index is up to date when this returns.
    ///
    /// Returns how many segments were removed.
    pub fn truncate(&mut self, at: usize) -> usize {
        let at = at.max(1);
        let mut removed = 0;
        while self.segments.len() > at {
            self.pop_tail();
            removed += 1;
        }
        removed
    }

    /// Rewrap every segment onto a new grid and rebuild the index
    pub fn resize(&mut self, width: i32, height: i32) {
        self.width = width;
        self.height = height;
        for seg in self.segments.iter_mut() {
            seg.pos = GridPos::wrapped(seg.pos.x, seg.pos.y, width, height);
        }
        if self.grid.is_some() {
            self.grid = Some(OccupancyGrid::new(width, height));
        }
        self.rebuild_index();
    }

    /// Full reindex. Only needed after wholesale changes (construction, resize).
    fn rebuild_index(&mut self) {
        let Some(grid) = &mut self.grid else {
            return;
        };
        grid.clear();
        for (i, seg) in self.segments.iter().enumerate() {
            grid.insert(seg.pos, self.head_serial.wrapping_sub(i as u32));
        }
    }

    #[inline]
    fn index_of(&self, serial: u32) -> usize {
        self.head_serial.wrapping_sub(serial) as usize
    }

    fn pop_tail(&mut self) -> Option<Segment> {
        let tail = self.segments.pop_back()?;
        let serial = self.head_serial.wrapping_sub(self.segments.len() as u32);
        if let Some(grid) = &mut self.grid {
            grid.remove(tail.pos, serial);
        }
        Some(tail)
    }

    fn push_tail(&mut self, seg: Segment) {
        let serial = self.head_serial.wrapping_sub(self.segments.len() as u32);
        self.segments.push_back(seg);
        if let Some(grid) = &mut self.grid {
            grid.insert(seg.pos, serial);
        }
    }

    /// Check that the grid matches the segments exactly
    #[cfg(test)]
    pub(crate) fn index_is_consistent(&self) -> bool {
        let Some(grid) = &self.grid else {
            return true;
        };
        let total: usize = grid.cells.iter().map(|b| b.len()).sum();
        if total != self.segments.len() {
            return false;
        }
        self.segments.iter().enumerate().all(|(i, seg)| {
            grid.bucket(seg.pos)
                .iter()
                .any(|&s| self.index_of(s) == i)
        })
    }
}
