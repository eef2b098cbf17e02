//! Food tiers and placement
//!
//! Placement is rejection sampling against the body and the footprints of
//! existing food. A failed placement is never an error: it is simply tried
//! again on the next tick.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::body::Body;
use super::grid::{CellRect, GridPos};
use super::state::GameEvent;
use crate::consts::*;
use crate::settings::Settings;

/// Food tiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FoodKind {
    Normal,
    /// Spawned every few normal foods; throws knives when eaten
    Special,
    /// Spawned less often; grants Invincible + SpeedBoost
    Super,
}

/// Region around a food's origin that counts as "eating" it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitWindow {
    /// Chebyshev distance from the origin of at most `reach`
    Centered { reach: i32 },
    /// Rectangle at `offset` from the origin
    Rect { dx: i32, dy: i32, w: i32, h: i32 },
}

impl FoodKind {
    /// Cells covered for placement purposes
    pub fn footprint(self) -> (i32, i32) {
        match self {
            FoodKind::Normal => (1, 1),
            FoodKind::Special => (6, 4),
            FoodKind::Super => (3, 3),
        }
    }

    pub fn points(self) -> u64 {
        match self {
            FoodKind::Normal => NORMAL_POINTS,
            FoodKind::Special => SPECIAL_POINTS,
            FoodKind::Super => SUPER_POINTS,
        }
    }

    /// The super tier's edible window is the inner 2x2 of its 3x3 footprint,
    /// so the head has to reach its middle.
    pub fn hit_window(self) -> HitWindow {
        match self {
            FoodKind::Normal => HitWindow::Centered { reach: 1 },
            FoodKind::Special => HitWindow::Rect {
                dx: 0,
                dy: 0,
                w: 6,
                h: 4,
            },
            FoodKind::Super => HitWindow::Rect {
                dx: 1,
                dy: 1,
                w: 2,
                h: 2,
            },
        }
    }
}

/// A food entity; `pos` is the top-left cell of its footprint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Food {
    pub pos: GridPos,
    pub kind: FoodKind,
}

impl Food {
    pub fn new(pos: GridPos, kind: FoodKind) -> Self {
        Self { pos, kind }
    }

    pub fn footprint(&self) -> CellRect {
        let (w, h) = self.kind.footprint();
        CellRect::new(self.pos, w, h)
    }

    /// Wrap-aware "is the head eating this food" test
    pub fn is_hit_by(&self, head: GridPos, width: i32, height: i32) -> bool {
        match self.kind.hit_window() {
            HitWindow::Centered { reach } => {
                let (dx, dy) = head.torus_distance(self.pos, width, height);
                dx <= reach && dy <= reach
            }
            HitWindow::Rect { dx, dy, w, h } => {
                let (fx, fy) = head.forward_from(self.pos, width, height);
                fx >= dx && fx < dx + w && fy >= dy && fy < dy + h
            }
        }
    }
}

/// Owns every food on the board and the tier counters
#[derive(Debug, Clone)]
pub struct FoodSpawner {
    foods: Vec<Food>,
    /// Normal foods eaten toward the next special
    special_progress: u32,
    /// Normal foods eaten toward the next super
    super_progress: u32,
    target_normals: usize,
    special_threshold: u32,
    super_threshold: u32,
    attempts: u32,
}

impl FoodSpawner {
    pub fn new(settings: &Settings) -> Self {
        Self {
            foods: Vec::new(),
            special_progress: 0,
            super_progress: 0,
            target_normals: settings.food_count,
            special_threshold: settings.special_threshold,
            super_threshold: settings.super_threshold,
            attempts: settings.placement_attempts,
        }
    }

    pub fn foods(&self) -> &[Food] {
        &self.foods
    }

    pub fn special_progress(&self) -> u32 {
        self.special_progress
    }

    pub fn super_progress(&self) -> u32 {
        self.super_progress
    }

    pub fn count(&self, kind: FoodKind) -> usize {
        self.foods.iter().filter(|f| f.kind == kind).count()
    }

    /// Drop all food and counters
    pub fn reset(&mut self) {
        self.foods.clear();
        self.special_progress = 0;
        self.super_progress = 0;
    }

    /// First food whose hit window covers `head`
    pub fn hit(&self, head: GridPos, width: i32, height: i32) -> Option<usize> {
        self.foods
            .iter()
            .position(|f| f.is_hit_by(head, width, height))
    }

    /// Remove an eaten food, counting normal ones toward the bonus tiers.
    /// The rest keep their placement order.
    pub fn consume(&mut self, index: usize) -> FoodKind {
        let food = self.foods.remove(index);
        if food.kind == FoodKind::Normal {
            self.special_progress += 1;
            self.super_progress += 1;
        }
        food.kind
    }

    /// Can a footprint go here without touching the body or other food?
    pub fn can_place(&self, rect: &CellRect, body: &Body) -> bool {
        let (w, h) = (body.width(), body.height());
        rect.fits(w, h)
            && !self.foods.iter().any(|f| f.footprint().overlaps(rect, w, h))
            && !rect.cells(w, h).any(|cell| body.occupied(cell))
    }

    /// Place a specific food if the spot is free
    pub fn place(&mut self, food: Food, body: &Body) -> bool {
        let food = Food::new(
            GridPos::wrapped(food.pos.x, food.pos.y, body.width(), body.height()),
            food.kind,
        );
        if !self.can_place(&food.footprint(), body) {
            return false;
        }
        self.foods.push(food);
        true
    }

    /// After a resize, forget food whose origin fell off the board or whose
    /// footprint now lands on the body or on food kept before it
    pub fn retain_fitting(&mut self, body: &Body) {
        let (width, height) = (body.width(), body.height());
        for food in std::mem::take(&mut self.foods) {
            if food.pos.x < width && food.pos.y < height && self.can_place(&food.footprint(), body) {
                self.foods.push(food);
            }
        }
    }

    /// One spawn cycle: bonus tiers whose counters crossed their threshold,
    /// then normal food up to the target count.
    ///
    /// Returns the number of foods placed.
    pub fn replenish<R: Rng + ?Sized>(
        &mut self,
        body: &Body,
        rng: &mut R,
        events: &mut Vec<GameEvent>,
    ) -> usize {
        let mut placed = 0;

        if self.super_progress >= self.super_threshold && self.try_spawn(FoodKind::Super, body, rng, events) {
            self.super_progress -= self.super_threshold;
            placed += 1;
        }

        if self.special_progress >= self.special_threshold
            && self.try_spawn(FoodKind::Special, body, rng, events)
        {
            self.special_progress -= self.special_threshold;
            placed += 1;
        }

        let mut normals = self.count(FoodKind::Normal);
        while normals < self.target_normals {
            if !self.try_spawn(FoodKind::Normal, body, rng, events) {
                break;
            }
            normals += 1;
            placed += 1;
        }

        placed
    }

    fn try_spawn<R: Rng + ?Sized>(
        &mut self,
        kind: FoodKind,
        body: &Body,
        rng: &mut R,
        events: &mut Vec<GameEvent>,
    ) -> bool {
        let (w, h) = (body.width(), body.height());
        let (fw, fh) = kind.footprint();
        if fw > w || fh > h {
            return false;
        }

        for _ in 0..self.attempts {
            let pos = GridPos::new(rng.random_range(0..w), rng.random_range(0..h));
            let food = Food::new(pos, kind);
            if self.can_place(&food.footprint(), body) {
                self.foods.push(food);
                if kind != FoodKind::Normal {
                    log::debug!("{:?} food placed at ({}, {})", kind, pos.x, pos.y);
                    events.push(GameEvent::FoodPlaced { kind, pos });
                }
                return true;
            }
        }

        log::debug!(
            "{:?} food placement gave up after {} attempts, deferring",
            kind,
            self.attempts
        );
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn assert_no_overlap(spawner: &FoodSpawner, body: &Body) {
        let (w, h) = (body.width(), body.height());
        let foods = spawner.foods();
        for (i, a) in foods.iter().enumerate() {
            for seg in body.segments() {
                assert!(!a.footprint().contains(seg.pos, w, h), "{:?} covers body", a);
            }
            for b in &foods[i + 1..] {
                assert!(!a.footprint().overlaps(&b.footprint(), w, h), "{:?} overlaps {:?}", a, b);
            }
        }
    }

    #[test]
    fn test_hit_windows() {
        let normal = Food::new(GridPos::new(0, 0), FoodKind::Normal);
        assert!(normal.is_hit_by(GridPos::new(19, 19), 20, 20));
        assert!(normal.is_hit_by(GridPos::new(1, 0), 20, 20));
        assert!(!normal.is_hit_by(GridPos::new(2, 0), 20, 20));

        let special = Food::new(GridPos::new(17, 0), FoodKind::Special);
        assert!(special.is_hit_by(GridPos::new(2, 3), 20, 20));
        assert!(!special.is_hit_by(GridPos::new(3, 0), 20, 20));
        assert!(!special.is_hit_by(GridPos::new(17, 4), 20, 20));

        // Super is only edible in the middle of its footprint
        let sup = Food::new(GridPos::new(5, 5), FoodKind::Super);
        assert!(!sup.is_hit_by(GridPos::new(5, 5), 20, 20));
        assert!(sup.is_hit_by(GridPos::new(6, 6), 20, 20));
        assert!(sup.is_hit_by(GridPos::new(7, 7), 20, 20));
        assert!(!sup.is_hit_by(GridPos::new(8, 7), 20, 20));
    }

    #[test]
    fn test_counters_carry_over() {
        let settings = Settings {
            food_count: 0,
            ..Settings::default()
        };
        let body = Body::new(30, 30, 4, 4, true);
        let mut spawner = FoodSpawner::new(&settings);
        let mut rng = Pcg32::seed_from_u64(7);
        let mut events = Vec::new();

        for x in 0..7 {
            assert!(spawner.place(Food::new(GridPos::new(x * 2, 0), FoodKind::Normal), &body));
        }
        for _ in 0..7 {
            spawner.consume(0);
        }
        assert_eq!(spawner.special_progress(), 7);

        assert_eq!(spawner.replenish(&body, &mut rng, &mut events), 1);
        assert_eq!(spawner.count(FoodKind::Special), 1);
        // 7 - 5 carries over instead of resetting
        assert_eq!(spawner.special_progress(), 2);
        assert_eq!(spawner.super_progress(), 7);
        assert!(matches!(
            events.as_slice(),
            [GameEvent::FoodPlaced {
                kind: FoodKind::Special,
                ..
            }]
        ));
    }

    #[test]
    fn test_consume_keeps_placement_order() {
        let body = Body::new(30, 30, 4, 4, true);
        let mut spawner = FoodSpawner::new(&Settings::default());
        let placed: Vec<_> = (0..4)
            .map(|x| Food::new(GridPos::new(x * 2, 0), FoodKind::Normal))
            .collect();
        for food in &placed {
            assert!(spawner.place(*food, &body));
        }

        assert_eq!(spawner.consume(0), FoodKind::Normal);
        assert_eq!(spawner.foods(), &placed[1..]);

        // (5,0) is inside the windows of both (4,0) and (6,0); the earlier
        // placement wins
        let hit = spawner.hit(GridPos::new(5, 0), 30, 30).expect("hit");
        assert_eq!(hit, 1);
        assert_eq!(spawner.foods()[hit].pos, GridPos::new(4, 0));
    }

    #[test]
    fn test_exhaustion_defers() {
        // A 6x4 grid fully covered by the body: nothing can be placed
        let segments = (0..24)
            .map(|i| crate::sim::body::Segment {
                pos: GridPos::new(i % 6, i / 6),
                dir: crate::sim::grid::Direction::Right,
            })
            .collect();
        let body = Body::from_segments(6, 4, segments, 4, true);
        let mut spawner = FoodSpawner::new(&Settings::default());
        let mut rng = Pcg32::seed_from_u64(1);
        let mut events = Vec::new();

        assert_eq!(spawner.replenish(&body, &mut rng, &mut events), 0);
        assert!(spawner.foods().is_empty());
    }

    #[test]
    fn test_place_rejects_overlap() {
        let body = Body::new(20, 20, 4, 4, true);
        let mut spawner = FoodSpawner::new(&Settings::default());
        assert!(spawner.place(Food::new(GridPos::new(0, 0), FoodKind::Special), &body));
        assert!(!spawner.place(Food::new(GridPos::new(5, 3), FoodKind::Normal), &body));
        assert!(spawner.place(Food::new(GridPos::new(6, 3), FoodKind::Normal), &body));
        // On the body
        assert!(!spawner.place(Food::new(GridPos::new(10, 10), FoodKind::Normal), &body));
    }

    proptest! {
        #[test]
        fn prop_spawn_never_overlaps(seed in any::<u64>(), special in 0u32..12, sup in 0u32..25, len in 1usize..40) {
            let body = Body::new(20, 20, len, 4, true);
            let mut spawner = FoodSpawner::new(&Settings::default());
            spawner.special_progress = special;
            spawner.super_progress = sup;
            let mut rng = Pcg32::seed_from_u64(seed);
            let mut events = Vec::new();
            for _ in 0..4 {
                spawner.replenish(&body, &mut rng, &mut events);
            }
            assert_no_overlap(&spawner, &body);
            prop_assert!(spawner.count(FoodKind::Normal) <= 8);
        }
    }
}
