//! Flying knives
//!
//! Knives live in an arena: `slots` is the backing store, `free` holds the
//! indices of recycled slots and `active` the live ones in spawn order. The
//! arena only ever grows, so spawning never fails.

use std::f32::consts::PI;

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::body::Body;
use super::collision::{HitResult, find_hit};
use super::state::GameEvent;
use crate::settings::Settings;
use crate::wrap_f32;

/// Board edge a volley is thrown from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Side {
    #[default]
    Right,
    Top,
    Left,
    Bottom,
}

impl Side {
    pub fn next(self) -> Self {
        match self {
            Side::Right => Side::Top,
            Side::Top => Side::Left,
            Side::Left => Side::Bottom,
            Side::Bottom => Side::Right,
        }
    }

    /// Start of the half-circle of inward-facing headings (y grows downward)
    fn base_angle(self) -> f32 {
        match self {
            Side::Right => PI / 2.0,
            Side::Top => 0.0,
            Side::Left => -PI / 2.0,
            Side::Bottom => PI,
        }
    }
}

/// A knife, in continuous cell units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Projectile {
    pub pos: Vec2,
    /// Cells per second
    pub vel: Vec2,
    pub rotation: f32,
    /// Radians per second
    pub spin: f32,
    pub age_ms: f64,
    pub lifetime_ms: f64,
    pub radius: f32,
    pub expired: bool,
}

impl Projectile {
    fn integrate(&mut self, dt_ms: f64, width: f32, height: f32) {
        let dt = (dt_ms / 1000.0) as f32;
        let pos = self.pos + self.vel * dt;
        self.pos = Vec2::new(wrap_f32(pos.x, width), wrap_f32(pos.y, height));
        self.rotation = (self.rotation + self.spin * dt) % std::f32::consts::TAU;
        self.age_ms += dt_ms;
        if self.age_ms >= self.lifetime_ms {
            self.expired = true;
        }
    }
}

/// What happened to the snake during one projectile update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HazardReport {
    /// A knife hit the head without immunity
    pub lethal: bool,
    /// Knives that cut the body
    pub body_hits: u32,
    /// Knives absorbed by immunity
    pub deflected: u32,
    /// Knives returned to the pool this update
    pub recycled: u32,
}

/// Owns every knife and the pool they are drawn from
#[derive(Debug, Clone)]
pub struct ProjectileSystem {
    slots: Vec<Projectile>,
    free: Vec<usize>,
    active: Vec<usize>,
    next_side: Side,
    speed_min: f32,
    speed_max: f32,
    spin_min: f32,
    spin_max: f32,
    lifetime_ms: f64,
    radius: f32,
}

impl ProjectileSystem {
    pub fn new(settings: &Settings) -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            active: Vec::new(),
            next_side: Side::default(),
            speed_min: settings.knife_speed_min,
            speed_max: settings.knife_speed_max,
            spin_min: settings.knife_spin_min,
            spin_max: settings.knife_spin_max,
            lifetime_ms: settings.knife_lifetime_ms,
            radius: settings.knife_radius,
        }
    }

    /// Live knives in spawn order
    pub fn iter(&self) -> impl Iterator<Item = &Projectile> {
        self.active.iter().map(|&i| &self.slots[i])
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Slots allocated so far (live + pooled)
    pub fn pool_size(&self) -> usize {
        self.slots.len()
    }

    /// Side the next volley will come from
    pub fn next_side(&self) -> Side {
        self.next_side
    }

    /// Return every knife to the pool
    pub fn reset(&mut self) {
        for slot in self.active.drain(..) {
            self.slots[slot].expired = true;
            self.free.push(slot);
        }
        self.next_side = Side::default();
    }

    /// Rewrap knife positions after the board changed size
    pub fn rewrap(&mut self, width: i32, height: i32) {
        for &i in &self.active {
            let p = &mut self.slots[i];
            p.pos = Vec2::new(wrap_f32(p.pos.x, width as f32), wrap_f32(p.pos.y, height as f32));
        }
    }

    /// Throw a volley of `count` knives from the next side in rotation
    pub fn spawn<R: Rng + ?Sized>(&mut self, count: usize, width: i32, height: i32, rng: &mut R) -> Side {
        let side = self.next_side;
        let (w, h) = (width as f32, height as f32);

        for _ in 0..count {
            let pos = match side {
                Side::Right => Vec2::new(w, rng.random::<f32>() * h),
                Side::Top => Vec2::new(rng.random::<f32>() * w, 0.0),
                Side::Left => Vec2::new(0.0, rng.random::<f32>() * h),
                Side::Bottom => Vec2::new(rng.random::<f32>() * w, h),
            };
            let angle = side.base_angle() + rng.random::<f32>() * PI;
            let speed = rng.random_range(self.speed_min..=self.speed_max);
            let spin = rng.random_range(self.spin_min..=self.spin_max);

            let pos = Vec2::new(wrap_f32(pos.x, w), wrap_f32(pos.y, h));
            let slot = self.spawn_at(pos, Vec2::new(angle.cos(), angle.sin()) * speed);
            self.slots[slot].spin = spin;
        }

        log::debug!("Threw {} knives from {:?}", count, side);
        self.next_side = side.next();
        side
    }

    /// Put one knife into play at an exact position. Returns its slot.
    pub fn spawn_at(&mut self, pos: Vec2, vel: Vec2) -> usize {
        let knife = Projectile {
            pos,
            vel,
            rotation: 0.0,
            spin: 0.0,
            age_ms: 0.0,
            lifetime_ms: self.lifetime_ms,
            radius: self.radius,
            expired: false,
        };
        let slot = match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = knife;
                slot
            }
            None => {
                self.slots.push(knife);
                self.slots.len() - 1
            }
        };
        self.active.push(slot);
        slot
    }

    /// Move, age and collide every knife against the current body.
    ///
    /// Knives are resolved one at a time in spawn order, and a body hit
    /// truncates the snake before the next knife is tested, so later knives
    /// only ever see segments that still exist.
    pub fn update(
        &mut self,
        dt_ms: f64,
        body: &mut Body,
        invincible: bool,
        events: &mut Vec<GameEvent>,
    ) -> HazardReport {
        let (w, h) = (body.width() as f32, body.height() as f32);
        let mut report = HazardReport::default();

        for &slot in &self.active {
            let knife = &mut self.slots[slot];
            knife.integrate(dt_ms, w, h);
            if knife.expired || report.lethal {
                continue;
            }

            match find_hit(knife.pos, knife.radius, body) {
                HitResult::Miss => {}
                _ if invincible => {
                    knife.expired = true;
                    report.deflected += 1;
                }
                HitResult::Head => {
                    report.lethal = true;
                }
                HitResult::Body(index) => {
                    body.truncate(index);
                    knife.expired = true;
                    report.body_hits += 1;
                    log::debug!("Knife cut the body at segment {}, {} left", index, body.len());
                    events.push(GameEvent::BodyTruncated {
                        at: index,
                        remaining: body.len(),
                    });
                }
            }
        }

        let slots = &self.slots;
        let free = &mut self.free;
        self.active.retain(|&slot| {
            if slots[slot].expired {
                free.push(slot);
                report.recycled += 1;
                false
            } else {
                true
            }
        });

        report
    }
}
