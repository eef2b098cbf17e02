//! Timed power-up effects
//!
//! Each effect kind has at most one absolute expiry. Gameplay code only reads
//! the derived [`EffectFlags`], which are recomputed when membership changes.

use serde::{Deserialize, Serialize};

use super::state::GameEvent;

/// Power-up effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectKind {
    /// Hazards and self-collision are not lethal
    Invincible,
    /// Fast movement interval
    SpeedBoost,
    /// Reserved: pass through own body
    Ghost,
    /// Reserved: pull nearby food
    Magnet,
}

impl EffectKind {
    pub const COUNT: usize = 4;
    pub const ALL: [EffectKind; Self::COUNT] = [
        EffectKind::Invincible,
        EffectKind::SpeedBoost,
        EffectKind::Ghost,
        EffectKind::Magnet,
    ];

    #[inline]
    fn index(self) -> usize {
        self as usize
    }

    #[inline]
    fn bit(self) -> u8 {
        1 << self.index()
    }
}

/// Bitset of currently active effects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EffectFlags(u8);

impl EffectFlags {
    #[inline]
    pub fn contains(self, kind: EffectKind) -> bool {
        self.0 & kind.bit() != 0
    }

    #[inline]
    pub fn invincible(self) -> bool {
        self.contains(EffectKind::Invincible)
    }

    #[inline]
    pub fn speed_boost(self) -> bool {
        self.contains(EffectKind::SpeedBoost)
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    fn insert(&mut self, kind: EffectKind) {
        self.0 |= kind.bit();
    }
}

/// Expiry bookkeeping for all effect kinds
#[derive(Debug, Clone, Default)]
pub struct EffectTimer {
    expiries: [Option<f64>; EffectKind::COUNT],
    flags: EffectFlags,
    now_ms: f64,
}

impl EffectTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Derived flags (O(1), the only thing gameplay code should consult)
    #[inline]
    pub fn flags(&self) -> EffectFlags {
        self.flags
    }

    pub fn now_ms(&self) -> f64 {
        self.now_ms
    }

    pub fn is_active(&self, kind: EffectKind) -> bool {
        self.expiries[kind.index()].is_some()
    }

    /// Absolute expiry time, if active
    pub fn expiry_ms(&self, kind: EffectKind) -> Option<f64> {
        self.expiries[kind.index()]
    }

    /// Time left before `kind` expires (0 if inactive)
    pub fn remaining_ms(&self, kind: EffectKind) -> f64 {
        self.expiries[kind.index()]
            .map(|end| (end - self.now_ms).max(0.0))
            .unwrap_or(0.0)
    }

    /// Activate `kind` until `now + duration_ms`.
    ///
    /// Re-adding an active effect resets its expiry; durations never stack.
    pub fn add_effect(&mut self, kind: EffectKind, duration_ms: f64, events: &mut Vec<GameEvent>) {
        self.expiries[kind.index()] = Some(self.now_ms + duration_ms);
        events.push(GameEvent::EffectStarted {
            effect: kind,
            duration_ms,
        });
        self.recompute_flags(events);
    }

    /// Cancel `kind` early. Returns false if it wasn't active.
    pub fn remove_effect(&mut self, kind: EffectKind, events: &mut Vec<GameEvent>) -> bool {
        if self.expiries[kind.index()].take().is_none() {
            return false;
        }
        events.push(GameEvent::EffectEnded { effect: kind });
        self.recompute_flags(events);
        true
    }

    /// Advance the timer clock and purge expired effects.
    ///
    /// Returns true if any effect ended.
    pub fn update(&mut self, now_ms: f64, events: &mut Vec<GameEvent>) -> bool {
        self.now_ms = now_ms;
        let mut changed = false;

        for kind in EffectKind::ALL {
            let slot = &mut self.expiries[kind.index()];
            if slot.is_some_and(|end| now_ms >= end) {
                *slot = None;
                changed = true;
                log::debug!("Effect {:?} ended at {:.0}ms", kind, now_ms);
                events.push(GameEvent::EffectEnded { effect: kind });
            }
        }

        if changed {
            self.recompute_flags(events);
        }
        changed
    }

    /// Drop every effect without notifications (used on reset)
    pub fn clear(&mut self) {
        self.expiries = [None; EffectKind::COUNT];
        self.flags = EffectFlags::default();
        self.now_ms = 0.0;
    }

    fn recompute_flags(&mut self, events: &mut Vec<GameEvent>) {
        let mut flags = EffectFlags::default();
        for kind in EffectKind::ALL {
            if self.expiries[kind.index()].is_some() {
                flags.insert(kind);
            }
        }
        if flags != self.flags {
            self.flags = flags;
            events.push(GameEvent::FlagsChanged { flags });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refresh_does_not_stack() {
        let mut timer = EffectTimer::new();
        let mut events = Vec::new();

        timer.update(100.0, &mut events);
        timer.add_effect(EffectKind::SpeedBoost, 1000.0, &mut events);
        assert_eq!(timer.expiry_ms(EffectKind::SpeedBoost), Some(1100.0));

        timer.update(400.0, &mut events);
        timer.add_effect(EffectKind::SpeedBoost, 1000.0, &mut events);
        assert_eq!(timer.expiry_ms(EffectKind::SpeedBoost), Some(1400.0));
        assert_eq!(timer.remaining_ms(EffectKind::SpeedBoost), 1000.0);
    }

    #[test]
    fn test_flags_follow_membership() {
        let mut timer = EffectTimer::new();
        let mut events = Vec::new();

        timer.add_effect(EffectKind::Invincible, 500.0, &mut events);
        timer.add_effect(EffectKind::SpeedBoost, 800.0, &mut events);
        assert!(timer.flags().invincible());
        assert!(timer.flags().speed_boost());
        assert!(!timer.flags().contains(EffectKind::Ghost));

        events.clear();
        assert!(!timer.update(499.0, &mut events));
        assert!(events.is_empty());

        assert!(timer.update(500.0, &mut events));
        assert!(!timer.flags().invincible());
        assert!(timer.flags().speed_boost());
        assert_eq!(
            events[0],
            GameEvent::EffectEnded {
                effect: EffectKind::Invincible
            }
        );
        assert!(matches!(events[1], GameEvent::FlagsChanged { .. }));

        timer.update(900.0, &mut events);
        assert!(timer.flags().is_empty());
    }

    #[test]
    fn test_remove_effect() {
        let mut timer = EffectTimer::new();
        let mut events = Vec::new();
        assert!(!timer.remove_effect(EffectKind::Magnet, &mut events));

        timer.add_effect(EffectKind::Magnet, 300.0, &mut events);
        assert!(timer.flags().contains(EffectKind::Magnet));
        assert!(timer.remove_effect(EffectKind::Magnet, &mut events));
        assert!(timer.flags().is_empty());
        assert_eq!(timer.remaining_ms(EffectKind::Magnet), 0.0);
    }
}
