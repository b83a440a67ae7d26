use std::time::{Duration, Instant};

use crate::geometry::{Point, Rect};

/// Tracking channel a detected hand is filed under, by its reported label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display)]
pub enum HandSlot {
    Right,
    Left,
}

impl HandSlot {
    pub const ALL: [HandSlot; 2] = [HandSlot::Right, HandSlot::Left];

    pub fn index(self) -> usize {
        match self {
            HandSlot::Right => 0,
            HandSlot::Left => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HandState {
    pub current: Option<Point>,
    pub previous: Option<Point>,
    pub last_hit: Option<Instant>,
}

impl HandState {
    /// Time since this slot last scored, `None` if it never has.
    pub fn since_last_hit(&self, now: Instant) -> Option<Duration> {
        self.last_hit.map(|t| now.saturating_duration_since(t))
    }
}

/// Both hand slots, recomputed from the vision feed every frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Hands {
    slots: [HandState; 2],
}

impl Hands {
    pub fn reset(&mut self) {
        self.slots = Default::default();
    }

    /// Shift current positions into previous and take this frame's samples.
    pub fn sample(&mut self, positions: [Option<Point>; 2]) {
        for (slot, pos) in self.slots.iter_mut().zip(positions) {
            slot.previous = slot.current;
            slot.current = pos;
        }
    }

    pub fn get(&self, slot: HandSlot) -> &HandState {
        &self.slots[slot.index()]
    }

    pub fn mark_hit(&mut self, slot: HandSlot, now: Instant) {
        self.slots[slot.index()].last_hit = Some(now);
    }

    pub fn iter(&self) -> impl Iterator<Item = (HandSlot, &HandState)> {
        HandSlot::ALL.into_iter().zip(self.slots.iter())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub slot: HandSlot,
    pub at: Point,
}

/// Cooldown + circle/rectangle collision rule for turning hand samples into hits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitDetector {
    pub collision_radius: f64,
    pub cooldown: Duration,
}

impl HitDetector {
    pub fn new(collision_radius: f64, cooldown: Duration) -> Self {
        Self {
            collision_radius,
            cooldown,
        }
    }

    fn cooled_down(&self, state: &HandState, now: Instant) -> bool {
        match state.since_last_hit(now) {
            Some(elapsed) => elapsed > self.cooldown,
            None => true,
        }
    }

    /// Find the first slot (right before left) that is off cooldown and
    /// touching the target, and stamp its hit time. Only one hit per frame.
    pub fn detect(&self, hands: &mut Hands, target: Rect, now: Instant) -> Option<Hit> {
        let hit = hands.iter().find_map(|(slot, state)| {
            let pos = state.current?;
            if !self.cooled_down(state, now) {
                return None;
            }
            target
                .intersects_circle(pos, self.collision_radius)
                .then_some(Hit { slot, at: pos })
        })?;

        hands.mark_hit(hit.slot, now);
        Some(hit)
    }
}
