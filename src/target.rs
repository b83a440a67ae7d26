use rand::Rng;

use crate::geometry::{Point, Rect};

pub const HITS_PER_STAGE: u32 = 5;
pub const MAX_DAMAGE_STAGE: u32 = 6;

/// Damage stage shown for a given number of hits in the current round.
pub fn damage_stage(hits_this_round: u32) -> u32 {
    (1 + hits_this_round / HITS_PER_STAGE).min(MAX_DAMAGE_STAGE)
}

/// The on-screen target. `position` stays `None` until the first frame of a
/// round tells us how large the frame is.
#[derive(Debug, Clone, PartialEq)]
pub struct Target {
    position: Option<Point>,
    size: f64,
    damage_stage: u32,
    hits_this_round: u32,
}

impl Target {
    pub fn new(size: u32) -> Self {
        Self {
            position: None,
            size: size as f64,
            damage_stage: 1,
            hits_this_round: 0,
        }
    }

    pub fn reset(&mut self) {
        self.position = None;
        self.damage_stage = 1;
        self.hits_this_round = 0;
    }

    /// Move to a uniformly random spot with the whole target inside the
    /// frame. An axis smaller than the target pins that coordinate to 0.
    pub fn relocate<R: Rng + ?Sized>(&mut self, frame_width: u32, frame_height: u32, rng: &mut R) {
        let size = self.size as u32;
        let x = rng.gen_range(0..=frame_width.saturating_sub(size));
        let y = rng.gen_range(0..=frame_height.saturating_sub(size));
        self.position = Some(Point::new(x as f64, y as f64));
        tracing::debug!("target moved to ({}, {})", x, y);
    }

    pub fn register_hit(&mut self) {
        self.hits_this_round += 1;
        let stage = damage_stage(self.hits_this_round);
        if stage != self.damage_stage {
            tracing::info!("target entering damage stage {}", stage);
        }
        self.damage_stage = stage;
    }

    /// Placed and wholly inside a frame of this size. A frame smaller than
    /// the target counts as a fit once the target is pinned at 0 on that axis.
    pub fn fits_in(&self, frame_width: u32, frame_height: u32) -> bool {
        let Some(p) = self.position else {
            return false;
        };
        let fits_axis = |pos: f64, extent: u32| {
            let extent = extent as f64;
            pos >= 0.0 && (pos + self.size <= extent || (self.size > extent && pos == 0.0))
        };
        fits_axis(p.x, frame_width) && fits_axis(p.y, frame_height)
    }

    pub fn is_placed(&self) -> bool {
        self.position.is_some()
    }

    pub fn position(&self) -> Option<Point> {
        self.position
    }

    pub fn rect(&self) -> Option<Rect> {
        self.position
            .map(|p| Rect::new(p.x, p.y, self.size, self.size))
    }

    pub fn size(&self) -> f64 {
        self.size
    }

    pub fn damage_stage(&self) -> u32 {
        self.damage_stage
    }

    pub fn hits_this_round(&self) -> u32 {
        self.hits_this_round
    }

    #[cfg(test)]
    pub(crate) fn place_at(&mut self, p: Point) {
        self.position = Some(p);
    }
}
