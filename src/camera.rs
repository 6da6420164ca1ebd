//! Follow camera
//!
//! Updated once per rendered frame, never per physics tick. Eases toward a
//! point ahead of the car so more of the upcoming track is visible.

use glam::Vec2;

/// Exponential follow rate (1/s)
pub const FOLLOW_RATE: f32 = 4.5;
/// Seconds of velocity projected ahead of the car
pub const LOOK_AHEAD_TIME: f32 = 0.35;
pub const LOOK_AHEAD_MIN: f32 = -3.0;
pub const LOOK_AHEAD_MAX: f32 = 9.0;
/// Compact screens get less look-ahead
pub const COMPACT_LOOK_AHEAD: f32 = 0.6;
/// Vertical look from climb/fall speed
pub const LOOK_UP_TIME: f32 = 0.12;
pub const LOOK_UP_MAX: f32 = 2.0;
/// Keep the car a little below screen centre
pub const FRAME_LIFT: f32 = 1.6;
pub const COMPACT_FRAME_LIFT: f32 = 1.0;

/// Visible world height
pub const VIEW_HEIGHT: f32 = 14.0;
pub const COMPACT_VIEW_HEIGHT: f32 = 11.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// World point at the centre of the screen
    pub position: Vec2,
    /// Visible world height; width follows the aspect ratio
    pub view_height: f32,
    /// Width / height of the drawing surface
    pub aspect: f32,
    pub compact: bool,
    /// Snap instead of easing
    pub reduced_motion: bool,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(false, false)
    }
}

impl Camera {
    pub fn new(compact: bool, reduced_motion: bool) -> Self {
        Self {
            position: Vec2::ZERO,
            view_height: if compact {
                COMPACT_VIEW_HEIGHT
            } else {
                VIEW_HEIGHT
            },
            aspect: 16.0 / 9.0,
            compact,
            reduced_motion,
        }
    }

    pub fn set_aspect(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    /// Where the camera wants to be for a car at `pos` moving at `vel`
    pub fn target(&self, pos: Vec2, vel: Vec2) -> Vec2 {
        let bias = if self.compact { COMPACT_LOOK_AHEAD } else { 1.0 };
        let ahead = (vel.x * LOOK_AHEAD_TIME).clamp(LOOK_AHEAD_MIN, LOOK_AHEAD_MAX) * bias;
        let up = (vel.y * LOOK_UP_TIME).clamp(-LOOK_UP_MAX, LOOK_UP_MAX);
        let lift = if self.compact {
            COMPACT_FRAME_LIFT
        } else {
            FRAME_LIFT
        };
        pos + Vec2::new(ahead, up + lift)
    }

    /// Jump straight to the target (spawn, reset)
    pub fn snap(&mut self, pos: Vec2, vel: Vec2) {
        self.position = self.target(pos, vel);
    }

    /// Ease toward the target over one rendered frame
    pub fn follow(&mut self, pos: Vec2, vel: Vec2, frame_dt: f32) {
        let target = self.target(pos, vel);
        if self.reduced_motion {
            self.position = target;
            return;
        }
        let dt = if frame_dt.is_finite() {
            frame_dt.max(0.0)
        } else {
            0.0
        };
        let blend = 1.0 - (-FOLLOW_RATE * dt).exp();
        self.position = self.position.lerp(target, blend);
    }

    /// Half the visible world size
    pub fn half_extents(&self) -> Vec2 {
        let h = self.view_height * 0.5;
        Vec2::new(h * self.aspect, h)
    }

    /// Visible world rectangle (min, max)
    pub fn view_bounds(&self) -> (Vec2, Vec2) {
        let half = self.half_extents();
        (self.position - half, self.position + half)
    }

    /// World point to normalized device coordinates (-1..1, y up)
    pub fn world_to_ndc(&self, p: Vec2) -> Vec2 {
        (p - self.position) / self.half_extents()
    }
}
