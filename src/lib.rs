//! Hill Climb - a 2D side-scrolling driving game core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (terrain, pickups, vehicle rig, control/scoring)
//! - `game`: Fixed-timestep loop, HUD throttling and game-over events
//! - `camera`: Smoothed look-ahead camera
//! - `renderer`: WebGPU rendering pipeline and snapshot rasterizer
//! - `settings`: Player/display preferences

pub mod camera;
pub mod game;
pub mod renderer;
pub mod settings;
pub mod sim;

pub use camera::Camera;
pub use game::{FrameOutput, Game, GameOverEvent};
pub use settings::{QualityPreset, Settings};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Longest real frame time fed to the accumulator (avoids spiral of death)
    pub const MAX_FRAME_DT: f32 = 0.25;
    /// HUD emission rate when nothing urgent happened
    pub const HUD_RATE_HZ: f32 = 30.0;

    /// Track extents and sample spacing (world units)
    pub const TRACK_X0: f32 = -40.0;
    pub const TRACK_X1: f32 = 1800.0;
    pub const TRACK_DX: f32 = 0.25;

    /// Chassis spawn height above the terrain at x=0
    pub const SPAWN_HEIGHT: f32 = 1.55;

    /// Fuel gauge capacity
    pub const FUEL_MAX: f32 = 100.0;

    /// Seed used when no valid seed is supplied
    pub const FALLBACK_SEED: u32 = 1337;

    /// m/s -> km/h
    pub const MS_TO_KMH: f32 = 3.6;
}

/// Normalize an angle to (-π, π]
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::{PI, TAU};
    if !angle.is_finite() {
        return 0.0;
    }
    if angle.abs() > 64.0 * TAU {
        angle %= TAU;
    }
    while angle > PI {
        angle -= TAU;
    }
    while angle <= -PI {
        angle += TAU;
    }
    angle
}

/// Shortest signed rotation taking `from` to `to`, in (-π, π]
#[inline]
pub fn wrap_angle_delta(to: f32, from: f32) -> f32 {
    normalize_angle(to - from)
}

/// Hermite smoothstep of t clamped to [0, 1]
#[inline]
pub fn smoothstep(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Rotate a body-local offset by `angle` and translate it to `origin`
#[inline]
pub fn local_to_world(origin: Vec2, angle: f32, local: Vec2) -> Vec2 {
    origin + Vec2::from_angle(angle).rotate(local)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn test_normalize_angle_range() {
        assert!((normalize_angle(PI) - PI).abs() < 1e-6);
        assert!((normalize_angle(-PI) - PI).abs() < 1e-6);
        assert!((normalize_angle(3.0 * PI / 2.0) + PI / 2.0).abs() < 1e-5);
        assert_eq!(normalize_angle(f32::NAN), 0.0);
    }

    #[test]
    fn test_wrap_delta_across_seam() {
        let d = wrap_angle_delta(-PI + 0.1, PI - 0.1);
        assert!((d - 0.2).abs() < 1e-5);
    }

    #[test]
    fn test_local_to_world() {
        let p = local_to_world(Vec2::new(1.0, 1.0), PI / 2.0, Vec2::new(1.0, 0.0));
        assert!((p - Vec2::new(1.0, 2.0)).length() < 1e-5);
    }
}
