//! Scene building
//!
//! Turns a session plus camera into one world-space triangle list. Both the
//! GPU pipeline and the snapshot rasterizer draw from the same `Scene`.

use glam::Vec2;

use super::shapes;
use super::vertex::{Vertex, colors, mix};
use crate::camera::Camera;
use crate::settings::QualityPreset;
use crate::sim::physics::{PhysicsWorld, RigBody};
use crate::sim::pickups::PickupKind;
use crate::sim::rig::tuning::{BALLAST_BOX, CABIN_BOX, HEAD_OFFSET, MAIN_BOX, WHEEL_RADIUS};
use crate::sim::rng::{BACKDROP_STREAM, SeededRng};
use crate::sim::tick::Session;

/// Horizontal scroll factor per parallax layer, far to near
const PARALLAX: [f32; 3] = [0.15, 0.35, 0.6];
/// Screen-space spacing of parallax samples (world units)
const BACKDROP_STEP: f32 = 0.5;
const GRASS_BAND: f32 = 0.22;

/// One frame worth of geometry
#[derive(Debug, Clone)]
pub struct Scene {
    /// World-space triangle list, back to front
    pub vertices: Vec<Vertex>,
    pub camera: Camera,
    pub clear: [f32; 4],
}

/// Sum-of-sines profile for one decorative hill layer
#[derive(Debug, Clone, Copy)]
struct HillProfile {
    waves: [(f32, f32, f32); 3],
}

impl HillProfile {
    fn new(seed: u32, layer: usize) -> Self {
        let mut rng = SeededRng::stream(seed.wrapping_add(layer as u32), BACKDROP_STREAM);
        let mut wave = |base_freq: f32, amp: f32| {
            (
                base_freq * rng.range(0.7, 1.3),
                rng.range(0.0, std::f32::consts::TAU),
                amp * rng.range(0.6, 1.0),
            )
        };
        Self {
            waves: [wave(0.05, 2.2), wave(0.13, 0.9), wave(0.31, 0.35)],
        }
    }

    fn height(&self, u: f32) -> f32 {
        self.waves
            .iter()
            .map(|&(freq, phase, amp)| (u * freq + phase).sin() * amp)
            .sum()
    }
}

/// Build the draw list for the current frame
pub fn build_scene<W: PhysicsWorld>(
    session: &Session<W>,
    camera: &Camera,
    quality: QualityPreset,
) -> Scene {
    let mut vertices = Vec::with_capacity(8192);
    let (min, max) = camera.view_bounds();

    // Sky
    vertices.extend(shapes::gradient_rect(
        min,
        max,
        colors::SKY_HORIZON,
        colors::SKY_TOP,
    ));

    backdrop(&mut vertices, session.seed, camera, quality.parallax_layers());
    terrain(&mut vertices, session, camera, quality.terrain_stride());
    pickups(&mut vertices, session, camera, quality.circle_segments());
    car(&mut vertices, session, quality.circle_segments());

    Scene {
        vertices,
        camera: camera.clone(),
        clear: colors::BACKGROUND,
    }
}

/// Parallax hills; needs only the camera and the seed
fn backdrop(out: &mut Vec<Vertex>, seed: u32, camera: &Camera, layers: usize) {
    let (min, max) = camera.view_bounds();
    let half = camera.half_extents();
    // Layers drawn are the nearest `layers` of the set
    let first = PARALLAX.len().saturating_sub(layers);
    for layer in first..PARALLAX.len() {
        let profile = HillProfile::new(seed, layer);
        let factor = PARALLAX[layer];
        // Far layers sit higher and drift less with vertical camera motion
        let base = camera.position.y * (1.0 - factor * 0.5) - half.y * (0.05 + 0.18 * layer as f32);
        let columns = ((max.x - min.x) / BACKDROP_STEP).ceil() as usize + 1;
        let samples: Vec<(f32, f32)> = (0..=columns)
            .map(|i| {
                let x = min.x + i as f32 * BACKDROP_STEP;
                let u = x - camera.position.x + camera.position.x * factor;
                (x, base + profile.height(u))
            })
            .collect();
        let color = mix(colors::HILLS[layer], colors::SKY_HORIZON, 0.25 * (2 - layer.min(2)) as f32);
        out.extend(shapes::silhouette(&samples, min.y, color));
    }
}

fn terrain<W: PhysicsWorld>(out: &mut Vec<Vertex>, session: &Session<W>, camera: &Camera, stride: usize) {
    let (min, max) = camera.view_bounds();
    let track = &session.track;
    let range = track.sample_range(min.x - 1.0, max.x + 1.0);
    if range.is_empty() {
        return;
    }
    let last = range.end - 1;
    let mut points: Vec<Vec2> = range
        .clone()
        .step_by(stride.max(1))
        .map(|i| Vec2::new(track.xs[i], track.ys[i]))
        .collect();
    if points.last().map(|p| p.x) != Some(track.xs[last]) {
        points.push(Vec2::new(track.xs[last], track.ys[last]));
    }
    out.extend(shapes::terrain_strip(
        &points,
        min.y - 1.0,
        colors::DIRT,
        colors::DIRT_DEEP,
        colors::GRASS,
        GRASS_BAND,
    ));
}

fn pickups<W: PhysicsWorld>(out: &mut Vec<Vertex>, session: &Session<W>, camera: &Camera, segments: u32) {
    let (min, max) = camera.view_bounds();
    let margin = PickupKind::Fuel.radius();
    for p in &session.pickups {
        if p.taken || p.pos.x < min.x - margin || p.pos.x > max.x + margin {
            continue;
        }
        match p.kind {
            PickupKind::Coin => {
                out.extend(shapes::circle(p.pos, 0.42, colors::COIN, segments));
                out.extend(shapes::ring(p.pos, 0.34, 0.45, colors::COIN_RIM, segments));
            }
            PickupKind::Fuel => {
                out.extend(shapes::oriented_box(
                    p.pos,
                    0.0,
                    Vec2::ZERO,
                    Vec2::new(0.38, 0.5),
                    colors::FUEL,
                ));
                out.extend(shapes::oriented_box(
                    p.pos,
                    0.0,
                    Vec2::new(0.18, 0.58),
                    Vec2::new(0.12, 0.1),
                    colors::FUEL_CAP,
                ));
            }
        }
    }
}

fn car<W: PhysicsWorld>(out: &mut Vec<Vertex>, session: &Session<W>, segments: u32) {
    let chassis = session.world.state(RigBody::Chassis);

    for (half, offset, color) in [
        (BALLAST_BOX.0, BALLAST_BOX.1, colors::BALLAST),
        (MAIN_BOX.0, MAIN_BOX.1, colors::CHASSIS),
        (CABIN_BOX.0, CABIN_BOX.1, colors::CABIN),
    ] {
        out.extend(shapes::oriented_box(chassis.pos, chassis.angle, offset, half, color));
    }
    out.extend(shapes::circle(
        chassis.world_point(HEAD_OFFSET),
        0.22,
        colors::DRIVER,
        segments,
    ));

    for body in [RigBody::RearWheel, RigBody::FrontWheel] {
        let wheel = session.world.state(body);
        out.extend(shapes::circle(wheel.pos, WHEEL_RADIUS, colors::TIRE, segments));
        // Spoke shows rotation
        out.extend(shapes::oriented_box(
            wheel.pos,
            wheel.angle,
            Vec2::ZERO,
            Vec2::new(WHEEL_RADIUS * 0.7, 0.07),
            colors::HUB,
        ));
        out.extend(shapes::circle(wheel.pos, 0.14, colors::HUB, segments / 2));
    }
}
