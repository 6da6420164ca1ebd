//! CPU snapshot of a scene
//!
//! Used for the game-over image. Rasterizes the same triangle list the GPU
//! draws, so it works without a drawing surface (headless, tests).

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::scene::Scene;

/// Largest edge a snapshot may have
pub const MAX_SNAPSHOT_EDGE: u32 = 4096;

/// Opaque RGBA8 bitmap, row-major, top row first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RgbaImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl RgbaImage {
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y * self.width + x) * 4) as usize;
        self.pixels.get(i..i + 4).map(|p| [p[0], p[1], p[2], p[3]])
    }
}

/// Anything that can turn a scene into a bitmap. `None` means the capture
/// failed; the game-over event still fires.
pub trait SnapshotSource {
    fn capture(&mut self, scene: &Scene) -> Option<RgbaImage>;
}

/// Source that never produces an image
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSnapshot;

impl SnapshotSource for NoSnapshot {
    fn capture(&mut self, _scene: &Scene) -> Option<RgbaImage> {
        None
    }
}

/// Software rasterizer with straight alpha blending
#[derive(Debug, Clone, Copy)]
pub struct Rasterizer {
    pub width: u32,
    pub height: u32,
}

impl Rasterizer {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn render(&self, scene: &Scene) -> Option<RgbaImage> {
        let (w, h) = (self.width, self.height);
        if w == 0 || h == 0 || w > MAX_SNAPSHOT_EDGE || h > MAX_SNAPSHOT_EDGE {
            log::warn!("Snapshot size {w}x{h} unavailable");
            return None;
        }
        let mut camera = scene.camera.clone();
        camera.set_aspect(w, h);

        let mut color = vec![scene.clear; (w * h) as usize];
        let to_pixel = |p: Vec2| {
            let ndc = camera.world_to_ndc(p);
            Vec2::new(
                (ndc.x + 1.0) * 0.5 * w as f32,
                (1.0 - ndc.y) * 0.5 * h as f32,
            )
        };

        for tri in scene.vertices.chunks_exact(3) {
            let p = [
                to_pixel(tri[0].pos()),
                to_pixel(tri[1].pos()),
                to_pixel(tri[2].pos()),
            ];
            let area = edge(p[0], p[1], p[2]);
            if area.abs() < 1e-9 || !area.is_finite() {
                continue;
            }
            let lo = p[0].min(p[1]).min(p[2]).floor().max(Vec2::ZERO);
            let hi = p[0]
                .max(p[1])
                .max(p[2])
                .ceil()
                .min(Vec2::new(w as f32, h as f32));
            if lo.x >= hi.x || lo.y >= hi.y {
                continue;
            }

            for y in lo.y as u32..hi.y as u32 {
                for x in lo.x as u32..hi.x as u32 {
                    let c = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                    // Barycentric weights, sign-normalized so winding doesn't matter
                    let b0 = edge(p[1], p[2], c) / area;
                    let b1 = edge(p[2], p[0], c) / area;
                    let b2 = edge(p[0], p[1], c) / area;
                    if b0 < 0.0 || b1 < 0.0 || b2 < 0.0 {
                        continue;
                    }
                    let src: [f32; 4] = std::array::from_fn(|k| {
                        tri[0].color[k] * b0 + tri[1].color[k] * b1 + tri[2].color[k] * b2
                    });
                    let dst = &mut color[(y * w + x) as usize];
                    let a = src[3].clamp(0.0, 1.0);
                    for k in 0..3 {
                        dst[k] = src[k] * a + dst[k] * (1.0 - a);
                    }
                    dst[3] = a + dst[3] * (1.0 - a);
                }
            }
        }

        let pixels = color
            .iter()
            .flat_map(|c| c.map(|v| (v.clamp(0.0, 1.0) * 255.0).round() as u8))
            .collect();
        Some(RgbaImage {
            width: w,
            height: h,
            pixels,
        })
    }
}

impl SnapshotSource for Rasterizer {
    fn capture(&mut self, scene: &Scene) -> Option<RgbaImage> {
        self.render(scene)
    }
}

fn edge(a: Vec2, b: Vec2, c: Vec2) -> f32 {
    (b - a).perp_dot(c - a)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Camera;
    use crate::renderer::shapes;

    fn scene(vertices: Vec<super::super::vertex::Vertex>) -> Scene {
        Scene {
            vertices,
            camera: Camera::default(),
            clear: [0.0, 0.0, 0.0, 1.0],
        }
    }

    #[test]
    fn test_zero_size_is_none() {
        let s = scene(Vec::new());
        assert!(Rasterizer::new(0, 10).render(&s).is_none());
        assert!(Rasterizer::new(10, 0).render(&s).is_none());
    }

    #[test]
    fn test_fills_covered_pixels() {
        let red = [1.0, 0.0, 0.0, 1.0];
        // Left half of the view
        let v = shapes::quad(
            Vec2::new(-100.0, -100.0),
            Vec2::new(0.0, -100.0),
            Vec2::new(0.0, 100.0),
            Vec2::new(-100.0, 100.0),
            red,
        );
        let img = Rasterizer::new(32, 18).render(&scene(v.to_vec())).unwrap();
        assert_eq!(img.pixels.len(), 32 * 18 * 4);
        assert_eq!(img.pixel(2, 9), Some([255, 0, 0, 255]));
        assert_eq!(img.pixel(30, 9), Some([0, 0, 0, 255]));
        assert_eq!(img.pixel(32, 0), None);
    }

    #[test]
    fn test_alpha_blends_over_clear() {
        let v = shapes::quad(
            Vec2::new(-100.0, -100.0),
            Vec2::new(100.0, -100.0),
            Vec2::new(100.0, 100.0),
            Vec2::new(-100.0, 100.0),
            [1.0, 1.0, 1.0, 0.5],
        );
        let img = Rasterizer::new(4, 4).render(&scene(v.to_vec())).unwrap();
        let px = img.pixel(1, 1).unwrap();
        assert!((127..=128).contains(&px[0]));
        assert_eq!(px[3], 255);
    }

    #[test]
    fn test_no_snapshot_source() {
        assert!(NoSnapshot.capture(&scene(Vec::new())).is_none());
    }
}
