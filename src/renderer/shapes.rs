//! Shape generation for 2D primitives
//!
//! Everything comes out as a plain triangle list in world coordinates.

use glam::Vec2;
use std::f32::consts::PI;

use super::vertex::Vertex;

/// Two triangles for a convex quad given counter-clockwise
pub fn quad(a: Vec2, b: Vec2, c: Vec2, d: Vec2, color: [f32; 4]) -> [Vertex; 6] {
    [
        Vertex::at(a, color),
        Vertex::at(b, color),
        Vertex::at(c, color),
        Vertex::at(a, color),
        Vertex::at(c, color),
        Vertex::at(d, color),
    ]
}

/// Axis-aligned rectangle with a vertical gradient
pub fn gradient_rect(min: Vec2, max: Vec2, bottom: [f32; 4], top: [f32; 4]) -> [Vertex; 6] {
    let bl = Vertex::at(min, bottom);
    let br = Vertex::at(Vec2::new(max.x, min.y), bottom);
    let tr = Vertex::at(max, top);
    let tl = Vertex::at(Vec2::new(min.x, max.y), top);
    [bl, br, tr, bl, tr, tl]
}

/// Box with half extents `half`, centred at `offset` in body space, placed
/// on a body at `origin` rotated by `angle`
pub fn oriented_box(
    origin: Vec2,
    angle: f32,
    offset: Vec2,
    half: Vec2,
    color: [f32; 4],
) -> [Vertex; 6] {
    let rot = Vec2::from_angle(angle);
    let corner = |sx: f32, sy: f32| origin + rot.rotate(offset + Vec2::new(sx * half.x, sy * half.y));
    quad(
        corner(-1.0, -1.0),
        corner(1.0, -1.0),
        corner(1.0, 1.0),
        corner(-1.0, 1.0),
        color,
    )
}

/// Generate vertices for a filled circle
pub fn circle(center: Vec2, radius: f32, color: [f32; 4], segments: u32) -> Vec<Vertex> {
    let segments = segments.max(3);
    let mut vertices = Vec::with_capacity((segments * 3) as usize);

    for i in 0..segments {
        let theta1 = (i as f32 / segments as f32) * 2.0 * PI;
        let theta2 = ((i + 1) as f32 / segments as f32) * 2.0 * PI;

        vertices.push(Vertex::at(center, color));
        vertices.push(Vertex::at(center + Vec2::from_angle(theta1) * radius, color));
        vertices.push(Vertex::at(center + Vec2::from_angle(theta2) * radius, color));
    }

    vertices
}

/// Generate vertices for a ring (hollow circle)
pub fn ring(
    center: Vec2,
    inner_radius: f32,
    outer_radius: f32,
    color: [f32; 4],
    segments: u32,
) -> Vec<Vertex> {
    let segments = segments.max(3);
    let mut vertices = Vec::with_capacity((segments * 6) as usize);

    for i in 0..segments {
        let d1 = Vec2::from_angle((i as f32 / segments as f32) * 2.0 * PI);
        let d2 = Vec2::from_angle(((i + 1) as f32 / segments as f32) * 2.0 * PI);

        vertices.extend(quad(
            center + d1 * inner_radius,
            center + d1 * outer_radius,
            center + d2 * outer_radius,
            center + d2 * inner_radius,
            color,
        ));
    }

    vertices
}

/// Ground fill under a polyline down to `floor_y`, with a surface band of
/// `band` thickness on top
pub fn terrain_strip(
    points: &[Vec2],
    floor_y: f32,
    fill: [f32; 4],
    deep: [f32; 4],
    surface: [f32; 4],
    band: f32,
) -> Vec<Vertex> {
    if points.len() < 2 {
        return Vec::new();
    }
    let mut vertices = Vec::with_capacity((points.len() - 1) * 12);

    for pair in points.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let fa = Vec2::new(a.x, floor_y);
        let fb = Vec2::new(b.x, floor_y);
        // Fill fades to the deep color toward the floor
        vertices.extend([
            Vertex::at(fa, deep),
            Vertex::at(fb, deep),
            Vertex::at(b, fill),
            Vertex::at(fa, deep),
            Vertex::at(b, fill),
            Vertex::at(a, fill),
        ]);
        let down = Vec2::new(0.0, band);
        vertices.extend(quad(a - down, b - down, b, a, surface));
    }

    vertices
}

/// Silhouette columns from `floor_y` up to each sampled height
pub fn silhouette(xs_heights: &[(f32, f32)], floor_y: f32, color: [f32; 4]) -> Vec<Vertex> {
    let mut vertices = Vec::with_capacity(xs_heights.len().saturating_sub(1) * 6);
    for pair in xs_heights.windows(2) {
        let ((x0, y0), (x1, y1)) = (pair[0], pair[1]);
        vertices.extend(quad(
            Vec2::new(x0, floor_y),
            Vec2::new(x1, floor_y),
            Vec2::new(x1, y1),
            Vec2::new(x0, y0),
            color,
        ));
    }
    vertices
}
