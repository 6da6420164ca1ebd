//! Vertex format and palette

use bytemuck::{Pod, Zeroable};
use glam::Vec2;

/// Simple 2D vertex with position and color
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
    pub color: [f32; 4],
}

impl Vertex {
    pub const fn new(x: f32, y: f32, color: [f32; 4]) -> Self {
        Self {
            position: [x, y],
            color,
        }
    }

    pub fn at(p: Vec2, color: [f32; 4]) -> Self {
        Self::new(p.x, p.y, color)
    }

    pub fn pos(&self) -> Vec2 {
        Vec2::from(self.position)
    }

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 2]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

/// Component-wise blend of two colors
pub fn mix(a: [f32; 4], b: [f32; 4], t: f32) -> [f32; 4] {
    std::array::from_fn(|i| a[i] + (b[i] - a[i]) * t)
}

/// Colors for game elements
pub mod colors {
    pub const SKY_TOP: [f32; 4] = [0.36, 0.62, 0.92, 1.0];
    pub const SKY_HORIZON: [f32; 4] = [0.78, 0.89, 0.97, 1.0];
    /// Parallax hills, far to near
    pub const HILLS: [[f32; 4]; 3] = [
        [0.62, 0.74, 0.80, 1.0],
        [0.45, 0.62, 0.55, 1.0],
        [0.31, 0.50, 0.36, 1.0],
    ];
    pub const DIRT: [f32; 4] = [0.45, 0.31, 0.19, 1.0];
    pub const DIRT_DEEP: [f32; 4] = [0.30, 0.20, 0.12, 1.0];
    pub const GRASS: [f32; 4] = [0.36, 0.68, 0.24, 1.0];
    pub const CHASSIS: [f32; 4] = [0.86, 0.22, 0.18, 1.0];
    pub const CABIN: [f32; 4] = [0.93, 0.93, 0.88, 1.0];
    pub const BALLAST: [f32; 4] = [0.25, 0.25, 0.28, 1.0];
    pub const DRIVER: [f32; 4] = [0.98, 0.80, 0.62, 1.0];
    pub const TIRE: [f32; 4] = [0.12, 0.12, 0.13, 1.0];
    pub const HUB: [f32; 4] = [0.70, 0.70, 0.74, 1.0];
    pub const COIN: [f32; 4] = [1.0, 0.82, 0.20, 1.0];
    pub const COIN_RIM: [f32; 4] = [0.85, 0.60, 0.10, 1.0];
    pub const FUEL: [f32; 4] = [0.90, 0.15, 0.15, 1.0];
    pub const FUEL_CAP: [f32; 4] = [0.20, 0.20, 0.22, 1.0];
    pub const BACKGROUND: [f32; 4] = SKY_HORIZON;
}
