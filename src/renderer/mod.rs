//! Rendering
//!
//! `scene` builds a world-space triangle list from the session and camera.
//! `pipeline` draws it with WebGPU; `snapshot` rasterizes it on the CPU for
//! the game-over image.

pub mod pipeline;
pub mod scene;
pub mod shapes;
pub mod snapshot;
pub mod vertex;

pub use pipeline::RenderState;
pub use scene::{Scene, build_scene};
pub use snapshot::{NoSnapshot, Rasterizer, RgbaImage, SnapshotSource};
pub use vertex::Vertex;
