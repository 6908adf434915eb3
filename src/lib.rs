/// tilerast - Tile-parallel CPU triangle rasterizer
/// Octree-culled scene submission, parallel binning, per-tile
/// rasterization with Phong shading and an optional edge filter
pub mod camera;
pub mod config;
pub mod error;
pub mod geometry;
pub mod math;
pub mod perf;
pub mod rendering;
pub mod scene;

pub use camera::{Camera, CameraController, Frustum, Plane};
pub use config::{AntiAliasing, OctreeConfig, RenderConfig};
pub use error::{ConfigError, MeshError, TextureError};
pub use geometry::Aabb;
pub use perf::{PerfTimer, PhaseTimings};
pub use rendering::{
    DebugFlags, DebugPrimitive, DirectionalLight, DrawCommand, FrameStats, Framebuffer, Lighting,
    RasterizeMode, RenderQueue, Renderer, Texture,
};
pub use scene::{
    primitives, GameObject, IlluminationModel, Material, Mesh, MeshBuilder, Model, Octree, Vertex,
};
