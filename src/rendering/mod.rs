/// Software rasterization pipeline
/// Render queue in, shaded color buffer out
pub mod bins;
pub mod clipping;
pub mod edge;
pub mod framebuffer;
pub mod fxaa;
pub mod lines;
pub mod render_queue;
pub mod renderer;
pub mod shading;
pub mod texture;
pub mod worker;

pub use bins::{TileBins, TileGrid, TrianglePool, TriangleRef};
pub use clipping::{ClipBuffers, ClipOutcome, ClipPolygon, ShadedVertex};
pub use edge::EdgeTriangle;
pub use framebuffer::{FrameTile, Framebuffer};
pub use fxaa::EdgeFilter;
pub use lines::ClipLine;
pub use render_queue::{
    DebugFlags, DebugPrimitive, DrawCommand, RasterizeMode, RenderQueue, DEBUG_AABB_COLOR,
    DEBUG_NORMAL_COLOR,
};
pub use renderer::{FrameStats, Renderer};
pub use shading::{DirectionalLight, Fragment, Lighting};
pub use texture::Texture;
pub use worker::{BinSettings, BinStats, WorkerContext};
