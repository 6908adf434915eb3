/// Per-frame list of draw requests and debug primitives.
/// Rebuilt from scratch every frame; nothing carries over between frames.
use crate::geometry::Aabb;
use crate::scene::Mesh;
use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum RasterizeMode {
    #[default]
    Fill,
    Wireframe,
}

/// Debug overlay toggles.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugFlags {
    /// Draw per-vertex normal lines for submitted triangles.
    pub normals: bool,
    /// Draw world-space boxes of visited octree nodes and meshes.
    pub aabbs: bool,
    /// Submit meshes as wireframe instead of filled.
    pub wireframe: bool,
}

impl DebugFlags {
    #[inline]
    pub fn rasterize_mode(&self) -> RasterizeMode {
        if self.wireframe {
            RasterizeMode::Wireframe
        } else {
            RasterizeMode::Fill
        }
    }
}

/// Draw a subset of a mesh's triangles with a world transform.
#[derive(Copy, Clone)]
pub struct DrawCommand<'a> {
    pub mesh: &'a Mesh,
    pub triangles: &'a [[u32; 3]],
    pub world: Mat4,
    pub mode: RasterizeMode,
}

impl<'a> DrawCommand<'a> {
    /// Draw every triangle of `mesh`.
    pub fn whole_mesh(mesh: &'a Mesh, world: Mat4, mode: RasterizeMode) -> Self {
        Self {
            mesh,
            triangles: mesh.triangles(),
            world,
            mode,
        }
    }
}

/// World-space line primitives drawn after the fill pass.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum DebugPrimitive {
    Aabb { aabb: Aabb, color: u32 },
    Line { from: Vec3, to: Vec3, color: u32 },
}

pub const DEBUG_AABB_COLOR: u32 = 0xFF00_FF00;
pub const DEBUG_NORMAL_COLOR: u32 = 0xFF00_A0FF;

#[derive(Default)]
pub struct RenderQueue<'a> {
    draws: Vec<DrawCommand<'a>>,
    debug: Vec<DebugPrimitive>,
}

impl<'a> RenderQueue<'a> {
    pub fn new() -> Self {
        Self {
            draws: Vec::new(),
            debug: Vec::new(),
        }
    }

    #[inline]
    pub fn submit_draw(&mut self, command: DrawCommand<'a>) {
        self.draws.push(command);
    }

    #[inline]
    pub fn submit_debug(&mut self, primitive: DebugPrimitive) {
        self.debug.push(primitive);
    }

    /// Move everything out of `other` into `self`, keeping order.
    pub fn append(&mut self, other: &mut RenderQueue<'a>) {
        self.draws.append(&mut other.draws);
        self.debug.append(&mut other.debug);
    }

    pub fn clear(&mut self) {
        self.draws.clear();
        self.debug.clear();
    }

    #[inline]
    pub fn draws(&self) -> &[DrawCommand<'a>] {
        &self.draws
    }

    #[inline]
    pub fn debug_primitives(&self) -> &[DebugPrimitive] {
        &self.debug
    }

    /// Number of draw commands. Debug primitives are not counted.
    #[inline]
    pub fn len(&self) -> usize {
        self.draws.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.draws.is_empty()
    }
}
