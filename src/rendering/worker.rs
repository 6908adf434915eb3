/// Per-worker binning context
///
/// One `WorkerContext` per binning worker, owned by the renderer and
/// reused across frames: buffers are reset at the start of every frame
/// and grown only when a larger mesh or screen shows up. Nothing here is
/// shared between workers while binning runs.
use super::bins::{TileBins, TileGrid, TriangleRef, TrianglePool};
use super::clipping::{ndc_signed_area, out_code, ClipBuffers, ClipOutcome, ShadedVertex};
use super::lines::ClipLine;
use super::render_queue::{DrawCommand, RasterizeMode};
use crate::math::{normal_matrix, pack_color, safe_normalize};
use glam::{Mat3, Mat4, Vec2};

/// Matrices derived once per draw command.
#[derive(Copy, Clone, Debug)]
struct CommandMatrices {
    mvp: Mat4,
    world: Mat4,
    normal: Mat3,
}

/// Counters of one worker for one frame.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct BinStats {
    pub commands: usize,
    pub triangles_submitted: usize,
    pub backface_culled: usize,
    pub trivially_rejected: usize,
    pub clipped: usize,
    pub binned: usize,
    pub vertices_shaded: usize,
}

/// Per-frame binning settings shared by all workers.
#[derive(Copy, Clone, Debug)]
pub struct BinSettings {
    pub view_proj: Mat4,
    pub grid: TileGrid,
    pub backface_culling: bool,
}

pub struct WorkerContext {
    /// Shaded vertex per mesh vertex slot, valid when its stamp matches.
    vertex_cache: Vec<ShadedVertex>,
    /// Command index + 1 that filled the slot; 0 means empty.
    vertex_stamps: Vec<u32>,
    matrices: Option<(u32, CommandMatrices)>,
    clip: ClipBuffers,
    pool: TrianglePool,
    bins: TileBins,
    lines: Vec<ClipLine>,
    stats: BinStats,
}

impl WorkerContext {
    pub fn new(pool_capacity: usize) -> Self {
        Self {
            vertex_cache: Vec::new(),
            vertex_stamps: Vec::new(),
            matrices: None,
            clip: ClipBuffers::new(),
            pool: TrianglePool::new(pool_capacity),
            bins: TileBins::new(),
            lines: Vec::new(),
            stats: BinStats::default(),
        }
    }

    /// Reset for a new frame. Allocations are kept.
    pub fn begin_frame(&mut self, tile_count: usize, pool_capacity: usize) {
        self.vertex_stamps.fill(0);
        self.matrices = None;
        self.pool.reset(pool_capacity);
        self.bins.reset(tile_count);
        self.lines.clear();
        self.stats = BinStats::default();
    }

    #[inline]
    pub fn pool(&self) -> &TrianglePool {
        &self.pool
    }

    #[inline]
    pub fn bins(&self) -> &TileBins {
        &self.bins
    }

    /// Wireframe edges collected this frame.
    #[inline]
    pub fn lines(&self) -> &[ClipLine] {
        &self.lines
    }

    #[inline]
    pub fn stats(&self) -> &BinStats {
        &self.stats
    }

    /// Shade, cull, clip and bin every triangle of one draw command.
    pub fn bin_command(&mut self, index: usize, command: &DrawCommand<'_>, settings: &BinSettings) {
        let stamp = index as u32 + 1;
        let mesh = command.mesh;
        let vertex_count = mesh.vertices().len();
        if self.vertex_stamps.len() < vertex_count {
            self.vertex_stamps.resize(vertex_count, 0);
            self.vertex_cache.resize(vertex_count, ShadedVertex::default());
        }

        let matrices = self.command_matrices(stamp, command, &settings.view_proj);
        let wire_color = mesh
            .material()
            .map_or(0xFFFF_FFFF, |m| pack_color(m.diffuse));
        self.stats.commands += 1;

        for &tri in command.triangles {
            self.stats.triangles_submitted += 1;
            let vertices = tri.map(|i| self.shade_vertex(stamp, i as usize, command, &matrices));
            let codes_and = vertices
                .iter()
                .fold(u8::MAX, |acc, v| acc & out_code(v.clip_pos));
            if codes_and != 0 {
                self.stats.trivially_rejected += 1;
                continue;
            }

            if settings.backface_culling
                && vertices.iter().all(|v| v.clip_pos.w > 0.0)
                && is_back_facing(&vertices)
            {
                self.stats.backface_culled += 1;
                continue;
            }

            if command.mode == RasterizeMode::Wireframe {
                for k in 0..3 {
                    self.lines.push(ClipLine {
                        from: vertices[k].clip_pos,
                        to: vertices[(k + 1) % 3].clip_pos,
                        color: wire_color,
                    });
                }
                continue;
            }

            self.clip_and_bin(&vertices, index as u32, settings);
        }
    }

    fn command_matrices(
        &mut self,
        stamp: u32,
        command: &DrawCommand<'_>,
        view_proj: &Mat4,
    ) -> CommandMatrices {
        if let Some((cached, matrices)) = self.matrices {
            if cached == stamp {
                return matrices;
            }
        }
        let matrices = CommandMatrices {
            mvp: *view_proj * command.world,
            world: command.world,
            normal: normal_matrix(&command.world),
        };
        self.matrices = Some((stamp, matrices));
        matrices
    }

    #[inline]
    fn shade_vertex(
        &mut self,
        stamp: u32,
        index: usize,
        command: &DrawCommand<'_>,
        matrices: &CommandMatrices,
    ) -> ShadedVertex {
        if self.vertex_stamps[index] == stamp {
            return self.vertex_cache[index];
        }
        let v = &command.mesh.vertices()[index];
        let shaded = ShadedVertex {
            world_pos: matrices.world.transform_point3(v.position),
            clip_pos: matrices.mvp * v.position.extend(1.0),
            normal: safe_normalize(matrices.normal * v.normal),
            uv: v.uv,
        };
        self.vertex_cache[index] = shaded;
        self.vertex_stamps[index] = stamp;
        self.stats.vertices_shaded += 1;
        shaded
    }

    fn clip_and_bin(&mut self, vertices: &[ShadedVertex; 3], command: u32, settings: &BinSettings) {
        let (outcome, polygon) = self.clip.clip_triangle(vertices);
        match outcome {
            ClipOutcome::Rejected => {
                self.stats.trivially_rejected += 1;
                return;
            }
            ClipOutcome::Clipped => self.stats.clipped += 1,
            ClipOutcome::Inside => {}
        }

        let all_in_front = vertices.iter().all(|v| v.clip_pos.w > 0.0);
        for sub in polygon.fan_triangles() {
            // Triangles that crossed w = 0 could not be culled up front
            if settings.backface_culling && !all_in_front && is_back_facing(&sub) {
                self.stats.backface_culled += 1;
                continue;
            }
            bin_triangle(&mut self.pool, &mut self.bins, &mut self.stats, sub, command, &settings.grid);
        }
    }
}

/// NDC of a vertex with w > 0.
#[inline]
fn ndc_xy(v: &ShadedVertex) -> Vec2 {
    v.clip_pos.truncate().truncate() / v.clip_pos.w
}

#[inline]
fn is_back_facing(vertices: &[ShadedVertex; 3]) -> bool {
    ndc_signed_area(ndc_xy(&vertices[0]), ndc_xy(&vertices[1]), ndc_xy(&vertices[2])) >= 0.0
}

fn bin_triangle(
    pool: &mut TrianglePool,
    bins: &mut TileBins,
    stats: &mut BinStats,
    vertices: [ShadedVertex; 3],
    command: u32,
    grid: &TileGrid,
) {
    let ndc = vertices.map(|v| ndc_xy(&v));
    let min = ndc[0].min(ndc[1]).min(ndc[2]);
    let max = ndc[0].max(ndc[1]).max(ndc[2]);
    let Some((tx0, ty0, tx1, ty1)) = grid.tile_range(min, max) else {
        return;
    };

    let Some(slot) = pool.push(TriangleRef { vertices, command }) else {
        return;
    };
    stats.binned += 1;
    for ty in ty0..=ty1 {
        for tx in tx0..=tx1 {
            bins.push(grid.tile_index(tx, ty), slot);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Camera;
    use crate::scene::primitives;
    use glam::Vec3;

    fn settings(camera: &Camera) -> BinSettings {
        BinSettings {
            view_proj: camera.view_projection_matrix(),
            grid: TileGrid::new(64, 64, 16),
            backface_culling: true,
        }
    }

    fn camera_at(z: f32) -> Camera {
        let mut camera = Camera::new(Vec3::new(0.0, 0.0, z), 1.0);
        camera.look_at(Vec3::ZERO, Vec3::Y);
        camera
    }

    #[test]
    fn shared_vertices_are_shaded_once_per_command() {
        let mesh = primitives::quad(1.0).build().unwrap();
        let camera = camera_at(5.0);
        let mut worker = WorkerContext::new(64);
        worker.begin_frame(16, 64);
        let command = DrawCommand::whole_mesh(&mesh, Mat4::IDENTITY, RasterizeMode::Fill);
        worker.bin_command(0, &command, &settings(&camera));

        assert_eq!(worker.stats().vertices_shaded, 4);
        assert_eq!(worker.stats().binned, 2);
        // Second command re-shades: stamps differ
        worker.bin_command(1, &command, &settings(&camera));
        assert_eq!(worker.stats().vertices_shaded, 8);
    }

    #[test]
    fn back_faces_are_culled() {
        let mesh = primitives::quad(1.0).build().unwrap();
        // Looking at the quad from behind
        let camera = camera_at(-5.0);
        let mut worker = WorkerContext::new(64);
        worker.begin_frame(16, 64);
        let command = DrawCommand::whole_mesh(&mesh, Mat4::IDENTITY, RasterizeMode::Fill);
        worker.bin_command(0, &command, &settings(&camera));
        assert_eq!(worker.stats().backface_culled, 2);
        assert_eq!(worker.pool().len(), 0);
    }

    #[test]
    fn pool_overflow_is_counted() {
        let mesh = primitives::uv_sphere(1.0, 8, 8).build().unwrap();
        let camera = camera_at(5.0);
        let mut worker = WorkerContext::new(4);
        worker.begin_frame(16, 4);
        let command = DrawCommand::whole_mesh(&mesh, Mat4::IDENTITY, RasterizeMode::Fill);
        worker.bin_command(0, &command, &settings(&camera));
        assert_eq!(worker.pool().len(), 4);
        assert!(worker.pool().dropped() > 0);
        assert_eq!(worker.stats().binned, 4);
    }

    #[test]
    fn wireframe_commands_emit_lines_instead_of_triangles() {
        let mesh = primitives::quad(1.0).build().unwrap();
        let camera = camera_at(5.0);
        let mut worker = WorkerContext::new(64);
        worker.begin_frame(16, 64);
        let command = DrawCommand::whole_mesh(&mesh, Mat4::IDENTITY, RasterizeMode::Wireframe);
        worker.bin_command(0, &command, &settings(&camera));
        assert_eq!(worker.lines().len(), 6);
        assert!(worker.pool().is_empty());
    }
}
