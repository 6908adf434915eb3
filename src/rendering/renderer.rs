/// Frame driver for the tile-parallel pipeline
///
/// Phases per frame: Clear -> Bin (parallel over workers, even split of
/// draw commands) -> Rasterize (parallel over tiles, dynamically
/// scheduled) -> Lines -> Post-filter. Binning must finish for every
/// worker before any tile starts, since a tile reads all workers' bins.
use super::bins::{TileGrid, TriangleRef};
use super::edge::EdgeTriangle;
use super::framebuffer::{FrameTile, Framebuffer};
use super::fxaa::EdgeFilter;
use super::lines::{draw_clip_line, ClipLine};
use super::render_queue::{DebugPrimitive, DrawCommand, RenderQueue};
use super::shading::{shade_fragment, Fragment, Lighting};
use super::worker::{BinSettings, BinStats, WorkerContext};
use crate::camera::Camera;
use crate::config::{AntiAliasing, RenderConfig};
use crate::error::ConfigError;
use crate::geometry::Aabb;
use crate::math::pack_color;
use crate::perf::{PerfTimer, PhaseTimings};
use crate::scene::Material;
use glam::{Vec2, Vec3};
use rayon::prelude::*;

/// Barycentric sums below this are treated as degenerate and skipped.
const MIN_WEIGHT_SUM: f32 = 1.0e-6;

/// Counters for one rendered frame.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct FrameStats {
    pub commands: usize,
    pub triangles_submitted: usize,
    pub backface_culled: usize,
    pub trivially_rejected: usize,
    pub clipped: usize,
    pub binned: usize,
    /// Post-clip triangles lost to full triangle pools.
    pub dropped: usize,
    pub pixels_written: usize,
    pub lines_drawn: usize,
    pub pixels_filtered: usize,
    pub timings: PhaseTimings,
}

impl FrameStats {
    fn absorb(&mut self, bins: &BinStats) {
        self.commands += bins.commands;
        self.triangles_submitted += bins.triangles_submitted;
        self.backface_culled += bins.backface_culled;
        self.trivially_rejected += bins.trivially_rejected;
        self.clipped += bins.clipped;
        self.binned += bins.binned;
    }
}

pub struct Renderer {
    config: RenderConfig,
    workers: Vec<WorkerContext>,
    edge_filter: EdgeFilter,
    /// Used by meshes without a material.
    default_material: Material,
}

impl Renderer {
    pub fn new(config: RenderConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let worker_count = config.resolved_worker_count();
        let workers = (0..worker_count)
            .map(|_| WorkerContext::new(config.triangle_pool_capacity))
            .collect();
        log::info!(
            "renderer: {} binning workers, {}px tiles, pool {} triangles/worker",
            worker_count,
            config.tile_size,
            config.triangle_pool_capacity
        );
        Ok(Self {
            config,
            workers,
            edge_filter: EdgeFilter::new(),
            default_material: Material::default(),
        })
    }

    #[inline]
    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    #[inline]
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    pub fn set_anti_aliasing(&mut self, mode: AntiAliasing) {
        self.config.anti_aliasing = mode;
    }

    pub fn set_backface_culling(&mut self, enabled: bool) {
        self.config.backface_culling = enabled;
    }

    /// Render one frame of `queue` into `fb`.
    pub fn render(
        &mut self,
        queue: &RenderQueue<'_>,
        camera: &Camera,
        lighting: &Lighting,
        fb: &mut Framebuffer,
    ) -> FrameStats {
        let frame_timer = PerfTimer::new("frame");
        let mut stats = FrameStats::default();
        let grid = TileGrid::new(fb.width, fb.height, self.config.tile_size);
        let view_proj = camera.view_projection_matrix();
        let draws = queue.draws();

        {
            let timer = PerfTimer::new("clear");
            fb.clear(self.config.clear_color);
            stats.timings.clear = timer.elapsed();
        }

        {
            let timer = PerfTimer::new("bin");
            let settings = BinSettings {
                view_proj,
                grid,
                backface_culling: self.config.backface_culling,
            };
            self.bin(draws, &settings);
            for worker in &self.workers {
                stats.absorb(worker.stats());
                stats.dropped += worker.pool().dropped();
            }
            stats.timings.bin = timer.elapsed();
        }

        {
            let timer = PerfTimer::new("rasterize");
            stats.pixels_written = self.rasterize_tiles(draws, camera.position, lighting, &grid, fb);
            stats.timings.rasterize = timer.elapsed();
        }

        {
            let timer = PerfTimer::new("lines");
            let mut lines_drawn = 0;
            for worker in &self.workers {
                for line in worker.lines() {
                    lines_drawn += draw_clip_line(fb, &grid, line) as usize;
                }
            }
            for primitive in queue.debug_primitives() {
                lines_drawn += draw_debug_primitive(fb, &grid, &view_proj, primitive);
            }
            stats.lines_drawn = lines_drawn;
            stats.timings.lines = timer.elapsed();
        }

        if self.config.anti_aliasing == AntiAliasing::EdgeFilter {
            let timer = PerfTimer::new("post_filter");
            stats.pixels_filtered = self.edge_filter.apply(fb);
            stats.timings.post_filter = timer.elapsed();
        }

        stats.timings.total = frame_timer.elapsed();
        if stats.dropped > 0 {
            log::warn!(
                "triangle pool overflow: {} triangles dropped (capacity {} per worker)",
                stats.dropped,
                self.config.triangle_pool_capacity
            );
        }
        log::debug!(
            "frame: {} commands, {} tris in, {} culled, {} rejected, {} clipped, {} binned, {} px",
            stats.commands,
            stats.triangles_submitted,
            stats.backface_culled,
            stats.trivially_rejected,
            stats.clipped,
            stats.binned,
            stats.pixels_written
        );
        stats.timings.log_summary();
        stats
    }

    /// Static even split: worker `w` takes one contiguous run of commands.
    fn bin(&mut self, draws: &[DrawCommand<'_>], settings: &BinSettings) {
        let tile_count = settings.grid.tile_count();
        let pool_capacity = self.config.triangle_pool_capacity;
        let chunk = draws.len().div_ceil(self.workers.len()).max(1);
        let default_material = &self.default_material;

        self.workers
            .par_iter_mut()
            .enumerate()
            .for_each(|(w, worker)| {
                worker.begin_frame(tile_count, pool_capacity);
                let start = (w * chunk).min(draws.len());
                let end = (start + chunk).min(draws.len());
                for (index, command) in draws[start..end].iter().enumerate() {
                    if material_of(command, default_material).opacity <= 0.0 {
                        continue;
                    }
                    worker.bin_command(start + index, command, settings);
                }
            });
    }

    fn rasterize_tiles(
        &self,
        draws: &[DrawCommand<'_>],
        eye: Vec3,
        lighting: &Lighting,
        grid: &TileGrid,
        fb: &mut Framebuffer,
    ) -> usize {
        let workers = &self.workers;
        let default_material = &self.default_material;

        fb.split_into_tiles(grid.tile_size)
            .into_par_iter()
            .enumerate()
            .map(|(tile_index, mut tile)| {
                let mut written = 0;
                for worker in workers {
                    for &slot in worker.bins().bin(tile_index) {
                        let Some(tri) = worker.pool().get(slot) else {
                            continue;
                        };
                        let Some(command) = draws.get(tri.command as usize) else {
                            continue;
                        };
                        let material = material_of(command, default_material);
                        written += rasterize_triangle(tri, material, lighting, eye, grid, &mut tile);
                    }
                }
                written
            })
            .sum()
    }
}

#[inline]
fn material_of<'m>(command: &'m DrawCommand<'_>, fallback: &'m Material) -> &'m Material {
    command.mesh.material().map_or(fallback, |m| m.as_ref())
}

/// Rasterize one binned triangle inside one tile. Returns pixels written.
fn rasterize_triangle(
    tri: &TriangleRef,
    material: &Material,
    lighting: &Lighting,
    eye: Vec3,
    grid: &TileGrid,
    tile: &mut FrameTile<'_>,
) -> usize {
    let mut screen = [Vec2::ZERO; 3];
    let mut inv_w = [0.0f32; 3];
    for (k, v) in tri.vertices.iter().enumerate() {
        if v.clip_pos.w <= 0.0 {
            return 0;
        }
        inv_w[k] = 1.0 / v.clip_pos.w;
        screen[k] = grid.ndc_to_screen(v.clip_pos.truncate().truncate() * inv_w[k]);
    }
    let Some(edges) = EdgeTriangle::new(screen) else {
        return 0;
    };

    // Attributes pre-divided by w
    let [a, b, c] = &tri.vertices;
    let positions = [a.world_pos * inv_w[0], b.world_pos * inv_w[1], c.world_pos * inv_w[2]];
    let normals = [a.normal * inv_w[0], b.normal * inv_w[1], c.normal * inv_w[2]];
    let uvs = [a.uv * inv_w[0], b.uv * inv_w[1], c.uv * inv_w[2]];

    let mut written = 0;
    edges.for_each_covered(tile.rect(), |x, y, weights| {
        let sum = weights[0] + weights[1] + weights[2];
        if sum.abs() < MIN_WEIGHT_SUM {
            return;
        }
        let bary = weights.map(|w| w / sum);
        let one_over_w = bary[0] * inv_w[0] + bary[1] * inv_w[1] + bary[2] * inv_w[2];
        if one_over_w.is_nan() || one_over_w <= 0.0 {
            return;
        }
        let Some(index) = tile.test_and_set_depth(x, y, one_over_w) else {
            return;
        };

        let w = 1.0 / one_over_w;
        let fragment = Fragment {
            position: (positions[0] * bary[0] + positions[1] * bary[1] + positions[2] * bary[2]) * w,
            normal: (normals[0] * bary[0] + normals[1] * bary[1] + normals[2] * bary[2]) * w,
            uv: (uvs[0] * bary[0] + uvs[1] * bary[1] + uvs[2] * bary[2]) * w,
        };
        let color = shade_fragment(material, lighting, &fragment, eye);
        tile.write_color(index, pack_color(color));
        written += 1;
    });
    written
}

/// Returns the number of line segments drawn.
fn draw_debug_primitive(
    fb: &mut Framebuffer,
    grid: &TileGrid,
    view_proj: &glam::Mat4,
    primitive: &DebugPrimitive,
) -> usize {
    match *primitive {
        DebugPrimitive::Line { from, to, color } => {
            draw_clip_line(fb, grid, &ClipLine::from_world(view_proj, from, to, color)) as usize
        }
        DebugPrimitive::Aabb { aabb, color } => {
            let corners = aabb.corners();
            Aabb::EDGES
                .iter()
                .filter(|&&(i, j)| {
                    draw_clip_line(
                        fb,
                        grid,
                        &ClipLine::from_world(view_proj, corners[i], corners[j], color),
                    )
                })
                .count()
        }
    }
}
