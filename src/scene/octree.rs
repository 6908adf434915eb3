/// Per-mesh octree over triangles
///
/// Nodes live in a flat arena; the 8 children of a node are stored
/// contiguously starting at `first_child`. A triangle is stored at the
/// deepest node whose bounds fully contain it, so triangles straddling a
/// split plane stay on the internal node.
///
/// Depth is capped by `OctreeConfig::max_depth`: a leaf at the cap keeps
/// accepting triangles instead of subdividing, which bounds the tree for
/// degenerate input (e.g. many coincident triangles).
use super::mesh::{triangle_aabb, Mesh, Vertex};
use crate::camera::Frustum;
use crate::config::OctreeConfig;
use crate::geometry::Aabb;
use crate::math::{normal_matrix, safe_normalize};
use crate::rendering::{
    DebugFlags, DebugPrimitive, DrawCommand, RenderQueue, DEBUG_AABB_COLOR, DEBUG_NORMAL_COLOR,
};
use glam::{Mat4, Vec3};

/// Length of debug normal lines in world units.
pub const NORMAL_LINE_LENGTH: f32 = 0.2;

pub struct OctreeNode {
    pub bounds: Aabb,
    pub depth: u32,
    first_child: Option<u32>,
    triangles: Vec<[u32; 3]>,
}

impl OctreeNode {
    fn new(bounds: Aabb, depth: u32) -> Self {
        Self {
            bounds,
            depth,
            first_child: None,
            triangles: Vec::new(),
        }
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.first_child.is_none()
    }

    /// Arena indices of the 8 children, if subdivided.
    #[inline]
    pub fn children(&self) -> Option<std::ops::Range<usize>> {
        self.first_child
            .map(|first| first as usize..first as usize + 8)
    }

    /// Triangles terminating at this node.
    #[inline]
    pub fn triangles(&self) -> &[[u32; 3]] {
        &self.triangles
    }
}

pub struct Octree {
    nodes: Vec<OctreeNode>,
    config: OctreeConfig,
}

impl Octree {
    pub const ROOT: usize = 0;

    /// Insert every triangle of `mesh`, one at a time, under the mesh bounds.
    pub fn build(mesh: &Mesh, config: OctreeConfig) -> Self {
        let mut octree = Self {
            nodes: vec![OctreeNode::new(*mesh.aabb(), 0)],
            config,
        };
        for &tri in mesh.triangles() {
            octree.insert(mesh.vertices(), tri);
        }
        log::trace!(
            "octree built: {} triangles, {} nodes, depth {}",
            mesh.triangle_count(),
            octree.nodes.len(),
            octree.depth()
        );
        octree
    }

    #[inline]
    pub fn nodes(&self) -> &[OctreeNode] {
        &self.nodes
    }

    #[inline]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn config(&self) -> OctreeConfig {
        self.config
    }

    /// Sum of triangle-list lengths over all nodes.
    pub fn triangle_count(&self) -> usize {
        self.nodes.iter().map(|n| n.triangles.len()).sum()
    }

    /// Deepest node depth (root = 0).
    pub fn depth(&self) -> u32 {
        self.nodes.iter().map(|n| n.depth).max().unwrap_or(0)
    }

    /// Visit nodes depth-first from the root.
    pub fn for_each_node<F: FnMut(usize, &OctreeNode)>(&self, mut f: F) {
        let mut stack = vec![Self::ROOT];
        while let Some(idx) = stack.pop() {
            let node = &self.nodes[idx];
            f(idx, node);
            if let Some(children) = node.children() {
                stack.extend(children.rev());
            }
        }
    }

    fn insert(&mut self, vertices: &[Vertex], tri: [u32; 3]) {
        self.insert_from(Self::ROOT, vertices, tri);
    }

    /// Descend from `start` to the deepest node containing the triangle.
    fn insert_from(&mut self, start: usize, vertices: &[Vertex], tri: [u32; 3]) {
        let tri_bounds = triangle_aabb(vertices, tri);
        let mut idx = start;

        while let Some(children) = self.nodes[idx].children() {
            match children
                .clone()
                .find(|&c| self.nodes[c].bounds.contains(&tri_bounds))
            {
                Some(child) => idx = child,
                None => {
                    // Straddles a split plane: stays on the internal node
                    self.nodes[idx].triangles.push(tri);
                    return;
                }
            }
        }

        let node = &mut self.nodes[idx];
        node.triangles.push(tri);
        if node.triangles.len() > self.config.split_threshold && node.depth < self.config.max_depth
        {
            self.subdivide(idx, vertices);
        }
    }

    /// Split a leaf into 8 octants and re-insert its triangles.
    fn subdivide(&mut self, idx: usize, vertices: &[Vertex]) {
        let bounds = self.nodes[idx].bounds;
        let depth = self.nodes[idx].depth + 1;
        let center = bounds.center();
        let first = self.nodes.len();

        for octant in 0..8 {
            let pick = |bit: usize, lo: f32, mid: f32, hi: f32| {
                if octant & bit == 0 {
                    (lo, mid)
                } else {
                    (mid, hi)
                }
            };
            let (x0, x1) = pick(1, bounds.min.x, center.x, bounds.max.x);
            let (y0, y1) = pick(2, bounds.min.y, center.y, bounds.max.y);
            let (z0, z1) = pick(4, bounds.min.z, center.z, bounds.max.z);
            self.nodes.push(OctreeNode::new(
                Aabb::new(Vec3::new(x0, y0, z0), Vec3::new(x1, y1, z1)),
                depth,
            ));
        }

        let held = std::mem::take(&mut self.nodes[idx].triangles);
        self.nodes[idx].first_child = Some(first as u32);
        for tri in held {
            self.insert_from(idx, vertices, tri);
        }
    }

    /// Frustum-test every node's world-space bounds and emit one draw
    /// command per visible node with a non-empty triangle list.
    /// Rejected nodes skip their entire subtree. Returns the number of
    /// draw commands emitted.
    pub fn submit_nodes_to_render_queue<'a>(
        &'a self,
        mesh: &'a Mesh,
        queue: &mut RenderQueue<'a>,
        frustum: &Frustum,
        world: &Mat4,
        debug: DebugFlags,
    ) -> usize {
        let mode = debug.rasterize_mode();
        let mut emitted = 0;
        let mut stack = Vec::with_capacity(64);
        stack.push(Self::ROOT);

        while let Some(idx) = stack.pop() {
            let node = &self.nodes[idx];
            let world_bounds = node.bounds.transform(world);
            if !frustum.is_aabb_in_frustum(&world_bounds) {
                continue;
            }

            if debug.aabbs {
                queue.submit_debug(DebugPrimitive::Aabb {
                    aabb: world_bounds,
                    color: DEBUG_AABB_COLOR,
                });
            }

            if !node.triangles.is_empty() {
                queue.submit_draw(DrawCommand {
                    mesh,
                    triangles: &node.triangles,
                    world: *world,
                    mode,
                });
                emitted += 1;
                if debug.normals {
                    submit_normal_lines(queue, mesh, &node.triangles, world);
                }
            }

            if let Some(children) = node.children() {
                stack.extend(children);
            }
        }

        emitted
    }
}

/// One line per triangle corner along its world-space normal.
pub(crate) fn submit_normal_lines(
    queue: &mut RenderQueue<'_>,
    mesh: &Mesh,
    triangles: &[[u32; 3]],
    world: &Mat4,
) {
    let normal_to_world = normal_matrix(world);
    for tri in triangles {
        for &i in tri {
            let v = &mesh.vertices()[i as usize];
            let from = world.transform_point3(v.position);
            let n = safe_normalize(normal_to_world * v.normal);
            queue.submit_debug(DebugPrimitive::Line {
                from,
                to: from + n * NORMAL_LINE_LENGTH,
                color: DEBUG_NORMAL_COLOR,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{primitives, MeshBuilder};
    use std::collections::HashMap;

    fn sphere(config: OctreeConfig) -> Mesh {
        primitives::uv_sphere(2.0, 16, 24).octree(config).build().unwrap()
    }

    #[test]
    fn every_triangle_is_stored_exactly_once() {
        let mesh = sphere(OctreeConfig::default());
        let octree = mesh.octree().unwrap();
        assert_eq!(octree.triangle_count(), mesh.triangle_count());
        assert!(octree.node_count() > 1, "sphere should subdivide");

        let mut seen: HashMap<[u32; 3], usize> = HashMap::new();
        octree.for_each_node(|_, node| {
            for &tri in node.triangles() {
                *seen.entry(tri).or_default() += 1;
            }
        });
        for tri in mesh.triangles() {
            assert_eq!(seen.get(tri), Some(&1), "triangle {tri:?}");
        }
    }

    #[test]
    fn triangles_lie_inside_their_node() {
        let mesh = sphere(OctreeConfig::default());
        let octree = mesh.octree().unwrap();
        octree.for_each_node(|_, node| {
            for &tri in node.triangles() {
                assert!(node.bounds.contains(&mesh.triangle_aabb(tri)));
            }
        });
    }

    #[test]
    fn leaves_respect_split_threshold_below_depth_cap() {
        let config = OctreeConfig {
            split_threshold: 8,
            max_depth: 10,
        };
        let mesh = sphere(config);
        let octree = mesh.octree().unwrap();
        octree.for_each_node(|_, node| {
            if node.is_leaf() && node.depth < config.max_depth {
                assert!(node.triangles().len() <= config.split_threshold);
            }
        });
    }

    #[test]
    fn depth_cap_holds_for_coincident_triangles() {
        // 100 copies of one tiny triangle can never be separated
        let mut builder = MeshBuilder::new();
        for p in [
            Vec3::ZERO,
            Vec3::new(0.001, 0.0, 0.0),
            Vec3::new(0.0, 0.001, 0.0),
            Vec3::splat(4.0),
        ] {
            builder.push_vertex(Vertex::new(p, glam::Vec2::ZERO, Vec3::Z));
        }
        for _ in 0..100 {
            builder.push_triangle(0, 1, 2);
        }
        let config = OctreeConfig {
            split_threshold: 4,
            max_depth: 3,
        };
        let mesh = builder.octree(config).build().unwrap();
        let octree = mesh.octree().unwrap();
        assert_eq!(octree.depth(), 3);
        assert_eq!(octree.triangle_count(), mesh.triangle_count());
    }

    #[test]
    fn culled_tree_emits_nothing() {
        let mesh = sphere(OctreeConfig::default());
        let octree = mesh.octree().unwrap();
        let mut camera = crate::camera::Camera::new(Vec3::new(0.0, 0.0, 10.0), 1.0);
        camera.look_at(Vec3::ZERO, Vec3::Y);
        let frustum = camera.frustum();

        let mut queue = RenderQueue::new();
        let far_away = Mat4::from_translation(Vec3::new(0.0, 0.0, 5000.0));
        let emitted = octree.submit_nodes_to_render_queue(
            &mesh,
            &mut queue,
            &frustum,
            &far_away,
            DebugFlags::default(),
        );
        assert_eq!(emitted, 0);
        assert!(queue.is_empty());

        let visible = octree.submit_nodes_to_render_queue(
            &mesh,
            &mut queue,
            &frustum,
            &Mat4::IDENTITY,
            DebugFlags {
                aabbs: true,
                ..DebugFlags::default()
            },
        );
        assert!(visible > 0);
        assert_eq!(queue.len(), visible);
        let drawn: usize = queue.draws().iter().map(|d| d.triangles.len()).sum();
        assert_eq!(drawn, mesh.triangle_count());
        assert!(!queue.debug_primitives().is_empty());
    }
}
