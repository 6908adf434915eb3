/// Scene graph node
///
/// A parent exclusively owns its children. Models are shared through `Arc`
/// so the same geometry can be placed several times.
use super::mesh::Model;
use super::octree::submit_normal_lines;
use crate::camera::Frustum;
use crate::geometry::Aabb;
use crate::rendering::{
    DebugFlags, DebugPrimitive, DrawCommand, RenderQueue, DEBUG_AABB_COLOR,
};
use glam::Mat4;
use rayon::prelude::*;
use std::sync::Arc;

/// Below this many children, submission stays on the calling thread.
const PARALLEL_SUBMIT_MIN_CHILDREN: usize = 4;

pub struct GameObject {
    pub name: String,
    pub local_transform: Mat4,
    world_transform: Mat4,
    /// `None` until `update_world_transforms` finds geometry in the subtree.
    world_aabb: Option<Aabb>,
    model: Option<Arc<Model>>,
    children: Vec<GameObject>,
}

impl GameObject {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            local_transform: Mat4::IDENTITY,
            world_transform: Mat4::IDENTITY,
            world_aabb: None,
            model: None,
            children: Vec::new(),
        }
    }

    pub fn with_model(mut self, model: Arc<Model>) -> Self {
        self.model = Some(model);
        self
    }

    pub fn with_transform(mut self, local: Mat4) -> Self {
        self.local_transform = local;
        self
    }

    /// Take ownership of `child`; returns a handle to it in place.
    pub fn add_child(&mut self, child: GameObject) -> &mut GameObject {
        self.children.push(child);
        let last = self.children.len() - 1;
        &mut self.children[last]
    }

    #[inline]
    pub fn children(&self) -> &[GameObject] {
        &self.children
    }

    #[inline]
    pub fn children_mut(&mut self) -> &mut [GameObject] {
        &mut self.children
    }

    #[inline]
    pub fn model(&self) -> Option<&Arc<Model>> {
        self.model.as_ref()
    }

    #[inline]
    pub fn world_transform(&self) -> &Mat4 {
        &self.world_transform
    }

    /// Bounds of this node's meshes and all descendants, in world space.
    #[inline]
    pub fn world_aabb(&self) -> Option<&Aabb> {
        self.world_aabb.as_ref()
    }

    /// Propagate transforms down the tree and bounds back up.
    pub fn update_world_transforms(&mut self, parent_world: &Mat4) {
        self.world_transform = *parent_world * self.local_transform;
        let world = self.world_transform;

        if self.children.len() >= PARALLEL_SUBMIT_MIN_CHILDREN {
            self.children
                .par_iter_mut()
                .for_each(|child| child.update_world_transforms(&world));
        } else {
            for child in &mut self.children {
                child.update_world_transforms(&world);
            }
        }

        let mut aabb = Aabb::EMPTY;
        if let Some(model) = &self.model {
            for mesh in model.meshes() {
                aabb.encapsulate(&mesh.aabb().transform(&world));
            }
        }
        for child in &self.children {
            if let Some(child_aabb) = &child.world_aabb {
                aabb.encapsulate(child_aabb);
            }
        }
        self.world_aabb = aabb.is_valid().then_some(aabb);
    }

    /// Emit draw commands for everything visible in this subtree.
    ///
    /// Children are traversed in parallel; each rayon task fills its own
    /// queue and the queues are concatenated afterwards, so no list is
    /// shared between threads.
    pub fn submit_to_render_queue<'a>(
        &'a self,
        queue: &mut RenderQueue<'a>,
        frustum: &Frustum,
        debug: DebugFlags,
    ) {
        match &self.world_aabb {
            Some(aabb) if frustum.is_aabb_in_frustum(aabb) => {}
            _ => return,
        }

        self.submit_own_meshes(queue, frustum, debug);

        if self.children.len() >= PARALLEL_SUBMIT_MIN_CHILDREN {
            let mut gathered = self
                .children
                .par_iter()
                .fold(RenderQueue::new, |mut local, child| {
                    child.submit_to_render_queue(&mut local, frustum, debug);
                    local
                })
                .reduce(RenderQueue::new, |mut a, mut b| {
                    a.append(&mut b);
                    a
                });
            queue.append(&mut gathered);
        } else {
            for child in &self.children {
                child.submit_to_render_queue(queue, frustum, debug);
            }
        }
    }

    fn submit_own_meshes<'a>(
        &'a self,
        queue: &mut RenderQueue<'a>,
        frustum: &Frustum,
        debug: DebugFlags,
    ) {
        let Some(model) = &self.model else {
            return;
        };
        let world = &self.world_transform;

        for mesh in model.meshes() {
            if let Some(octree) = mesh.octree() {
                octree.submit_nodes_to_render_queue(mesh, queue, frustum, world, debug);
                continue;
            }

            let world_bounds = mesh.aabb().transform(world);
            if !frustum.is_aabb_in_frustum(&world_bounds) {
                continue;
            }
            if debug.aabbs {
                queue.submit_debug(DebugPrimitive::Aabb {
                    aabb: world_bounds,
                    color: DEBUG_AABB_COLOR,
                });
            }
            queue.submit_draw(DrawCommand::whole_mesh(mesh, *world, debug.rasterize_mode()));
            if debug.normals {
                submit_normal_lines(queue, mesh, mesh.triangles(), world);
            }
        }
    }
}
