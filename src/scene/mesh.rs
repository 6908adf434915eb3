/// Mesh data structures for rendering
///
/// Meshes are assembled through `MeshBuilder`, which owns mutation while
/// vertices and indices are being loaded and hands back an immutable
/// `Mesh` once the buffers validate.
use super::material::Material;
use super::octree::Octree;
use crate::config::OctreeConfig;
use crate::error::MeshError;
use crate::geometry::Aabb;
use glam::{Vec2, Vec3};
use std::sync::Arc;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Vertex {
    pub position: Vec3,
    pub uv: Vec2,
    pub normal: Vec3,
}

impl Vertex {
    #[inline]
    pub fn new(position: Vec3, uv: Vec2, normal: Vec3) -> Self {
        Self {
            position,
            uv,
            normal,
        }
    }
}

/// Triangle mesh owned by a `Model`.
pub struct Mesh {
    vertices: Vec<Vertex>,
    triangles: Vec<[u32; 3]>,
    material: Option<Arc<Material>>,
    aabb: Aabb,
    octree: Option<Octree>,
}

impl Mesh {
    #[inline]
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Triangles as index triples.
    #[inline]
    pub fn triangles(&self) -> &[[u32; 3]] {
        &self.triangles
    }

    /// Flat index buffer (stride 3).
    #[inline]
    pub fn indices(&self) -> &[u32] {
        self.triangles.as_flattened()
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    #[inline]
    pub fn material(&self) -> Option<&Arc<Material>> {
        self.material.as_ref()
    }

    /// Local-space bounds; `Aabb::ZERO` for an empty mesh.
    #[inline]
    pub fn aabb(&self) -> &Aabb {
        &self.aabb
    }

    #[inline]
    pub fn octree(&self) -> Option<&Octree> {
        self.octree.as_ref()
    }

    /// Local-space bounds of one triangle.
    #[inline]
    pub fn triangle_aabb(&self, tri: [u32; 3]) -> Aabb {
        triangle_aabb(&self.vertices, tri)
    }
}

#[inline]
pub(crate) fn triangle_aabb(vertices: &[Vertex], tri: [u32; 3]) -> Aabb {
    Aabb::from_points(tri.iter().map(|&i| vertices[i as usize].position))
}

#[derive(Default)]
pub struct MeshBuilder {
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    material: Option<Arc<Material>>,
    octree: Option<OctreeConfig>,
}

impl MeshBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(vertices: usize, indices: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertices),
            indices: Vec::with_capacity(indices),
            ..Self::default()
        }
    }

    /// Append a vertex and return its index.
    pub fn push_vertex(&mut self, vertex: Vertex) -> u32 {
        self.vertices.push(vertex);
        (self.vertices.len() - 1) as u32
    }

    pub fn push_triangle(&mut self, a: u32, b: u32, c: u32) -> &mut Self {
        self.indices.extend_from_slice(&[a, b, c]);
        self
    }

    pub fn vertices(mut self, vertices: Vec<Vertex>) -> Self {
        self.vertices = vertices;
        self
    }

    pub fn indices(mut self, indices: Vec<u32>) -> Self {
        self.indices = indices;
        self
    }

    pub fn material(mut self, material: Arc<Material>) -> Self {
        self.material = Some(material);
        self
    }

    /// Build an octree over the finished mesh.
    pub fn octree(mut self, config: OctreeConfig) -> Self {
        self.octree = Some(config);
        self
    }

    pub fn build(self) -> Result<Mesh, MeshError> {
        if self.indices.len() % 3 != 0 {
            return Err(MeshError::IndexCountNotMultipleOfThree(self.indices.len()));
        }
        let vertex_count = self.vertices.len();
        if let Some(&index) = self.indices.iter().find(|&&i| i as usize >= vertex_count) {
            return Err(MeshError::IndexOutOfRange {
                index,
                vertex_count,
            });
        }

        let triangles: Vec<[u32; 3]> = self
            .indices
            .chunks_exact(3)
            .map(|c| [c[0], c[1], c[2]])
            .collect();
        let aabb = Aabb::from_points(self.vertices.iter().map(|v| v.position));

        let mut mesh = Mesh {
            vertices: self.vertices,
            triangles,
            material: self.material,
            aabb,
            octree: None,
        };
        if let Some(config) = self.octree {
            mesh.octree = Some(Octree::build(&mesh, config));
        }
        Ok(mesh)
    }
}

/// A loaded model: the exclusive owner of its meshes.
pub struct Model {
    pub name: String,
    meshes: Vec<Mesh>,
    aabb: Aabb,
}

impl Model {
    pub fn new(name: impl Into<String>, meshes: Vec<Mesh>) -> Self {
        let mut aabb = Aabb::EMPTY;
        for mesh in &meshes {
            aabb.encapsulate(mesh.aabb());
        }
        if !aabb.is_valid() {
            aabb = Aabb::ZERO;
        }
        Self {
            name: name.into(),
            meshes,
            aabb,
        }
    }

    #[inline]
    pub fn meshes(&self) -> &[Mesh] {
        &self.meshes
    }

    /// Union of mesh bounds in model space.
    #[inline]
    pub fn aabb(&self) -> &Aabb {
        &self.aabb
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tri_vertices() -> Vec<Vertex> {
        vec![
            Vertex::new(Vec3::new(0.0, 0.0, 0.0), Vec2::ZERO, Vec3::Z),
            Vertex::new(Vec3::new(2.0, 0.0, -1.0), Vec2::X, Vec3::Z),
            Vertex::new(Vec3::new(0.0, 3.0, 0.5), Vec2::Y, Vec3::Z),
        ]
    }

    #[test]
    fn builder_computes_bounds() {
        let mesh = MeshBuilder::new()
            .vertices(tri_vertices())
            .indices(vec![0, 1, 2])
            .build()
            .unwrap();
        assert_eq!(mesh.triangle_count(), 1);
        assert_eq!(mesh.indices(), &[0, 1, 2]);
        assert_eq!(mesh.aabb().min, Vec3::new(0.0, 0.0, -1.0));
        assert_eq!(mesh.aabb().max, Vec3::new(2.0, 3.0, 0.5));
        assert!(mesh.material().is_none());
        assert!(mesh.octree().is_none());
    }

    #[test]
    fn builder_rejects_bad_indices() {
        let err = MeshBuilder::new()
            .vertices(tri_vertices())
            .indices(vec![0, 1])
            .build()
            .err();
        assert_eq!(err, Some(MeshError::IndexCountNotMultipleOfThree(2)));

        let err = MeshBuilder::new()
            .vertices(tri_vertices())
            .indices(vec![0, 1, 7])
            .build()
            .err();
        assert_eq!(
            err,
            Some(MeshError::IndexOutOfRange {
                index: 7,
                vertex_count: 3
            })
        );
    }

    #[test]
    fn empty_mesh_has_zero_bounds() {
        let mesh = MeshBuilder::new().build().unwrap();
        assert_eq!(*mesh.aabb(), Aabb::ZERO);
        let model = Model::new("empty", vec![mesh]);
        assert_eq!(*model.aabb(), Aabb::ZERO);
    }
}
