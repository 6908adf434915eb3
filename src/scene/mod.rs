/// Scene data: meshes, materials, the per-mesh octree and the scene graph
pub mod game_object;
pub mod material;
pub mod mesh;
pub mod octree;
pub mod primitives;

pub use game_object::GameObject;
pub use material::{IlluminationModel, Material};
pub use mesh::{Mesh, MeshBuilder, Model, Vertex};
pub use octree::{Octree, OctreeNode};
