/// Bounding volumes shared by culling and the octree
pub mod aabb;

pub use aabb::Aabb;
