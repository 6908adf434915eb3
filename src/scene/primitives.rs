/// Procedural meshes for the viewer, tests and benchmarks.
/// All faces wind counter-clockwise when seen from outside.
use super::mesh::{MeshBuilder, Vertex};
use glam::{Vec2, Vec3};

/// Square in the XY plane facing +Z, centered on the origin.
pub fn quad(half_size: f32) -> MeshBuilder {
    let h = half_size;
    let mut builder = MeshBuilder::with_capacity(4, 6);
    let corners = [
        (Vec3::new(-h, -h, 0.0), Vec2::new(0.0, 1.0)),
        (Vec3::new(h, -h, 0.0), Vec2::new(1.0, 1.0)),
        (Vec3::new(h, h, 0.0), Vec2::new(1.0, 0.0)),
        (Vec3::new(-h, h, 0.0), Vec2::new(0.0, 0.0)),
    ];
    for (position, uv) in corners {
        builder.push_vertex(Vertex::new(position, uv, Vec3::Z));
    }
    builder.push_triangle(0, 1, 2).push_triangle(0, 2, 3);
    builder
}

/// Axis-aligned cube with flat per-face normals (24 vertices).
pub fn cube(half_extent: f32) -> MeshBuilder {
    // (normal, u axis, v axis) with u x v = normal
    const FACES: [(Vec3, Vec3, Vec3); 6] = [
        (Vec3::X, Vec3::NEG_Z, Vec3::Y),
        (Vec3::NEG_X, Vec3::Z, Vec3::Y),
        (Vec3::Y, Vec3::X, Vec3::NEG_Z),
        (Vec3::NEG_Y, Vec3::X, Vec3::Z),
        (Vec3::Z, Vec3::X, Vec3::Y),
        (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
    ];

    let mut builder = MeshBuilder::with_capacity(24, 36);
    for (normal, u, v) in FACES {
        let center = normal * half_extent;
        let base = builder.push_vertex(Vertex::new(
            center + (-u - v) * half_extent,
            Vec2::new(0.0, 1.0),
            normal,
        ));
        builder.push_vertex(Vertex::new(
            center + (u - v) * half_extent,
            Vec2::new(1.0, 1.0),
            normal,
        ));
        builder.push_vertex(Vertex::new(
            center + (u + v) * half_extent,
            Vec2::new(1.0, 0.0),
            normal,
        ));
        builder.push_vertex(Vertex::new(
            center + (v - u) * half_extent,
            Vec2::new(0.0, 0.0),
            normal,
        ));
        builder
            .push_triangle(base, base + 1, base + 2)
            .push_triangle(base, base + 2, base + 3);
    }
    builder
}

/// Latitude/longitude sphere. Pole rows produce zero-area triangles,
/// which the rasterizer skips.
pub fn uv_sphere(radius: f32, rings: u32, segments: u32) -> MeshBuilder {
    let rings = rings.max(2);
    let segments = segments.max(3);
    let stride = segments + 1;
    let mut builder =
        MeshBuilder::with_capacity(((rings + 1) * stride) as usize, (rings * segments * 6) as usize);

    for i in 0..=rings {
        let theta = std::f32::consts::PI * i as f32 / rings as f32;
        for j in 0..=segments {
            let phi = std::f32::consts::TAU * j as f32 / segments as f32;
            let normal = Vec3::new(theta.sin() * phi.cos(), theta.cos(), theta.sin() * phi.sin());
            builder.push_vertex(Vertex::new(
                normal * radius,
                Vec2::new(j as f32 / segments as f32, i as f32 / rings as f32),
                normal,
            ));
        }
    }

    for i in 0..rings {
        for j in 0..segments {
            let a = i * stride + j;
            let b = a + stride;
            builder
                .push_triangle(a, a + 1, b)
                .push_triangle(a + 1, b + 1, b);
        }
    }
    builder
}
