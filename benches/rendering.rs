/// Benchmark suite for rendering pipeline
/// Full frames at several worker counts plus the hot per-phase pieces.
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use glam::{Mat4, Vec2, Vec3};
use std::sync::Arc;
use tilerast::rendering::{EdgeFilter, EdgeTriangle};
use tilerast::*;

const WIDTH: usize = 1280;
const HEIGHT: usize = 720;

fn bench_scene() -> GameObject {
    let texture = Arc::new(Texture::checkerboard(64, 8, [220, 220, 220, 255], [40, 40, 40, 255]));
    let material = Arc::new(Material::colored("bench", Vec3::new(0.8, 0.6, 0.3)).with_texture(texture));
    let sphere = Arc::new(Model::new(
        "sphere",
        vec![primitives::uv_sphere(0.8, 32, 64)
            .material(material.clone())
            .octree(OctreeConfig::default())
            .build()
            .unwrap()],
    ));
    let cube = Arc::new(Model::new(
        "cube",
        vec![primitives::cube(0.7)
            .material(material)
            .octree(OctreeConfig::default())
            .build()
            .unwrap()],
    ));

    let mut root = GameObject::new("root");
    for x in -4..=4 {
        for z in -4..=0 {
            let model = if (x + z) % 2 == 0 { sphere.clone() } else { cube.clone() };
            root.add_child(
                GameObject::new(format!("obj_{x}_{z}"))
                    .with_model(model)
                    .with_transform(Mat4::from_translation(Vec3::new(
                        x as f32 * 2.0,
                        0.0,
                        z as f32 * 2.0,
                    ))),
            );
        }
    }
    root.update_world_transforms(&Mat4::IDENTITY);
    root
}

fn bench_camera() -> Camera {
    let mut camera = Camera::new(Vec3::new(0.0, 4.0, 10.0), WIDTH as f32 / HEIGHT as f32);
    camera.look_at(Vec3::new(0.0, 0.0, -3.0), Vec3::Y);
    camera
}

fn bench_render_frame(c: &mut Criterion) {
    let scene = bench_scene();
    let camera = bench_camera();
    let lighting = Lighting::default();
    let frustum = camera.frustum();

    let mut group = c.benchmark_group("render_frame");
    for workers in [1, 4, 8] {
        group.bench_with_input(BenchmarkId::from_parameter(workers), &workers, |b, &workers| {
            let mut renderer = Renderer::new(RenderConfig {
                worker_count: Some(workers),
                ..RenderConfig::default()
            })
            .unwrap();
            let mut framebuffer = Framebuffer::new(WIDTH, HEIGHT);
            b.iter(|| {
                let mut queue = RenderQueue::new();
                scene.submit_to_render_queue(&mut queue, &frustum, DebugFlags::default());
                black_box(renderer.render(&queue, &camera, &lighting, &mut framebuffer));
            });
        });
    }
    group.finish();
}

fn bench_scene_submission(c: &mut Criterion) {
    let scene = bench_scene();
    let frustum = bench_camera().frustum();
    c.bench_function("scene_submission", |b| {
        b.iter(|| {
            let mut queue = RenderQueue::new();
            scene.submit_to_render_queue(&mut queue, black_box(&frustum), DebugFlags::default());
            black_box(queue.len())
        });
    });
}

fn bench_edge_filter(c: &mut Criterion) {
    let scene = bench_scene();
    let camera = bench_camera();
    let mut renderer = Renderer::new(RenderConfig::default()).unwrap();
    let mut rendered = Framebuffer::new(WIDTH, HEIGHT);
    let mut queue = RenderQueue::new();
    scene.submit_to_render_queue(&mut queue, &camera.frustum(), DebugFlags::default());
    renderer.render(&queue, &camera, &Lighting::default(), &mut rendered);

    c.bench_function("edge_filter", |b| {
        let mut filter = EdgeFilter::new();
        let mut framebuffer = Framebuffer::new(WIDTH, HEIGHT);
        b.iter(|| {
            framebuffer.color_buffer.copy_from_slice(&rendered.color_buffer);
            black_box(filter.apply(&mut framebuffer))
        });
    });
}

fn bench_edge_walker(c: &mut Criterion) {
    c.bench_function("edge_walker_tile", |b| {
        let screen = [Vec2::new(1.3, 0.7), Vec2::new(15.2, 4.9), Vec2::new(6.1, 15.6)];
        b.iter(|| {
            let tri = EdgeTriangle::new(black_box(screen)).unwrap();
            let mut covered = 0usize;
            tri.for_each_covered((0, 0, 16, 16), |_, _, _| covered += 1);
            black_box(covered)
        });
    });
}

fn bench_framebuffer_clear(c: &mut Criterion) {
    c.bench_function("framebuffer_clear", |b| {
        let mut framebuffer = Framebuffer::new(WIDTH, HEIGHT);

        b.iter(|| {
            framebuffer.clear(black_box(0xFF20_2028));
        });
    });
}

criterion_group!(
    benches,
    bench_render_frame,
    bench_scene_submission,
    bench_edge_filter,
    bench_edge_walker,
    bench_framebuffer_clear,
);
criterion_main!(benches);
