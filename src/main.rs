/// Viewer entry point
/// Handles window creation, input, scene setup and the render loop
use glam::{Mat4, Quat, Vec3};
use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;
use std::error::Error;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Instant;
use tilerast::*;
use winit::{
    event::*,
    event_loop::{ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowBuilder},
};

const RING_OBJECTS: usize = 12;
const RING_RADIUS: f32 = 6.0;
const RING_SPEED: f32 = 0.25;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match std::env::args().nth(1) {
        Some(path) => {
            log::info!("loading render config from {path}");
            RenderConfig::load(&path)?
        }
        None => RenderConfig::default(),
    };
    let mut debug = config.debug;
    let mut renderer = Renderer::new(config)?;

    println!("=== tilerast viewer ===");
    println!("Controls:");
    println!("  WASD - Move camera");
    println!("  Space/Shift - Up/Down");
    println!("  Mouse (click to capture) - Look around");
    println!("  F - Toggle edge anti-aliasing");
    println!("  B - Toggle AABB overlay");
    println!("  N - Toggle normals overlay");
    println!("  G - Toggle wireframe");
    println!("  ESC - Release mouse / exit");
    println!();

    let event_loop = EventLoop::new()?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title("tilerast")
            .with_inner_size(winit::dpi::LogicalSize::new(1280, 720))
            .build(&event_loop)?,
    );

    let context = softbuffer::Context::new(window.clone())?;
    let mut surface = softbuffer::Surface::new(&context, window.clone())?;

    let window_size = window.inner_size();
    let mut framebuffer =
        Framebuffer::new(window_size.width as usize, window_size.height as usize);

    let aspect_ratio = window_size.width as f32 / window_size.height.max(1) as f32;
    let mut camera = Camera::new(Vec3::new(0.0, 4.0, 14.0), aspect_ratio);
    camera.look_at(Vec3::ZERO, Vec3::Y);
    let mut camera_controller = CameraController::new();
    let lighting = Lighting::default();

    let build_start = Instant::now();
    let mut scene = build_scene(renderer.config().octree)?;
    log::info!(
        "scene built in {:.2}ms",
        build_start.elapsed().as_secs_f64() * 1000.0
    );

    let start = Instant::now();
    let mut last_frame = Instant::now();
    let mut frame_count = 0u32;
    let mut fps_timer = Instant::now();

    let mut mouse_captured = false;
    let mut last_mouse_pos: Option<(f64, f64)> = None;

    event_loop.run(move |event, elwt| {
        elwt.set_control_flow(ControlFlow::Poll);

        match event {
            Event::WindowEvent { event, .. } => match event {
                WindowEvent::CloseRequested => {
                    elwt.exit();
                }
                WindowEvent::Resized(new_size) => {
                    framebuffer.resize(new_size.width as usize, new_size.height as usize);
                    if new_size.height > 0 {
                        camera.set_aspect_ratio(new_size.width as f32 / new_size.height as f32);
                    }
                }
                WindowEvent::KeyboardInput { event, .. } => {
                    let pressed = event.state == ElementState::Pressed;

                    if let PhysicalKey::Code(keycode) = event.physical_key {
                        match keycode {
                            KeyCode::KeyW => camera_controller.forward_pressed = pressed,
                            KeyCode::KeyS => camera_controller.backward_pressed = pressed,
                            KeyCode::KeyA => camera_controller.left_pressed = pressed,
                            KeyCode::KeyD => camera_controller.right_pressed = pressed,
                            KeyCode::Space => camera_controller.up_pressed = pressed,
                            KeyCode::ShiftLeft => camera_controller.down_pressed = pressed,
                            KeyCode::KeyF if pressed => {
                                let mode = match renderer.config().anti_aliasing {
                                    AntiAliasing::Off => AntiAliasing::EdgeFilter,
                                    AntiAliasing::EdgeFilter => AntiAliasing::Off,
                                };
                                renderer.set_anti_aliasing(mode);
                                log::info!("anti-aliasing: {mode:?}");
                            }
                            KeyCode::KeyB if pressed => {
                                debug.aabbs = !debug.aabbs;
                                log::info!("AABB overlay: {}", on_off(debug.aabbs));
                            }
                            KeyCode::KeyN if pressed => {
                                debug.normals = !debug.normals;
                                log::info!("normals overlay: {}", on_off(debug.normals));
                            }
                            KeyCode::KeyG if pressed => {
                                debug.wireframe = !debug.wireframe;
                                log::info!("wireframe: {}", on_off(debug.wireframe));
                            }
                            KeyCode::Escape if pressed => {
                                if mouse_captured {
                                    mouse_captured = false;
                                    last_mouse_pos = None;
                                    window.set_cursor_visible(true);
                                } else {
                                    elwt.exit();
                                }
                            }
                            _ => {}
                        }
                    }
                }
                WindowEvent::MouseInput { state, button, .. } => {
                    if button == MouseButton::Left && state == ElementState::Pressed {
                        mouse_captured = true;
                        window.set_cursor_visible(false);
                    }
                }
                WindowEvent::CursorMoved { position, .. } => {
                    if mouse_captured {
                        if let Some(last_pos) = last_mouse_pos {
                            let delta_x = position.x - last_pos.0;
                            let delta_y = position.y - last_pos.1;
                            camera.rotate(delta_x as f32, delta_y as f32);
                        }
                        last_mouse_pos = Some((position.x, position.y));
                    }
                }
                WindowEvent::RedrawRequested => {
                    let now = Instant::now();
                    let dt = (now - last_frame).as_secs_f32();
                    last_frame = now;
                    camera_controller.update_camera(&mut camera, dt);

                    animate_ring(&mut scene, start.elapsed().as_secs_f32());
                    scene.update_world_transforms(&Mat4::IDENTITY);

                    let frustum = camera.frustum();
                    let mut queue = RenderQueue::new();
                    scene.submit_to_render_queue(&mut queue, &frustum, debug);
                    let stats = renderer.render(&queue, &camera, &lighting, &mut framebuffer);

                    if let Err(err) = present(&mut surface, &framebuffer) {
                        log::error!("present failed: {err}");
                        elwt.exit();
                        return;
                    }

                    frame_count += 1;
                    if fps_timer.elapsed().as_secs() >= 1 {
                        log::info!(
                            "FPS: {} | commands: {} | binned: {} | culled: {} | px: {}",
                            frame_count,
                            stats.commands,
                            stats.binned,
                            stats.backface_culled,
                            stats.pixels_written
                        );
                        frame_count = 0;
                        fps_timer = Instant::now();
                    }
                }
                _ => {}
            },
            Event::AboutToWait => {
                window.request_redraw();
            }
            _ => {}
        }
    })?;

    Ok(())
}

fn on_off(enabled: bool) -> &'static str {
    if enabled {
        "ON"
    } else {
        "OFF"
    }
}

/// Copy the finished frame to the window. Zero-sized windows are skipped.
fn present(
    surface: &mut softbuffer::Surface<Arc<Window>, Arc<Window>>,
    framebuffer: &Framebuffer,
) -> Result<(), softbuffer::SoftBufferError> {
    perf_scope!("present");
    let (Some(width), Some(height)) = (
        NonZeroU32::new(framebuffer.width as u32),
        NonZeroU32::new(framebuffer.height as u32),
    ) else {
        return Ok(());
    };
    surface.resize(width, height)?;
    let mut buffer = surface.buffer_mut()?;
    buffer.copy_from_slice(framebuffer.color_buffer_slice());
    buffer.present()
}

/// Ground plane plus a ring of alternating cubes and spheres that share
/// two models and one checkerboard texture.
fn build_scene(octree: OctreeConfig) -> Result<GameObject, Box<dyn Error>> {
    let checker = Arc::new(Texture::checkerboard(
        64,
        8,
        [230, 230, 230, 255],
        [60, 60, 70, 255],
    ));
    let ground_material = Arc::new(
        Material::colored("ground", Vec3::new(0.8, 0.8, 0.8)).with_texture(checker.clone()),
    );
    let cube_material = Arc::new(
        Material::colored("cube", Vec3::new(0.9, 0.5, 0.2)).with_texture(checker),
    );
    let sphere_material = Arc::new(Material {
        specular: Vec3::splat(0.6),
        shininess: 32,
        ..Material::colored("sphere", Vec3::new(0.2, 0.5, 0.9))
    });

    let ground = Arc::new(Model::new(
        "ground",
        vec![primitives::quad(20.0)
            .material(ground_material)
            .octree(octree)
            .build()?],
    ));
    let cube = Arc::new(Model::new(
        "cube",
        vec![primitives::cube(0.75)
            .material(cube_material)
            .octree(octree)
            .build()?],
    ));
    let sphere = Arc::new(Model::new(
        "sphere",
        vec![primitives::uv_sphere(0.9, 24, 48)
            .material(sphere_material)
            .octree(octree)
            .build()?],
    ));

    let mut root = GameObject::new("root");
    root.add_child(
        GameObject::new("ground")
            .with_model(ground)
            .with_transform(Mat4::from_rotation_translation(
                Quat::from_rotation_x(-std::f32::consts::FRAC_PI_2),
                Vec3::new(0.0, -1.0, 0.0),
            )),
    );

    let ring = root.add_child(GameObject::new("ring"));
    for i in 0..RING_OBJECTS {
        let angle = std::f32::consts::TAU * i as f32 / RING_OBJECTS as f32;
        let position = Vec3::new(angle.cos() * RING_RADIUS, 0.0, angle.sin() * RING_RADIUS);
        let model = if i % 2 == 0 { cube.clone() } else { sphere.clone() };
        ring.add_child(
            GameObject::new(format!("ring_{i}"))
                .with_model(model)
                .with_transform(Mat4::from_translation(position)),
        );
    }

    root.add_child(
        GameObject::new("centerpiece")
            .with_model(sphere)
            .with_transform(Mat4::from_scale_rotation_translation(
                Vec3::splat(2.0),
                Quat::IDENTITY,
                Vec3::new(0.0, 1.0, 0.0),
            )),
    );

    log::info!(
        "scene: {} objects in ring, octree split at {} triangles",
        RING_OBJECTS,
        octree.split_threshold
    );
    Ok(root)
}

fn animate_ring(scene: &mut GameObject, seconds: f32) {
    if let Some(ring) = scene.children_mut().iter_mut().find(|c| c.name == "ring") {
        ring.local_transform = Mat4::from_rotation_y(seconds * RING_SPEED);
    }
}
