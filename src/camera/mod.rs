/// Camera system with FPS-style controls
/// Mouse look and WASD movement
use crate::geometry::Aabb;
use crate::math::safe_inverse;
use glam::{Mat4, Quat, Vec3, Vec4};

pub struct Camera {
    pub position: Vec3,
    pub yaw: f32,   // Rotation around Y axis (radians)
    pub pitch: f32, // Rotation around X axis (radians)
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    pub aspect_ratio: f32,

    // Movement state
    pub move_speed: f32,
    pub mouse_sensitivity: f32,
}

impl Camera {
    pub fn new(position: Vec3, aspect_ratio: f32) -> Self {
        Self {
            position,
            yaw: 0.0,
            pitch: 0.0,
            fov: 70.0f32.to_radians(),
            near: 0.1,
            far: 1000.0,
            aspect_ratio,
            move_speed: 10.0,
            mouse_sensitivity: 0.002,
        }
    }

    /// Update camera orientation to look at a specific target point.
    pub fn look_at(&mut self, target: Vec3, up: Vec3) {
        let view_matrix = Mat4::look_at_rh(self.position, target, up);
        let rotation_quat = Quat::from_mat4(&safe_inverse(view_matrix));
        let (yaw, pitch, _roll) = rotation_quat.to_euler(glam::EulerRot::YXZ);
        self.yaw = yaw;
        self.pitch = pitch;
    }

    pub fn view_matrix(&self) -> Mat4 {
        let rotation = self.rotation_quat();
        let forward = rotation * Vec3::NEG_Z;
        let up = rotation * Vec3::Y;
        Mat4::look_at_rh(self.position, self.position + forward, up)
    }

    /// OpenGL-style projection: clip z lands in [-w, w].
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh_gl(self.fov, self.aspect_ratio, self.near, self.far)
    }

    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    pub fn forward(&self) -> Vec3 {
        self.rotation_quat() * Vec3::NEG_Z
    }

    pub fn right(&self) -> Vec3 {
        self.rotation_quat() * Vec3::X
    }

    pub fn up(&self) -> Vec3 {
        self.rotation_quat() * Vec3::Y
    }

    fn rotation_quat(&self) -> Quat {
        Quat::from_rotation_y(self.yaw) * Quat::from_rotation_x(self.pitch)
    }

    /// Update camera orientation from mouse delta
    pub fn rotate(&mut self, mouse_delta_x: f32, mouse_delta_y: f32) {
        self.yaw -= mouse_delta_x * self.mouse_sensitivity;
        self.pitch -= mouse_delta_y * self.mouse_sensitivity;

        // Clamp pitch to prevent gimbal lock
        const MAX_PITCH: f32 = std::f32::consts::FRAC_PI_2 - 0.01;
        self.pitch = self.pitch.clamp(-MAX_PITCH, MAX_PITCH);
    }

    /// Move camera in local space
    pub fn move_local(&mut self, forward: f32, right: f32, up: f32, dt: f32) {
        let move_vec = self.forward() * forward + self.right() * right + Vec3::Y * up;
        self.position += move_vec * self.move_speed * dt;
    }

    /// Update aspect ratio (call when window resizes)
    pub fn set_aspect_ratio(&mut self, aspect_ratio: f32) {
        self.aspect_ratio = aspect_ratio;
    }

    /// Frustum for the current view-projection
    pub fn frustum(&self) -> Frustum {
        Frustum::from_view_projection(&self.view_projection_matrix())
    }
}

/// Plane in Hessian normal form: `normal . p + distance = 0`,
/// normal pointing into the frustum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub normal: Vec3,
    pub distance: f32,
}

impl Plane {
    #[inline]
    pub fn signed_distance(&self, p: Vec3) -> f32 {
        self.normal.dot(p) + self.distance
    }

    #[inline]
    fn from_row_combination(v: Vec4) -> Self {
        let normal = v.truncate();
        let normal_length = normal.length();
        if normal_length > 0.0001 {
            Self {
                normal: normal / normal_length,
                distance: v.w / normal_length,
            }
        } else {
            Self {
                normal,
                distance: v.w,
            }
        }
    }
}

/// View frustum represented as 6 planes: left, right, bottom, top, near, far
#[derive(Debug, Clone, Copy)]
pub struct Frustum {
    pub planes: [Plane; 6],
}

impl Default for Frustum {
    fn default() -> Self {
        Self::from_view_projection(&Mat4::IDENTITY)
    }
}

impl Frustum {
    pub const LEFT: usize = 0;
    pub const RIGHT: usize = 1;
    pub const BOTTOM: usize = 2;
    pub const TOP: usize = 3;
    pub const NEAR: usize = 4;
    pub const FAR: usize = 5;

    /// Extract frustum planes from a view-projection matrix
    /// (Gribb-Hartmann row combination)
    pub fn from_view_projection(vp: &Mat4) -> Self {
        let mut frustum = Self {
            planes: [Plane {
                normal: Vec3::ZERO,
                distance: 0.0,
            }; 6],
        };
        frustum.update(vp);
        frustum
    }

    /// Re-extract the planes in place, once per frame.
    pub fn update(&mut self, vp: &Mat4) {
        let row0 = vp.row(0);
        let row1 = vp.row(1);
        let row2 = vp.row(2);
        let row3 = vp.row(3);

        self.planes[Self::LEFT] = Plane::from_row_combination(row3 + row0);
        self.planes[Self::RIGHT] = Plane::from_row_combination(row3 - row0);
        self.planes[Self::BOTTOM] = Plane::from_row_combination(row3 + row1);
        self.planes[Self::TOP] = Plane::from_row_combination(row3 - row1);
        self.planes[Self::NEAR] = Plane::from_row_combination(row3 + row2);
        self.planes[Self::FAR] = Plane::from_row_combination(row3 - row2);
    }

    pub fn is_point_in_frustum(&self, p: Vec3) -> bool {
        self.planes.iter().all(|plane| plane.signed_distance(p) >= 0.0)
    }

    /// Conservative box test: rejects only when the box is fully
    /// outside at least one plane.
    pub fn is_aabb_in_frustum(&self, aabb: &Aabb) -> bool {
        let (min, max) = (aabb.min, aabb.max);
        for plane in &self.planes {
            // The corner furthest along the plane normal
            let n = plane.normal;
            let p_vertex = Vec3::new(
                if n.x > 0.0 { max.x } else { min.x },
                if n.y > 0.0 { max.y } else { min.y },
                if n.z > 0.0 { max.z } else { min.z },
            );

            if plane.signed_distance(p_vertex) < 0.0 {
                return false;
            }
        }
        true
    }
}

/// Camera controller - handles input state
#[derive(Default)]
pub struct CameraController {
    pub forward_pressed: bool,
    pub backward_pressed: bool,
    pub left_pressed: bool,
    pub right_pressed: bool,
    pub up_pressed: bool,
    pub down_pressed: bool,
}

impl CameraController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Update camera based on controller state
    pub fn update_camera(&self, camera: &mut Camera, dt: f32) {
        let axis = |pos: bool, neg: bool| (pos as i32 - neg as i32) as f32;
        camera.move_local(
            axis(self.forward_pressed, self.backward_pressed),
            axis(self.right_pressed, self.left_pressed),
            axis(self.up_pressed, self.down_pressed),
            dt,
        );
    }
}
