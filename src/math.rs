/// Small numeric helpers on top of glam.
/// Everything here short-circuits to a safe value instead of
/// producing NaN/Inf for near-zero inputs.
use glam::{Mat3, Mat4, Vec3};

/// Determinants below this are treated as singular.
pub const DETERMINANT_EPSILON: f32 = 1.0e-12;
/// Vectors shorter than this are left untouched by `safe_normalize`.
pub const LENGTH_EPSILON: f32 = 1.0e-8;

/// Inverse of `m`, or identity when `m` is (nearly) singular or not finite.
#[inline]
pub fn safe_inverse(m: Mat4) -> Mat4 {
    let det = m.determinant();
    if !det.is_finite() || det.abs() < DETERMINANT_EPSILON {
        Mat4::IDENTITY
    } else {
        m.inverse()
    }
}

/// Inverse-transpose of the upper 3x3 of `world`, used to carry normals
/// into world space under non-uniform scale.
#[inline]
pub fn normal_matrix(world: &Mat4) -> Mat3 {
    let upper = Mat3::from_mat4(*world);
    if upper.determinant().abs() < DETERMINANT_EPSILON {
        Mat3::IDENTITY
    } else {
        upper.inverse().transpose()
    }
}

/// Normalize `v`, returning it unchanged when its length is near zero.
#[inline]
pub fn safe_normalize(v: Vec3) -> Vec3 {
    let len_sq = v.length_squared();
    if len_sq < LENGTH_EPSILON * LENGTH_EPSILON {
        v
    } else {
        v / len_sq.sqrt()
    }
}

/// Reflect incident direction `i` about normal `n` (n must be unit length).
#[inline]
pub fn reflect(i: Vec3, n: Vec3) -> Vec3 {
    i - 2.0 * n.dot(i) * n
}

/// `base^exp` by repeated squaring.
#[inline]
pub fn powi_by_squaring(mut base: f32, mut exp: u32) -> f32 {
    let mut result = 1.0;
    while exp > 0 {
        if exp & 1 == 1 {
            result *= base;
        }
        base *= base;
        exp >>= 1;
    }
    result
}

/// Pack a linear [0,1] RGB color into ARGB8888.
#[inline]
pub fn pack_color(c: Vec3) -> u32 {
    let c = c.clamp(Vec3::ZERO, Vec3::ONE);
    let r = (c.x * 255.0 + 0.5) as u32;
    let g = (c.y * 255.0 + 0.5) as u32;
    let b = (c.z * 255.0 + 0.5) as u32;
    0xFF00_0000 | (r << 16) | (g << 8) | b
}

/// Unpack ARGB8888 into a [0,1] RGB color.
#[inline]
pub fn unpack_color(c: u32) -> Vec3 {
    const INV: f32 = 1.0 / 255.0;
    Vec3::new(
        ((c >> 16) & 0xFF) as f32 * INV,
        ((c >> 8) & 0xFF) as f32 * INV,
        (c & 0xFF) as f32 * INV,
    )
}
