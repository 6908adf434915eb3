/// Phong shading utilities.
/// Kept separate from the rasterizer so lighting models
/// can evolve independently of the rasterization pipeline.
use crate::math::{powi_by_squaring, reflect, safe_normalize};
use crate::scene::{IlluminationModel, Material};
use glam::{Vec2, Vec3};

/// Light arriving from infinitely far away along `direction`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DirectionalLight {
    /// Direction the light travels (world space, unit length).
    pub direction: Vec3,
    pub color: Vec3,
}

impl DirectionalLight {
    pub fn new(direction: Vec3, color: Vec3) -> Self {
        Self {
            direction: safe_normalize(direction),
            color,
        }
    }
}

/// Scene-wide lighting inputs for one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Lighting {
    /// Ambient light color, scaled by each material's ambient coefficient.
    pub ambient: Vec3,
    pub lights: Vec<DirectionalLight>,
}

impl Default for Lighting {
    fn default() -> Self {
        Self {
            ambient: Vec3::splat(0.15),
            // From above and slightly from one side
            lights: vec![DirectionalLight::new(
                Vec3::new(-0.4, -1.0, -0.3),
                Vec3::ONE,
            )],
        }
    }
}

/// Inputs of one fragment, all in world space.
#[derive(Copy, Clone, Debug)]
pub struct Fragment {
    pub position: Vec3,
    pub normal: Vec3,
    pub uv: Vec2,
}

/// Base color: texture sample when the material has one, else diffuse.
#[inline]
pub fn base_color(material: &Material, uv: Vec2) -> Vec3 {
    match &material.texture {
        Some(texture) => texture.sample_rgb(uv),
        None => material.diffuse,
    }
}

/// Phong reflection for one fragment, each channel clamped to [0, 1].
pub fn shade_fragment(
    material: &Material,
    lighting: &Lighting,
    fragment: &Fragment,
    eye: Vec3,
) -> Vec3 {
    let base = base_color(material, fragment.uv);
    if material.illumination == IlluminationModel::ColorOnly {
        return base.clamp(Vec3::ZERO, Vec3::ONE);
    }

    let n = safe_normalize(fragment.normal);
    let v = safe_normalize(eye - fragment.position);
    let with_specular = material.illumination == IlluminationModel::Specular;

    let mut color = material.ambient * base * lighting.ambient;
    for light in &lighting.lights {
        let l = -light.direction;
        let n_dot_l = n.dot(l).max(0.0);
        color += base * light.color * n_dot_l;

        if with_specular && n_dot_l > 0.0 {
            let r = reflect(-l, n);
            let r_dot_v = r.dot(v).max(0.0);
            color += material.specular * light.color * powi_by_squaring(r_dot_v, material.shininess);
        }
    }

    color.clamp(Vec3::ZERO, Vec3::ONE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rendering::Texture;
    use std::sync::Arc;

    fn facing_fragment() -> Fragment {
        Fragment {
            position: Vec3::ZERO,
            normal: Vec3::Z,
            uv: Vec2::ZERO,
        }
    }

    fn head_on() -> Lighting {
        Lighting {
            ambient: Vec3::splat(0.1),
            lights: vec![DirectionalLight::new(Vec3::NEG_Z, Vec3::ONE)],
        }
    }

    #[test]
    fn head_on_light_gives_ambient_plus_diffuse() {
        let material = Material {
            specular: Vec3::ZERO,
            ..Material::colored("red", Vec3::new(0.5, 0.0, 0.0))
        };
        let c = shade_fragment(&material, &head_on(), &facing_fragment(), Vec3::Z * 5.0);
        // ambient 1 * 0.5 * 0.1 + 0.5 * 1
        assert!((c.x - 0.55).abs() < 1e-6);
        assert_eq!(c.y, 0.0);
    }

    #[test]
    fn light_from_behind_leaves_ambient_only() {
        let material = Material::colored("white", Vec3::ONE);
        let lighting = Lighting {
            ambient: Vec3::splat(0.2),
            lights: vec![DirectionalLight::new(Vec3::Z, Vec3::ONE)],
        };
        let c = shade_fragment(&material, &lighting, &facing_fragment(), Vec3::Z * 5.0);
        assert!((c - Vec3::splat(0.2)).abs().max_element() < 1e-6);
    }

    #[test]
    fn specular_highlight_peaks_at_mirror_direction() {
        let material = Material {
            diffuse: Vec3::ZERO,
            ambient: Vec3::ZERO,
            specular: Vec3::ONE,
            shininess: 16,
            ..Material::default()
        };
        let lighting = head_on();
        let mirror = shade_fragment(&material, &lighting, &facing_fragment(), Vec3::Z * 5.0);
        let grazing = shade_fragment(
            &material,
            &lighting,
            &facing_fragment(),
            Vec3::new(5.0, 0.0, 1.0),
        );
        assert!((mirror.x - 1.0).abs() < 1e-5);
        assert!(grazing.x < 0.1);
    }

    #[test]
    fn output_is_clamped() {
        let material = Material::colored("bright", Vec3::splat(4.0));
        let c = shade_fragment(&material, &head_on(), &facing_fragment(), Vec3::Z);
        assert_eq!(c, Vec3::ONE);
    }

    #[test]
    fn texture_replaces_diffuse_color() {
        let texture = Arc::new(Texture::new(1, 1, vec![[0, 255, 0, 255]]).unwrap());
        let material = Material {
            illumination: IlluminationModel::ColorOnly,
            ..Material::colored("t", Vec3::X).with_texture(texture)
        };
        let c = shade_fragment(&material, &head_on(), &facing_fragment(), Vec3::Z);
        assert!((c - Vec3::Y).abs().max_element() < 1e-6);
    }
}
