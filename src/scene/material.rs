/// Surface description shared by every mesh that uses the same named material.
use crate::rendering::Texture;
use glam::Vec3;
use std::sync::Arc;

/// Lighting terms a material takes part in, after the OBJ/MTL `illum` values.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum IlluminationModel {
    /// `illum 0`: base color, no lighting.
    ColorOnly,
    /// `illum 1`: ambient + diffuse.
    Diffuse,
    /// `illum 2`: ambient + diffuse + specular.
    #[default]
    Specular,
}

impl IlluminationModel {
    pub fn from_illum(illum: u32) -> Self {
        match illum {
            0 => Self::ColorOnly,
            1 => Self::Diffuse,
            _ => Self::Specular,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Material {
    pub name: String,
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
    pub shininess: u32,
    pub opacity: f32,
    pub texture: Option<Arc<Texture>>,
    pub illumination: IlluminationModel,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: String::from("default"),
            ambient: Vec3::ONE,
            diffuse: Vec3::splat(0.8),
            specular: Vec3::splat(0.2),
            shininess: 32,
            opacity: 1.0,
            texture: None,
            illumination: IlluminationModel::Specular,
        }
    }
}

impl Material {
    /// Untextured material with the given diffuse color.
    pub fn colored(name: impl Into<String>, diffuse: Vec3) -> Self {
        Self {
            name: name.into(),
            diffuse,
            ..Self::default()
        }
    }

    pub fn with_texture(mut self, texture: Arc<Texture>) -> Self {
        self.texture = Some(texture);
        self
    }
}
