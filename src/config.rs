/// Renderer configuration
/// Loadable from TOML; every field has a default so partial files work.
use crate::error::ConfigError;
use crate::rendering::DebugFlags;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tile edge length in pixels used by the reference configuration.
pub const DEFAULT_TILE_SIZE: usize = 16;
/// Largest tile edge accepted by `RenderConfig::validate`.
pub const MAX_TILE_SIZE: usize = 256;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AntiAliasing {
    #[default]
    Off,
    EdgeFilter,
}

/// Octree construction parameters.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OctreeConfig {
    /// A leaf subdivides once it holds more than this many triangles.
    pub split_threshold: usize,
    /// Nodes at this depth never subdivide (root is depth 0).
    pub max_depth: u32,
}

impl Default for OctreeConfig {
    fn default() -> Self {
        Self {
            split_threshold: 16,
            max_depth: 8,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Tile edge length in pixels (tiles are square).
    pub tile_size: usize,
    pub octree: OctreeConfig,
    pub anti_aliasing: AntiAliasing,
    pub debug: DebugFlags,
    /// ARGB clear color.
    pub clear_color: u32,
    pub backface_culling: bool,
    /// Post-clip triangles each worker can hold per frame; the rest are
    /// dropped and counted.
    pub triangle_pool_capacity: usize,
    /// Binning workers; `None` uses the rayon pool size.
    pub worker_count: Option<usize>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            tile_size: DEFAULT_TILE_SIZE,
            octree: OctreeConfig::default(),
            anti_aliasing: AntiAliasing::Off,
            debug: DebugFlags::default(),
            clear_color: 0xFF20_2028,
            backface_culling: true,
            triangle_pool_capacity: 1 << 18,
            worker_count: None,
        }
    }
}

impl RenderConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: RenderConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tile_size == 0 || self.tile_size > MAX_TILE_SIZE {
            return Err(ConfigError::Invalid {
                field: "tile_size",
                reason: format!("must be in 1..={MAX_TILE_SIZE}, got {}", self.tile_size),
            });
        }
        if self.octree.split_threshold == 0 {
            return Err(ConfigError::Invalid {
                field: "octree.split_threshold",
                reason: "must be at least 1".into(),
            });
        }
        if self.triangle_pool_capacity == 0 {
            return Err(ConfigError::Invalid {
                field: "triangle_pool_capacity",
                reason: "must be at least 1".into(),
            });
        }
        if self.worker_count == Some(0) {
            return Err(ConfigError::Invalid {
                field: "worker_count",
                reason: "must be at least 1 when set".into(),
            });
        }
        Ok(())
    }

    /// Worker count actually used for binning.
    pub fn resolved_worker_count(&self) -> usize {
        self.worker_count
            .unwrap_or_else(rayon::current_num_threads)
            .max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_gives_defaults() {
        let config = RenderConfig::from_toml_str("").unwrap();
        assert_eq!(config, RenderConfig::default());
        assert_eq!(config.tile_size, 16);
        assert_eq!(config.octree.split_threshold, 16);
    }

    #[test]
    fn partial_toml_overrides_fields() {
        let config = RenderConfig::from_toml_str(
            r#"
            anti_aliasing = "edge_filter"
            worker_count = 3

            [octree]
            max_depth = 4

            [debug]
            aabbs = true
            "#,
        )
        .unwrap();
        assert_eq!(config.anti_aliasing, AntiAliasing::EdgeFilter);
        assert_eq!(config.worker_count, Some(3));
        assert_eq!(config.resolved_worker_count(), 3);
        assert_eq!(config.octree.max_depth, 4);
        assert_eq!(config.octree.split_threshold, 16);
        assert!(config.debug.aabbs);
        assert!(!config.debug.normals);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let err = RenderConfig::from_toml_str("tile_size = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "tile_size", .. }));

        let err = RenderConfig::from_toml_str("[octree]\nsplit_threshold = 0").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "octree.split_threshold",
                ..
            }
        ));

        assert!(matches!(
            RenderConfig::from_toml_str("tile_size = \"big\""),
            Err(ConfigError::Parse(_))
        ));
    }
}
