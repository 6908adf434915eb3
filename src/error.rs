//! Error types for the construction-time surfaces of the crate.
//!
//! The per-frame pipeline never returns errors: degenerate geometry,
//! missing materials and pool overflow are handled in place and show up
//! in `FrameStats` instead.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MeshError {
    #[error("index count {0} is not a multiple of 3")]
    IndexCountNotMultipleOfThree(usize),

    #[error("index {index} out of range for {vertex_count} vertices")]
    IndexOutOfRange { index: u32, vertex_count: usize },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TextureError {
    #[error("texture dimensions must be non-zero (got {width}x{height})")]
    ZeroDimension { width: usize, height: usize },

    #[error("texture buffer holds {actual} pixels, expected {expected}")]
    SizeMismatch { expected: usize, actual: usize },
}
