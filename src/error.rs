//! Error type shared by the scene, ocean and rendering layers.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OceanError {
    /// Scene table could not be parsed or failed validation
    #[error("scene table: {0}")]
    Config(String),

    #[error("sea state '{0}' is missing from the wave table")]
    MissingSeaState(String),

    #[error("invalid wave in sea state '{sea_state}': {reason}")]
    InvalidWaveTable { sea_state: String, reason: String },

    /// Adapter or device could not be acquired
    #[error("gpu: {0}")]
    Gpu(String),

    #[error("surface: {0}")]
    Surface(String),

    /// Off-screen mirror render failed; last good reflection stays bound
    #[error("reflection pass failed: {0}")]
    ReflectionPass(String),

    #[error("texture '{path}': {reason}")]
    Texture { path: String, reason: String },

    #[error("displacement probe: {0}")]
    Probe(String),
}

impl From<serde_json::Error> for OceanError {
    fn from(err: serde_json::Error) -> Self {
        OceanError::Config(err.to_string())
    }
}
