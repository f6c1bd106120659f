//! Parameter definitions with physical units and documented semantics.
//!
//! Scene constants live here with:
//! - Physical units (meters, seconds, radians, etc.)
//! - Documented ranges and meanings
//! - Defaults matching the reference scene

mod camera;
mod ocean;
mod render;

// Re-export all types
pub use camera::{CameraPreset, FixedCamera, OrbitCamera};
pub use ocean::{MeshParams, OceanSurfaceParams, SunLightParams};
pub use render::RenderConfig;
