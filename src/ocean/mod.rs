//! Ocean surface: wave table, Gerstner displacement, mesh and shading.

mod clock;
mod gerstner;
mod mesh;
mod probe;
pub mod shading;
mod waves;

// Re-export public types
pub use clock::WaveClock;
pub use gerstner::{displace, effective_direction, Displacement, DisplacementInputs};
pub use mesh::{SurfaceGrid, Vertex};
pub use probe::{probe_grid, DisplacementProbe, ProbeReport, PROBE_TOLERANCE};
pub use waves::{SeaStateEntry, Wave, WaveDescriptor, WaveSet, GRAVITY, WAVES_PER_STATE};

/// Gerstner displacement in WGSL, prepended to shaders that call
/// `gerstner_displace`
pub const GERSTNER_WGSL: &str = include_str!("../shaders/gerstner.wgsl");

/// Concatenate the shared Gerstner source with a shader body
pub fn with_gerstner(body: &str) -> String {
    [GERSTNER_WGSL, body].concat()
}
