//! Camera configuration and presets.

use std::f32::consts::PI;

/// Orbit camera around the boat (mouse driven)
#[derive(Debug, Clone)]
pub struct OrbitCamera {
    /// Point the camera orbits and looks at (meters)
    pub target: [f32; 3],

    /// Initial eye position (meters)
    pub start_eye: [f32; 3],

    /// Closest allowed distance to the target (meters)
    pub min_distance_m: f32,

    /// Farthest allowed distance to the target (meters)
    pub max_distance_m: f32,

    /// Polar angle limits measured from +Y (radians)
    /// Upper bound slightly past the horizon allows looking under water
    pub min_polar_rad: f32,
    pub max_polar_rad: f32,

    /// Orbit speed (radians per pixel of mouse drag)
    pub rotate_speed: f32,

    /// Zoom step (meters per scroll line)
    pub zoom_step_m: f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self {
            target: [0.0, 3.0, 0.0],
            start_eye: [0.0, 5.0, 15.0],
            min_distance_m: 5.0,
            max_distance_m: 70.0,
            min_polar_rad: PI / 3.0,
            max_polar_rad: 0.55 * PI,
            rotate_speed: 0.005,
            zoom_step_m: 2.0,
        }
    }
}

/// Fixed camera position (for debugging and probes)
#[derive(Debug, Clone)]
pub struct FixedCamera {
    /// Camera position (meters)
    pub position: [f32; 3],

    /// Look-at target (meters)
    pub target: [f32; 3],
}

impl Default for FixedCamera {
    fn default() -> Self {
        Self {
            position: [0.0, 5.0, 15.0],
            target: [0.0, 3.0, 0.0],
        }
    }
}

/// Camera preset selection
#[derive(Debug, Clone)]
pub enum CameraPreset {
    /// Orbit preset: mouse-driven orbit around the boat
    Orbit(OrbitCamera),

    /// Fixed preset: stationary camera
    Fixed(FixedCamera),
}

impl Default for CameraPreset {
    fn default() -> Self {
        Self::Orbit(OrbitCamera::default())
    }
}
