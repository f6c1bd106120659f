//! Scene camera and the orbit/fixed camera presets.

use glam::{Mat4, Vec3};

use crate::params::{CameraPreset, FixedCamera, OrbitCamera, RenderConfig};

/// Perspective camera (right-handed, [0, 1] depth)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fov_y_rad: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    pub fn new(eye: Vec3, target: Vec3, config: &RenderConfig) -> Self {
        Self {
            eye,
            target,
            up: Vec3::Y,
            fov_y_rad: config.fov_degrees.to_radians(),
            aspect: config.aspect_ratio(),
            near: config.near_plane_m,
            far: config.far_plane_m,
        }
    }

    /// Unit view direction
    pub fn forward(&self) -> Vec3 {
        (self.target - self.eye).normalize_or_zero()
    }

    /// Up vector orthogonal to the view direction
    pub fn true_up(&self) -> Vec3 {
        let forward = self.forward();
        let right = forward.cross(self.up).normalize_or_zero();
        right.cross(forward)
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, self.up)
    }

    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y_rad, self.aspect, self.near, self.far)
    }

    pub fn view_proj(&self) -> Mat4 {
        self.projection() * self.view()
    }

    /// Below the mirror plane of the sea surface
    pub fn is_underwater(&self) -> bool {
        self.eye.y < 0.0
    }
}

/// Spherical coordinates of the orbit camera around its target
#[derive(Debug, Clone, Copy, PartialEq)]
struct OrbitState {
    azimuth: f32,
    polar: f32,
    distance: f32,
}

/// Camera system driven by the selected preset
pub struct CameraSystem {
    preset: CameraPreset,
    orbit: Option<OrbitState>,
}

impl CameraSystem {
    /// Create new camera system with specified preset
    pub fn new(preset: CameraPreset) -> Self {
        let orbit = match &preset {
            CameraPreset::Orbit(params) => Some(Self::initial_orbit(params)),
            CameraPreset::Fixed(_) => None,
        };
        Self { preset, orbit }
    }

    fn initial_orbit(p: &OrbitCamera) -> OrbitState {
        let offset = Vec3::from_array(p.start_eye) - Vec3::from_array(p.target);
        let distance = offset.length().max(1e-3);
        OrbitState {
            azimuth: offset.x.atan2(offset.z),
            polar: (offset.y / distance).clamp(-1.0, 1.0).acos(),
            distance,
        }
        .clamped(p)
    }

    /// Orbit by a mouse drag (pixels)
    pub fn rotate(&mut self, dx_px: f32, dy_px: f32) {
        if let (CameraPreset::Orbit(p), Some(state)) = (&self.preset, self.orbit.as_mut()) {
            state.azimuth -= dx_px * p.rotate_speed;
            state.polar -= dy_px * p.rotate_speed;
            *state = state.clamped(p);
        }
    }

    /// Dolly towards (positive) or away from the target (scroll lines)
    pub fn zoom(&mut self, lines: f32) {
        if let (CameraPreset::Orbit(p), Some(state)) = (&self.preset, self.orbit.as_mut()) {
            state.distance -= lines * p.zoom_step_m;
            *state = state.clamped(p);
        }
    }

    /// Compute camera position and look-at target
    ///
    /// # Returns
    /// Tuple of (eye_position, target_position)
    pub fn compute_position_and_target(&self) -> (Vec3, Vec3) {
        match (&self.preset, self.orbit) {
            (CameraPreset::Orbit(p), Some(state)) => Self::compute_orbit(p, state),
            (CameraPreset::Orbit(p), None) => Self::compute_orbit(p, Self::initial_orbit(p)),
            (CameraPreset::Fixed(p), _) => Self::compute_fixed(p),
        }
    }

    fn compute_orbit(p: &OrbitCamera, s: OrbitState) -> (Vec3, Vec3) {
        let target = Vec3::from_array(p.target);
        let dir = Vec3::new(
            s.polar.sin() * s.azimuth.sin(),
            s.polar.cos(),
            s.polar.sin() * s.azimuth.cos(),
        );
        (target + dir * s.distance, target)
    }

    fn compute_fixed(p: &FixedCamera) -> (Vec3, Vec3) {
        (Vec3::from_array(p.position), Vec3::from_array(p.target))
    }

    /// Camera for the current frame
    pub fn camera(&self, render_config: &RenderConfig) -> Camera {
        let (eye, target) = self.compute_position_and_target();
        Camera::new(eye, target, render_config)
    }
}

impl OrbitState {
    fn clamped(mut self, p: &OrbitCamera) -> Self {
        self.polar = self.polar.clamp(p.min_polar_rad, p.max_polar_rad);
        self.distance = self.distance.clamp(p.min_distance_m, p.max_distance_m);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orbit_starts_at_configured_eye() {
        let params = OrbitCamera::default();
        let camera = CameraSystem::new(CameraPreset::Orbit(params.clone()));
        let (eye, target) = camera.compute_position_and_target();

        assert!((eye - Vec3::from_array(params.start_eye)).length() < 1e-4);
        assert_eq!(target, Vec3::from_array(params.target));
    }

    #[test]
    fn test_orbit_polar_angle_is_clamped() {
        let params = OrbitCamera::default();
        let mut camera = CameraSystem::new(CameraPreset::Orbit(params.clone()));

        // drag far upwards: camera swings over the top until the limit
        camera.rotate(0.0, 10_000.0);
        let (eye, target) = camera.compute_position_and_target();
        let offset = eye - target;
        let polar = (offset.y / offset.length()).acos();
        assert!((polar - params.min_polar_rad).abs() < 1e-4);

        camera.rotate(0.0, -10_000.0);
        let (eye, target) = camera.compute_position_and_target();
        let offset = eye - target;
        let polar = (offset.y / offset.length()).acos();
        assert!((polar - params.max_polar_rad).abs() < 1e-4);
    }

    #[test]
    fn test_zoom_respects_max_distance() {
        let params = OrbitCamera::default();
        let mut camera = CameraSystem::new(CameraPreset::Orbit(params.clone()));
        camera.zoom(-1000.0);
        let (eye, target) = camera.compute_position_and_target();
        assert!(((eye - target).length() - params.max_distance_m).abs() < 1e-3);
    }

    #[test]
    fn test_max_polar_reaches_under_water() {
        let params = OrbitCamera::default();
        let mut camera = CameraSystem::new(CameraPreset::Orbit(params));
        camera.zoom(-1000.0);
        camera.rotate(0.0, -10_000.0);
        let cam = camera.camera(&RenderConfig::default());
        assert!(cam.is_underwater());
    }

    #[test]
    fn test_fixed_camera_ignores_input() {
        let mut camera = CameraSystem::new(CameraPreset::Fixed(FixedCamera::default()));
        let before = camera.compute_position_and_target();
        camera.rotate(50.0, 50.0);
        camera.zoom(3.0);
        assert_eq!(before, camera.compute_position_and_target());
    }

    #[test]
    fn test_true_up_is_orthogonal() {
        let cam = Camera::new(Vec3::new(0.0, 5.0, 15.0), Vec3::ZERO, &RenderConfig::default());
        assert!(cam.true_up().dot(cam.forward()).abs() < 1e-6);
        assert!(cam.true_up().y > 0.0);
    }

    #[test]
    fn test_view_proj_matrix_generation() {
        let params = OrbitCamera::default();
        let camera = CameraSystem::new(CameraPreset::Orbit(params.clone()));
        let cam = camera.camera(&RenderConfig::default());
        let view_proj = cam.view_proj();

        assert!(view_proj.is_finite());
        assert_ne!(view_proj, Mat4::IDENTITY);

        // eye stays at the configured orbit distance
        let target = Vec3::from_array(params.target);
        let distance = (Vec3::from_array(params.start_eye) - target).length();
        assert!(((cam.eye - target).length() - distance).abs() < 1e-4);

        // the orbit target projects to the screen centre, inside [0, 1] depth
        let clip = view_proj * target.extend(1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(ndc.x.abs() < 1e-4 && ndc.y.abs() < 1e-4);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
    }
}
