//! Reflection state machine driven through a recording backend.

use std::panic::{catch_unwind, AssertUnwindSafe};

use glam::{Mat4, Vec3};

use searebbel::camera::Camera;
use searebbel::error::OceanError;
use searebbel::params::RenderConfig;
use searebbel::reflection::{MirrorBackend, ReflectionFrame, ReflectionOutcome, ReflectionPhase, ReflectionRenderer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    Front,
    Back,
    Window,
}

#[derive(Default)]
enum Failure {
    #[default]
    None,
    Error,
    Panic,
}

struct RecordingBackend {
    bound: Option<Target>,
    water: bool,
    failure: Failure,
    frames: Vec<ReflectionFrame>,
}

impl RecordingBackend {
    fn new() -> Self {
        Self {
            bound: Some(Target::Window),
            water: true,
            failure: Failure::None,
            frames: Vec::new(),
        }
    }
}

impl MirrorBackend for RecordingBackend {
    type Target = Target;

    fn active_target(&self) -> Option<Target> {
        self.bound
    }

    fn bind_target(&mut self, target: Option<Target>) {
        self.bound = target;
    }

    fn water_visible(&self) -> bool {
        self.water
    }

    fn set_water_visible(&mut self, visible: bool) {
        self.water = visible;
    }

    fn draw_mirror(&mut self, frame: &ReflectionFrame) -> Result<(), OceanError> {
        assert!(!self.water, "surface must be hidden during the mirror pass");
        assert_ne!(self.bound, Some(Target::Window));
        match std::mem::take(&mut self.failure) {
            Failure::None => {
                self.frames.push(*frame);
                Ok(())
            }
            Failure::Error => Err(OceanError::ReflectionPass("out of memory".to_string())),
            Failure::Panic => panic!("driver crashed"),
        }
    }
}

fn camera_at(eye: Vec3) -> Camera {
    Camera::new(eye, Vec3::new(0.0, 3.0, 0.0), &RenderConfig::default())
}

#[test]
fn test_alternates_targets_across_frames() {
    let mut renderer = ReflectionRenderer::new([Target::Front, Target::Back], 0.0);
    let mut backend = RecordingBackend::new();
    let camera = camera_at(Vec3::new(0.0, 5.0, 15.0));

    let mut fronts = Vec::new();
    for _ in 0..4 {
        let outcome = renderer.render(&mut backend, &camera, &Mat4::IDENTITY);
        assert!(matches!(outcome, ReflectionOutcome::Composited));
        fronts.push(renderer.texture());
    }
    assert_eq!(
        fronts,
        vec![Target::Back, Target::Front, Target::Back, Target::Front]
    );
    assert_eq!(backend.bound, Some(Target::Window));
    assert!(backend.water);
}

#[test]
fn test_mirror_frame_reflects_across_raised_plane() {
    let mut renderer = ReflectionRenderer::new([Target::Front, Target::Back], 0.0);
    let mut backend = RecordingBackend::new();
    let camera = camera_at(Vec3::new(2.0, 6.0, 12.0));
    let water = Mat4::from_translation(Vec3::new(0.0, 1.0, 0.0));

    renderer.render(&mut backend, &camera, &water);
    let frame = &backend.frames[0];
    assert!((frame.eye - Vec3::new(2.0, -4.0, 12.0)).length() < 1e-5);
    assert_eq!(renderer.texture_matrix(), frame.texture_matrix);

    // the oblique near plane passes through the water surface
    let on_plane = frame.view_proj() * Vec3::new(2.0, 1.0, 0.0).extend(1.0);
    assert!((on_plane.z / on_plane.w).abs() < 1e-3);
}

#[test]
fn test_error_keeps_last_good_reflection() {
    let mut renderer = ReflectionRenderer::new([Target::Front, Target::Back], 0.0);
    let mut backend = RecordingBackend::new();
    let camera = camera_at(Vec3::new(0.0, 5.0, 15.0));

    renderer.render(&mut backend, &camera, &Mat4::IDENTITY);
    let good_texture = renderer.texture();
    let good_matrix = renderer.texture_matrix();

    backend.failure = Failure::Error;
    let moved = camera_at(Vec3::new(8.0, 9.0, 4.0));
    let outcome = renderer.render(&mut backend, &moved, &Mat4::IDENTITY);

    assert!(matches!(outcome, ReflectionOutcome::Failed(_)));
    assert_eq!(renderer.phase(), ReflectionPhase::Failed);
    assert_eq!(renderer.texture(), good_texture);
    assert_eq!(renderer.texture_matrix(), good_matrix);
    assert_eq!(backend.bound, Some(Target::Window));
    assert!(backend.water);
    assert_eq!(renderer.total_failures(), 1);
}

#[test]
fn test_panic_in_draw_restores_renderer_state() {
    let mut renderer = ReflectionRenderer::new([Target::Front, Target::Back], 0.0);
    let mut backend = RecordingBackend::new();
    let camera = camera_at(Vec3::new(0.0, 5.0, 15.0));

    backend.failure = Failure::Panic;
    let result = catch_unwind(AssertUnwindSafe(|| {
        renderer.render(&mut backend, &camera, &Mat4::IDENTITY)
    }));

    assert!(result.is_err());
    assert_eq!(backend.bound, Some(Target::Window));
    assert!(backend.water);
    assert_eq!(renderer.texture(), Target::Front);
    assert_eq!(renderer.texture_matrix(), Mat4::ZERO);
}

#[test]
fn test_underwater_camera_skips_the_pass() {
    let mut renderer = ReflectionRenderer::new([Target::Front, Target::Back], 0.0);
    let mut backend = RecordingBackend::new();
    let camera = camera_at(Vec3::new(0.0, -2.0, 10.0));

    let outcome = renderer.render(&mut backend, &camera, &Mat4::IDENTITY);
    assert!(matches!(outcome, ReflectionOutcome::Culled));
    assert_eq!(renderer.phase(), ReflectionPhase::Culled);
    assert!(backend.frames.is_empty());
    assert_eq!(renderer.texture_matrix(), Mat4::ZERO);
}
