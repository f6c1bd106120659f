//! Per-frame reflection state machine.
//!
//! Idle → Culled | Rendering → Composited. The back target is bound and the
//! water hidden inside a scope that restores both on every exit path,
//! including errors and panics. Only a completed pass swaps the back target
//! to the front, so a failure leaves the last good texture bound.

use glam::Mat4;

use super::mirror::{MirrorPlane, ReflectionFrame};
use crate::camera::Camera;
use crate::error::OceanError;

/// Renderer state the reflection pass borrows for one frame
pub trait MirrorBackend {
    /// Handle to an off-screen color target
    type Target: Copy + PartialEq + std::fmt::Debug;

    /// Currently bound target, `None` for the default framebuffer
    fn active_target(&self) -> Option<Self::Target>;
    fn bind_target(&mut self, target: Option<Self::Target>);

    fn water_visible(&self) -> bool;
    fn set_water_visible(&mut self, visible: bool);

    /// Render the scene from the mirror camera into the bound target
    fn draw_mirror(&mut self, frame: &ReflectionFrame) -> Result<(), OceanError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReflectionPhase {
    Idle,
    /// Plane faces away from the camera; previous texture kept
    Culled,
    Rendering,
    Composited,
    /// Draw failed; previous texture kept
    Failed,
}

/// Result of one `ReflectionRenderer::render` call
#[derive(Debug)]
pub enum ReflectionOutcome {
    Culled,
    Composited,
    /// Pass failed; the previous texture stays bound
    Failed(OceanError),
}

/// Saved renderer state, restored on drop
struct MirrorScope<'a, B: MirrorBackend> {
    backend: &'a mut B,
    previous_target: Option<B::Target>,
    previous_visible: bool,
}

impl<'a, B: MirrorBackend> MirrorScope<'a, B> {
    fn enter(backend: &'a mut B, target: B::Target) -> Self {
        let previous_target = backend.active_target();
        let previous_visible = backend.water_visible();
        backend.set_water_visible(false);
        backend.bind_target(Some(target));
        Self {
            backend,
            previous_target,
            previous_visible,
        }
    }

    fn draw(&mut self, frame: &ReflectionFrame) -> Result<(), OceanError> {
        self.backend.draw_mirror(frame)
    }
}

impl<B: MirrorBackend> Drop for MirrorScope<'_, B> {
    fn drop(&mut self) {
        self.backend.set_water_visible(self.previous_visible);
        self.backend.bind_target(self.previous_target);
    }
}

/// Owns the double-buffered reflection targets and the matrix that goes
/// with the front one
pub struct ReflectionRenderer<T> {
    targets: [T; 2],
    front: usize,
    texture_matrix: Mat4,
    phase: ReflectionPhase,
    clip_bias: f32,
    consecutive_failures: u32,
    total_failures: u64,
    last_frame: Option<ReflectionFrame>,
}

impl<T: Copy + PartialEq + std::fmt::Debug> ReflectionRenderer<T> {
    pub fn new(targets: [T; 2], clip_bias: f32) -> Self {
        Self {
            targets,
            front: 0,
            texture_matrix: Mat4::ZERO,
            phase: ReflectionPhase::Idle,
            clip_bias,
            consecutive_failures: 0,
            total_failures: 0,
            last_frame: None,
        }
    }

    /// Cull, place the mirror camera and draw into the back target
    pub fn render<B>(&mut self, backend: &mut B, camera: &Camera, water_transform: &Mat4) -> ReflectionOutcome
    where
        B: MirrorBackend<Target = T>,
    {
        self.phase = ReflectionPhase::Idle;

        let plane = MirrorPlane::from_transform(water_transform);
        let Some(frame) = ReflectionFrame::compute(camera, &plane, self.clip_bias) else {
            log::trace!("Reflection culled, eye {:?}", camera.eye);
            self.phase = ReflectionPhase::Culled;
            return ReflectionOutcome::Culled;
        };

        self.phase = ReflectionPhase::Rendering;
        let back = self.targets[1 - self.front];
        let result = {
            let mut scope = MirrorScope::enter(backend, back);
            scope.draw(&frame)
        };

        match result {
            Ok(()) => {
                self.front = 1 - self.front;
                self.texture_matrix = frame.texture_matrix;
                self.last_frame = Some(frame);
                self.phase = ReflectionPhase::Composited;
                if self.consecutive_failures > 0 {
                    log::info!(
                        "Reflection pass recovered after {} failed frame(s)",
                        self.consecutive_failures
                    );
                    self.consecutive_failures = 0;
                }
                ReflectionOutcome::Composited
            }
            Err(err) => {
                self.phase = ReflectionPhase::Failed;
                self.consecutive_failures += 1;
                self.total_failures += 1;
                log::warn!(
                    "Reflection pass failed ({} in a row), keeping last texture: {}",
                    self.consecutive_failures,
                    err
                );
                ReflectionOutcome::Failed(err)
            }
        }
    }

    /// Target holding the last good reflection
    pub fn texture(&self) -> T {
        self.targets[self.front]
    }

    /// Texture matrix matching `texture()`; zero until the first pass
    /// completes, which maps every fragment to one texel
    pub fn texture_matrix(&self) -> Mat4 {
        self.texture_matrix
    }

    pub fn phase(&self) -> ReflectionPhase {
        self.phase
    }

    pub fn last_frame(&self) -> Option<&ReflectionFrame> {
        self.last_frame.as_ref()
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn total_failures(&self) -> u64 {
        self.total_failures
    }

    pub fn clip_bias(&self) -> f32 {
        self.clip_bias
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::RenderConfig;
    use glam::Vec3;

    #[derive(Default)]
    struct FakeBackend {
        bound: Option<u8>,
        water: bool,
        fail_next: bool,
        drawn_into: Vec<Option<u8>>,
        water_seen: Vec<bool>,
    }

    impl MirrorBackend for FakeBackend {
        type Target = u8;

        fn active_target(&self) -> Option<u8> {
            self.bound
        }

        fn bind_target(&mut self, target: Option<u8>) {
            self.bound = target;
        }

        fn water_visible(&self) -> bool {
            self.water
        }

        fn set_water_visible(&mut self, visible: bool) {
            self.water = visible;
        }

        fn draw_mirror(&mut self, _frame: &ReflectionFrame) -> Result<(), OceanError> {
            self.drawn_into.push(self.bound);
            self.water_seen.push(self.water);
            if std::mem::take(&mut self.fail_next) {
                return Err(OceanError::ReflectionPass("device lost".to_string()));
            }
            Ok(())
        }
    }

    fn backend() -> FakeBackend {
        FakeBackend {
            water: true,
            ..Default::default()
        }
    }

    fn above() -> Camera {
        Camera::new(Vec3::new(0.0, 5.0, 15.0), Vec3::ZERO, &RenderConfig::default())
    }

    fn below() -> Camera {
        Camera::new(Vec3::new(0.0, -5.0, 15.0), Vec3::ZERO, &RenderConfig::default())
    }

    #[test]
    fn test_successful_pass_swaps_targets() {
        let mut renderer = ReflectionRenderer::new([10u8, 11u8], 0.0);
        let mut b = backend();

        assert_eq!(renderer.texture(), 10);
        let outcome = renderer.render(&mut b, &above(), &Mat4::IDENTITY);
        assert!(matches!(outcome, ReflectionOutcome::Composited));
        assert_eq!(renderer.phase(), ReflectionPhase::Composited);

        // drawn into the back target with the water hidden
        assert_eq!(b.drawn_into, vec![Some(11)]);
        assert_eq!(b.water_seen, vec![false]);
        assert_eq!(renderer.texture(), 11);
        assert_ne!(renderer.texture_matrix(), Mat4::ZERO);

        // state restored
        assert_eq!(b.bound, None);
        assert!(b.water);
    }

    #[test]
    fn test_culled_frame_keeps_previous_texture() {
        let mut renderer = ReflectionRenderer::new([1u8, 2u8], 0.0);
        let mut b = backend();
        renderer.render(&mut b, &above(), &Mat4::IDENTITY);
        let matrix = renderer.texture_matrix();

        let outcome = renderer.render(&mut b, &below(), &Mat4::IDENTITY);
        assert!(matches!(outcome, ReflectionOutcome::Culled));
        assert_eq!(renderer.phase(), ReflectionPhase::Culled);
        assert_eq!(renderer.texture(), 2);
        assert_eq!(renderer.texture_matrix(), matrix);
        assert_eq!(b.drawn_into.len(), 1);
    }

    #[test]
    fn test_failure_restores_state_and_keeps_texture() {
        let mut renderer = ReflectionRenderer::new([1u8, 2u8], 0.0);
        let mut b = backend();
        b.bound = Some(42);
        renderer.render(&mut b, &above(), &Mat4::IDENTITY);
        let matrix = renderer.texture_matrix();

        b.fail_next = true;
        let outcome = renderer.render(&mut b, &above(), &Mat4::IDENTITY);
        assert!(matches!(
            outcome,
            ReflectionOutcome::Failed(OceanError::ReflectionPass(_))
        ));
        assert_eq!(renderer.phase(), ReflectionPhase::Failed);
        assert_eq!(renderer.texture(), 2);
        assert_eq!(renderer.texture_matrix(), matrix);
        assert_eq!(renderer.consecutive_failures(), 1);

        assert_eq!(b.bound, Some(42));
        assert!(b.water);
    }

    #[test]
    fn test_recovery_resets_consecutive_failures() {
        let mut renderer = ReflectionRenderer::new([1u8, 2u8], 0.0);
        let mut b = backend();
        for _ in 0..3 {
            b.fail_next = true;
            renderer.render(&mut b, &above(), &Mat4::IDENTITY);
        }
        assert_eq!(renderer.consecutive_failures(), 3);
        assert_eq!(renderer.texture(), 1);

        renderer.render(&mut b, &above(), &Mat4::IDENTITY);
        assert_eq!(renderer.consecutive_failures(), 0);
        assert_eq!(renderer.total_failures(), 3);
        assert_eq!(renderer.texture(), 2);
        assert!(renderer.last_frame().is_some());
    }
}
