//! Mirror camera math: plane reflection, projective texture matrix and
//! oblique near-plane clipping.
//!
//! Matrices follow glam's right-handed convention with [0, 1] clip depth
//! (`Mat4::perspective_rh`), matching wgpu. Texture space has v pointing
//! down.

use glam::{Mat4, Vec3, Vec4};

use crate::camera::Camera;

/// Reflecting plane in world space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MirrorPlane {
    pub point: Vec3,
    /// Unit normal, pointing to the side being reflected
    pub normal: Vec3,
}

impl MirrorPlane {
    /// Local XZ plane of a surface transform; normal is local up
    pub fn from_transform(transform: &Mat4) -> Self {
        let (_, rotation, translation) = transform.to_scale_rotation_translation();
        Self {
            point: translation,
            normal: (rotation * Vec3::Y).normalize_or_zero(),
        }
    }

    /// True when the plane faces away from `eye` (nothing to reflect)
    pub fn faces_away_from(&self, eye: Vec3) -> bool {
        (self.point - eye).dot(self.normal) >= 0.0
    }

    /// Signed distance of `p` above the plane
    pub fn distance(&self, p: Vec3) -> f32 {
        (p - self.point).dot(self.normal)
    }

    /// Plane equation (n, d) in the space of `view`, shifted by `bias`
    /// along the normal
    pub fn in_view_space(&self, view: &Mat4, bias: f32) -> Vec4 {
        let normal = view.transform_vector3(self.normal).normalize_or_zero();
        let point = view.transform_point3(self.point);
        normal.extend(-normal.dot(point) - bias)
    }
}

/// Reflect `v` across a plane with unit normal `n`
pub fn reflect(v: Vec3, n: Vec3) -> Vec3 {
    v - 2.0 * v.dot(n) * n
}

/// Maps clip space to texture space: u = x/2 + 1/2, v = -y/2 + 1/2
pub const TEXTURE_BIAS: Mat4 = Mat4::from_cols(
    Vec4::new(0.5, 0.0, 0.0, 0.0),
    Vec4::new(0.0, -0.5, 0.0, 0.0),
    Vec4::new(0.0, 0.0, 1.0, 0.0),
    Vec4::new(0.5, 0.5, 0.0, 1.0),
);

/// Mirror camera and matrices for one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReflectionFrame {
    /// Reflected eye position
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub far: f32,
    pub view: Mat4,
    /// Main camera projection, unclipped
    pub projection: Mat4,
    /// Main camera projection with the near plane replaced by the mirror plane
    pub oblique_projection: Mat4,
    /// World → reflection texture coordinates (homogeneous)
    pub texture_matrix: Mat4,
}

impl ReflectionFrame {
    /// Reflected camera for `camera`, or `None` when the plane faces away
    pub fn compute(camera: &Camera, plane: &MirrorPlane, clip_bias: f32) -> Option<Self> {
        if plane.faces_away_from(camera.eye) {
            return None;
        }
        let n = plane.normal;

        let eye = -reflect(plane.point - camera.eye, n) + plane.point;

        let look_at = camera.eye + camera.forward();
        let target = -reflect(plane.point - look_at, n) + plane.point;

        let up = reflect(camera.true_up(), n);

        let view = Mat4::look_at_rh(eye, target, up);
        let projection = Mat4::perspective_rh(camera.fov_y_rad, camera.aspect, camera.near, camera.far);
        let texture_matrix = TEXTURE_BIAS * projection * view;

        let clip_plane = plane.in_view_space(&view, clip_bias);
        let oblique_projection = oblique_clip(projection, clip_plane);

        Some(Self {
            eye,
            target,
            up,
            far: camera.far,
            view,
            projection,
            oblique_projection,
            texture_matrix,
        })
    }

    pub fn view_proj(&self) -> Mat4 {
        self.oblique_projection * self.view
    }
}

/// Replace the near plane of a [0, 1]-depth projection with `clip_plane`
/// (view space, kept side where `clip_plane · v >= 0`).
///
/// The far plane is re-aimed through the far frustum corner opposite the
/// plane, so depth precision is preserved for everything in view.
pub fn oblique_clip(projection: Mat4, clip_plane: Vec4) -> Mat4 {
    let corner = Vec4::new(clip_plane.x.signum(), clip_plane.y.signum(), 1.0, 1.0);
    let q = projection.inverse() * corner;
    let denom = clip_plane.dot(q);
    if denom.abs() < f32::EPSILON {
        return projection;
    }

    let c = clip_plane * (projection.row(3).dot(q) / denom);

    let mut m = projection;
    m.x_axis.z = c.x;
    m.y_axis.z = c.y;
    m.z_axis.z = c.z;
    m.w_axis.z = c.w;
    m
}
