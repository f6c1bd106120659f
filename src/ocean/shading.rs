//! Host reference of the surface fragment stage (`shaders/ocean.wgsl`).
//!
//! Used to pin down the control flow (underwater bypass, trail bounds,
//! discard threshold) in tests; the frame itself is shaded on the GPU.

use glam::{Vec2, Vec3, Vec3Swizzles, Vec4, Vec4Swizzles};

use crate::params::OceanSurfaceParams;

/// Texture lookups the fragment stage performs
pub trait SurfaceSampler {
    fn normal_map(&self, uv: Vec2) -> Vec4;
    fn reflection(&self, uv: Vec2) -> Vec3;
    fn foam(&self, uv: Vec2) -> Vec4;
    fn perlin(&self, uv: Vec2) -> Vec4;
    fn trail(&self, uv: Vec2) -> Vec3;
}

/// Which branch the fragment stage takes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShadingPath {
    /// Reflection, Fresnel, foam and trail
    AboveWater,
    /// Diffuse only, opaque, underwater fog. The mirror texture is invalid
    /// from below the plane.
    Underwater,
}

impl ShadingPath {
    pub fn for_eye(eye: Vec3) -> Self {
        if eye.y < 0.0 {
            ShadingPath::Underwater
        } else {
            ShadingPath::AboveWater
        }
    }
}

/// Per-frame values the surface shader reads
#[derive(Debug, Clone, Copy)]
pub struct SurfaceState {
    pub eye: Vec3,
    pub time: f32,
    /// Unit vector towards the sun (or moon)
    pub sun_direction: Vec3,
    pub wind_speed: f32,
    pub boat_speed: f32,
    pub boat_direction: Vec2,
    pub boat_scale: Vec2,
    pub boat_length: f32,
    pub fog_factor: f32,
    pub use_normals: bool,
}

/// Interpolated vertex outputs
#[derive(Debug, Clone, Copy)]
pub struct SurfaceFragment {
    pub world_position: Vec3,
    /// Texture-matrix projected position (homogeneous)
    pub mirror_coord: Vec4,
    /// Wave height at this point, drives foam
    pub height: f32,
    pub tangent: Vec3,
    pub binormal: Vec3,
    pub normal: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadedFragment {
    pub color: Vec3,
    pub opacity: f32,
    pub path: ShadingPath,
}

/// Fragments below this opacity are discarded
pub const DISCARD_OPACITY: f32 = 0.01;

/// Shadow mask of a fully lit surface plus the constant ambient share
const UNSHADOWED: f32 = 1.5;

/// Schlick approximation
pub fn fresnel(r0: f32, cos_theta: f32) -> f32 {
    r0 + (1.0 - r0) * (1.0 - cos_theta).powi(5)
}

/// Base alpha minus distance fog
pub fn surface_opacity(alpha: f32, distance: f32, fog_factor: f32, falloff: f32) -> f32 {
    (alpha - (distance * falloff * fog_factor).min(1.0)).clamp(0.0, 1.0)
}

/// Trail texture coordinate of a world XZ point, `None` outside the texture
pub fn trail_uv(world_xz: Vec2, boat_direction: Vec2, boat_scale: Vec2, boat_length: f32) -> Option<Vec2> {
    let forward = boat_direction.normalize_or_zero();
    let perpendicular = Vec2::new(forward.y, -forward.x).normalize_or_zero();
    let mut uv = forward * world_xz.y + perpendicular * world_xz.x;
    uv /= boat_scale;
    uv += Vec2::new(0.5, boat_length);
    // shift to the stern
    uv += Vec2::new(0.0, 0.4);

    let inside = uv.x > 0.0 && uv.x < 1.0 && uv.y > 0.0 && uv.y < 1.0;
    inside.then_some(uv)
}

fn reflect(incident: Vec3, normal: Vec3) -> Vec3 {
    incident - 2.0 * normal.dot(incident) * normal
}

/// (diffuse, specular) contribution of the directional light
pub fn sun_light(
    normal: Vec3,
    eye_direction: Vec3,
    sun_direction: Vec3,
    sun_color: Vec3,
    params: &OceanSurfaceParams,
) -> (Vec3, Vec3) {
    let reflection = reflect(-sun_direction, normal).normalize_or_zero();
    let direction = eye_direction.dot(reflection).max(0.0);
    let specular = direction.powf(params.sun.shininess) * sun_color * params.sun.specular_strength;
    let diffuse = sun_direction.dot(normal).max(0.0) * sun_color * params.sun.diffuse_strength;
    (diffuse, specular)
}

/// Four drifting taps of the normal map, biased along the boat heading
pub fn normal_noise(uv: Vec2, t: f32, boat_direction: Vec2, sampler: &dyn SurfaceSampler) -> Vec4 {
    let bias = boat_direction * Vec2::new(-1.0, 1.0);
    let uv0 = uv / 103.0 + Vec2::new(t / 17.0, t / 29.0) * bias;
    let uv1 = uv / 107.0 - Vec2::new(t / -19.0, t / 31.0) * bias;
    let uv2 = uv / Vec2::new(8907.0, 9803.0) + Vec2::new(t / 101.0, t / 97.0) * bias;
    let uv3 = uv / Vec2::new(1091.0, 1027.0) - Vec2::new(t / 109.0, t / -113.0) * bias;
    let noise = sampler.normal_map(uv0)
        + sampler.normal_map(uv1)
        + sampler.normal_map(uv2)
        + sampler.normal_map(uv3);
    noise * 0.5 - Vec4::ONE
}

fn two_tap(uv: Vec2, t: f32, boat_direction: Vec2, tap: impl Fn(Vec2) -> Vec4) -> Vec4 {
    let uv0 = uv + t * boat_direction * Vec2::new(-0.1, 0.1);
    let uv1 = uv - t * boat_direction * Vec2::new(-0.1, -0.1);
    tap(uv0) * tap(uv1).x
}

/// Shade one surface fragment; `None` when the fragment is discarded
pub fn shade(
    fragment: &SurfaceFragment,
    state: &SurfaceState,
    params: &OceanSurfaceParams,
    sampler: &dyn SurfaceSampler,
) -> Option<ShadedFragment> {
    let world = fragment.world_position;
    let world_xz = world.xz();
    let sun_color = Vec3::from_array(params.sun_color);
    let water_color = Vec3::from_array(params.water_color);

    let noise = normal_noise(
        world_xz * params.size,
        state.time * state.wind_speed * state.boat_speed,
        state.boat_direction,
        sampler,
    );
    let surface_normal = (noise.xzy() * Vec3::new(1.5, 1.0, 1.5)).normalize_or_zero();
    let normal = if state.use_normals {
        (surface_normal.y * fragment.normal
            + surface_normal.z * fragment.binormal
            + surface_normal.x * fragment.tangent)
            .normalize_or_zero()
    } else {
        surface_normal
    };

    let world_to_eye = state.eye - world;
    let eye_direction = world_to_eye.normalize_or_zero();
    let (diffuse_light, specular_light) =
        sun_light(normal, eye_direction, state.sun_direction, sun_color, params);

    let dist = world_to_eye.length();
    let dist_norm = (world.length() / params.distance_normalizer_m).clamp(0.0, 0.8);

    let scatter = normal.dot(eye_direction).max(0.0) * water_color;
    let diff = (sun_color * diffuse_light * 0.3 * water_color + scatter) * UNSHADOWED * 0.1;

    if ShadingPath::for_eye(state.eye) == ShadingPath::Underwater {
        let fog_color = Vec3::from_array(params.underwater_fog_color);
        let density = params.underwater_fog_density;
        let fog = 1.0 - (-density * density * dist * dist).exp();
        return Some(ShadedFragment {
            color: diff.lerp(fog_color, fog.clamp(0.0, 1.0)),
            opacity: 1.0,
            path: ShadingPath::Underwater,
        });
    }

    let opacity = surface_opacity(params.alpha, dist, state.fog_factor, params.fog_distance_falloff);
    if opacity < DISCARD_OPACITY {
        return None;
    }

    let distortion = Vec2::new(normal.x, normal.z)
        * (0.001 + 1.0 / dist.max(1e-3))
        * params.distortion_scale
        * dist_norm;
    let mirror_uv = fragment.mirror_coord.xy() / fragment.mirror_coord.w;
    let reflection = sampler.reflection(mirror_uv + distortion);

    let theta = eye_direction.dot(normal).max(0.0);
    let reflectance = fresnel(params.fresnel_r0, theta);

    let spec = Vec3::splat(0.1) + reflection * 0.7 * (1.0 - dist_norm) + reflection * specular_light;
    let mut albedo = diff.lerp(spec, reflectance);

    let foam_uv = world_xz / 10.0;
    let foam = two_tap(foam_uv, state.time * state.boat_speed, state.boat_direction, |uv| {
        sampler.foam(uv)
    })
    .xyz();
    let perlin = two_tap(foam_uv / 15.0, state.time * 0.3, state.boat_direction, |uv| {
        sampler.perlin(uv)
    })
    .xyz()
        * 4.5;
    let foam = foam * perlin;

    if let Some(uv) = trail_uv(world_xz, state.boat_direction, state.boat_scale, state.boat_length) {
        albedo += sampler.trail(uv) * (foam * 2.5);
    }

    albedo = albedo.lerp(foam, (fragment.height * foam.x).clamp(0.0, 0.8));

    Some(ShadedFragment {
        color: albedo,
        opacity,
        path: ShadingPath::AboveWater,
    })
}
