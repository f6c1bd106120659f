//! GPU uniform layouts. Each struct mirrors the WGSL struct of the same
//! name field for field; sizes are pinned below.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use static_assertions::const_assert_eq;

use crate::camera::Camera;
use crate::config::SkyParams;
use crate::ocean::{DisplacementInputs, Wave, WaveSet, WAVES_PER_STATE};
use crate::params::OceanSurfaceParams;
use crate::scene::{CloudPlacement, FrameInputs};

/// One wave as the shaders see it (`GerstnerWave`)
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct GpuWave {
    pub k: f32,
    pub speed: f32,
    pub amp: f32,
    pub _pad0: f32,
    pub dir: [f32; 2],
    pub _pad1: [f32; 2],
}

impl From<&Wave> for GpuWave {
    fn from(w: &Wave) -> Self {
        Self {
            k: w.k,
            speed: w.speed,
            amp: w.amplitude,
            _pad0: 0.0,
            dir: w.direction.to_array(),
            _pad1: [0.0; 2],
        }
    }
}

/// Pack up to three waves; the count tells the shader how many are live
pub fn pack_waves(waves: &[Wave]) -> ([GpuWave; WAVES_PER_STATE], u32) {
    let mut packed = [GpuWave::default(); WAVES_PER_STATE];
    let count = waves.len().min(WAVES_PER_STATE);
    for (slot, wave) in packed.iter_mut().zip(waves.iter()) {
        *slot = wave.into();
    }
    (packed, count as u32)
}

/// Per-camera uniforms shared by every scene pipeline (`ViewUniforms`)
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct ViewUniforms {
    pub view_proj: [[f32; 4]; 4],
    /// Inverse of the unclipped view-projection, for sky rays
    pub inv_view_proj: [[f32; 4]; 4],
    pub eye: [f32; 3],
    pub time: f32,
    /// Nonzero when the main camera is under the surface
    pub underwater: u32,
    pub _pad: [u32; 3],
}

/// Main camera eye height below which the sky is cut at the horizon
pub const SKY_UNDERWATER_EYE_M: f32 = 0.5;

impl ViewUniforms {
    pub fn new(view_proj: Mat4, unclipped_view_proj: Mat4, eye: Vec3, time: f32, main_eye_y: f32) -> Self {
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            inv_view_proj: unclipped_view_proj.inverse().to_cols_array_2d(),
            eye: eye.to_array(),
            time,
            underwater: (main_eye_y < SKY_UNDERWATER_EYE_M) as u32,
            _pad: [0; 3],
        }
    }

    pub fn for_camera(camera: &Camera, time: f32) -> Self {
        let view_proj = camera.view_proj();
        Self::new(view_proj, view_proj, camera.eye, time, camera.eye.y)
    }
}

/// Surface material and wave state (`OceanUniforms`)
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct OceanUniforms {
    pub texture_matrix: [[f32; 4]; 4],
    pub model: [[f32; 4]; 4],
    pub sun_direction: [f32; 3],
    pub alpha: f32,
    pub sun_color: [f32; 3],
    pub distortion_scale: f32,
    pub water_color: [f32; 3],
    pub size: f32,
    pub fog_color: [f32; 3],
    pub fog_density: f32,
    pub boat_direction: [f32; 2],
    pub boat_scale: [f32; 2],
    pub wind_direction: [f32; 2],
    pub boat_speed: f32,
    pub boat_length: f32,
    pub wind_speed: f32,
    pub fog_factor: f32,
    pub use_normals: u32,
    pub wave_count: u32,
    pub sun_shininess: f32,
    pub sun_specular: f32,
    pub sun_diffuse: f32,
    pub fresnel_r0: f32,
    pub fog_falloff: f32,
    pub distance_normalizer: f32,
    pub time: f32,
    pub _pad0: f32,
    pub waves: [GpuWave; WAVES_PER_STATE],
}

impl OceanUniforms {
    pub fn new(frame: &FrameInputs, texture_matrix: Mat4, params: &OceanSurfaceParams) -> Self {
        let (waves, wave_count) = pack_waves(&frame.waves.waves);
        let d = &frame.displacement;
        Self {
            texture_matrix: texture_matrix.to_cols_array_2d(),
            model: frame.water_transform.to_cols_array_2d(),
            sun_direction: frame.lights.sun_direction.to_array(),
            alpha: params.alpha,
            sun_color: params.sun_color,
            distortion_scale: params.distortion_scale,
            water_color: params.water_color,
            size: params.size,
            fog_color: params.underwater_fog_color,
            fog_density: params.underwater_fog_density,
            boat_direction: d.boat_direction.to_array(),
            boat_scale: frame.boat.hull_scale.to_array(),
            wind_direction: d.wind_direction.to_array(),
            boat_speed: d.boat_speed,
            boat_length: frame.boat.hull_length,
            wind_speed: frame.waves.wind_speed,
            fog_factor: frame.weather.fog_factor,
            use_normals: frame.waves.use_normals as u32,
            wave_count,
            sun_shininess: params.sun.shininess,
            sun_specular: params.sun.specular_strength,
            sun_diffuse: params.sun.diffuse_strength,
            fresnel_r0: params.fresnel_r0,
            fog_falloff: params.fog_distance_falloff,
            distance_normalizer: params.distance_normalizer_m,
            time: d.time,
            _pad0: 0.0,
            waves,
        }
    }
}

/// Inputs of the displacement probe (`ProbeParams`)
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct ProbeUniforms {
    pub time: f32,
    pub boat_speed: f32,
    pub boat_direction: [f32; 2],
    pub wave_count: u32,
    pub _pad: [u32; 3],
    pub waves: [GpuWave; WAVES_PER_STATE],
}

impl ProbeUniforms {
    pub fn new(waves: &WaveSet, inputs: &DisplacementInputs) -> Self {
        let (packed, wave_count) = pack_waves(&waves.waves);
        Self {
            time: inputs.time,
            boat_speed: inputs.boat_speed,
            boat_direction: inputs.boat_direction.to_array(),
            wave_count,
            _pad: [0; 3],
            waves: packed,
        }
    }
}

/// One probe result (`ProbeSample`); w components unused
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, Pod, Zeroable)]
pub struct ProbeSample {
    pub offset: [f32; 4],
    pub normal: [f32; 4],
    pub tangent: [f32; 4],
    pub binormal: [f32; 4],
}

/// Preetham sky coefficients (`SkyUniforms`)
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct SkyUniforms {
    pub sun_position: [f32; 3],
    pub rayleigh: f32,
    pub turbidity: f32,
    pub mie_coefficient: f32,
    pub mie_directional_g: f32,
    pub sun_intensity: f32,
    pub up: [f32; 3],
    pub luminance: f32,
}

impl SkyUniforms {
    pub fn new(sun_vector: Vec3, sky: &SkyParams) -> Self {
        Self {
            sun_position: sun_vector.to_array(),
            rayleigh: sky.rayleigh,
            turbidity: sky.turbidity,
            mie_coefficient: sky.mie_coefficient,
            mie_directional_g: sky.mie_directional_g,
            sun_intensity: sky.sun_intensity,
            up: [0.0, 1.0, 0.0],
            luminance: 1.0,
        }
    }
}

/// Cloud layer (`CloudUniforms`)
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct CloudUniforms {
    pub offset: [f32; 2],
    pub cover: f32,
    pub fade_distance: f32,
    pub height: f32,
    pub size: f32,
    pub tint: f32,
    pub _pad: f32,
}

impl CloudUniforms {
    pub fn new(cloud: &CloudPlacement) -> Self {
        Self {
            offset: cloud.offset.to_array(),
            cover: cloud.cover,
            fade_distance: cloud.fade_distance_m,
            height: cloud.height_m,
            size: cloud.size_m,
            tint: cloud.tint,
            _pad: 0.0,
        }
    }
}

/// Coastline quad transform (`DecalUniforms`)
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct DecalUniforms {
    pub model: [[f32; 4]; 4],
}

const_assert_eq!(std::mem::size_of::<GpuWave>(), 32);
const_assert_eq!(std::mem::size_of::<ViewUniforms>(), 160);
const_assert_eq!(std::mem::size_of::<OceanUniforms>(), 368);
const_assert_eq!(std::mem::size_of::<ProbeUniforms>(), 128);
const_assert_eq!(std::mem::size_of::<ProbeSample>(), 64);
const_assert_eq!(std::mem::size_of::<SkyUniforms>(), 48);
const_assert_eq!(std::mem::size_of::<CloudUniforms>(), 32);
const_assert_eq!(std::mem::size_of::<DecalUniforms>(), 64);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocean::WaveDescriptor;

    #[test]
    fn test_pack_waves_counts_live_slots() {
        let wave = WaveDescriptor {
            wavelength_m: 30.0,
            steepness: 0.1,
            direction_deg: 45.0,
        }
        .derive();

        let (packed, count) = pack_waves(&[wave]);
        assert_eq!(count, 1);
        assert_eq!(packed[0].k, wave.k);
        assert_eq!(packed[0].amp, wave.amplitude);
        assert_eq!(packed[1], GpuWave::default());

        let (_, none) = pack_waves(&[]);
        assert_eq!(none, 0);
    }

    #[test]
    fn test_cloud_uniforms_carry_rain_tint() {
        let wet = CloudPlacement::new(glam::Vec2::X, 2.0, 4.0, 1.0, 1.0);
        let u = CloudUniforms::new(&wet);
        assert_eq!(u.tint, 0.75);
        assert_eq!(u.cover, 1.5);
    }

    #[test]
    fn test_view_uniforms_underwater_flag() {
        let eye = Vec3::new(0.0, 0.2, 5.0);
        let u = ViewUniforms::new(Mat4::IDENTITY, Mat4::IDENTITY, eye, 1.0, eye.y);
        assert_eq!(u.underwater, 1);
        let u = ViewUniforms::new(Mat4::IDENTITY, Mat4::IDENTITY, eye, 1.0, 3.0);
        assert_eq!(u.underwater, 0);
    }
}
