//! Ocean surface shading and mesh parameters.

/// Surface shading parameters (mirror target, colors, fog)
#[derive(Debug, Clone)]
pub struct OceanSurfaceParams {
    /// Reflection render target width (pixels)
    pub mirror_texture_width: u32,

    /// Reflection render target height (pixels)
    pub mirror_texture_height: u32,

    /// Offset of the oblique clip plane along its normal (meters)
    /// Positive values clip slightly above the surface
    pub clip_bias: f32,

    /// Base surface opacity before distance falloff (0-1)
    pub alpha: f32,

    /// Strength of the normal-map distortion of the reflection lookup
    pub distortion_scale: f32,

    /// Normal map UV scale (dimensionless)
    pub size: f32,

    /// Sun light color (linear RGB)
    pub sun_color: [f32; 3],

    /// Deep water color (linear RGB, #008cff)
    pub water_color: [f32; 3],

    /// Fresnel reflectance at normal incidence
    pub fresnel_r0: f32,

    /// Opacity lost per meter of view distance, scaled by the fog factor
    pub fog_distance_falloff: f32,

    /// Underwater fog color (linear RGB, #8594bd)
    pub underwater_fog_color: [f32; 3],

    /// Underwater exp² fog density (1/m)
    pub underwater_fog_density: f32,

    /// Distance at which distortion and reflection falloff saturate (meters)
    pub distance_normalizer_m: f32,

    pub sun: SunLightParams,
}

impl Default for OceanSurfaceParams {
    fn default() -> Self {
        Self {
            mirror_texture_width: 512,
            mirror_texture_height: 512,
            clip_bias: 0.0,
            alpha: 1.0,
            distortion_scale: 1.5,
            size: 1.0,
            sun_color: [1.0, 1.0, 1.0],
            water_color: [0.0, 140.0 / 255.0, 1.0],
            fresnel_r0: 0.3,
            fog_distance_falloff: 0.003,
            underwater_fog_color: [133.0 / 255.0, 148.0 / 255.0, 189.0 / 255.0],
            underwater_fog_density: 0.03,
            distance_normalizer_m: 350.0,
            sun: SunLightParams::default(),
        }
    }
}

/// Directional sun light terms used by the surface shader
#[derive(Debug, Clone, Copy)]
pub struct SunLightParams {
    /// Phong exponent of the sun glint
    pub shininess: f32,

    /// Specular strength
    pub specular_strength: f32,

    /// Diffuse strength (the sun direction itself is unit length)
    pub diffuse_strength: f32,
}

impl Default for SunLightParams {
    fn default() -> Self {
        Self {
            shininess: 100.0,
            specular_strength: 2.0,
            diffuse_strength: 0.5,
        }
    }
}

/// Surface mesh layout
#[derive(Debug, Clone)]
pub struct MeshParams {
    /// Edge length of the square surface (meters)
    pub size_m: f32,

    /// Cells per side (vertices per side = cells + 1)
    pub cells_per_side: u32,
}

impl Default for MeshParams {
    fn default() -> Self {
        Self {
            size_m: 350.0,
            cells_per_side: 256, // 66,049 vertices
        }
    }
}

impl MeshParams {
    /// Spacing between neighbouring vertices (meters)
    pub fn spacing_m(&self) -> f32 {
        self.size_m / self.cells_per_side.max(1) as f32
    }
}
