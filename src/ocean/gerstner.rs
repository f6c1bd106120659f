//! Gerstner displacement, host side.
//!
//! Mirrors `gerstner_displace` in `shaders/gerstner.wgsl` operation for
//! operation so the boat sampled here sits on the surface drawn by the
//! vertex stage. Any change to one must be made to the other; the GPU probe
//! test compares the two.

use glam::{Vec2, Vec3};

use super::waves::Wave;

/// Per-frame inputs shared by every displacement evaluation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplacementInputs {
    /// Wave clock (seconds)
    pub time: f32,

    /// Wind direction (unit). Carried for the shading stage; waves are
    /// steered by the boat heading, not by the wind.
    pub wind_direction: Vec2,

    /// Boat direction vector, see `BoatPose::direction`
    pub boat_direction: Vec2,

    /// Boat speed (dimensionless multiplier on the wave phase speed)
    pub boat_speed: f32,
}

/// Displaced surface point and its tangent frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Displacement {
    /// Offset added to the rest position (meters)
    pub offset: Vec3,
    pub tangent: Vec3,
    pub binormal: Vec3,
    pub normal: Vec3,
}

impl Displacement {
    /// Flat water: no offset, up normal
    pub const IDENTITY: Displacement = Displacement {
        offset: Vec3::ZERO,
        tangent: Vec3::X,
        binormal: Vec3::Z,
        normal: Vec3::Y,
    };

    pub fn vertical_offset(&self) -> f32 {
        self.offset.y
    }

    pub fn horizontal_offset(&self) -> Vec2 {
        Vec2::new(self.offset.x, self.offset.z)
    }
}

/// Propagation direction of a wave as seen from the moving boat.
///
/// Equivalent to `cross((w, 1), (-b, 1)).xy + 0.1`, normalized.
pub fn effective_direction(wave_direction: Vec2, boat_direction: Vec2) -> Vec2 {
    let d = Vec2::new(
        wave_direction.y + boat_direction.y + 0.1,
        -boat_direction.x - wave_direction.x + 0.1,
    );
    let len = d.length();
    if len > 0.0 {
        d / len
    } else {
        Vec2::ZERO
    }
}

fn normalize_or(v: Vec3, fallback: Vec3) -> Vec3 {
    let len = v.length();
    if len > 0.0 {
        v / len
    } else {
        fallback
    }
}

/// Displacement at horizontal rest position `position` (x, z).
///
/// Empty `waves` yields [`Displacement::IDENTITY`].
pub fn displace(position: Vec2, waves: &[Wave], inputs: &DisplacementInputs) -> Displacement {
    if waves.is_empty() {
        return Displacement::IDENTITY;
    }

    let mut tangent = Vec3::X;
    let mut binormal = Vec3::Z;
    let mut offset = Vec3::ZERO;

    for wave in waves {
        let dir = effective_direction(wave.direction, inputs.boat_direction);
        let steepness = wave.k * wave.amplitude;
        let f = wave.k * (dir.dot(position) - inputs.time * wave.speed * inputs.boat_speed);
        let (sin_f, cos_f) = (f.sin(), f.cos());

        tangent += Vec3::new(
            -dir.x * dir.x * steepness * sin_f,
            dir.x * steepness * cos_f,
            -dir.x * dir.y * steepness * sin_f,
        );
        tangent = normalize_or(tangent, Vec3::X);

        binormal += Vec3::new(
            -dir.x * dir.y * steepness * sin_f,
            dir.y * steepness * cos_f,
            -dir.y * dir.y * steepness * sin_f,
        );
        binormal = normalize_or(binormal, Vec3::Z);

        offset += Vec3::new(
            dir.x * wave.amplitude * cos_f,
            wave.amplitude * sin_f,
            dir.y * wave.amplitude * cos_f,
        );
    }

    Displacement {
        offset,
        tangent,
        binormal,
        normal: normalize_or(binormal.cross(tangent), Vec3::Y),
    }
}
