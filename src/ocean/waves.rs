//! Wave table: sea state → three traveling-wave descriptors.

use std::f32::consts::PI;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::config::SceneTable;
use crate::error::OceanError;
use crate::weather::SeaState;

/// Gravitational acceleration (m/s²)
pub const GRAVITY: f32 = 9.8;

/// Waves per sea state; the vertex loop always iterates exactly this many
pub const WAVES_PER_STATE: usize = 3;

/// One traveling wave as authored in the scene table
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WaveDescriptor {
    /// Crest-to-crest distance (meters, > 0)
    #[serde(rename = "wavelength")]
    pub wavelength_m: f32,

    /// Steepness (dimensionless, (0, 1))
    pub steepness: f32,

    /// Propagation direction (degrees)
    #[serde(rename = "direction")]
    pub direction_deg: f32,
}

impl WaveDescriptor {
    pub fn validate(&self) -> Result<(), String> {
        if !(self.wavelength_m.is_finite() && self.wavelength_m > 0.0) {
            return Err(format!("wavelength {} must be > 0", self.wavelength_m));
        }
        if !(self.steepness > 0.0 && self.steepness < 1.0) {
            return Err(format!("steepness {} must be in (0, 1)", self.steepness));
        }
        if !self.direction_deg.is_finite() {
            return Err("direction must be finite".to_string());
        }
        Ok(())
    }

    /// Angular wavenumber k = 2π/λ (rad/m)
    pub fn wavenumber(&self) -> f32 {
        2.0 * PI / self.wavelength_m
    }

    /// Deep-water phase speed √(g/k) (m/s)
    pub fn phase_speed(&self) -> f32 {
        (GRAVITY / self.wavenumber()).sqrt()
    }

    /// Amplitude steepness/k (meters)
    pub fn amplitude(&self) -> f32 {
        self.steepness / self.wavenumber()
    }

    pub fn derive(&self) -> Wave {
        let theta = self.direction_deg.to_radians();
        Wave {
            k: self.wavenumber(),
            speed: self.phase_speed(),
            amplitude: self.amplitude(),
            direction: Vec2::new(theta.cos(), theta.sin()),
        }
    }
}

/// Wave with derived quantities, as consumed by the displacement function
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Wave {
    pub k: f32,
    pub speed: f32,
    pub amplitude: f32,
    /// Unit propagation direction in the XZ plane
    pub direction: Vec2,
}

/// Sea-state row of the scene table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeaStateEntry {
    /// Representative wind speed (m/s), drives cloud drift
    pub wind_speed: f32,

    /// Blend geometric normals into the shading normal
    pub use_normals: bool,

    pub waves: [WaveDescriptor; WAVES_PER_STATE],
}

/// Looked-up and derived wave set for one sea state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaveSet {
    pub sea_state: SeaState,
    pub descriptors: [WaveDescriptor; WAVES_PER_STATE],
    pub waves: [Wave; WAVES_PER_STATE],
    pub wind_speed: f32,
    pub use_normals: bool,
}

impl WaveSet {
    /// Look up a sea state and derive its waves
    pub fn lookup(table: &SceneTable, sea_state: SeaState) -> Result<Self, OceanError> {
        let entry = table.sea_state(sea_state)?;
        for wave in &entry.waves {
            wave.validate().map_err(|reason| OceanError::InvalidWaveTable {
                sea_state: sea_state.name().to_string(),
                reason,
            })?;
        }

        Ok(Self {
            sea_state,
            descriptors: entry.waves,
            waves: entry.waves.map(|w| w.derive()),
            wind_speed: entry.wind_speed,
            use_normals: entry.use_normals,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_quantities() {
        let w = WaveDescriptor {
            wavelength_m: 60.0,
            steepness: 0.18,
            direction_deg: 90.0,
        };
        let k = 2.0 * PI / 60.0;
        assert!((w.wavenumber() - k).abs() < 1e-6);
        assert!((w.amplitude() - 0.18 / k).abs() < 1e-6);
        assert!((w.phase_speed() - (9.8 / k).sqrt()).abs() < 1e-5);

        let derived = w.derive();
        assert!(derived.direction.x.abs() < 1e-6);
        assert!((derived.direction.y - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_validate_rejects_bad_waves() {
        let mut w = WaveDescriptor {
            wavelength_m: 10.0,
            steepness: 0.5,
            direction_deg: 0.0,
        };
        assert!(w.validate().is_ok());

        w.wavelength_m = 0.0;
        assert!(w.validate().is_err());

        w.wavelength_m = 10.0;
        w.steepness = 1.0;
        assert!(w.validate().is_err());

        w.steepness = f32::NAN;
        assert!(w.validate().is_err());
    }

    #[test]
    fn test_every_sea_state_has_three_valid_waves() {
        let table = SceneTable::builtin().unwrap();
        for state in SeaState::ALL {
            let set = WaveSet::lookup(&table, state).unwrap();
            assert_eq!(set.waves.len(), WAVES_PER_STATE);
            for (desc, wave) in set.descriptors.iter().zip(set.waves.iter()) {
                assert!(desc.wavelength_m > 0.0);
                assert!(desc.steepness > 0.0 && desc.steepness < 1.0);
                assert!((wave.k - 2.0 * PI / desc.wavelength_m).abs() < 1e-6);
                assert!((wave.amplitude - desc.steepness / wave.k).abs() < 1e-6);
                assert!((wave.speed - (GRAVITY / wave.k).sqrt()).abs() < 1e-5);
            }
        }
    }

    #[test]
    fn test_rougher_sea_has_taller_waves() {
        let table = SceneTable::builtin().unwrap();
        let calm = WaveSet::lookup(&table, SeaState::Calm).unwrap();
        let gale = WaveSet::lookup(&table, SeaState::StrongGale).unwrap();
        assert!(gale.waves[0].amplitude > calm.waves[0].amplitude);
        assert!(gale.wind_speed > calm.wind_speed);
    }
}
