//! Static scene table: wave table, sky presets, coastline cities and the
//! fallback weather state.
//!
//! The table ships embedded in the binary (`assets/weather_states.json`) and
//! can be replaced from disk. It is validated once on load; lookups after
//! that only fail for tables that were constructed by hand.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::OceanError;
use crate::ocean::SeaStateEntry;
use crate::weather::{City, SceneWeatherState, SeaState, SkyState};

const BUILTIN_TABLE: &str = include_str!("../assets/weather_states.json");

/// Preetham sky coefficients for one time-of-day bucket
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkyParams {
    pub turbidity: f32,
    pub rayleigh: f32,
    pub mie_coefficient: f32,
    pub mie_directional_g: f32,
    /// Multiplier on the sun disc intensity
    pub sun_intensity: f32,
}

/// Coastline city: location and decal size (meters)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CityEntry {
    pub latitude: f64,
    pub longitude: f64,
    pub scale: [f32; 2],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneTable {
    pub sea_states: BTreeMap<SeaState, SeaStateEntry>,
    pub sky_states: BTreeMap<SkyState, SkyParams>,
    pub cities: BTreeMap<City, CityEntry>,
    /// Used when no weather signal is available
    pub fallback: SceneWeatherState,
}

impl SceneTable {
    /// The table embedded at build time
    pub fn builtin() -> Result<Self, OceanError> {
        Self::from_json(BUILTIN_TABLE)
    }

    pub fn from_json(json: &str) -> Result<Self, OceanError> {
        let table: SceneTable = serde_json::from_str(json)?;
        table.validate()?;
        Ok(table)
    }

    pub fn load(path: &Path) -> Result<Self, OceanError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| OceanError::Config(format!("{}: {}", path.display(), e)))?;
        let table = Self::from_json(&json)?;
        log::info!("Loaded scene table from {}", path.display());
        Ok(table)
    }

    /// Check completeness and wave ranges
    pub fn validate(&self) -> Result<(), OceanError> {
        for state in SeaState::ALL {
            let entry = self.sea_state(state)?;
            for wave in &entry.waves {
                wave.validate().map_err(|reason| OceanError::InvalidWaveTable {
                    sea_state: state.name().to_string(),
                    reason,
                })?;
            }
            if !(entry.wind_speed.is_finite() && entry.wind_speed >= 0.0) {
                return Err(OceanError::InvalidWaveTable {
                    sea_state: state.name().to_string(),
                    reason: format!("wind speed {} must be >= 0", entry.wind_speed),
                });
            }
        }

        for sky in SkyState::ALL {
            self.sky(sky)?;
        }
        for city in City::ALL {
            self.city(city)?;
        }

        if self.fallback.clone().clamped() != self.fallback {
            return Err(OceanError::Config(
                "fallback weather state is out of range".to_string(),
            ));
        }

        Ok(())
    }

    pub fn sea_state(&self, state: SeaState) -> Result<&SeaStateEntry, OceanError> {
        self.sea_states
            .get(&state)
            .ok_or_else(|| OceanError::MissingSeaState(state.name().to_string()))
    }

    pub fn sky(&self, state: SkyState) -> Result<&SkyParams, OceanError> {
        self.sky_states
            .get(&state)
            .ok_or_else(|| OceanError::Config(format!("sky state '{}' missing", state.name())))
    }

    pub fn city(&self, city: City) -> Result<&CityEntry, OceanError> {
        self.cities
            .get(&city)
            .ok_or_else(|| OceanError::Config(format!("city '{}' missing", city.name())))
    }

    /// Fallback state, logged as the single notice that live weather is unavailable
    pub fn fallback_state(&self) -> SceneWeatherState {
        log::warn!("No weather signal available, using preset scene");
        self.fallback.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_table_is_complete() {
        let table = SceneTable::builtin().unwrap();
        assert_eq!(table.sea_states.len(), SeaState::ALL.len());
        assert_eq!(table.sky_states.len(), SkyState::ALL.len());
        assert_eq!(table.cities.len(), City::ALL.len());
        assert_eq!(table.fallback.sea_state, SeaState::GentleBreeze);
    }

    #[test]
    fn test_missing_sea_state_is_reported() {
        let mut table = SceneTable::builtin().unwrap();
        table.sea_states.remove(&SeaState::Gale);

        match table.validate() {
            Err(OceanError::MissingSeaState(name)) => assert_eq!(name, "gale"),
            other => panic!("expected MissingSeaState, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_steepness_is_rejected() {
        let mut table = SceneTable::builtin().unwrap();
        if let Some(entry) = table.sea_states.get_mut(&SeaState::Calm) {
            entry.waves[1].steepness = 1.5;
        }
        assert!(matches!(
            table.validate(),
            Err(OceanError::InvalidWaveTable { .. })
        ));
    }

    #[test]
    fn test_wrong_wave_count_fails_to_parse() {
        let table = SceneTable::builtin().unwrap();
        let mut value = serde_json::to_value(&table).unwrap();
        value["seaStates"]["calm"]["waves"]
            .as_array_mut()
            .unwrap()
            .pop();

        let json = serde_json::to_string(&value).unwrap();
        assert!(matches!(
            SceneTable::from_json(&json),
            Err(OceanError::Config(_))
        ));
    }

    #[test]
    fn test_malformed_json_is_config_error() {
        assert!(matches!(
            SceneTable::from_json("{ not json"),
            Err(OceanError::Config(_))
        ));
    }
}
