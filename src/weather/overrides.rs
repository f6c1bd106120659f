//! Debug override path: substitutes fields of a scene weather state directly,
//! bypassing the mapper.

use glam::Vec2;

use super::{City, SceneWeatherState, SeaState, SkyState};

/// Optional per-field replacements (tuning panel / command line)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeatherOverrides {
    pub sea_state: Option<SeaState>,
    pub fog_factor: Option<f32>,
    pub cloud_cover: Option<f32>,
    pub rain_state: Option<f32>,
    /// Wind direction in degrees
    pub wind_direction_deg: Option<f32>,
    pub sky_state: Option<SkyState>,
    pub coastline_visible: Option<bool>,
    pub city: Option<City>,
}

impl WeatherOverrides {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Apply every set field, then re-clamp to the documented ranges
    pub fn apply(&self, mut state: SceneWeatherState) -> SceneWeatherState {
        if let Some(sea_state) = self.sea_state {
            state.sea_state = sea_state;
        }
        if let Some(fog) = self.fog_factor {
            state.fog_factor = fog;
        }
        if let Some(clouds) = self.cloud_cover {
            state.cloud_cover = clouds;
        }
        if let Some(rain) = self.rain_state {
            state.rain_state = rain;
        }
        if let Some(deg) = self.wind_direction_deg {
            let theta = deg.to_radians();
            state.wind_direction = Vec2::new(theta.cos(), theta.sin());
        }
        if let Some(sky) = self.sky_state {
            state.sky_state = sky;
        }
        if let Some(visible) = self.coastline_visible {
            state.coastline_visible = visible;
        }
        if let Some(city) = self.city {
            state.city = city;
        }

        if !self.is_empty() {
            log::debug!("Weather overrides applied: {:?}", self);
        }

        state.clamped()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weather::SunPosition;

    fn base() -> SceneWeatherState {
        SceneWeatherState {
            sea_state: SeaState::GentleBreeze,
            fog_factor: 1.0,
            cloud_cover: 1.0,
            wind_direction: Vec2::X,
            rain_state: 0.0,
            sky_state: SkyState::Noon,
            sun_position: SunPosition {
                azimuth: 0.2,
                inclination: 0.8,
            },
            coastline_visible: true,
            city: City::Barcelona,
        }
    }

    #[test]
    fn test_empty_overrides_leave_state_unchanged() {
        let overrides = WeatherOverrides::default();
        assert!(overrides.is_empty());
        assert_eq!(overrides.apply(base()), base());
    }

    #[test]
    fn test_overrides_substitute_and_clamp() {
        let overrides = WeatherOverrides {
            sea_state: Some(SeaState::Gale),
            fog_factor: Some(12.0),
            wind_direction_deg: Some(180.0),
            coastline_visible: Some(false),
            city: Some(City::Capetown),
            ..Default::default()
        };

        let state = overrides.apply(base());
        assert_eq!(state.sea_state, SeaState::Gale);
        assert_eq!(state.fog_factor, 4.0);
        assert!((state.wind_direction.x + 1.0).abs() < 1e-6);
        assert!(!state.coastline_visible);
        assert_eq!(state.city, City::Capetown);
        // untouched fields survive
        assert_eq!(state.sky_state, SkyState::Noon);
        assert_eq!(state.cloud_cover, 1.0);
    }
}
