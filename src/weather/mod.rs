//! Weather input and the scene-level weather state derived from it.

pub mod astro;
mod mapper;
mod overrides;

use std::fmt;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use glam::Vec2;
use serde::{Deserialize, Serialize};

pub use mapper::{
    map_cloud_cover, map_fog, map_rain, map_sea_state, map_sky_state, map_sun_position,
    map_weather, map_wind_direction,
};
pub use overrides::WeatherOverrides;

/// Raw reading delivered by the weather collaborator (one per fetch)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeatherSignal {
    pub wind_speed_ms: f32,
    /// Meteorological wind direction in degrees, [0, 360)
    pub wind_direction_deg: f32,
    /// Cloudiness percentage, [0, 100]
    pub cloud_pct: f32,
    /// Rain volume over the last hour; `None` when no rain was reported
    pub rain_mm_1h: Option<f32>,
    pub visibility_m: f32,
    pub timestamp: SystemTime,
    pub latitude: f64,
    pub longitude: f64,
}

/// Beaufort-like sea state buckets, calm to strong gale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SeaState {
    #[serde(rename = "calm")]
    Calm,
    #[serde(rename = "light air")]
    LightAir,
    #[serde(rename = "light breeze")]
    LightBreeze,
    #[serde(rename = "gentle breeze")]
    GentleBreeze,
    #[serde(rename = "moderate breeze")]
    ModerateBreeze,
    #[serde(rename = "fresh breeze")]
    FreshBreeze,
    #[serde(rename = "strong breeze")]
    StrongBreeze,
    #[serde(rename = "near gale")]
    NearGale,
    #[serde(rename = "gale")]
    Gale,
    #[serde(rename = "strong gale")]
    StrongGale,
}

impl SeaState {
    pub const ALL: [SeaState; 10] = [
        SeaState::Calm,
        SeaState::LightAir,
        SeaState::LightBreeze,
        SeaState::GentleBreeze,
        SeaState::ModerateBreeze,
        SeaState::FreshBreeze,
        SeaState::StrongBreeze,
        SeaState::NearGale,
        SeaState::Gale,
        SeaState::StrongGale,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SeaState::Calm => "calm",
            SeaState::LightAir => "light air",
            SeaState::LightBreeze => "light breeze",
            SeaState::GentleBreeze => "gentle breeze",
            SeaState::ModerateBreeze => "moderate breeze",
            SeaState::FreshBreeze => "fresh breeze",
            SeaState::StrongBreeze => "strong breeze",
            SeaState::NearGale => "near gale",
            SeaState::Gale => "gale",
            SeaState::StrongGale => "strong gale",
        }
    }
}

/// Time-of-day sky buckets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkyState {
    Dawn,
    Sunrise,
    Morning,
    Noon,
    Afternoon,
    Dusk,
    Night,
}

impl SkyState {
    pub const ALL: [SkyState; 7] = [
        SkyState::Dawn,
        SkyState::Sunrise,
        SkyState::Morning,
        SkyState::Noon,
        SkyState::Afternoon,
        SkyState::Dusk,
        SkyState::Night,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SkyState::Dawn => "dawn",
            SkyState::Sunrise => "sunrise",
            SkyState::Morning => "morning",
            SkyState::Noon => "noon",
            SkyState::Afternoon => "afternoon",
            SkyState::Dusk => "dusk",
            SkyState::Night => "night",
        }
    }
}

/// Coastline shown on the horizon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum City {
    Barcelona,
    Capetown,
}

impl City {
    pub const ALL: [City; 2] = [City::Barcelona, City::Capetown];

    pub fn name(self) -> &'static str {
        match self {
            City::Barcelona => "Barcelona",
            City::Capetown => "Capetown",
        }
    }
}

/// Renormalized position of the scene's single directional light (sun or moon)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SunPosition {
    /// Fraction of a turn, roughly [-0.25, 0.75)
    pub azimuth: f32,
    /// 0.5 at the horizon, 1.0 at zenith
    pub inclination: f32,
}

/// Weather as the scene consumes it. Owned by the scene, replaced wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneWeatherState {
    pub sea_state: SeaState,
    /// [0, 4]
    pub fog_factor: f32,
    /// [0, 4]
    pub cloud_cover: f32,
    /// Unit vector
    pub wind_direction: Vec2,
    /// [0, 2]
    pub rain_state: f32,
    pub sky_state: SkyState,
    pub sun_position: SunPosition,
    pub coastline_visible: bool,
    pub city: City,
}

impl SceneWeatherState {
    /// Re-establish the documented ranges (used after overrides)
    pub fn clamped(mut self) -> Self {
        self.fog_factor = finite_or(self.fog_factor, 0.0).clamp(0.0, 4.0);
        self.cloud_cover = finite_or(self.cloud_cover, 0.0).clamp(0.0, 4.0);
        self.rain_state = finite_or(self.rain_state, 0.0).clamp(0.0, 2.0);
        self.wind_direction = self.wind_direction.try_normalize().unwrap_or(Vec2::X);
        self.sun_position.azimuth = finite_or(self.sun_position.azimuth, 0.0);
        self.sun_position.inclination = finite_or(self.sun_position.inclination, 0.5).clamp(0.0, 1.0);
        self
    }
}

pub(crate) fn finite_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}

/// Milliseconds since the Unix epoch (negative before it)
pub fn unix_millis(time: SystemTime) -> f64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(after) => after.as_secs_f64() * 1000.0,
        Err(before) => -before.duration().as_secs_f64() * 1000.0,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownName(pub String);

impl fmt::Display for UnknownName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown name '{}'", self.0)
    }
}

impl std::error::Error for UnknownName {}

fn normalize_name(s: &str) -> String {
    s.trim().to_lowercase().replace(['-', '_'], " ")
}

impl FromStr for SeaState {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize_name(s);
        SeaState::ALL
            .into_iter()
            .find(|state| state.name() == wanted)
            .ok_or_else(|| UnknownName(s.to_string()))
    }
}

impl FromStr for SkyState {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize_name(s);
        SkyState::ALL
            .into_iter()
            .find(|state| state.name() == wanted)
            .ok_or_else(|| UnknownName(s.to_string()))
    }
}

impl FromStr for City {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize_name(s);
        City::ALL
            .into_iter()
            .find(|city| city.name().to_lowercase() == wanted)
            .ok_or_else(|| UnknownName(s.to_string()))
    }
}
