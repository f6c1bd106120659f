//! Pure mapping from a weather reading to scene parameters.
//!
//! Every field is sanitised at this boundary: NaN or out-of-range input is
//! replaced or clamped so nothing non-finite reaches the wave or shader
//! pipeline.

use std::f32::consts::PI;
use std::time::SystemTime;

use glam::Vec2;

use super::astro;
use super::{finite_or, unix_millis, City, SceneWeatherState, SeaState, SkyState, SunPosition, WeatherSignal};

/// Lower wind-speed bound (m/s) of every bucket above calm
const SEA_STATE_THRESHOLDS: [(f32, SeaState); 9] = [
    (0.5, SeaState::LightAir),
    (1.5, SeaState::LightBreeze),
    (3.3, SeaState::GentleBreeze),
    (5.5, SeaState::ModerateBreeze),
    (7.9, SeaState::FreshBreeze),
    (10.7, SeaState::StrongBreeze),
    (13.8, SeaState::NearGale),
    (17.1, SeaState::Gale),
    (20.7, SeaState::StrongGale),
];

/// Visibility at which fog vanishes (meters)
const CLEAR_VISIBILITY_M: f32 = 10_000.0;

/// Below this solar altitude (radians) the moon lights the scene
const MOON_ALTITUDE_RAD: f64 = -0.1;

/// Visibility in meters → fog factor in [0, 4] (inverse)
pub fn map_fog(visibility_m: f32) -> f32 {
    let visibility = finite_or(visibility_m, CLEAR_VISIBILITY_M).max(0.0);
    (4.0 * (1.0 - visibility / CLEAR_VISIBILITY_M) + 0.6).clamp(0.0, 4.0)
}

/// Cloudiness percentage → cover in [0, 4]
pub fn map_cloud_cover(cloud_pct: f32) -> f32 {
    4.0 * finite_or(cloud_pct, 0.0).clamp(0.0, 100.0) / 100.0
}

/// Meteorological degrees → unit vector
pub fn map_wind_direction(direction_deg: f32) -> Vec2 {
    let theta = finite_or(direction_deg, 0.0).rem_euclid(360.0) * PI / 180.0;
    Vec2::new(theta.cos(), theta.sin())
}

/// Rain in mm over one hour → density in [0, 2]
pub fn map_rain(rain_mm_1h: Option<f32>) -> f32 {
    match rain_mm_1h {
        Some(mm) if mm.is_finite() && mm > 0.0 => (mm.sqrt().ceil() / 2.0).min(2.0),
        _ => 0.0,
    }
}

/// Beaufort bucket for a wind speed; each bucket includes its lower bound.
/// NaN reads as no wind, anything past the last bound saturates at strong gale.
pub fn map_sea_state(wind_speed_ms: f32) -> SeaState {
    let speed = if wind_speed_ms.is_nan() { 0.0 } else { wind_speed_ms };
    SEA_STATE_THRESHOLDS
        .iter()
        .rev()
        .find(|(lower, _)| speed >= *lower)
        .map(|(_, state)| *state)
        .unwrap_or(SeaState::Calm)
}

/// Time-of-day bucket from the solar events of the day containing `at`
pub fn map_sky_state(at: SystemTime, latitude: f64, longitude: f64) -> SkyState {
    let t = unix_millis(at);
    let times = astro::solar_times(t, latitude, longitude);

    // NaN events (polar day/night) make every window test false
    if t > times.night_end && t <= times.dawn {
        SkyState::Dawn
    } else if t > times.dawn && t <= times.sunrise_end {
        SkyState::Sunrise
    } else if t > times.sunrise_end && t < times.solar_noon {
        SkyState::Morning
    } else if t >= times.solar_noon && t <= times.golden_hour {
        SkyState::Noon
    } else if t > times.golden_hour && t < times.sunset_start {
        SkyState::Afternoon
    } else if t >= times.sunset_start && t <= times.dusk {
        SkyState::Dusk
    } else {
        SkyState::Night
    }
}

/// Sun position renormalised for the sky model; the moon stands in at night
pub fn map_sun_position(at: SystemTime, latitude: f64, longitude: f64) -> SunPosition {
    let t = unix_millis(at);
    let sun = astro::sun_position(t, latitude, longitude);

    let (azimuth, inclination) = if sun.altitude < MOON_ALTITUDE_RAD {
        let moon = astro::moon_position(t, latitude, longitude);
        (
            moon.azimuth / (2.0 * std::f64::consts::PI) + 0.5,
            moon.altitude.max(0.0) / std::f64::consts::PI + 0.5,
        )
    } else {
        (
            sun.azimuth / (2.0 * std::f64::consts::PI) - 0.25,
            sun.altitude.max(-0.02) / std::f64::consts::PI + 0.5,
        )
    };

    SunPosition {
        azimuth: finite_or(azimuth as f32, 0.0),
        inclination: finite_or(inclination as f32, 0.5),
    }
}

/// Full mapping for a reading, evaluated at `at` for the given location
pub fn map_weather(
    signal: &WeatherSignal,
    at: SystemTime,
    latitude: f64,
    longitude: f64,
) -> SceneWeatherState {
    let (latitude, longitude) = sanitize_location(latitude, longitude);

    let state = SceneWeatherState {
        sea_state: map_sea_state(signal.wind_speed_ms),
        fog_factor: map_fog(signal.visibility_m),
        cloud_cover: map_cloud_cover(signal.cloud_pct),
        wind_direction: map_wind_direction(signal.wind_direction_deg),
        rain_state: map_rain(signal.rain_mm_1h),
        sky_state: map_sky_state(at, latitude, longitude),
        sun_position: map_sun_position(at, latitude, longitude),
        coastline_visible: true,
        city: City::Barcelona,
    };

    log::info!(
        "Weather mapped: sea '{}', sky '{}', fog {:.2}, clouds {:.2}, rain {:.1}",
        state.sea_state.name(),
        state.sky_state.name(),
        state.fog_factor,
        state.cloud_cover,
        state.rain_state
    );

    state
}

impl WeatherSignal {
    /// Map this reading at its own timestamp and location
    pub fn to_scene_state(&self) -> SceneWeatherState {
        map_weather(self, self.timestamp, self.latitude, self.longitude)
    }
}

fn sanitize_location(latitude: f64, longitude: f64) -> (f64, f64) {
    let lat = if latitude.is_finite() { latitude.clamp(-90.0, 90.0) } else { 0.0 };
    let lng = if longitude.is_finite() { longitude.clamp(-180.0, 180.0) } else { 0.0 };
    (lat, lng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, UNIX_EPOCH};

    fn signal(wind_speed_ms: f32) -> WeatherSignal {
        WeatherSignal {
            wind_speed_ms,
            wind_direction_deg: 90.0,
            cloud_pct: 50.0,
            rain_mm_1h: None,
            visibility_m: 8000.0,
            // 2024-06-21 10:00 UTC
            timestamp: UNIX_EPOCH + Duration::from_secs(1_718_964_000),
            latitude: 41.3,
            longitude: 2.46,
        }
    }

    #[test]
    fn test_sea_state_thresholds_include_lower_bound() {
        assert_eq!(map_sea_state(0.4), SeaState::Calm);
        assert_eq!(map_sea_state(0.5), SeaState::LightAir);
        assert_eq!(map_sea_state(1.5), SeaState::LightBreeze);
        assert_eq!(map_sea_state(10.7), SeaState::StrongBreeze);
        assert_eq!(map_sea_state(20.7), SeaState::StrongGale);
        assert_eq!(map_sea_state(21.0), SeaState::StrongGale);
    }

    #[test]
    fn test_sea_state_clamps_out_of_range_speeds() {
        assert_eq!(map_sea_state(f32::NAN), SeaState::Calm);
        assert_eq!(map_sea_state(-3.0), SeaState::Calm);
        assert_eq!(map_sea_state(f32::NEG_INFINITY), SeaState::Calm);
        assert_eq!(map_sea_state(95.0), SeaState::StrongGale);
        assert_eq!(map_sea_state(f32::INFINITY), SeaState::StrongGale);
    }

    #[test]
    fn test_rain_mapping() {
        assert_eq!(map_rain(None), 0.0);
        assert_eq!(map_rain(Some(0.0)), 0.0);
        assert_eq!(map_rain(Some(4.0)), 1.0);
        assert_eq!(map_rain(Some(16.0)), 2.0);
        assert_eq!(map_rain(Some(0.2)), 0.5);
        assert_eq!(map_rain(Some(f32::NAN)), 0.0);
    }

    #[test]
    fn test_fog_is_clamped() {
        assert!((map_fog(8000.0) - 1.4).abs() < 1e-5);
        assert_eq!(map_fog(0.0), 4.0);
        assert!((map_fog(10_000.0) - 0.6).abs() < 1e-6);
        assert_eq!(map_fog(50_000.0), 0.0);
        assert!((map_fog(f32::NAN) - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_cloud_cover_scales_percentage() {
        assert_eq!(map_cloud_cover(50.0), 2.0);
        assert_eq!(map_cloud_cover(250.0), 4.0);
        assert_eq!(map_cloud_cover(-10.0), 0.0);
    }

    #[test]
    fn test_wind_direction_is_unit() {
        let east = map_wind_direction(90.0);
        assert!(east.x.abs() < 1e-6);
        assert!((east.y - 1.0).abs() < 1e-6);
        assert!((map_wind_direction(725.0).length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_strong_breeze_scenario() {
        let state = signal(12.0).to_scene_state();

        assert_eq!(state.sea_state, SeaState::StrongBreeze);
        assert!(state.wind_direction.x.abs() < 1e-6);
        assert!((state.wind_direction.y - 1.0).abs() < 1e-6);
        assert!((state.fog_factor - 1.4).abs() < 1e-5);
        assert_eq!(state.cloud_cover, 2.0);
        assert_eq!(state.rain_state, 0.0);
    }

    #[test]
    fn test_morning_in_barcelona() {
        // 10:00 UTC is mid-morning locally, before the ~11:52 UTC transit
        let state = signal(3.0).to_scene_state();
        assert_eq!(state.sky_state, SkyState::Morning);
        assert!(state.sun_position.inclination > 0.5);
    }

    #[test]
    fn test_night_uses_moon_renormalisation() {
        let midnight = UNIX_EPOCH + Duration::from_secs(1_718_928_000);
        assert_eq!(map_sky_state(midnight, 41.38, 2.17), SkyState::Night);

        let pos = map_sun_position(midnight, 41.38, 2.17);
        // moon branch: inclination never drops below the horizon value
        assert!(pos.inclination >= 0.5);
        assert!(pos.azimuth >= 0.0 && pos.azimuth <= 1.0);
    }

    #[test]
    fn test_polar_day_falls_back_to_night_bucket() {
        let noon = UNIX_EPOCH + Duration::from_secs(1_718_971_200);
        assert_eq!(map_sky_state(noon, 78.0, 15.0), SkyState::Night);
    }

    #[test]
    fn test_invalid_location_is_sanitised() {
        let mut s = signal(5.0);
        s.latitude = f64::NAN;
        s.longitude = 500.0;
        let state = s.to_scene_state();
        assert!(state.sun_position.azimuth.is_finite());
        assert!(state.sun_position.inclination.is_finite());
    }
}
