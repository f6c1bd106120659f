//! Command-line argument parsing.

use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use clap::Parser;

use crate::config::SceneTable;
use crate::error::OceanError;
use crate::params::{CameraPreset, FixedCamera, MeshParams, OrbitCamera, RenderConfig};
use crate::weather::{City, SceneWeatherState, SeaState, SkyState, WeatherOverrides, WeatherSignal};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "searebbel")]
#[command(about = "Weather-driven ocean scene with Gerstner waves and planar reflections", long_about = None)]
pub struct Args {
    /// Wind speed (m/s)
    #[arg(long, value_name = "M/S", default_value = "5.0")]
    pub wind_speed: f32,

    /// Meteorological wind direction (degrees)
    #[arg(long, value_name = "DEGREES", default_value = "0")]
    pub wind_direction: f32,

    /// Cloudiness (percent)
    #[arg(long, value_name = "PERCENT", default_value = "20")]
    pub cloud_pct: f32,

    /// Rain volume over the last hour (mm); omit for no rain
    #[arg(long, value_name = "MM")]
    pub rain_mm: Option<f32>,

    /// Visibility (meters)
    #[arg(long, value_name = "METERS", default_value = "10000")]
    pub visibility: f32,

    #[arg(long, default_value = "41.3", allow_hyphen_values = true)]
    pub latitude: f64,

    #[arg(long, default_value = "2.46", allow_hyphen_values = true)]
    pub longitude: f64,

    /// Unix time of the reading (seconds); defaults to now
    #[arg(long, value_name = "SECONDS")]
    pub timestamp: Option<u64>,

    /// Skip weather mapping and use the scene table's fallback state
    #[arg(long)]
    pub preset: bool,

    /// Override: sea state name, e.g. "strong breeze"
    #[arg(long, value_name = "NAME")]
    pub sea_state: Option<SeaState>,

    /// Override: fog factor [0, 4]
    #[arg(long, value_name = "FACTOR")]
    pub fog: Option<f32>,

    /// Override: cloud cover [0, 4]
    #[arg(long, value_name = "COVER")]
    pub clouds: Option<f32>,

    /// Override: rain state [0, 2]
    #[arg(long, value_name = "STATE")]
    pub rain: Option<f32>,

    /// Override: wind direction (degrees)
    #[arg(long, value_name = "DEGREES", allow_hyphen_values = true)]
    pub wind_dir: Option<f32>,

    /// Override: sky state name, e.g. "dusk"
    #[arg(long, value_name = "NAME")]
    pub sky_state: Option<SkyState>,

    /// Override: coastline city
    #[arg(long, value_name = "NAME")]
    pub city: Option<City>,

    /// Override: hide the coastline
    #[arg(long)]
    pub no_coast: bool,

    /// Camera preset: orbit (default) or fixed
    #[arg(long, value_name = "PRESET", default_value = "orbit")]
    pub camera: String,

    /// Surface mesh cells per side
    #[arg(long, value_name = "CELLS", default_value = "256")]
    pub cells: u32,

    /// Surface mesh edge length (meters)
    #[arg(long, value_name = "METERS", default_value = "350")]
    pub mesh_size: f32,

    #[arg(long, value_name = "PIXELS", default_value = "1280")]
    pub width: u32,

    #[arg(long, value_name = "PIXELS", default_value = "720")]
    pub height: u32,

    /// Directory with waternormals.jpg, foam.jpg, perlin.png, trail.png and
    /// coast_<city>.png; textures are generated when omitted
    #[arg(long, value_name = "DIR")]
    pub textures: Option<PathBuf>,

    /// Scene table JSON replacing the built-in one
    #[arg(long, value_name = "FILE")]
    pub table: Option<PathBuf>,

    /// Waypoint route JSON to play back
    #[arg(long, value_name = "FILE")]
    pub route: Option<PathBuf>,

    /// Compare GPU and CPU displacement, then exit
    #[arg(long)]
    pub check_surface: bool,
}

impl Args {
    /// Parse camera preset from command-line arguments
    pub fn camera_preset(&self) -> CameraPreset {
        match self.camera.to_lowercase().as_str() {
            "orbit" => CameraPreset::Orbit(OrbitCamera::default()),
            "fixed" => CameraPreset::Fixed(FixedCamera::default()),
            other => {
                log::warn!("Unknown camera preset '{}', using orbit", other);
                CameraPreset::Orbit(OrbitCamera::default())
            }
        }
    }

    pub fn render_config(&self) -> RenderConfig {
        RenderConfig {
            window_width: self.width.max(1),
            window_height: self.height.max(1),
            ..Default::default()
        }
    }

    pub fn mesh_params(&self) -> MeshParams {
        let defaults = MeshParams::default();
        MeshParams {
            size_m: if self.mesh_size.is_finite() && self.mesh_size > 0.0 {
                self.mesh_size
            } else {
                defaults.size_m
            },
            cells_per_side: self.cells.clamp(1, 1024),
        }
    }

    /// Built-in scene table unless `--table` names a file
    pub fn load_table(&self) -> Result<SceneTable, OceanError> {
        match &self.table {
            Some(path) => SceneTable::load(path),
            None => SceneTable::builtin(),
        }
    }

    pub fn reading_time(&self) -> SystemTime {
        match self.timestamp {
            Some(secs) => UNIX_EPOCH + Duration::from_secs(secs),
            None => SystemTime::now(),
        }
    }

    pub fn weather_signal(&self) -> WeatherSignal {
        WeatherSignal {
            wind_speed_ms: self.wind_speed,
            wind_direction_deg: self.wind_direction,
            cloud_pct: self.cloud_pct,
            rain_mm_1h: self.rain_mm,
            visibility_m: self.visibility,
            timestamp: self.reading_time(),
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }

    /// Mapped weather, or the fallback state with `--preset`
    pub fn initial_weather(&self, table: &SceneTable) -> SceneWeatherState {
        if self.preset {
            log::warn!("Weather mapping skipped, using the fallback preset");
            table.fallback_state()
        } else {
            self.weather_signal().to_scene_state()
        }
    }

    pub fn overrides(&self) -> WeatherOverrides {
        WeatherOverrides {
            sea_state: self.sea_state,
            fog_factor: self.fog,
            cloud_cover: self.clouds,
            rain_state: self.rain,
            wind_direction_deg: self.wind_dir,
            sky_state: self.sky_state,
            coastline_visible: self.no_coast.then_some(false),
            city: self.city,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_from_flags() {
        let args = Args::parse_from([
            "searebbel",
            "--sea-state",
            "strong breeze",
            "--sky-state",
            "dusk",
            "--city",
            "capetown",
            "--no-coast",
            "--fog",
            "2.5",
        ]);
        let o = args.overrides();
        assert_eq!(o.sea_state, Some(SeaState::StrongBreeze));
        assert_eq!(o.sky_state, Some(SkyState::Dusk));
        assert_eq!(o.city, Some(City::Capetown));
        assert_eq!(o.coastline_visible, Some(false));
        assert_eq!(o.fog_factor, Some(2.5));
        assert_eq!(o.cloud_cover, None);
    }

    #[test]
    fn test_defaults_leave_overrides_empty() {
        let args = Args::parse_from(["searebbel"]);
        assert!(args.overrides().is_empty());
        assert!(matches!(args.camera_preset(), CameraPreset::Orbit(_)));
        assert_eq!(args.mesh_params().cells_per_side, 256);
    }

    #[test]
    fn test_signal_fields_and_timestamp() {
        let args = Args::parse_from([
            "searebbel",
            "--wind-speed",
            "12",
            "--latitude",
            "-33.9",
            "--timestamp",
            "1700000000",
        ]);
        let signal = args.weather_signal();
        assert_eq!(signal.wind_speed_ms, 12.0);
        assert_eq!(signal.latitude, -33.9);
        assert_eq!(signal.rain_mm_1h, None);
        assert_eq!(
            signal.timestamp,
            UNIX_EPOCH + Duration::from_secs(1_700_000_000)
        );
    }

    #[test]
    fn test_unknown_sea_state_is_rejected() {
        assert!(Args::try_parse_from(["searebbel", "--sea-state", "tsunami"]).is_err());
    }

    #[test]
    fn test_preset_uses_fallback_state() {
        let table = SceneTable::builtin().unwrap();
        let args = Args::parse_from(["searebbel", "--preset"]);
        assert_eq!(args.initial_weather(&table), table.fallback_state());
    }
}
