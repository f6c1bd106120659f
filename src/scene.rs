//! Scene composition: weather, boat, clock and camera in, one set of
//! per-frame render inputs out.
//!
//! `Scene` is owned by the application and driven through explicit methods
//! (`resize`, camera and boat controls, `set_weather`); nothing reaches it
//! through globals.

use std::f32::consts::PI;

use glam::{Mat4, Quat, Vec2, Vec3};

use crate::boat::{ground_boat, BoatGrounding, BoatPose, GeoPoint, RoutePlayback};
use crate::camera::{Camera, CameraSystem};
use crate::config::{CityEntry, SceneTable, SkyParams};
use crate::error::OceanError;
use crate::ocean::{DisplacementInputs, WaveClock, WaveSet};
use crate::params::{CameraPreset, RenderConfig};
use crate::weather::{SceneWeatherState, SunPosition, WeatherOverrides};

/// Cloud layer altitude (meters)
pub const CLOUD_HEIGHT_M: f32 = 60.0;
/// Cloud layer edge length (meters)
pub const CLOUD_SIZE_M: f32 = 1000.0;
/// Distance over which clouds fade out (meters)
pub const CLOUD_FADE_M: f32 = 500.0;
/// Cloud grey level lost per unit of rain state
pub const RAIN_DARKENING: f32 = 0.25;
/// Extra cloud opacity per unit of rain state
pub const RAIN_THICKENING: f32 = 0.5;

/// Scene units per kilometre of real distance to the coast
pub const COAST_SCALE: f32 = 0.03;
/// Coastlines farther than this (scene units) are not drawn
pub const COAST_MAX_DISTANCE: f32 = 450.0;

/// Light position on the sky sphere for a renormalized sun position
pub fn sun_vector(sun: &SunPosition) -> Vec3 {
    let theta = PI * (sun.inclination - 0.5);
    let phi = 2.0 * PI * (sun.azimuth - 0.5);
    Vec3::new(phi.cos(), theta.sin(), phi.sin()).normalize_or_zero() * 10.0
}

/// Light intensities derived from the sun's elevation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneLights {
    /// Sun position (length 10), as the sky shader expects it
    pub sun_vector: Vec3,
    /// Unit direction towards the sun
    pub sun_direction: Vec3,
    pub point_intensity: f32,
    /// Warm directional light, brightest near the horizon
    pub directional_intensity: f32,
    pub ambient_intensity: f32,
}

impl SceneLights {
    pub fn from_sun(sun: &SunPosition) -> Self {
        let v = sun_vector(sun);
        let elevation = sun.inclination - 0.5;
        Self {
            sun_vector: v,
            sun_direction: v.normalize_or_zero(),
            point_intensity: (elevation * 10.0).max(0.0),
            directional_intensity: (1.0 - elevation * 8.0).max(0.0),
            ambient_intensity: (sun.inclination - 0.2).max(0.0),
        }
    }
}

/// Coastline decal placement relative to the boat at the origin
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoastlinePlacement {
    pub position: Vec3,
    /// Scene-space distance from the boat
    pub distance: f32,
    pub bearing_rad: f32,
    /// Decal width and height (meters)
    pub scale: Vec2,
    pub visible: bool,
}

impl CoastlinePlacement {
    pub fn compute(boat: &GeoPoint, city: &CityEntry, coastline_visible: bool) -> Self {
        let city_point = GeoPoint::new(city.longitude, city.latitude);
        let distance = (boat.distance_km(&city_point) as f32) * COAST_SCALE;
        let bearing = boat.bearing_to(&city_point) as f32;

        Self {
            position: Vec3::new(distance * bearing.sin(), 0.0, distance * bearing.cos()),
            distance,
            bearing_rad: bearing,
            scale: Vec2::from_array(city.scale),
            visible: coastline_visible && distance < COAST_MAX_DISTANCE,
        }
    }

    /// Quad transform: unit quad scaled to the decal, turned to face the origin
    pub fn model_matrix(&self) -> Mat4 {
        let yaw = (-self.position.x).atan2(-self.position.z);
        Mat4::from_scale_rotation_translation(
            Vec3::new(self.scale.x, self.scale.y, 1.0),
            Quat::from_rotation_y(yaw),
            self.position,
        )
    }
}

/// Texture offset of the cloud layer after `time` seconds
pub fn cloud_offset(wind_direction: Vec2, time: f32, wind_speed: f32) -> Vec2 {
    wind_direction * time * 0.1 * wind_speed
}

/// Cloud layer state for one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CloudPlacement {
    /// Texture offset, see [`cloud_offset`]
    pub offset: Vec2,
    /// Alpha multiplier: cloud cover, thickened by rain
    pub cover: f32,
    /// Grey level of the layer, 1.0 when dry
    pub tint: f32,
    pub height_m: f32,
    pub size_m: f32,
    pub fade_distance_m: f32,
}

impl CloudPlacement {
    pub fn new(wind_direction: Vec2, time: f32, wind_speed: f32, cover: f32, rain: f32) -> Self {
        let rain = rain.clamp(0.0, 2.0);
        Self {
            offset: cloud_offset(wind_direction, time, wind_speed),
            cover: cover * (1.0 + RAIN_THICKENING * rain),
            tint: 1.0 - RAIN_DARKENING * rain,
            height_m: CLOUD_HEIGHT_M,
            size_m: CLOUD_SIZE_M,
            fade_distance_m: CLOUD_FADE_M,
        }
    }
}

/// Everything the renderer needs for one frame
#[derive(Debug, Clone)]
pub struct FrameInputs {
    pub camera: Camera,
    /// World transform of the sea surface (its local XZ plane is the mirror)
    pub water_transform: Mat4,
    pub time: f32,
    pub weather: SceneWeatherState,
    pub waves: WaveSet,
    pub displacement: DisplacementInputs,
    pub lights: SceneLights,
    pub sky: SkyParams,
    pub coastline: CoastlinePlacement,
    pub clouds: CloudPlacement,
    pub boat: BoatPose,
    pub grounding: BoatGrounding,
}

pub struct Scene {
    table: SceneTable,
    weather: SceneWeatherState,
    overrides: WeatherOverrides,
    waves: WaveSet,
    boat: BoatPose,
    route: Option<RoutePlayback>,
    clock: WaveClock,
    camera: CameraSystem,
    render_config: RenderConfig,
}

impl Scene {
    pub fn new(
        table: SceneTable,
        weather: SceneWeatherState,
        render_config: RenderConfig,
        preset: CameraPreset,
    ) -> Result<Self, OceanError> {
        let weather = weather.clamped();
        let waves = WaveSet::lookup(&table, weather.sea_state)?;
        Ok(Self {
            table,
            weather,
            overrides: WeatherOverrides::default(),
            waves,
            boat: BoatPose::default(),
            route: None,
            clock: WaveClock::new(),
            camera: CameraSystem::new(preset),
            render_config,
        })
    }

    /// Replace the weather wholesale; active overrides are re-applied
    pub fn set_weather(&mut self, weather: SceneWeatherState) -> Result<(), OceanError> {
        let weather = self.overrides.apply(weather);
        let waves = WaveSet::lookup(&self.table, weather.sea_state)?;
        if waves.sea_state != self.waves.sea_state {
            log::info!(
                "Sea state {} -> {}",
                self.waves.sea_state.name(),
                waves.sea_state.name()
            );
        }
        self.weather = weather;
        self.waves = waves;
        Ok(())
    }

    /// Debug overrides substituted straight into the weather state
    pub fn set_overrides(&mut self, overrides: WeatherOverrides) -> Result<(), OceanError> {
        self.overrides = overrides;
        let weather = self.weather.clone();
        self.set_weather(weather)
    }

    pub fn set_route(&mut self, route: RoutePlayback) {
        self.route = Some(route);
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.render_config.window_width = width;
        self.render_config.window_height = height;
    }

    pub fn rotate_camera(&mut self, dx_px: f32, dy_px: f32) {
        self.camera.rotate(dx_px, dy_px);
    }

    pub fn zoom_camera(&mut self, lines: f32) {
        self.camera.zoom(lines);
    }

    pub fn steer_boat(&mut self, delta_rad: f32) {
        self.boat.steer(delta_rad);
    }

    pub fn boat_mut(&mut self) -> &mut BoatPose {
        &mut self.boat
    }

    pub fn boat(&self) -> &BoatPose {
        &self.boat
    }

    pub fn weather(&self) -> &SceneWeatherState {
        &self.weather
    }

    pub fn waves(&self) -> &WaveSet {
        &self.waves
    }

    pub fn table(&self) -> &SceneTable {
        &self.table
    }

    pub fn render_config(&self) -> &RenderConfig {
        &self.render_config
    }

    pub fn elapsed(&self) -> f32 {
        self.clock.elapsed()
    }

    /// Advance the clock once and assemble this frame's inputs
    pub fn advance(&mut self, dt_s: f32) -> Result<FrameInputs, OceanError> {
        let time = self.clock.advance(dt_s);

        let waypoint_weather = match self.route.as_mut() {
            Some(route) => route
                .advance(dt_s, &mut self.boat)
                .and_then(|w| w.weather.clone()),
            None => None,
        };
        if let Some(weather) = waypoint_weather {
            self.set_weather(weather)?;
        }

        self.frame_inputs(time)
    }

    fn frame_inputs(&self, time: f32) -> Result<FrameInputs, OceanError> {
        let displacement = self
            .boat
            .displacement_inputs(time, self.weather.wind_direction);
        let grounding = ground_boat(&self.boat, &self.waves.waves, &displacement);
        let city = self.table.city(self.weather.city)?;

        Ok(FrameInputs {
            camera: self.camera.camera(&self.render_config),
            water_transform: Mat4::IDENTITY,
            time,
            weather: self.weather.clone(),
            waves: self.waves,
            displacement,
            lights: SceneLights::from_sun(&self.weather.sun_position),
            sky: *self.table.sky(self.weather.sky_state)?,
            coastline: CoastlinePlacement::compute(
                &self.boat.position,
                city,
                self.weather.coastline_visible,
            ),
            clouds: CloudPlacement::new(
                self.weather.wind_direction,
                time,
                self.waves.wind_speed,
                self.weather.cloud_cover,
                self.weather.rain_state,
            ),
            boat: self.boat.clone(),
            grounding,
        })
    }
}
