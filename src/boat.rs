//! Boat pose, surface grounding and scripted route playback.
//!
//! The renderer never owns the geographic position. It reads the pose for
//! one frame and hands back where the hull should sit on the displaced
//! surface.

use std::path::Path;

use glam::{Quat, Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::OceanError;
use crate::ocean::{displace, DisplacementInputs, Wave};
use crate::weather::SceneWeatherState;

/// Mean Earth radius (km)
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Seconds between waypoint steps during route playback
pub const ROUTE_STEP_S: f32 = 2.0;

/// Geographic coordinate in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub longitude: f64,
    pub latitude: f64,
}

impl GeoPoint {
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }

    /// Initial great-circle bearing towards `other` (radians, clockwise from north)
    pub fn bearing_to(&self, other: &GeoPoint) -> f64 {
        let phi1 = self.latitude.to_radians();
        let phi2 = other.latitude.to_radians();
        let d_lambda = (other.longitude - self.longitude).to_radians();

        let y = d_lambda.sin() * phi2.cos();
        let x = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * d_lambda.cos();
        y.atan2(x)
    }

    /// Equirectangular distance approximation (km)
    pub fn distance_km(&self, other: &GeoPoint) -> f64 {
        let phi1 = self.latitude.to_radians();
        let phi2 = other.latitude.to_radians();
        let x = (other.longitude - self.longitude).to_radians() * ((phi1 + phi2) / 2.0).cos();
        let y = phi2 - phi1;
        (x * x + y * y).sqrt() * EARTH_RADIUS_KM
    }
}

/// Boat state as the simulation writes it once per tick
#[derive(Debug, Clone, PartialEq)]
pub struct BoatPose {
    pub position: GeoPoint,
    pub heading_rad: f32,
    /// Dimensionless, scales the wave phase speed
    pub speed: f32,
    /// Trail texture footprint (meters)
    pub hull_scale: Vec2,
    pub hull_length: f32,
    pub next_waypoint: Option<GeoPoint>,
}

impl Default for BoatPose {
    fn default() -> Self {
        Self {
            position: GeoPoint::new(2.46, 41.3),
            heading_rad: std::f32::consts::FRAC_PI_2,
            speed: 1.5,
            hull_scale: Vec2::new(12.0, 20.0),
            hull_length: 0.5,
            next_waypoint: Some(GeoPoint::new(2.77, 41.49)),
        }
    }
}

impl BoatPose {
    /// Heading as the surface shaders consume it. The small bias keeps the
    /// vector away from zero at every heading.
    pub fn direction(&self) -> Vec2 {
        Vec2::new(-self.heading_rad.sin() + 0.01, self.heading_rad.cos() + 0.01)
    }

    /// Turn by `delta_rad`, wrapped to [0, 2π)
    pub fn steer(&mut self, delta_rad: f32) {
        self.heading_rad = (self.heading_rad + delta_rad).rem_euclid(std::f32::consts::TAU);
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.speed = if speed.is_finite() { speed.max(0.0) } else { 0.0 };
    }

    /// Inputs for one frame of displacement. Both the host sampler and the
    /// GPU uniforms are filled from this value.
    pub fn displacement_inputs(&self, time: f32, wind_direction: Vec2) -> DisplacementInputs {
        DisplacementInputs {
            time,
            wind_direction,
            boat_direction: self.direction(),
            boat_speed: self.speed,
        }
    }
}

/// Where the hull sits on the displaced surface this frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoatGrounding {
    /// Vertical offset of the surface under the boat (meters)
    pub height: f32,
    /// Horizontal drift of the surface point (meters, x/z)
    pub drift: Vec2,
    pub normal: Vec3,
    /// Surface tilt composed with the heading
    pub orientation: Quat,
}

/// Sample the surface at the boat, which always sits at the scene origin
pub fn ground_boat(pose: &BoatPose, waves: &[Wave], inputs: &DisplacementInputs) -> BoatGrounding {
    let d = displace(Vec2::ZERO, waves, inputs);
    let tilt = Quat::from_rotation_arc(Vec3::Y, d.normal);

    BoatGrounding {
        height: d.vertical_offset(),
        drift: d.horizontal_offset(),
        normal: d.normal,
        orientation: tilt * Quat::from_rotation_y(pose.heading_rad),
    }
}

/// One step of a scripted route, optionally carrying the weather there
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub longitude: f64,
    pub latitude: f64,
    #[serde(default)]
    pub weather: Option<SceneWeatherState>,
}

impl Waypoint {
    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.longitude, self.latitude)
    }
}

/// Scripted playback: one waypoint every [`ROUTE_STEP_S`] seconds
#[derive(Debug, Clone)]
pub struct RoutePlayback {
    waypoints: Vec<Waypoint>,
    next_index: usize,
    since_step_s: f32,
}

impl RoutePlayback {
    pub fn new(waypoints: Vec<Waypoint>) -> Result<Self, OceanError> {
        if waypoints.is_empty() {
            return Err(OceanError::Config("route has no waypoints".to_string()));
        }
        Ok(Self {
            waypoints,
            next_index: 0,
            since_step_s: ROUTE_STEP_S,
        })
    }

    pub fn from_json(json: &str) -> Result<Self, OceanError> {
        let waypoints: Vec<Waypoint> = serde_json::from_str(json)?;
        Self::new(waypoints)
    }

    pub fn load(path: &Path) -> Result<Self, OceanError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| OceanError::Config(format!("{}: {}", path.display(), e)))?;
        let route = Self::from_json(&json)?;
        log::info!(
            "Loaded route with {} waypoints from {}",
            route.waypoints.len(),
            path.display()
        );
        Ok(route)
    }

    pub fn is_finished(&self) -> bool {
        self.next_index >= self.waypoints.len()
    }

    /// Index of the waypoint the pose was last set to
    pub fn current_index(&self) -> Option<usize> {
        self.next_index.checked_sub(1)
    }

    /// Advance playback by `dt_s`. When a step is due the pose is moved to
    /// the waypoint and the waypoint is returned. The first waypoint is
    /// applied on the first call.
    pub fn advance(&mut self, dt_s: f32, pose: &mut BoatPose) -> Option<&Waypoint> {
        if self.is_finished() {
            return None;
        }
        if dt_s.is_finite() && dt_s > 0.0 {
            self.since_step_s += dt_s;
        }
        if self.since_step_s < ROUTE_STEP_S {
            return None;
        }
        self.since_step_s = 0.0;

        let index = self.next_index;
        self.next_index += 1;

        let here = self.waypoints[index].point();
        let next = match self.waypoints.get(index + 1) {
            Some(w) => w.point(),
            None => GeoPoint::new(here.longitude + 0.01, here.latitude + 0.01),
        };

        pose.position = here;
        pose.next_waypoint = Some(next);
        pose.heading_rad = here.bearing_to(&next) as f32;
        log::debug!(
            "Route step {}/{}: ({:.4}, {:.4}) heading {:.3} rad",
            index + 1,
            self.waypoints.len(),
            here.longitude,
            here.latitude,
            pose.heading_rad
        );

        self.waypoints.get(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocean::WaveDescriptor;

    fn route() -> RoutePlayback {
        RoutePlayback::from_json(
            r#"[
                {"longitude": 2.46, "latitude": 41.30},
                {"longitude": 2.46, "latitude": 41.40},
                {"longitude": 2.56, "latitude": 41.40}
            ]"#,
        )
        .unwrap()
    }

    #[test]
    fn test_default_direction_points_west() {
        let d = BoatPose::default().direction();
        assert!((d - Vec2::new(-0.99, 0.01)).length() < 1e-6);
    }

    #[test]
    fn test_bearing_cardinal_directions() {
        let origin = GeoPoint::new(0.0, 0.0);
        assert!(origin.bearing_to(&GeoPoint::new(0.0, 1.0)).abs() < 1e-9);
        let east = origin.bearing_to(&GeoPoint::new(1.0, 0.0));
        assert!((east - std::f64::consts::FRAC_PI_2).abs() < 1e-9);
    }

    #[test]
    fn test_distance_one_degree_of_latitude() {
        let a = GeoPoint::new(2.0, 41.0);
        let b = GeoPoint::new(2.0, 42.0);
        let expected = EARTH_RADIUS_KM * 1f64.to_radians();
        assert!((a.distance_km(&b) - expected).abs() < 1e-6);
    }

    #[test]
    fn test_steer_wraps_heading() {
        let mut pose = BoatPose::default();
        pose.steer(std::f32::consts::TAU);
        assert!((pose.heading_rad - std::f32::consts::FRAC_PI_2).abs() < 1e-5);
        pose.steer(-std::f32::consts::PI);
        assert!(pose.heading_rad >= 0.0);
    }

    #[test]
    fn test_flat_sea_grounding_is_upright() {
        let pose = BoatPose::default();
        let inputs = pose.displacement_inputs(1.0, Vec2::X);
        let g = ground_boat(&pose, &[], &inputs);
        assert_eq!(g.height, 0.0);
        assert_eq!(g.normal, Vec3::Y);
        let forward = g.orientation * Vec3::Z;
        assert!(forward.y.abs() < 1e-6);
    }

    #[test]
    fn test_grounding_matches_displacement_at_origin() {
        let pose = BoatPose::default();
        let waves = [WaveDescriptor {
            wavelength_m: 40.0,
            steepness: 0.2,
            direction_deg: 30.0,
        }
        .derive()];
        let inputs = pose.displacement_inputs(4.2, Vec2::Y);
        let g = ground_boat(&pose, &waves, &inputs);
        let d = displace(Vec2::ZERO, &waves, &inputs);
        assert_eq!(g.height, d.offset.y);
        assert_eq!(g.normal, d.normal);
        assert!(((g.orientation * Vec3::Y) - d.normal).length() < 1e-5);
    }

    #[test]
    fn test_route_steps_every_two_seconds() {
        let mut route = route();
        let mut pose = BoatPose::default();

        assert!(route.advance(0.016, &mut pose).is_some());
        assert_eq!(route.current_index(), Some(0));
        // heading north towards the second waypoint
        assert!(pose.heading_rad.abs() < 1e-4);

        assert!(route.advance(1.0, &mut pose).is_none());
        assert!(route.advance(1.0, &mut pose).is_some());
        assert_eq!(pose.position, GeoPoint::new(2.46, 41.40));
        assert!(pose.heading_rad > 1.0 && pose.heading_rad < 2.0);

        assert!(route.advance(2.0, &mut pose).is_some());
        let next = pose.next_waypoint.unwrap();
        assert!((next.longitude - 2.57).abs() < 1e-9);
        assert!((next.latitude - 41.41).abs() < 1e-9);
        assert!(route.is_finished());
        assert!(route.advance(5.0, &mut pose).is_none());
    }

    #[test]
    fn test_empty_route_is_rejected() {
        assert!(matches!(
            RoutePlayback::from_json("[]"),
            Err(OceanError::Config(_))
        ));
    }
}
