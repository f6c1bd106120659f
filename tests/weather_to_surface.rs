//! A weather reading flows through the mapper, the wave table and the
//! displacement function into the boat grounding.

use std::f32::consts::PI;
use std::time::{Duration, UNIX_EPOCH};

use glam::Vec2;

use searebbel::boat::ground_boat;
use searebbel::config::SceneTable;
use searebbel::ocean::{displace, WaveSet, GRAVITY};
use searebbel::params::{CameraPreset, RenderConfig};
use searebbel::scene::Scene;
use searebbel::weather::{SeaState, WeatherOverrides, WeatherSignal};

fn strong_breeze_signal() -> WeatherSignal {
    WeatherSignal {
        wind_speed_ms: 12.0,
        wind_direction_deg: 90.0,
        cloud_pct: 50.0,
        rain_mm_1h: None,
        visibility_m: 8000.0,
        // 2024-06-21 12:00 UTC
        timestamp: UNIX_EPOCH + Duration::from_secs(1_718_971_200),
        latitude: 41.3,
        longitude: 2.46,
    }
}

#[test]
fn test_strong_breeze_scenario() {
    let state = strong_breeze_signal().to_scene_state();

    assert_eq!(state.sea_state, SeaState::StrongBreeze);
    assert!((state.wind_direction - Vec2::new(0.0, 1.0)).length() < 1e-5);
    assert!((state.fog_factor - 1.4).abs() < 1e-5);
    assert_eq!(state.cloud_cover, 2.0);
    assert_eq!(state.rain_state, 0.0);
}

#[test]
fn test_every_sea_state_yields_three_valid_waves() {
    let table = SceneTable::builtin().unwrap();
    for sea_state in SeaState::ALL {
        let set = WaveSet::lookup(&table, sea_state).unwrap();
        assert_eq!(set.waves.len(), 3);
        for (descriptor, wave) in set.descriptors.iter().zip(set.waves.iter()) {
            assert!(descriptor.wavelength_m > 0.0);
            assert!(descriptor.steepness > 0.0 && descriptor.steepness < 1.0);

            let k = 2.0 * PI / descriptor.wavelength_m;
            assert!((wave.k - k).abs() < 1e-6);
            assert!((wave.amplitude - descriptor.steepness / k).abs() < 1e-5);
            assert!((wave.speed - (GRAVITY / k).sqrt()).abs() < 1e-5);
        }
    }
}

#[test]
fn test_mapped_state_drives_grounding() {
    let table = SceneTable::builtin().unwrap();
    let state = strong_breeze_signal().to_scene_state();
    let mut scene = Scene::new(table, state, RenderConfig::default(), CameraPreset::default()).unwrap();

    let frame = scene.advance(1.5).unwrap();
    assert_eq!(frame.waves.sea_state, SeaState::StrongBreeze);
    assert_eq!(frame.displacement.time, 1.5);

    // the grounding is exactly the displacement at the origin
    let d = displace(Vec2::ZERO, &frame.waves.waves, &frame.displacement);
    assert_eq!(frame.grounding.height, d.offset.y);
    assert_eq!(frame.grounding.normal, d.normal);

    // and recomputing it is side-effect free
    let again = ground_boat(&frame.boat, &frame.waves.waves, &frame.displacement);
    assert_eq!(again, frame.grounding);

    // summed amplitudes bound the surface height
    let bound: f32 = frame.waves.waves.iter().map(|w| w.amplitude).sum();
    assert!(frame.grounding.height.abs() <= bound + 1e-4);
}

#[test]
fn test_overrides_bypass_the_mapper() {
    let table = SceneTable::builtin().unwrap();
    let state = strong_breeze_signal().to_scene_state();
    let mut scene = Scene::new(table, state, RenderConfig::default(), CameraPreset::default()).unwrap();

    scene
        .set_overrides(WeatherOverrides {
            sea_state: Some(SeaState::Calm),
            fog_factor: Some(9.0),
            ..Default::default()
        })
        .unwrap();

    assert_eq!(scene.waves().sea_state, SeaState::Calm);
    // re-clamped to the documented range
    assert_eq!(scene.weather().fog_factor, 4.0);
    // untouched fields keep the mapped values
    assert_eq!(scene.weather().cloud_cover, 2.0);
}

#[test]
fn test_displacement_is_pure() {
    let table = SceneTable::builtin().unwrap();
    let set = WaveSet::lookup(&table, SeaState::Gale).unwrap();
    let mut scene = Scene::new(
        SceneTable::builtin().unwrap(),
        table.fallback_state(),
        RenderConfig::default(),
        CameraPreset::default(),
    )
    .unwrap();
    let inputs = scene.advance(7.25).unwrap().displacement;

    for p in [Vec2::ZERO, Vec2::new(13.0, -4.5), Vec2::new(-120.0, 80.0)] {
        assert_eq!(displace(p, &set.waves, &inputs), displace(p, &set.waves, &inputs));
    }
}
