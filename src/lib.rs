//! searebbel library - weather-driven ocean scene with Gerstner waves and
//! planar reflections

pub mod boat;
pub mod camera;
pub mod cli;
pub mod config;
pub mod error;
pub mod ocean;
pub mod params;
pub mod reflection;
pub mod rendering;
pub mod scene;
pub mod weather;

pub use error::OceanError;
