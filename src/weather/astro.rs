//! Sun and moon ephemeris for the sky and lighting model.
//!
//! Low-precision analytic formulas (accurate to a fraction of a degree), the
//! same family used by common web mapping libraries. All instants are
//! milliseconds since the Unix epoch, all angles are radians.
//!
//! Azimuth convention: measured from south, positive towards west.

use std::f64::consts::PI;

const RAD: f64 = PI / 180.0;
const DAY_MS: f64 = 86_400_000.0;
const J1970: f64 = 2_440_588.0;
const J2000: f64 = 2_451_545.0;
/// Obliquity of the Earth
const OBLIQUITY: f64 = RAD * 23.4397;
const J0: f64 = 0.0009;

/// Horizontal position of a body
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HorizontalPosition {
    pub azimuth: f64,
    pub altitude: f64,
}

/// Solar event instants for one day (ms since epoch).
///
/// Events that do not happen on that day (polar day/night) are NaN.
#[derive(Debug, Clone, Copy)]
pub struct SolarTimes {
    pub night_end: f64,
    pub dawn: f64,
    pub sunrise: f64,
    pub sunrise_end: f64,
    pub golden_hour_end: f64,
    pub solar_noon: f64,
    pub golden_hour: f64,
    pub sunset_start: f64,
    pub sunset: f64,
    pub dusk: f64,
    pub night: f64,
}

fn to_julian(ms: f64) -> f64 {
    ms / DAY_MS - 0.5 + J1970
}

fn from_julian(j: f64) -> f64 {
    (j + 0.5 - J1970) * DAY_MS
}

fn to_days(ms: f64) -> f64 {
    to_julian(ms) - J2000
}

fn right_ascension(l: f64, b: f64) -> f64 {
    (l.sin() * OBLIQUITY.cos() - b.tan() * OBLIQUITY.sin()).atan2(l.cos())
}

fn declination(l: f64, b: f64) -> f64 {
    (b.sin() * OBLIQUITY.cos() + b.cos() * OBLIQUITY.sin() * l.sin()).asin()
}

fn azimuth(h: f64, phi: f64, dec: f64) -> f64 {
    h.sin().atan2(h.cos() * phi.sin() - dec.tan() * phi.cos())
}

fn altitude(h: f64, phi: f64, dec: f64) -> f64 {
    (phi.sin() * dec.sin() + phi.cos() * dec.cos() * h.cos()).asin()
}

fn sidereal_time(d: f64, lw: f64) -> f64 {
    RAD * (280.16 + 360.985_623_5 * d) - lw
}

fn astro_refraction(h: f64) -> f64 {
    // formula breaks down below the horizon
    let h = h.max(0.0);
    0.000_296_7 / (h + 0.003_125_36 / (h + 0.089_011_79)).tan()
}

fn solar_mean_anomaly(d: f64) -> f64 {
    RAD * (357.5291 + 0.985_600_28 * d)
}

fn ecliptic_longitude(m: f64) -> f64 {
    let center = RAD * (1.9148 * m.sin() + 0.02 * (2.0 * m).sin() + 0.0003 * (3.0 * m).sin());
    let perihelion = RAD * 102.9372;
    m + center + perihelion + PI
}

/// (declination, right ascension)
fn sun_coords(d: f64) -> (f64, f64) {
    let l = ecliptic_longitude(solar_mean_anomaly(d));
    (declination(l, 0.0), right_ascension(l, 0.0))
}

/// Sun position at `ms` for an observer at `lat`/`lng` (degrees)
pub fn sun_position(ms: f64, lat: f64, lng: f64) -> HorizontalPosition {
    let lw = RAD * -lng;
    let phi = RAD * lat;
    let d = to_days(ms);
    let (dec, ra) = sun_coords(d);
    let h = sidereal_time(d, lw) - ra;

    HorizontalPosition {
        azimuth: azimuth(h, phi, dec),
        altitude: altitude(h, phi, dec),
    }
}

fn julian_cycle(d: f64, lw: f64) -> f64 {
    (d - J0 - lw / (2.0 * PI)).round()
}

fn approx_transit(ht: f64, lw: f64, n: f64) -> f64 {
    J0 + (ht + lw) / (2.0 * PI) + n
}

fn solar_transit_j(ds: f64, m: f64, l: f64) -> f64 {
    J2000 + ds + 0.0053 * m.sin() - 0.0069 * (2.0 * l).sin()
}

fn hour_angle(h: f64, phi: f64, dec: f64) -> f64 {
    ((h.sin() - phi.sin() * dec.sin()) / (phi.cos() * dec.cos())).acos()
}

/// Solar event instants for the day containing `ms`
pub fn solar_times(ms: f64, lat: f64, lng: f64) -> SolarTimes {
    let lw = RAD * -lng;
    let phi = RAD * lat;
    let d = to_days(ms);
    let n = julian_cycle(d, lw);
    let ds = approx_transit(0.0, lw, n);
    let m = solar_mean_anomaly(ds);
    let l = ecliptic_longitude(m);
    let dec = declination(l, 0.0);
    let j_noon = solar_transit_j(ds, m, l);

    // (rise, set) for a sun altitude in degrees
    let event = |angle_deg: f64| {
        let w = hour_angle(angle_deg * RAD, phi, dec);
        let j_set = solar_transit_j(approx_transit(w, lw, n), m, l);
        let j_rise = j_noon - (j_set - j_noon);
        (from_julian(j_rise), from_julian(j_set))
    };

    let (sunrise, sunset) = event(-0.833);
    let (sunrise_end, sunset_start) = event(-0.3);
    let (dawn, dusk) = event(-6.0);
    let (night_end, night) = event(-18.0);
    let (golden_hour_end, golden_hour) = event(6.0);

    SolarTimes {
        night_end,
        dawn,
        sunrise,
        sunrise_end,
        golden_hour_end,
        solar_noon: from_julian(j_noon),
        golden_hour,
        sunset_start,
        sunset,
        dusk,
        night,
    }
}

/// (right ascension, declination) of the moon
fn moon_coords(d: f64) -> (f64, f64) {
    let l = RAD * (218.316 + 13.176_396 * d);
    let m = RAD * (134.963 + 13.064_993 * d);
    let f = RAD * (93.272 + 13.229_350 * d);

    let lng = l + RAD * 6.289 * m.sin();
    let lat = RAD * 5.128 * f.sin();

    (right_ascension(lng, lat), declination(lng, lat))
}

/// Moon position at `ms`; altitude includes atmospheric refraction
pub fn moon_position(ms: f64, lat: f64, lng: f64) -> HorizontalPosition {
    let lw = RAD * -lng;
    let phi = RAD * lat;
    let d = to_days(ms);
    let (ra, dec) = moon_coords(d);
    let h = sidereal_time(d, lw) - ra;
    let alt = altitude(h, phi, dec);

    HorizontalPosition {
        azimuth: azimuth(h, phi, dec),
        altitude: alt + astro_refraction(alt),
    }
}
