//! Surface, cloud and coastline textures: loaded from a directory when one
//! is given, otherwise generated procedurally from noise.

use std::f64::consts::TAU;
use std::path::Path;

use image::{Rgba, RgbaImage};
use noise::{NoiseFn, Perlin};

use crate::error::OceanError;
use crate::weather::City;

/// Edge length of the generated square textures (pixels)
pub const TEXTURE_SIZE: u32 = 256;

const NOISE_SEED: u32 = 42;

/// Which texture a file or generator provides
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureKind {
    NormalMap,
    Foam,
    Perlin,
    Trail,
    Coastline(City),
}

impl TextureKind {
    /// File name looked up in the texture directory
    pub fn file_name(self) -> String {
        match self {
            TextureKind::NormalMap => "waternormals.jpg".to_string(),
            TextureKind::Foam => "foam.jpg".to_string(),
            TextureKind::Perlin => "perlin.png".to_string(),
            TextureKind::Trail => "trail.png".to_string(),
            TextureKind::Coastline(city) => format!("coast_{}.png", city.name().to_lowercase()),
        }
    }

    pub fn generate(self) -> RgbaImage {
        match self {
            TextureKind::NormalMap => normal_map(TEXTURE_SIZE, NOISE_SEED),
            TextureKind::Foam => foam(TEXTURE_SIZE, NOISE_SEED + 1),
            TextureKind::Perlin => perlin(TEXTURE_SIZE, NOISE_SEED + 2),
            TextureKind::Trail => trail(TEXTURE_SIZE),
            TextureKind::Coastline(city) => coastline(TEXTURE_SIZE * 4, TEXTURE_SIZE / 2, city as u32 + 7),
        }
    }
}

/// Load `kind` from `dir`, or generate it when no directory is given.
/// A directory that lacks the file is an error.
pub fn load_or_generate(dir: Option<&Path>, kind: TextureKind) -> Result<RgbaImage, OceanError> {
    let Some(dir) = dir else {
        return Ok(kind.generate());
    };
    let path = dir.join(kind.file_name());
    let image = image::open(&path).map_err(|e| OceanError::Texture {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    log::debug!("Loaded texture {}", path.display());
    Ok(image.to_rgba8())
}

/// Perlin noise that wraps seamlessly in both directions, roughly [-1, 1]
fn tileable(perlin: &Perlin, u: f64, v: f64, frequency: f64) -> f64 {
    let r = frequency / TAU;
    let (su, cu) = (u * TAU).sin_cos();
    let (sv, cv) = (v * TAU).sin_cos();
    perlin.get([cu * r, su * r, cv * r, sv * r])
}

fn fbm(perlin: &Perlin, u: f64, v: f64, base_frequency: f64, octaves: u32) -> f64 {
    let mut sum = 0.0;
    let mut amplitude = 0.5;
    let mut frequency = base_frequency;
    for _ in 0..octaves {
        sum += amplitude * tileable(perlin, u, v, frequency);
        amplitude *= 0.5;
        frequency *= 2.0;
    }
    sum
}

fn heightfield(size: u32, seed: u32, base_frequency: f64, octaves: u32) -> Vec<f64> {
    let perlin = Perlin::new(seed);
    let mut heights = Vec::with_capacity((size * size) as usize);
    for y in 0..size {
        for x in 0..size {
            let u = x as f64 / size as f64;
            let v = y as f64 / size as f64;
            heights.push(fbm(&perlin, u, v, base_frequency, octaves));
        }
    }
    heights
}

fn to_byte(value: f64) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Tangent-space normal map, blue is up
pub fn normal_map(size: u32, seed: u32) -> RgbaImage {
    let size = size.max(2);
    let heights = heightfield(size, seed, 8.0, 5);
    let at = |x: i64, y: i64| {
        let n = size as i64;
        heights[(y.rem_euclid(n) * n + x.rem_euclid(n)) as usize]
    };

    let strength = 2.5;
    RgbaImage::from_fn(size, size, |x, y| {
        let (x, y) = (x as i64, y as i64);
        let dx = (at(x + 1, y) - at(x - 1, y)) * strength;
        let dy = (at(x, y + 1) - at(x, y - 1)) * strength;
        let len = (dx * dx + dy * dy + 1.0).sqrt();
        let n = [-dx / len, -dy / len, 1.0 / len];
        Rgba([
            to_byte(n[0] * 0.5 + 0.5),
            to_byte(n[1] * 0.5 + 0.5),
            to_byte(n[2] * 0.5 + 0.5),
            255,
        ])
    })
}

/// Cellular-looking foam: thresholded high-frequency noise
pub fn foam(size: u32, seed: u32) -> RgbaImage {
    let size = size.max(1);
    let heights = heightfield(size, seed, 16.0, 3);
    RgbaImage::from_fn(size, size, |x, y| {
        let h = heights[(y * size + x) as usize];
        let v = to_byte(((h + 0.15) * 3.0).clamp(0.0, 1.0));
        Rgba([v, v, v, 255])
    })
}

/// Smooth grayscale noise in [0, 1]
pub fn perlin(size: u32, seed: u32) -> RgbaImage {
    let size = size.max(1);
    let heights = heightfield(size, seed, 4.0, 4);
    RgbaImage::from_fn(size, size, |x, y| {
        let v = to_byte(heights[(y * size + x) as usize] + 0.5);
        Rgba([v, v, v, 255])
    })
}

/// V-shaped wake behind a hull at v = 0.9, opening towards v = 0
pub fn trail(size: u32) -> RgbaImage {
    let size = size.max(1);
    let stern = 0.9;
    RgbaImage::from_fn(size, size, |x, y| {
        let u = (x as f64 + 0.5) / size as f64;
        let v = (y as f64 + 0.5) / size as f64;
        if v >= stern {
            return Rgba([0, 0, 0, 255]);
        }
        let behind = stern - v;
        let fade = 1.0 - behind / stern;
        let arm = (u - 0.5).abs() - behind * 0.35;
        let wake = (-(arm / 0.03).powi(2)).exp();
        let wash = (-((u - 0.5) / (0.02 + behind * 0.1)).powi(2)).exp() * 0.6;
        let value = to_byte((wake + wash).min(1.0) * fade);
        Rgba([value, value, value, 255])
    })
}

/// Land silhouette along the bottom edge, transparent sky above
pub fn coastline(width: u32, height: u32, seed: u32) -> RgbaImage {
    let (width, height) = (width.max(1), height.max(1));
    let perlin = Perlin::new(seed);
    RgbaImage::from_fn(width, height, |x, y| {
        let u = x as f64 / width as f64;
        // distance from the bottom edge, 0 at the water line
        let up = 1.0 - (y as f64 + 0.5) / height as f64;
        let ridge = 0.35 + 0.25 * fbm(&perlin, u, 0.0, 6.0, 4);
        if up > ridge {
            return Rgba([0, 0, 0, 0]);
        }
        let shade = 0.25 + 0.2 * (up / ridge.max(1e-3));
        let c = to_byte(shade);
        Rgba([c, to_byte(shade * 1.1), to_byte(shade * 1.2), 255])
    })
}

/// Upload an RGBA image as a sampled 2D texture
pub fn upload(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    image: &RgbaImage,
    label: &str,
) -> (wgpu::Texture, wgpu::TextureView) {
    let (width, height) = image.dimensions();
    let size = wgpu::Extent3d {
        width,
        height,
        depth_or_array_layers: 1,
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8Unorm,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });

    queue.write_texture(
        wgpu::ImageCopyTexture {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        image.as_raw(),
        wgpu::ImageDataLayout {
            offset: 0,
            bytes_per_row: Some(4 * width),
            rows_per_image: Some(height),
        },
        size,
    );

    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    (texture, view)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normal_map_points_up_on_average() {
        let img = normal_map(128, 1);
        let n = 128.0 * 128.0;
        let mean_blue: f64 = img.pixels().map(|p| p.0[2] as f64).sum::<f64>() / n;
        let mean_red: f64 = img.pixels().map(|p| p.0[0] as f64).sum::<f64>() / n;
        assert!(mean_blue > 200.0);
        assert!((mean_red - 128.0).abs() < 30.0);
    }

    #[test]
    fn test_tileable_noise_wraps() {
        let perlin = Perlin::new(3);
        let a = tileable(&perlin, 0.0, 0.3, 4.0);
        let b = tileable(&perlin, 1.0, 0.3, 4.0);
        assert!((a - b).abs() < 1e-9);
    }

    #[test]
    fn test_trail_is_dark_ahead_of_the_stern() {
        let img = trail(64);
        // ahead of the stern
        assert_eq!(img.get_pixel(32, 62).0[0], 0);
        // centre line just behind the hull
        assert!(img.get_pixel(32, 55).0[0] > 100);
        // symmetric about the centre line
        assert_eq!(img.get_pixel(20, 30).0[0], img.get_pixel(43, 30).0[0]);
    }

    #[test]
    fn test_coastline_has_sky_and_land() {
        let img = coastline(128, 32, 9);
        assert!(img.pixels().any(|p| p.0[3] == 0));
        // the bottom row is land everywhere
        assert!((0..128).all(|x| img.get_pixel(x, 31).0[3] == 255));
    }

    #[test]
    fn test_missing_texture_file_is_reported() {
        let dir = std::env::temp_dir().join("searebbel-no-textures-here");
        let err = load_or_generate(Some(&dir), TextureKind::Foam).unwrap_err();
        assert!(matches!(err, OceanError::Texture { .. }));
    }

    #[test]
    fn test_generated_sizes() {
        assert_eq!(TextureKind::Perlin.generate().dimensions(), (TEXTURE_SIZE, TEXTURE_SIZE));
        assert_eq!(
            TextureKind::Coastline(City::Barcelona).file_name(),
            "coast_barcelona.png"
        );
    }
}
