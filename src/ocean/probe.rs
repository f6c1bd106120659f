//! Runs `gerstner_displace` on the GPU at given positions and compares the
//! result with the host implementation.
//!
//! The boat is grounded with the host function while the surface is
//! displaced in the vertex stage, so the two must agree.

use glam::{Vec2, Vec3, Vec4Swizzles};
use wgpu::util::DeviceExt;

use super::gerstner::{displace, Displacement, DisplacementInputs};
use super::waves::WaveSet;
use crate::error::OceanError;
use crate::rendering::uniforms::{ProbeSample, ProbeUniforms};

/// Largest accepted CPU/GPU difference (meters for offsets, unit vectors
/// otherwise). GPU `sin`/`cos` may be off by about 2^-11 on some drivers.
pub const PROBE_TOLERANCE: f32 = 1e-3;

const WORKGROUP_SIZE: u32 = 64;

/// Outcome of a CPU/GPU comparison
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbeReport {
    pub samples: usize,
    pub max_offset_error: f32,
    pub max_normal_error: f32,
    pub tolerance: f32,
}

impl ProbeReport {
    pub fn passed(&self) -> bool {
        self.max_offset_error <= self.tolerance && self.max_normal_error <= self.tolerance
    }
}

/// Headless compute pipeline evaluating the WGSL displacement
pub struct DisplacementProbe {
    device: wgpu::Device,
    queue: wgpu::Queue,
    pipeline: wgpu::ComputePipeline,
    bind_group_layout: wgpu::BindGroupLayout,
}

impl DisplacementProbe {
    /// Acquire a device without a surface. Fails with `OceanError::Gpu`
    /// when no adapter is available.
    pub async fn new() -> Result<Self, OceanError> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| OceanError::Gpu("no adapter available for the probe".to_string()))?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Displacement Probe Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::downlevel_defaults(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await
            .map_err(|e| OceanError::Gpu(format!("failed to request device: {}", e)))?;

        Ok(Self::with_device(device, queue))
    }

    pub fn with_device(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        let source = super::with_gerstner(include_str!("../shaders/gerstner_probe.wgsl"));
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Displacement Probe Shader"),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });

        let storage = |binding, read_only| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Storage { read_only },
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Displacement Probe Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                storage(1, true),
                storage(2, false),
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Displacement Probe Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("Displacement Probe Pipeline"),
            layout: Some(&pipeline_layout),
            module: &shader,
            entry_point: Some("main"),
            compilation_options: Default::default(),
            cache: None,
        });

        Self {
            device,
            queue,
            pipeline,
            bind_group_layout,
        }
    }

    /// GPU displacement at each position
    pub async fn sample(
        &self,
        positions: &[Vec2],
        waves: &WaveSet,
        inputs: &DisplacementInputs,
    ) -> Result<Vec<Displacement>, OceanError> {
        if positions.is_empty() {
            return Ok(Vec::new());
        }

        let params = ProbeUniforms::new(waves, inputs);
        let params_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Probe Params Buffer"),
            contents: bytemuck::cast_slice(&[params]),
            usage: wgpu::BufferUsages::UNIFORM,
        });

        let raw_positions: Vec<[f32; 2]> = positions.iter().map(|p| p.to_array()).collect();
        let positions_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Probe Positions Buffer"),
            contents: bytemuck::cast_slice(&raw_positions),
            usage: wgpu::BufferUsages::STORAGE,
        });

        let output_size = (positions.len() * std::mem::size_of::<ProbeSample>()) as u64;
        let output_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Probe Output Buffer"),
            size: output_size,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });

        // Staging buffer for readback
        let staging_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Probe Staging Buffer"),
            size: output_size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Probe Bind Group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: params_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: positions_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: output_buffer.as_entire_binding(),
                },
            ],
        });

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Probe Encoder"),
        });

        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Probe Compute Pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            let groups = (positions.len() as u32).div_ceil(WORKGROUP_SIZE);
            pass.dispatch_workgroups(groups, 1, 1);
        }

        encoder.copy_buffer_to_buffer(&output_buffer, 0, &staging_buffer, 0, output_size);
        self.queue.submit(Some(encoder.finish()));

        // Read back results
        let buffer_slice = staging_buffer.slice(..);
        let (sender, receiver) = futures::channel::oneshot::channel();
        buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });

        self.device.poll(wgpu::Maintain::Wait);
        receiver
            .await
            .map_err(|_| OceanError::Probe("readback was cancelled".to_string()))?
            .map_err(|e| OceanError::Probe(format!("failed to map output: {}", e)))?;

        let data = buffer_slice.get_mapped_range();
        let samples: Vec<ProbeSample> = bytemuck::cast_slice(&data).to_vec();
        drop(data);
        staging_buffer.unmap();

        Ok(samples.iter().map(to_displacement).collect())
    }

    /// Evaluate on both sides and report the largest differences
    pub async fn check(
        &self,
        positions: &[Vec2],
        waves: &WaveSet,
        inputs: &DisplacementInputs,
    ) -> Result<ProbeReport, OceanError> {
        let gpu = self.sample(positions, waves, inputs).await?;

        let mut report = ProbeReport {
            samples: positions.len(),
            max_offset_error: 0.0,
            max_normal_error: 0.0,
            tolerance: PROBE_TOLERANCE,
        };

        for (p, g) in positions.iter().zip(gpu.iter()) {
            let c = displace(*p, &waves.waves, inputs);
            report.max_offset_error = report.max_offset_error.max((c.offset - g.offset).abs().max_element());
            let frame_error = (c.normal - g.normal)
                .abs()
                .max_element()
                .max((c.tangent - g.tangent).abs().max_element())
                .max((c.binormal - g.binormal).abs().max_element());
            report.max_normal_error = report.max_normal_error.max(frame_error);
        }

        if report.passed() {
            log::info!(
                "Surface probe: {} samples, max offset error {:.2e}, max frame error {:.2e}",
                report.samples,
                report.max_offset_error,
                report.max_normal_error
            );
        } else {
            log::warn!(
                "Surface probe mismatch: offset error {:.2e}, frame error {:.2e} (tolerance {:.0e})",
                report.max_offset_error,
                report.max_normal_error,
                report.tolerance
            );
        }
        Ok(report)
    }
}

fn to_displacement(s: &ProbeSample) -> Displacement {
    let xyz = |v: [f32; 4]| -> Vec3 { glam::Vec4::from_array(v).xyz() };
    Displacement {
        offset: xyz(s.offset),
        normal: xyz(s.normal),
        tangent: xyz(s.tangent),
        binormal: xyz(s.binormal),
    }
}

/// Regular grid of probe positions around the boat (meters)
pub fn probe_grid(half_extent_m: f32, per_side: u32) -> Vec<Vec2> {
    let n = per_side.max(2);
    let step = 2.0 * half_extent_m / (n - 1) as f32;
    (0..n)
        .flat_map(|z| (0..n).map(move |x| Vec2::new(x as f32 * step - half_extent_m, z as f32 * step - half_extent_m)))
        .collect()
}
