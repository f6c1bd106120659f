//! Rendering system with wgpu pipelines and the per-frame passes.
//!
//! Every frame runs the mirror pass into the back reflection target first,
//! then draws sky, coastline, sea surface and clouds to the window.

pub mod reflection;
pub mod textures;
pub mod uniforms;

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::error::OceanError;
use crate::ocean::{with_gerstner, SurfaceGrid, Vertex};
use crate::params::OceanSurfaceParams;
use crate::reflection::{ReflectionOutcome, ReflectionPhase, ReflectionRenderer};
use crate::scene::FrameInputs;
use crate::weather::City;
use reflection::{GpuMirror, MirrorTargets};
use textures::TextureKind;
use uniforms::{CloudUniforms, DecalUniforms, OceanUniforms, SkyUniforms, ViewUniforms};

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Depth attachment shared by the scene pipelines
pub(crate) fn create_depth_view(device: &wgpu::Device, width: u32, height: u32, label: &str) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

/// Per-camera uniform buffer and its group-0 bind group
pub(crate) struct ViewBinding {
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
}

impl ViewBinding {
    fn new(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, label: &str) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: std::mem::size_of::<ViewUniforms>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });
        Self { buffer, bind_group }
    }
}

/// Pipelines and bind groups drawn by both the mirror and the main pass
pub(crate) struct Scenery {
    sky_pipeline: wgpu::RenderPipeline,
    decal_pipeline: wgpu::RenderPipeline,
    ocean_pipeline: wgpu::RenderPipeline,
    cloud_pipeline: wgpu::RenderPipeline,
    sky_bind_group: wgpu::BindGroup,
    cloud_bind_group: wgpu::BindGroup,
    decal_bind_groups: BTreeMap<City, wgpu::BindGroup>,
    /// One per reflection target, indexed like `MirrorTargets`
    ocean_bind_groups: [wgpu::BindGroup; 2],
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    /// Coastline drawn this frame
    coast: Option<City>,
}

impl Scenery {
    /// Record the scene. `ocean` names the reflection target the surface
    /// samples; `None` leaves the surface out.
    pub(crate) fn draw(&self, pass: &mut wgpu::RenderPass<'_>, view: &wgpu::BindGroup, ocean: Option<usize>) {
        // Render sky first
        pass.set_pipeline(&self.sky_pipeline);
        pass.set_bind_group(0, view, &[]);
        pass.set_bind_group(1, &self.sky_bind_group, &[]);
        pass.draw(0..3, 0..1); // Fullscreen triangle

        if let Some(bind_group) = self.coast.and_then(|city| self.decal_bind_groups.get(&city)) {
            pass.set_pipeline(&self.decal_pipeline);
            pass.set_bind_group(0, view, &[]);
            pass.set_bind_group(1, bind_group, &[]);
            pass.draw(0..6, 0..1);
        }

        if let Some(index) = ocean {
            pass.set_pipeline(&self.ocean_pipeline);
            pass.set_bind_group(0, view, &[]);
            pass.set_bind_group(1, &self.ocean_bind_groups[index % 2], &[]);
            pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
            pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..self.index_count, 0, 0..1);
        }

        // Transparent layer last
        pass.set_pipeline(&self.cloud_pipeline);
        pass.set_bind_group(0, view, &[]);
        pass.set_bind_group(1, &self.cloud_bind_group, &[]);
        pass.draw(0..6, 0..1);
    }
}

/// Fixed-function state that differs between the scene pipelines
struct PipelineSpec<'a> {
    label: &'a str,
    shader: &'a wgpu::ShaderModule,
    bind_group_layouts: &'a [&'a wgpu::BindGroupLayout],
    buffers: &'a [wgpu::VertexBufferLayout<'a>],
    blend: Option<wgpu::BlendState>,
    depth_write: bool,
    depth_compare: wgpu::CompareFunction,
}

fn create_scene_pipeline(device: &wgpu::Device, format: wgpu::TextureFormat, spec: PipelineSpec<'_>) -> wgpu::RenderPipeline {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(spec.label),
        bind_group_layouts: spec.bind_group_layouts,
        push_constant_ranges: &[],
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(spec.label),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: spec.shader,
            entry_point: Some("vs_main"),
            buffers: spec.buffers,
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: spec.shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: spec.blend,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            // the mirror camera flips winding, and the surface is seen from below
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: spec.depth_write,
            depth_compare: spec.depth_compare,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

fn uniform_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn sampler_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        count: None,
    }
}

fn texture_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

fn create_uniform_buffer<T: bytemuck::Pod>(device: &wgpu::Device, label: &str, contents: &T) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents: bytemuck::bytes_of(contents),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    })
}

/// Rendering system managing wgpu device, pipelines, and buffers
pub struct RenderSystem {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    depth_view: wgpu::TextureView,
    scenery: Scenery,
    main_view: ViewBinding,
    mirror_view: ViewBinding,
    ocean_uniform_buffer: wgpu::Buffer,
    sky_uniform_buffer: wgpu::Buffer,
    cloud_uniform_buffer: wgpu::Buffer,
    decal_uniform_buffer: wgpu::Buffer,
    mirror_targets: MirrorTargets,
    reflection: ReflectionRenderer<usize>,
    /// Off-screen target the next pass draws into; `None` is the window
    bound_target: Option<usize>,
    ocean_visible: bool,
    surface_params: OceanSurfaceParams,
    clear_color: wgpu::Color,
}

impl RenderSystem {
    /// Create new rendering system. Textures come from `texture_dir` when
    /// given, otherwise they are generated.
    pub async fn new(
        window: Arc<Window>,
        grid: &SurfaceGrid,
        surface_params: OceanSurfaceParams,
        texture_dir: Option<&Path>,
    ) -> Result<Self, OceanError> {
        let size = window.inner_size();

        // Create wgpu instance
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        // Create surface (window must have 'static lifetime via Arc)
        let surface = instance
            .create_surface(window)
            .map_err(|e| OceanError::Surface(format!("failed to create surface: {}", e)))?;

        // Request adapter
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| OceanError::Gpu("failed to find suitable GPU adapter".to_string()))?;

        log::info!("Using adapter: {}", adapter.get_info().name);

        // Request device
        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Main Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await
            .map_err(|e| OceanError::Gpu(format!("failed to request device: {}", e)))?;

        // Configure surface
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or_else(|| OceanError::Surface("surface reports no formats".to_string()))?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let depth_view = create_depth_view(&device, config.width, config.height, "Depth Texture");

        // Load shaders
        let ocean_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Ocean Shader"),
            source: wgpu::ShaderSource::Wgsl(with_gerstner(include_str!("../shaders/ocean.wgsl")).into()),
        });
        let sky_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Sky Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../shaders/sky.wgsl").into()),
        });
        let cloud_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Cloud Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../shaders/cloud.wgsl").into()),
        });
        let decal_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Coastline Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../shaders/decal.wgsl").into()),
        });

        // Create buffers
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Vertex Buffer"),
            contents: bytemuck::cast_slice(&grid.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Index Buffer"),
            contents: bytemuck::cast_slice(&grid.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        let ocean_uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Ocean Uniform Buffer"),
            size: std::mem::size_of::<OceanUniforms>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let sky_uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Sky Uniform Buffer"),
            size: std::mem::size_of::<SkyUniforms>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let cloud_uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Cloud Uniform Buffer"),
            size: std::mem::size_of::<CloudUniforms>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let decal_uniform_buffer = create_uniform_buffer(
            &device,
            "Coastline Uniform Buffer",
            &DecalUniforms {
                model: glam::Mat4::IDENTITY.to_cols_array_2d(),
            },
        );

        // Textures
        let load = |kind: TextureKind| -> Result<wgpu::TextureView, OceanError> {
            let image = textures::load_or_generate(texture_dir, kind)?;
            let (_texture, view) = textures::upload(&device, &queue, &image, &kind.file_name());
            Ok(view)
        };
        let normal_view = load(TextureKind::NormalMap)?;
        let foam_view = load(TextureKind::Foam)?;
        let perlin_view = load(TextureKind::Perlin)?;
        let trail_view = load(TextureKind::Trail)?;

        let repeat_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Repeat Sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });
        let clamp_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Clamp Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        // Bind group layouts
        let view_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("View Bind Group Layout"),
            entries: &[uniform_entry(0)],
        });
        let sky_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Sky Bind Group Layout"),
            entries: &[uniform_entry(0)],
        });
        let textured_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Textured Quad Bind Group Layout"),
            entries: &[uniform_entry(0), sampler_entry(1), texture_entry(2)],
        });
        let ocean_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Ocean Bind Group Layout"),
            entries: &[
                uniform_entry(0),
                sampler_entry(1),
                sampler_entry(2),
                texture_entry(3),
                texture_entry(4),
                texture_entry(5),
                texture_entry(6),
                texture_entry(7),
            ],
        });

        let main_view = ViewBinding::new(&device, &view_layout, "Main View Uniforms");
        let mirror_view = ViewBinding::new(&device, &view_layout, "Mirror View Uniforms");

        // Mirror targets share the surface format so one set of pipelines serves both passes
        let mirror_targets = MirrorTargets::new(
            &device,
            surface_params.mirror_texture_width,
            surface_params.mirror_texture_height,
            config.format,
        );

        let ocean_bind_group = |index: usize| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Ocean Bind Group"),
                layout: &ocean_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: ocean_uniform_buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::Sampler(&repeat_sampler),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::Sampler(&clamp_sampler),
                    },
                    wgpu::BindGroupEntry {
                        binding: 3,
                        resource: wgpu::BindingResource::TextureView(mirror_targets.view(index)),
                    },
                    wgpu::BindGroupEntry {
                        binding: 4,
                        resource: wgpu::BindingResource::TextureView(&normal_view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 5,
                        resource: wgpu::BindingResource::TextureView(&foam_view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 6,
                        resource: wgpu::BindingResource::TextureView(&perlin_view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 7,
                        resource: wgpu::BindingResource::TextureView(&trail_view),
                    },
                ],
            })
        };
        let ocean_bind_groups = [ocean_bind_group(0), ocean_bind_group(1)];

        let sky_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Sky Bind Group"),
            layout: &sky_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: sky_uniform_buffer.as_entire_binding(),
            }],
        });

        let textured_bind_group = |label: &str, buffer: &wgpu::Buffer, sampler: &wgpu::Sampler, view: &wgpu::TextureView| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(label),
                layout: &textured_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::Sampler(sampler),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::TextureView(view),
                    },
                ],
            })
        };

        // Clouds reuse the perlin texture
        let cloud_bind_group = textured_bind_group("Cloud Bind Group", &cloud_uniform_buffer, &repeat_sampler, &perlin_view);

        let mut decal_bind_groups = BTreeMap::new();
        for city in City::ALL {
            let coast_view = load(TextureKind::Coastline(city))?;
            let bind_group = textured_bind_group("Coastline Bind Group", &decal_uniform_buffer, &clamp_sampler, &coast_view);
            decal_bind_groups.insert(city, bind_group);
        }

        // Pipelines
        let sky_pipeline = create_scene_pipeline(
            &device,
            config.format,
            PipelineSpec {
                label: "Sky Pipeline",
                shader: &sky_shader,
                bind_group_layouts: &[&view_layout, &sky_layout],
                buffers: &[],
                blend: None,
                depth_write: false,
                depth_compare: wgpu::CompareFunction::Always,
            },
        );
        let decal_pipeline = create_scene_pipeline(
            &device,
            config.format,
            PipelineSpec {
                label: "Coastline Pipeline",
                shader: &decal_shader,
                bind_group_layouts: &[&view_layout, &textured_layout],
                buffers: &[],
                blend: None,
                depth_write: true,
                depth_compare: wgpu::CompareFunction::Less,
            },
        );
        let ocean_pipeline = create_scene_pipeline(
            &device,
            config.format,
            PipelineSpec {
                label: "Ocean Render Pipeline",
                shader: &ocean_shader,
                bind_group_layouts: &[&view_layout, &ocean_layout],
                buffers: &[Vertex::layout()],
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                depth_write: true,
                depth_compare: wgpu::CompareFunction::Less,
            },
        );
        let cloud_pipeline = create_scene_pipeline(
            &device,
            config.format,
            PipelineSpec {
                label: "Cloud Pipeline",
                shader: &cloud_shader,
                bind_group_layouts: &[&view_layout, &textured_layout],
                buffers: &[],
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                depth_write: false,
                depth_compare: wgpu::CompareFunction::Less,
            },
        );

        let scenery = Scenery {
            sky_pipeline,
            decal_pipeline,
            ocean_pipeline,
            cloud_pipeline,
            sky_bind_group,
            cloud_bind_group,
            decal_bind_groups,
            ocean_bind_groups,
            vertex_buffer,
            index_buffer,
            index_count: grid.index_count(),
            coast: None,
        };

        let [r, g, b] = surface_params.underwater_fog_color;
        let clear_color = wgpu::Color {
            r: r as f64,
            g: g as f64,
            b: b as f64,
            a: 1.0,
        };
        let reflection = ReflectionRenderer::new([0, 1], surface_params.clip_bias);

        log::info!(
            "Renderer ready: {}x{} {:?}, mirror {}x{}, {} surface indices",
            config.width,
            config.height,
            config.format,
            mirror_targets.size().0,
            mirror_targets.size().1,
            grid.index_count()
        );

        Ok(Self {
            surface,
            device,
            queue,
            config,
            depth_view,
            scenery,
            main_view,
            mirror_view,
            ocean_uniform_buffer,
            sky_uniform_buffer,
            cloud_uniform_buffer,
            decal_uniform_buffer,
            mirror_targets,
            reflection,
            bound_target: None,
            ocean_visible: true,
            surface_params,
            clear_color,
        })
    }

    /// Reconfigure the surface and depth buffer for a new window size
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.depth_view = create_depth_view(&self.device, width, height, "Depth Texture");
    }

    /// Reapply the current configuration after the surface was lost
    pub fn reconfigure(&mut self) {
        self.surface.configure(&self.device, &self.config);
    }

    pub fn size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    pub fn reflection(&self) -> &ReflectionRenderer<usize> {
        &self.reflection
    }

    /// Update the per-frame uniforms that do not depend on the reflection
    fn update_uniforms(&mut self, frame: &FrameInputs) {
        let view = ViewUniforms::for_camera(&frame.camera, frame.time);
        self.queue
            .write_buffer(&self.main_view.buffer, 0, bytemuck::cast_slice(&[view]));

        let sky = SkyUniforms::new(frame.lights.sun_vector, &frame.sky);
        self.queue
            .write_buffer(&self.sky_uniform_buffer, 0, bytemuck::cast_slice(&[sky]));

        let clouds = CloudUniforms::new(&frame.clouds);
        self.queue
            .write_buffer(&self.cloud_uniform_buffer, 0, bytemuck::cast_slice(&[clouds]));

        let decal = DecalUniforms {
            model: frame.coastline.model_matrix().to_cols_array_2d(),
        };
        self.queue
            .write_buffer(&self.decal_uniform_buffer, 0, bytemuck::cast_slice(&[decal]));

        self.scenery.coast = frame.coastline.visible.then_some(frame.weather.city);
    }

    /// Render one frame: mirror pass, then the main pass to the window
    pub fn render(&mut self, frame: &FrameInputs) -> Result<ReflectionPhase, wgpu::SurfaceError> {
        self.update_uniforms(frame);

        let outcome = {
            let mut mirror = GpuMirror {
                device: &self.device,
                queue: &self.queue,
                targets: &self.mirror_targets,
                scenery: &self.scenery,
                view: &self.mirror_view,
                clear_color: self.clear_color,
                time: frame.time,
                main_eye_y: frame.camera.eye.y,
                bound_target: &mut self.bound_target,
                ocean_visible: &mut self.ocean_visible,
            };
            self.reflection
                .render(&mut mirror, &frame.camera, &frame.water_transform)
        };
        if let ReflectionOutcome::Failed(err) = &outcome {
            log::debug!("Main pass uses the previous reflection: {}", err);
        }

        // The texture matrix must pair with the front target
        let ocean = OceanUniforms::new(frame, self.reflection.texture_matrix(), &self.surface_params);
        self.queue
            .write_buffer(&self.ocean_uniform_buffer, 0, bytemuck::cast_slice(&[ocean]));

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Discard,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            let ocean = self.ocean_visible.then_some(self.reflection.texture());
            self.scenery
                .draw(&mut render_pass, &self.main_view.bind_group, ocean);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(self.reflection.phase())
    }
}
