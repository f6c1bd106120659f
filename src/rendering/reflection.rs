//! Off-screen mirror targets and the wgpu side of the reflection pass.

use super::uniforms::ViewUniforms;
use super::{create_depth_view, Scenery, ViewBinding};
use crate::error::OceanError;
use crate::reflection::{MirrorBackend, ReflectionFrame};

/// Two color targets the reflection alternates between, plus shared depth
pub struct MirrorTargets {
    colors: [wgpu::Texture; 2],
    views: [wgpu::TextureView; 2],
    depth_view: wgpu::TextureView,
}

impl MirrorTargets {
    /// Create both targets in `format` so the scene pipelines can draw into them
    pub fn new(device: &wgpu::Device, width: u32, height: u32, format: wgpu::TextureFormat) -> Self {
        let (width, height) = (width.max(1), height.max(1));
        let color = |label| {
            device.create_texture(&wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
                view_formats: &[],
            })
        };
        let colors = [color("Mirror Target A"), color("Mirror Target B")];
        let views = [
            colors[0].create_view(&wgpu::TextureViewDescriptor::default()),
            colors[1].create_view(&wgpu::TextureViewDescriptor::default()),
        ];
        let depth_view = create_depth_view(device, width, height, "Mirror Depth Texture");

        Self {
            colors,
            views,
            depth_view,
        }
    }

    pub fn view(&self, index: usize) -> &wgpu::TextureView {
        &self.views[index % 2]
    }

    pub fn size(&self) -> (u32, u32) {
        (self.colors[0].width(), self.colors[0].height())
    }
}

/// Renderer state lent to the reflection pass for one frame
pub(crate) struct GpuMirror<'a> {
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
    pub targets: &'a MirrorTargets,
    pub scenery: &'a Scenery,
    pub view: &'a ViewBinding,
    pub clear_color: wgpu::Color,
    pub time: f32,
    /// Main camera eye height; decides whether the sky is cut at the horizon
    pub main_eye_y: f32,
    pub bound_target: &'a mut Option<usize>,
    pub ocean_visible: &'a mut bool,
}

impl MirrorBackend for GpuMirror<'_> {
    type Target = usize;

    fn active_target(&self) -> Option<usize> {
        *self.bound_target
    }

    fn bind_target(&mut self, target: Option<usize>) {
        *self.bound_target = target;
    }

    fn water_visible(&self) -> bool {
        *self.ocean_visible
    }

    fn set_water_visible(&mut self, visible: bool) {
        *self.ocean_visible = visible;
    }

    fn draw_mirror(&mut self, frame: &ReflectionFrame) -> Result<(), OceanError> {
        let index = self
            .bound_target
            .ok_or_else(|| OceanError::ReflectionPass("no mirror target bound".to_string()))?;

        let uniforms = ViewUniforms::new(
            frame.view_proj(),
            frame.projection * frame.view,
            frame.eye,
            self.time,
            self.main_eye_y,
        );
        self.queue
            .write_buffer(&self.view.buffer, 0, bytemuck::cast_slice(&[uniforms]));

        self.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Mirror Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Mirror Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: self.targets.view(index),
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.targets.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Discard,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            // the surface, when drawn at all, samples the other target
            let ocean = self.ocean_visible.then_some(1 - index);
            self.scenery.draw(&mut render_pass, &self.view.bind_group, ocean);
        }

        self.queue.submit(std::iter::once(encoder.finish()));

        let validation = pollster::block_on(self.device.pop_error_scope());
        let out_of_memory = pollster::block_on(self.device.pop_error_scope());
        match validation.or(out_of_memory) {
            Some(err) => Err(OceanError::ReflectionPass(err.to_string())),
            None => Ok(()),
        }
    }
}
