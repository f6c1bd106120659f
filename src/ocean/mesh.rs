//! Flat surface grid; displacement happens in the vertex stage.

use bytemuck::{Pod, Zeroable};

use crate::params::MeshParams;

/// Vertex data for surface meshes (position + UV coordinates)
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    pub const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x2];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Regular grid in the XZ plane, centred on the origin
pub struct SurfaceGrid {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    cells_per_side: u32,
    size_m: f32,
}

impl SurfaceGrid {
    /// Create a grid with the given extent and resolution
    pub fn new(params: &MeshParams) -> Self {
        let cells = params.cells_per_side.max(1);
        let spacing = params.spacing_m();
        let half_size = params.size_m / 2.0;

        let mut vertices = Vec::with_capacity(((cells + 1) * (cells + 1)) as usize);
        let mut indices = Vec::with_capacity((cells * cells * 6) as usize);

        for z in 0..=cells {
            for x in 0..=cells {
                vertices.push(Vertex {
                    position: [
                        x as f32 * spacing - half_size,
                        0.0,
                        z as f32 * spacing - half_size,
                    ],
                    uv: [x as f32 / cells as f32, z as f32 / cells as f32],
                });
            }
        }

        // Counter-clockwise seen from +Y
        for z in 0..cells {
            for x in 0..cells {
                let top_left = z * (cells + 1) + x;
                let top_right = top_left + 1;
                let bottom_left = (z + 1) * (cells + 1) + x;
                let bottom_right = bottom_left + 1;

                indices.extend_from_slice(&[
                    top_left,
                    bottom_left,
                    top_right,
                    top_right,
                    bottom_left,
                    bottom_right,
                ]);
            }
        }

        Self {
            vertices,
            indices,
            cells_per_side: cells,
            size_m: params.size_m,
        }
    }

    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }

    pub fn cells_per_side(&self) -> u32 {
        self.cells_per_side
    }

    pub fn size_m(&self) -> f32 {
        self.size_m
    }
}
