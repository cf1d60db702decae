//! Sphere geometry for the demo scene.

use bytemuck::{Pod, Zeroable};

/// Vertex format shared with `shaders/sphere.wgsl`.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct Vertex {
    /// Object-space position.
    pub position: [f32; 3],
    /// Unit outward normal.
    pub normal: [f32; 3],
    /// Texture coordinates.
    pub uv: [f32; 2],
}

impl Vertex {
    /// Vertex buffer layout for the scene pipeline.
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                // position
                wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x3,
                    offset: 0,
                    shader_location: 0,
                },
                // normal
                wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x3,
                    offset: 12,
                    shader_location: 1,
                },
                // uv
                wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x2,
                    offset: 24,
                    shader_location: 2,
                },
            ],
        }
    }
}

/// Generate a UV sphere as an indexed triangle list.
///
/// `width_segments` is the number of longitudinal slices (≥ 3),
/// `height_segments` the number of latitudinal rings (≥ 2). Poles are
/// duplicated per slice so the texture seam stays clean.
pub fn uv_sphere(radius: f32, width_segments: u32, height_segments: u32) -> (Vec<Vertex>, Vec<u32>) {
    let width_segments = width_segments.max(3);
    let height_segments = height_segments.max(2);

    let mut vertices = Vec::with_capacity(((width_segments + 1) * (height_segments + 1)) as usize);
    for y in 0..=height_segments {
        let v = y as f32 / height_segments as f32;
        let phi = v * std::f32::consts::PI;
        for x in 0..=width_segments {
            let u = x as f32 / width_segments as f32;
            let theta = u * std::f32::consts::TAU;
            let nx = phi.sin() * theta.cos();
            let ny = phi.cos();
            let nz = phi.sin() * theta.sin();
            vertices.push(Vertex {
                position: [radius * nx, radius * ny, radius * nz],
                normal: [nx, ny, nz],
                uv: [u, 1.0 - v],
            });
        }
    }

    let stride = width_segments + 1;
    let mut indices = Vec::with_capacity((width_segments * height_segments * 6) as usize);
    for y in 0..height_segments {
        for x in 0..width_segments {
            let a = y * stride + x;
            let b = a + stride;
            indices.extend_from_slice(&[a, b, a + 1, a + 1, b, b + 1]);
        }
    }

    (vertices, indices)
}
