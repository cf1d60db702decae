//! Demo scene renderer: a lit, textured sphere.
//!
//! This is a renderer "library" consuming the virtual canvas's GPU surface
//! the way a real 3D engine would - it builds its own pipeline against the
//! context's device, renders into the context's drawing buffer, and never
//! touches the raster side. The canvas adapter owes it nothing beyond the
//! `GpuContext` accessors.

mod geometry;

pub use geometry::{uv_sphere, Vertex};

use crate::error::Result;
use crate::gpu::{GpuContext, TARGET_FORMAT};
use crate::texture::TextureData;

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

/// Scene uniforms shared with `shaders/sphere.wgsl`.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
struct Globals {
    view_proj: [[f32; 4]; 4],
    camera_pos: [f32; 4],
    // xyz = position, w = intensity
    light0: [f32; 4],
    light1: [f32; 4],
    base_color: [f32; 4],
    ambient: [f32; 4],
}

/// Build a right-handed perspective projection with depth in `[0, 1]`.
///
/// Column-major, ready for a WGSL `mat4x4<f32>` uniform.
pub fn perspective(fovy: f32, aspect: f32, near: f32, far: f32) -> [[f32; 4]; 4] {
    let f = 1.0 / (fovy / 2.0).tan();
    [
        [f / aspect, 0.0, 0.0, 0.0],
        [0.0, f, 0.0, 0.0],
        [0.0, 0.0, far / (near - far), -1.0],
        [0.0, 0.0, (near * far) / (near - far), 0.0],
    ]
}

/// Column-major translation matrix.
pub fn translation(x: f32, y: f32, z: f32) -> [[f32; 4]; 4] {
    [
        [1.0, 0.0, 0.0, 0.0],
        [0.0, 1.0, 0.0, 0.0],
        [0.0, 0.0, 1.0, 0.0],
        [x, y, z, 1.0],
    ]
}

/// Multiply two column-major matrices (`a * b`).
#[allow(clippy::indexing_slicing)] // 4x4, all indices constant-bounded
pub fn mat4_mul(a: [[f32; 4]; 4], b: [[f32; 4]; 4]) -> [[f32; 4]; 4] {
    let mut out = [[0.0; 4]; 4];
    for col in 0..4 {
        for row in 0..4 {
            let mut sum = 0.0;
            for k in 0..4 {
                sum += a[k][row] * b[col][k];
            }
            out[col][row] = sum;
        }
    }
    out
}

/// Renders the demo scene into a canvas's GPU drawing buffer.
pub struct SceneRenderer {
    pipeline: wgpu::RenderPipeline,
    bind_group: wgpu::BindGroup,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

impl SceneRenderer {
    /// Build pipeline, geometry, and bindings against the given context.
    ///
    /// Camera and lights mirror the demo's fixed setup: 75° fov camera at
    /// z = 9 looking at the origin, a strong light above and a weak fill
    /// below, a blue material modulated by `texture`.
    pub fn new(gpu: &GpuContext, texture: &TextureData) -> Result<Self> {
        let device = gpu.device();

        let (vertices, indices) = uv_sphere(5.0, 25, 28);
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("sphere vertices"),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("sphere indices"),
            contents: bytemuck::cast_slice(&indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        let (width, height) = gpu.drawing_buffer_size();
        let aspect = width as f32 / height as f32;
        let proj = perspective(75.0_f32.to_radians(), aspect, 0.1, 1000.0);
        let view = translation(0.0, 0.0, -9.0);
        let globals = Globals {
            view_proj: mat4_mul(proj, view),
            camera_pos: [0.0, 0.0, 9.0, 1.0],
            light0: [0.0, 7.0, 10.0, 1.1],
            light1: [0.0, -9.0, 10.0, 0.35],
            base_color: [0.016, 0.620, 0.957, 1.0], // #049EF4
            ambient: [0.25, 0.25, 0.25, 0.0],
        };
        let globals_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("scene globals"),
            contents: bytemuck::bytes_of(&globals),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let diffuse = texture.upload(gpu)?;
        let diffuse_view = diffuse.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("diffuse sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("scene bind group layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("scene bind group"),
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: globals_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&diffuse_view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("sphere shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/sphere.wgsl").into()),
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("sphere pipeline"),
            layout: Some(
                &device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                    label: Some("sphere pipeline layout"),
                    bind_group_layouts: &[&bind_group_layout],
                    immediate_size: 0,
                }),
            ),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[Vertex::layout()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: TARGET_FORMAT,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: gpu.depth_view().map(|_| wgpu::DepthStencilState {
                format: wgpu::TextureFormat::Depth32Float,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState {
                count: gpu.sample_count(),
                ..Default::default()
            },
            multiview_mask: None,
            cache: None,
        });

        #[allow(clippy::cast_possible_truncation)]
        let index_count = indices.len() as u32;
        Ok(Self {
            pipeline,
            bind_group,
            vertex_buffer,
            index_buffer,
            index_count,
        })
    }

    /// Render one frame into the context's drawing buffer.
    pub fn render(&self, gpu: &GpuContext) {
        let mut encoder = gpu
            .device()
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("scene encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("scene pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: gpu.msaa_view().unwrap_or_else(|| gpu.target_view()),
                    resolve_target: gpu.msaa_view().map(|_| gpu.target_view()),
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: gpu.depth_view().map(|view| {
                    wgpu::RenderPassDepthStencilAttachment {
                        view,
                        depth_ops: Some(wgpu::Operations {
                            load: wgpu::LoadOp::Clear(1.0),
                            store: wgpu::StoreOp::Store,
                        }),
                        stencil_ops: None,
                    }
                }),
                ..Default::default()
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &self.bind_group, &[]);
            pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
            pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..self.index_count, 0, 0..1);
        }
        gpu.queue().submit(std::iter::once(encoder.finish()));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::float_cmp)]
mod tests {
    use super::*;

    /// Transform a point by a column-major matrix, returning clip coords.
    fn transform(m: [[f32; 4]; 4], p: [f32; 4]) -> [f32; 4] {
        let mut out = [0.0; 4];
        for (row, value) in out.iter_mut().enumerate() {
            *value = (0..4).map(|col| m[col][row] * p[col]).sum();
        }
        out
    }

    #[test]
    fn perspective_maps_near_and_far_to_unit_depth_range() {
        let m = perspective(75.0_f32.to_radians(), 1.0, 0.1, 1000.0);

        let near = transform(m, [0.0, 0.0, -0.1, 1.0]);
        assert!((near[2] / near[3]).abs() < 1e-5);

        let far = transform(m, [0.0, 0.0, -1000.0, 1.0]);
        assert!((far[2] / far[3] - 1.0).abs() < 1e-4);
    }

    #[test]
    fn translation_moves_points() {
        let m = translation(1.0, 2.0, 3.0);
        let p = transform(m, [0.0, 0.0, 0.0, 1.0]);
        assert_eq!(&p, &[1.0, 2.0, 3.0, 1.0]);
    }

    #[test]
    fn mat4_mul_with_identity_is_identity() {
        let id = translation(0.0, 0.0, 0.0);
        let m = perspective(1.0, 1.5, 0.1, 100.0);
        assert_eq!(mat4_mul(m, id), m);
        assert_eq!(mat4_mul(id, m), m);
    }

    #[test]
    fn view_projection_puts_the_sphere_in_front_of_the_camera() {
        // Camera at z = 9 looking down -z; the sphere surface point nearest
        // the camera is (0, 0, 5).
        let proj = perspective(75.0_f32.to_radians(), 1.0, 0.1, 1000.0);
        let view = translation(0.0, 0.0, -9.0);
        let vp = mat4_mul(proj, view);

        let front = transform(vp, [0.0, 0.0, 5.0, 1.0]);
        let depth = front[2] / front[3];
        assert!(depth > 0.0 && depth < 1.0, "depth {depth}");
    }
}
