//! Headless GPU drawing buffer over wgpu.
//!
//! This is the "GPU context" half of the virtual canvas: an offscreen RGBA8
//! render target with WebGL-flavored pixel access. Renderer libraries get
//! the raw `wgpu` device/queue/views and build their own pipelines; the
//! canvas adapter only needs the sizing, clear, and readback surface.
//!
//! Orientation contract: `read_pixels` returns rows bottom-to-top, exactly
//! like `glReadPixels(0, 0, w, h)`. The adapter's blit step is the one place
//! that converts back to top-down raster order.

use crate::error::{CanvasError, Result};
use serde::{Deserialize, Serialize};

/// Pixel format of the drawing buffer and of all readback data.
pub const TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// Sample count used when `antialias` is requested.
const MSAA_SAMPLES: u32 = 4;

/// WebGL-style context creation attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextAttributes {
    /// Whether the drawing buffer has an alpha channel. When `false`,
    /// clears force alpha to fully opaque.
    pub alpha: bool,
    /// Whether to render through a multisampled target (4x) resolved into
    /// the drawing buffer.
    pub antialias: bool,
    /// Whether a depth buffer is attached to render passes.
    pub depth: bool,
}

impl Default for ContextAttributes {
    fn default() -> Self {
        Self {
            alpha: true,
            antialias: false,
            depth: true,
        }
    }
}

struct Targets {
    target: wgpu::Texture,
    target_view: wgpu::TextureView,
    msaa_view: Option<wgpu::TextureView>,
    depth_view: Option<wgpu::TextureView>,
    staging: wgpu::Buffer,
}

/// A headless, offscreen GPU rendering context.
///
/// Dimensions are clamped to at least 1 texel (wgpu forbids zero extents);
/// the owning canvas may still report a logical size of 0.
pub struct GpuContext {
    device: wgpu::Device,
    queue: wgpu::Queue,
    attrs: ContextAttributes,
    width: u32,
    height: u32,
    target: wgpu::Texture,
    target_view: wgpu::TextureView,
    msaa_view: Option<wgpu::TextureView>,
    depth_view: Option<wgpu::TextureView>,
    staging: wgpu::Buffer,
}

impl GpuContext {
    /// Acquire an adapter and device, and allocate a drawing buffer of the
    /// given size.
    pub fn new(width: u32, height: u32, attrs: ContextAttributes) -> Result<Self> {
        let width = width.max(1);
        let height = height.max(1);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .map_err(|e| CanvasError::Adapter(e.to_string()))?;

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("vcanvas device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            experimental_features: wgpu::ExperimentalFeatures::default(),
            memory_hints: wgpu::MemoryHints::MemoryUsage,
            trace: wgpu::Trace::Off,
        }))
        .map_err(|e| CanvasError::Device(e.to_string()))?;

        log::debug!(
            "gpu context {}x{} on {}",
            width,
            height,
            adapter.get_info().name
        );

        let targets = create_targets(&device, width, height, attrs);
        Ok(Self {
            device,
            queue,
            attrs,
            width,
            height,
            target: targets.target,
            target_view: targets.target_view,
            msaa_view: targets.msaa_view,
            depth_view: targets.depth_view,
            staging: targets.staging,
        })
    }

    /// Drawing-buffer width in texels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Drawing-buffer height in texels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Current drawing-buffer dimensions, `(width, height)`.
    pub fn drawing_buffer_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Attributes this context was created with.
    pub fn attributes(&self) -> ContextAttributes {
        self.attrs
    }

    /// The wgpu device, for renderer libraries building pipelines.
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    /// The wgpu queue.
    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// View of the single-sampled drawing buffer.
    pub fn target_view(&self) -> &wgpu::TextureView {
        &self.target_view
    }

    /// View of the multisampled color target, if `antialias` was requested.
    /// Render into this and resolve into `target_view`.
    pub fn msaa_view(&self) -> Option<&wgpu::TextureView> {
        self.msaa_view.as_ref()
    }

    /// View of the depth buffer, if `depth` was requested.
    pub fn depth_view(&self) -> Option<&wgpu::TextureView> {
        self.depth_view.as_ref()
    }

    /// Sample count render pipelines must be built with.
    pub fn sample_count(&self) -> u32 {
        if self.attrs.antialias {
            MSAA_SAMPLES
        } else {
            1
        }
    }

    /// Resize the drawing buffer, discarding its contents.
    ///
    /// Counterpart of the `STACKGL_resize_drawingbuffer` extension on
    /// headless GL stacks; here it is a plain method and always available.
    pub fn resize_drawing_buffer(&mut self, width: u32, height: u32) {
        let width = width.max(1);
        let height = height.max(1);
        if width == self.width && height == self.height {
            return;
        }
        log::debug!(
            "resize drawing buffer {}x{} -> {}x{}",
            self.width,
            self.height,
            width,
            height
        );
        let targets = create_targets(&self.device, width, height, self.attrs);
        self.target = targets.target;
        self.target_view = targets.target_view;
        self.msaa_view = targets.msaa_view;
        self.depth_view = targets.depth_view;
        self.staging = targets.staging;
        self.width = width;
        self.height = height;
    }

    /// Clear the full drawing buffer (and depth buffer, if present).
    ///
    /// With `alpha: false` the alpha component is forced to 1.0.
    pub fn clear(&self, r: f64, g: f64, b: f64, a: f64) {
        let a = if self.attrs.alpha { a } else { 1.0 };
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("clear encoder"),
            });
        {
            let _pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("clear pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: self.msaa_view.as_ref().unwrap_or(&self.target_view),
                    resolve_target: self.msaa_view.as_ref().map(|_| &self.target_view),
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a }),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: self.depth_view.as_ref().map(|view| {
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
        }
        self.queue.submit(std::iter::once(encoder.finish()));
    }

    /// Read the full drawing buffer as RGBA bytes, rows bottom-to-top.
    ///
    /// This matches `glReadPixels(0, 0, w, h)`: the first returned row is
    /// the framebuffer's origin row, which is the BOTTOM scanline of the
    /// picture. Consumers producing top-down raster images must flip.
    #[allow(clippy::indexing_slicing)] // row ranges derive from the staging buffer's own layout
    pub fn read_pixels(&self) -> Result<Vec<u8>> {
        let padded = (self.width * 4).next_multiple_of(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT);

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("readback encoder"),
            });
        encoder.copy_texture_to_buffer(
            self.target.as_image_copy(),
            wgpu::TexelCopyBufferInfo {
                buffer: &self.staging,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded),
                    rows_per_image: None,
                },
            },
            wgpu::Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            },
        );
        let submission = self.queue.submit(std::iter::once(encoder.finish()));

        let slice = self.staging.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        self.device
            .poll(wgpu::PollType::Wait {
                timeout: None,
                submission_index: Some(submission),
            })
            .map_err(|e| CanvasError::Readback(format!("poll: {e}")))?;
        rx.recv()
            .map_err(|_| CanvasError::Readback("map callback dropped".to_string()))?
            .map_err(|e| CanvasError::Readback(format!("map: {e}")))?;

        let data = slice.get_mapped_range();
        let row_bytes = self.width as usize * 4;
        let mut pixels = Vec::with_capacity(row_bytes * self.height as usize);
        for row in (0..self.height).rev() {
            let start = row as usize * padded as usize;
            pixels.extend_from_slice(&data[start..start + row_bytes]);
        }
        drop(data);
        self.staging.unmap();
        Ok(pixels)
    }

    /// Upload RGBA pixels into the drawing buffer at GL window coordinates
    /// (origin bottom-left, `data` rows bottom-to-top).
    #[allow(clippy::indexing_slicing)] // row ranges validated against data.len() above
    pub fn write_pixels(&self, x: u32, y: u32, width: u32, height: u32, data: &[u8]) -> Result<()> {
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(CanvasError::Geometry(format!(
                "expected {expected} bytes for {width}x{height} RGBA, got {}",
                data.len()
            )));
        }
        let fits_x = x.checked_add(width).is_some_and(|right| right <= self.width);
        let fits_y = y
            .checked_add(height)
            .is_some_and(|top| top <= self.height);
        if !(fits_x && fits_y) {
            return Err(CanvasError::Geometry(format!(
                "rect {width}x{height}+{x}+{y} outside {}x{} drawing buffer",
                self.width, self.height
            )));
        }

        // Flip the bottom-to-top input into the texture's top-down order.
        let row_bytes = width as usize * 4;
        let mut flipped = Vec::with_capacity(data.len());
        for row in (0..height as usize).rev() {
            flipped.extend_from_slice(&data[row * row_bytes..(row + 1) * row_bytes]);
        }

        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &self.target,
                mip_level: 0,
                origin: wgpu::Origin3d {
                    x,
                    y: self.height - y - height,
                    z: 0,
                },
                aspect: wgpu::TextureAspect::All,
            },
            &flipped,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(width * 4),
                rows_per_image: Some(height),
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        Ok(())
    }

    /// Upload RGBA pixels (top-down rows) as a sampled texture for renderer
    /// collaborators.
    pub fn create_texture_rgba(&self, width: u32, height: u32, data: &[u8]) -> Result<wgpu::Texture> {
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(CanvasError::Geometry(format!(
                "expected {expected} bytes for {width}x{height} RGBA, got {}",
                data.len()
            )));
        }
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("sampled texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: TARGET_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        self.queue.write_texture(
            texture.as_image_copy(),
            data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(width * 4),
                rows_per_image: Some(height),
            },
            size,
        );
        Ok(texture)
    }
}

fn create_targets(
    device: &wgpu::Device,
    width: u32,
    height: u32,
    attrs: ContextAttributes,
) -> Targets {
    let size = wgpu::Extent3d {
        width,
        height,
        depth_or_array_layers: 1,
    };

    let target = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("drawing buffer"),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: TARGET_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT
            | wgpu::TextureUsages::COPY_SRC
            | wgpu::TextureUsages::COPY_DST
            | wgpu::TextureUsages::TEXTURE_BINDING,
        view_formats: &[],
    });
    let target_view = target.create_view(&wgpu::TextureViewDescriptor::default());

    let msaa_view = attrs.antialias.then(|| {
        device
            .create_texture(&wgpu::TextureDescriptor {
                label: Some("msaa color target"),
                size,
                mip_level_count: 1,
                sample_count: MSAA_SAMPLES,
                dimension: wgpu::TextureDimension::D2,
                format: TARGET_FORMAT,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                view_formats: &[],
            })
            .create_view(&wgpu::TextureViewDescriptor::default())
    });

    let depth_view = attrs.depth.then(|| {
        device
            .create_texture(&wgpu::TextureDescriptor {
                label: Some("depth buffer"),
                size,
                mip_level_count: 1,
                sample_count: if attrs.antialias { MSAA_SAMPLES } else { 1 },
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Depth32Float,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                view_formats: &[],
            })
            .create_view(&wgpu::TextureViewDescriptor::default())
    });

    let padded = (width * 4).next_multiple_of(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT);
    let staging = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("readback staging"),
        size: u64::from(padded) * u64::from(height),
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    Targets {
        target,
        target_view,
        msaa_view,
        depth_view,
        staging,
    }
}
