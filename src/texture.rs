//! Texture loading for renderer collaborators.
//!
//! A single attempt, success or failure - decode errors surface to the
//! caller, there is no retry policy. Decoding is delegated to the `image`
//! crate; anything it can open becomes RGBA8.

use crate::error::Result;
use crate::gpu::GpuContext;
use std::path::Path;

/// Decoded RGBA8 pixel data, row-major, top-down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureData {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// RGBA bytes, `width * height * 4`.
    pub rgba: Vec<u8>,
}

/// Decode an image file into RGBA8 pixel data.
pub fn load_texture(path: impl AsRef<Path>) -> Result<TextureData> {
    let path = path.as_ref();
    let image = image::open(path)?.to_rgba8();
    log::debug!(
        "loaded texture {} ({}x{})",
        path.display(),
        image.width(),
        image.height()
    );
    Ok(TextureData {
        width: image.width(),
        height: image.height(),
        rgba: image.into_raw(),
    })
}

impl TextureData {
    /// Procedural checkerboard, `cells` squares per side.
    ///
    /// Stand-in for the demo's texture asset when no file is supplied.
    pub fn checkerboard(size: u32, cells: u32) -> Self {
        let cell = (size / cells.max(1)).max(1);
        let mut rgba = Vec::with_capacity(size as usize * size as usize * 4);
        for y in 0..size {
            for x in 0..size {
                let on = ((x / cell) + (y / cell)) % 2 == 0;
                let v = if on { 255 } else { 96 };
                rgba.extend_from_slice(&[v, v, v, 255]);
            }
        }
        Self {
            width: size,
            height: size,
            rgba,
        }
    }

    /// Upload as a sampled GPU texture.
    pub fn upload(&self, gpu: &GpuContext) -> Result<wgpu::Texture> {
        gpu.create_texture_rgba(self.width, self.height, &self.rgba)
    }
}
