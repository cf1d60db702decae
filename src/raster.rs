//! 2D raster surface: pixel storage, image-data access, and encoding.
//!
//! This is the "plain canvas" half of the virtual canvas - an RGBA8 pixel
//! store with DOM-flavored `get_image_data`/`put_image_data` access. It draws
//! nothing itself; encoding is delegated to the `image` crate.

use crate::error::{CanvasError, Result};
use std::cell::RefCell;
use std::io::Cursor;
use std::rc::Rc;

/// Output encodings supported by the raster surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeFormat {
    /// Lossless PNG.
    Png,
    /// JPEG at the given quality (1-100). Alpha is dropped.
    Jpeg {
        /// Encoder quality, 1-100.
        quality: u8,
    },
}

impl EncodeFormat {
    /// MIME type string for data-URL export.
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg { .. } => "image/jpeg",
        }
    }
}

/// A rectangular block of RGBA8 pixels, row-major, top-down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl ImageData {
    /// Allocate a zeroed (transparent black) block.
    pub fn new(width: u32, height: u32) -> Self {
        let len = width as usize * height as usize * 4;
        Self {
            width,
            height,
            data: vec![0; len],
        }
    }

    /// Wrap an existing RGBA byte vector, validating its length.
    pub fn from_vec(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(CanvasError::Geometry(format!(
                "expected {expected} bytes for {width}x{height} RGBA, got {}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Block width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Block height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw RGBA bytes, row-major, top-down.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Mutable raw RGBA bytes.
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

/// An RGBA8 raster surface with direct pixel access and image encoding.
///
/// Fresh surfaces (and resized ones) are transparent black, matching a DOM
/// canvas, which resets its backing store whenever `width` or `height` is
/// assigned.
#[derive(Debug)]
pub struct RasterSurface {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl RasterSurface {
    /// Allocate a zeroed surface.
    pub fn new(width: u32, height: u32) -> Self {
        let len = width as usize * height as usize * 4;
        Self {
            width,
            height,
            pixels: vec![0; len],
        }
    }

    /// Surface width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Surface height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw RGBA bytes, row-major, top-down.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Reallocate to the new size, clearing all content.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.pixels = vec![0; width as usize * height as usize * 4];
    }

    fn check_rect(&self, x: u32, y: u32, width: u32, height: u32) -> Result<()> {
        let fits_x = x.checked_add(width).is_some_and(|right| right <= self.width);
        let fits_y = y
            .checked_add(height)
            .is_some_and(|bottom| bottom <= self.height);
        if fits_x && fits_y {
            Ok(())
        } else {
            Err(CanvasError::Geometry(format!(
                "rect {width}x{height}+{x}+{y} outside {}x{} surface",
                self.width, self.height
            )))
        }
    }

    /// Copy the given rect out of the surface.
    #[allow(clippy::indexing_slicing)] // ranges are bounds-checked by check_rect
    pub fn get_image_data(&self, x: u32, y: u32, width: u32, height: u32) -> Result<ImageData> {
        self.check_rect(x, y, width, height)?;
        let mut out = ImageData::new(width, height);
        let row_bytes = width as usize * 4;
        let surface_stride = self.width as usize * 4;
        for row in 0..height as usize {
            let src = (y as usize + row) * surface_stride + x as usize * 4;
            let dst = row * row_bytes;
            out.data_mut()[dst..dst + row_bytes]
                .copy_from_slice(&self.pixels[src..src + row_bytes]);
        }
        Ok(out)
    }

    /// Write the given block into the surface at `(x, y)`.
    #[allow(clippy::indexing_slicing)] // ranges are bounds-checked by check_rect
    pub fn put_image_data(&mut self, data: &ImageData, x: u32, y: u32) -> Result<()> {
        self.check_rect(x, y, data.width(), data.height())?;
        let row_bytes = data.width() as usize * 4;
        let surface_stride = self.width as usize * 4;
        for row in 0..data.height() as usize {
            let dst = (y as usize + row) * surface_stride + x as usize * 4;
            let src = row * row_bytes;
            self.pixels[dst..dst + row_bytes].copy_from_slice(&data.data()[src..src + row_bytes]);
        }
        Ok(())
    }

    /// Encode the surface contents via the `image` crate.
    pub fn encode(&self, format: EncodeFormat) -> Result<Vec<u8>> {
        let image = image::RgbaImage::from_raw(self.width, self.height, self.pixels.clone())
            .ok_or_else(|| {
                CanvasError::Geometry("pixel buffer does not match surface dimensions".to_string())
            })?;
        let mut out = Cursor::new(Vec::new());
        match format {
            EncodeFormat::Png => {
                image::DynamicImage::ImageRgba8(image)
                    .write_to(&mut out, image::ImageFormat::Png)?;
            }
            EncodeFormat::Jpeg { quality } => {
                let rgb = image::DynamicImage::ImageRgba8(image).to_rgb8();
                let mut encoder =
                    image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, quality);
                encoder.encode(
                    rgb.as_raw(),
                    self.width,
                    self.height,
                    image::ExtendedColorType::Rgb8,
                )?;
            }
        }
        Ok(out.into_inner())
    }
}

/// A 2D drawing context handle sharing the canvas's raster surface.
///
/// This is what `get_context("2d")` hands out. It aliases the surface rather
/// than owning it, so pixels written through the context are visible to the
/// canvas's encoders and vice versa.
#[derive(Clone)]
pub struct Context2d {
    surface: Rc<RefCell<RasterSurface>>,
}

impl Context2d {
    pub(crate) fn new(surface: Rc<RefCell<RasterSurface>>) -> Self {
        Self { surface }
    }

    /// Width of the backing surface.
    pub fn width(&self) -> u32 {
        self.surface.borrow().width()
    }

    /// Height of the backing surface.
    pub fn height(&self) -> u32 {
        self.surface.borrow().height()
    }

    /// Copy a rect out of the backing surface.
    pub fn get_image_data(&self, x: u32, y: u32, width: u32, height: u32) -> Result<ImageData> {
        self.surface.borrow().get_image_data(x, y, width, height)
    }

    /// Write a block into the backing surface at `(x, y)`.
    pub fn put_image_data(&self, data: &ImageData, x: u32, y: u32) -> Result<()> {
        self.surface.borrow_mut().put_image_data(data, x, y)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn fresh_surface_is_transparent_black() {
        let surface = RasterSurface::new(4, 3);
        assert_eq!(surface.pixels().len(), 4 * 3 * 4);
        assert!(surface.pixels().iter().all(|&b| b == 0));
    }

    #[test]
    fn image_data_round_trips_through_surface() {
        let mut surface = RasterSurface::new(8, 8);
        let block = ImageData::from_vec(2, 2, vec![255; 16]).unwrap();
        surface.put_image_data(&block, 3, 4).unwrap();

        let read = surface.get_image_data(3, 4, 2, 2).unwrap();
        assert_eq!(read, block);

        // Neighboring pixels untouched.
        let neighbor = surface.get_image_data(0, 0, 1, 1).unwrap();
        assert_eq!(neighbor.data(), &[0, 0, 0, 0]);
    }

    #[test]
    fn out_of_bounds_rect_is_rejected() {
        let surface = RasterSurface::new(4, 4);
        assert!(matches!(
            surface.get_image_data(2, 0, 3, 1),
            Err(crate::error::CanvasError::Geometry(_))
        ));

        let mut surface = RasterSurface::new(4, 4);
        let block = ImageData::new(2, 2);
        assert!(surface.put_image_data(&block, 3, 3).is_err());
    }

    #[test]
    fn from_vec_validates_length() {
        assert!(ImageData::from_vec(2, 2, vec![0; 15]).is_err());
        assert!(ImageData::from_vec(2, 2, vec![0; 16]).is_ok());
    }

    #[test]
    fn resize_clears_content() {
        let mut surface = RasterSurface::new(2, 2);
        let block = ImageData::from_vec(2, 2, vec![9; 16]).unwrap();
        surface.put_image_data(&block, 0, 0).unwrap();

        surface.resize(3, 3);
        assert_eq!(surface.width(), 3);
        assert!(surface.pixels().iter().all(|&b| b == 0));
    }

    #[test]
    fn png_encode_decodes_back_to_same_pixels() {
        let mut surface = RasterSurface::new(3, 2);
        let block = ImageData::from_vec(
            3,
            2,
            vec![
                255, 0, 0, 255, 0, 255, 0, 255, 0, 0, 255, 255, //
                255, 255, 0, 255, 0, 255, 255, 255, 255, 0, 255, 255,
            ],
        )
        .unwrap();
        surface.put_image_data(&block, 0, 0).unwrap();

        let png = surface.encode(EncodeFormat::Png).unwrap();
        let decoded = image::load_from_memory(&png).unwrap().to_rgba8();
        assert_eq!(decoded.width(), 3);
        assert_eq!(decoded.height(), 2);
        assert_eq!(decoded.as_raw().as_slice(), surface.pixels());
    }

    #[test]
    fn jpeg_encode_produces_a_jfif_stream() {
        let surface = RasterSurface::new(4, 4);
        let jpeg = surface.encode(EncodeFormat::Jpeg { quality: 80 }).unwrap();
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]); // SOI marker
    }

    #[test]
    fn context_handle_aliases_the_surface() {
        let surface = Rc::new(RefCell::new(RasterSurface::new(2, 2)));
        let ctx = Context2d::new(Rc::clone(&surface));

        let block = ImageData::from_vec(1, 1, vec![1, 2, 3, 4]).unwrap();
        ctx.put_image_data(&block, 1, 1).unwrap();

        assert_eq!(
            surface.borrow().get_image_data(1, 1, 1, 1).unwrap().data(),
            &[1, 2, 3, 4]
        );
    }
}
