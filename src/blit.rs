//! GPU-to-raster reconciliation.
//!
//! GPU framebuffers and top-down raster images disagree on row order: the
//! GPU read API hands back rows bottom-to-top (`glReadPixels` convention),
//! while every image encoder wants row 0 at the top. This module is the one
//! place that disagreement is corrected - skip it and every exported image
//! comes out upside down, silently.

use crate::error::{CanvasError, Result};
use crate::gpu::GpuContext;
use crate::raster::{Context2d, ImageData};

/// Copy the GPU drawing buffer into the 2D raster surface, flipping rows.
///
/// Reads the full framebuffer from `gpu`, reorders it top-down, and writes
/// it back through `ctx` at `(0, 0)`. Mutates the raster surface in place;
/// the GPU context's own state is untouched.
///
/// The caller is responsible for the precondition that the surface and the
/// drawing buffer agree on dimensions; a mismatch surfaces as a geometry
/// error from the copy itself.
pub fn reconcile(gpu: &GpuContext, ctx: &Context2d) -> Result<()> {
    let width = ctx.width();
    let height = ctx.height();
    let mut data = ctx.get_image_data(0, 0, width, height)?;
    let pixels = gpu.read_pixels()?;
    copy_flipped(&pixels, &mut data)?;
    ctx.put_image_data(&data, 0, 0)
}

/// Flip a bottom-to-top RGBA row stream into a top-down image block.
///
/// For every destination row `i`, the 4 channel bytes of each column are
/// taken from source row `height - i - 1`. Kept as an explicit double loop:
/// the row-index arithmetic is the part worth being able to read and test
/// in isolation.
#[allow(clippy::indexing_slicing)] // indices bounded by the length check above the loops
pub fn copy_flipped(src: &[u8], dst: &mut ImageData) -> Result<()> {
    let width = dst.width() as usize;
    let height = dst.height() as usize;
    let expected = width * height * 4;
    if src.len() != expected {
        return Err(CanvasError::Geometry(format!(
            "source has {} bytes, destination {}x{} needs {expected}",
            src.len(),
            dst.width(),
            dst.height()
        )));
    }

    let out = dst.data_mut();
    for i in 0..height {
        let src_row = height - i - 1;
        for j in 0..width {
            let s = 4 * (src_row * width + j);
            let d = 4 * (i * width + j);
            for k in 0..4 {
                out[d + k] = src[s + k];
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::cast_possible_truncation
)]
mod tests {
    use super::*;

    /// Build a bottom-to-top row stream where every byte of row `r` is `r`.
    fn row_tagged_stream(width: usize, height: usize) -> Vec<u8> {
        let mut src = Vec::with_capacity(width * height * 4);
        for row in 0..height {
            src.extend(std::iter::repeat_n(row as u8, width * 4));
        }
        src
    }

    #[test]
    fn bottom_row_of_stream_becomes_bottom_of_image() {
        let (width, height) = (3_usize, 4_usize);
        let src = row_tagged_stream(width, height);
        let mut dst = ImageData::new(3, 4);

        copy_flipped(&src, &mut dst).unwrap();

        // Source row 0 is the bottom scanline; it must land on the last
        // destination row, and the top of the image must hold row 3.
        let data = dst.data();
        assert!(data[..width * 4].iter().all(|&b| b == 3));
        assert!(data[(height - 1) * width * 4..].iter().all(|&b| b == 0));
    }

    #[test]
    fn flip_is_an_involution() {
        let (width, height) = (5_u32, 3_u32);
        let src: Vec<u8> = (0..width * height * 4).map(|i| (i % 251) as u8).collect();

        let mut once = ImageData::new(width, height);
        copy_flipped(&src, &mut once).unwrap();
        let mut twice = ImageData::new(width, height);
        copy_flipped(once.data(), &mut twice).unwrap();

        assert_eq!(twice.data(), src.as_slice());
    }

    #[test]
    fn single_pixel_lands_at_mirrored_row_same_column() {
        let (width, height) = (4_usize, 4_usize);
        let mut src = vec![0_u8; width * height * 4];
        // One white pixel at stream row 1, column 2.
        let s = 4 * (width + 2);
        src[s..s + 4].copy_from_slice(&[255, 255, 255, 255]);

        let mut dst = ImageData::new(4, 4);
        copy_flipped(&src, &mut dst).unwrap();

        // height - 1 - 1 = destination row 2, same column.
        let d = 4 * (2 * width + 2);
        assert_eq!(&dst.data()[d..d + 4], &[255, 255, 255, 255]);
        assert_eq!(&dst.data()[s..s + 4], &[0, 0, 0, 0]);
    }

    #[test]
    fn length_mismatch_is_rejected() {
        let src = vec![0_u8; 12];
        let mut dst = ImageData::new(2, 2);
        assert!(matches!(
            copy_flipped(&src, &mut dst),
            Err(CanvasError::Geometry(_))
        ));
    }
}
