//! Shared helpers for vcanvas integration tests.
//!
//! GPU-backed tests need a real wgpu adapter. On machines without one the
//! tests skip with a note instead of failing, unless `VCANVAS_REQUIRE_GPU`
//! is set, in which case a missing adapter is a hard failure.
#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]

use std::cell::RefCell;
use std::rc::Rc;
use vcanvas::{
    create_canvas, CanvasError, ContextAttributes, ContextKind, GpuContext, RenderingContext,
    VirtualCanvas,
};

pub fn require_gpu() -> bool {
    let Ok(raw) = std::env::var("VCANVAS_REQUIRE_GPU") else {
        return false;
    };

    let v = raw.trim();
    v == "1"
        || v.eq_ignore_ascii_case("true")
        || v.eq_ignore_ascii_case("yes")
        || v.eq_ignore_ascii_case("on")
}

pub fn skip_or_panic(test_name: &str, reason: &str) {
    if require_gpu() {
        panic!("VCANVAS_REQUIRE_GPU is enabled but {test_name} cannot run: {reason}");
    }
    eprintln!("skipping {test_name}: {reason}");
}

/// Build a canvas bound to a WebGL context, or `None` when no adapter exists.
pub fn gpu_canvas(
    test_name: &str,
    width: u32,
    height: u32,
) -> Option<(VirtualCanvas, Rc<RefCell<GpuContext>>)> {
    gpu_canvas_with(test_name, width, height, ContextAttributes::default())
}

/// Like [`gpu_canvas`] but with explicit context attributes.
pub fn gpu_canvas_with(
    test_name: &str,
    width: u32,
    height: u32,
    attrs: ContextAttributes,
) -> Option<(VirtualCanvas, Rc<RefCell<GpuContext>>)> {
    let mut canvas = create_canvas(width, height);
    match canvas.get_context_with(ContextKind::WebGl, attrs) {
        Ok(Some(RenderingContext::Gl(gl))) => Some((canvas, gl)),
        Ok(_) => panic!("fresh canvas refused a webgl context"),
        Err(CanvasError::Adapter(reason)) | Err(CanvasError::Device(reason)) => {
            skip_or_panic(test_name, &reason);
            None
        }
        Err(e) => panic!("webgl context creation failed: {e}"),
    }
}

/// Decode a PNG buffer into (width, height, RGBA bytes).
pub fn decode_png(buffer: &[u8]) -> (u32, u32, Vec<u8>) {
    let image = image::load_from_memory(buffer)
        .expect("canvas produced an undecodable PNG")
        .to_rgba8();
    (image.width(), image.height(), image.into_raw())
}

/// Fetch the RGBA bytes of pixel `(x, y)` from a decoded image.
pub fn pixel_at(width: u32, data: &[u8], x: u32, y: u32) -> [u8; 4] {
    let idx = ((y * width + x) * 4) as usize;
    [data[idx], data[idx + 1], data[idx + 2], data[idx + 3]]
}
