//! vcanvas - headless virtual canvas
//!
//! A DOM-compatible drawing surface for processes with no display:
//! - Impersonates a canvas element (attributes, events, sizing, `getContext`)
//! - Lazy, once-only context binding: 2D raster or WebGL-style GPU, never both
//! - GPU output reconciled into the raster surface on serialization, with
//!   the mandatory vertical flip applied in one tested place
//! - PNG / JPEG / data-URL export via the raster encoder
//!
//! Everything is synchronous and single-threaded; a canvas is not meant to
//! be shared across threads (contexts alias it through `Rc`).
//!
//! # Usage
//!
//! ```no_run
//! use vcanvas::{create_canvas, ContextKind, RenderingContext};
//!
//! # fn main() -> vcanvas::Result<()> {
//! let mut canvas = create_canvas(512, 512);
//! let Some(RenderingContext::Gl(gl)) = canvas.get_context(ContextKind::WebGl)? else {
//!     return Err("context already bound".into());
//! };
//! gl.borrow().clear(0.0, 0.5, 1.0, 1.0);
//! let png = canvas.to_png()?;
//! # let _ = png;
//! # Ok(())
//! # }
//! ```

pub mod attrs;
pub mod blit;
pub mod canvas;
pub mod error;
pub mod events;
pub mod gpu;
pub mod raster;
pub mod scene;
pub mod texture;

pub use attrs::AttrValue;
pub use canvas::{ContextKind, RenderingContext, VirtualCanvas};
pub use error::{CanvasError, Result};
pub use events::{Event, EventTarget, Listener};
pub use gpu::{ContextAttributes, GpuContext};
pub use raster::{Context2d, EncodeFormat, ImageData, RasterSurface};
pub use texture::{load_texture, TextureData};

/// Construct a virtual canvas with the given dimensions.
///
/// No context is bound yet; attributes, listeners, and style start empty.
pub fn create_canvas(width: u32, height: u32) -> VirtualCanvas {
    VirtualCanvas::new(width, height)
}

/// Get the library version
#[must_use]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
