//! Structured error types for vcanvas.
//!
//! Context-conflict on `get_context` is deliberately NOT an error - it is an
//! absent-context return, mirroring DOM canvas behavior. Everything that can
//! actually fail (GPU acquisition, readback, codecs, I/O) lands here.

/// All errors that can occur while driving a virtual canvas.
#[derive(Debug, thiserror::Error)]
pub enum CanvasError {
    /// No suitable GPU adapter was found for the headless context.
    #[error("No suitable GPU adapter: {0}")]
    Adapter(String),

    /// GPU device creation failed after an adapter was found.
    #[error("GPU device: {0}")]
    Device(String),

    /// Framebuffer readback (copy, map, or poll) failed.
    #[error("GPU readback: {0}")]
    Readback(String),

    /// Image encode/decode error from the `image` crate.
    #[error("Image codec: {0}")]
    Image(#[from] image::ImageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Image-data rectangle does not fit the surface it is applied to.
    #[error("Image data geometry: {0}")]
    Geometry(String),

    /// Catch-all for string errors.
    #[error("{0}")]
    Other(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, CanvasError>;

impl From<String> for CanvasError {
    fn from(s: String) -> Self {
        Self::Other(s)
    }
}

impl From<&str> for CanvasError {
    fn from(s: &str) -> Self {
        Self::Other(s.to_string())
    }
}
