//! Renderer boundary: the scene drawing layer is a black box that can hand
//! back frames. Which technology draws (WebGL context, plugin runtime, DOM)
//! is invisible to the capture pipeline.

use async_trait::async_trait;

use super::error::CaptureError;

/// An encoded bitmap. All capture strategies produce the same encoding
/// (PNG), so callers cannot tell which strategy produced the result.
#[derive(Debug, Clone)]
pub struct Bitmap {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl Bitmap {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// A raw pixel readback straight from the graphics context, RGBA8, origin
/// top-left.
#[derive(Debug, Clone)]
pub struct RawFrame {
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Handle onto a live renderer.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RendererPort: Send + Sync {
    /// Current drawing surface size in pixels.
    fn surface_size(&self) -> (u32, u32);

    /// Redraw the scene at the requested resolution and return the encoded
    /// frame. Implementations restore their previous resolution and redraw
    /// before returning.
    async fn render_at(&self, width: u32, height: u32) -> Result<Vec<u8>, CaptureError>;

    /// Low-level pixel buffer readback of the current frame, without a
    /// redraw. May return warm-up garbage; callers must blank-check it.
    async fn read_raw_frame(&self) -> Result<RawFrame, CaptureError>;

    /// Rasterize the whole document subtree hosting the renderer. Last
    /// resort when the graphics context will not cooperate.
    async fn rasterize_document(&self) -> Result<Vec<u8>, CaptureError>;
}
