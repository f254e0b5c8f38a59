//! Scene capture with cascading fallback.
//!
//! The embedded renderer may not have initialized yet, may return
//! transparent/black frames during warm-up, or may be absent entirely in
//! some deployments. Capture therefore runs an ordered list of strategies
//! with uniform `Result` signaling - first success wins, no retry within a
//! strategy, and callers cannot tell which strategy produced the bitmap:
//!
//! 1. direct renderer readback at the target resolution,
//! 2. raw pixel-buffer readback (blank-checked, then encoded),
//! 3. a placeholder synthesized from the avatar configuration,
//! 4. whole-document rasterization.

use std::io::Cursor;
use std::sync::Arc;

use image::{ImageFormat, Rgba, RgbaImage};
use tokio::sync::RwLock;

use blockhome_domain::{Accessory, AvatarConfig, BodyStyle, Expression, Weather};

use crate::infrastructure::ports::{Bitmap, CaptureError, RawFrame, RendererPort};

/// Target resolution: ~1024px on the long edge, aspect preserved.
pub const CAPTURE_LONG_EDGE: u32 = 1024;

/// Frames below this byte count are warm-up garbage, not scenes.
const MIN_FRAME_BYTES: usize = 1024;

const PLACEHOLDER_WIDTH: u32 = 1024;
const PLACEHOLDER_HEIGHT: u32 = 768;

/// Capture front-end holding the (optional) live renderer handle.
pub struct SceneCapturer {
    renderer: RwLock<Option<Arc<dyn RendererPort>>>,
}

impl SceneCapturer {
    pub fn new() -> Self {
        Self {
            renderer: RwLock::new(None),
        }
    }

    /// Register the live renderer handle once the scene is up.
    pub async fn register(&self, renderer: Arc<dyn RendererPort>) {
        let (w, h) = renderer.surface_size();
        tracing::info!(width = w, height = h, "Renderer handle registered for capture");
        *self.renderer.write().await = Some(renderer);
    }

    pub async fn clear(&self) {
        *self.renderer.write().await = None;
    }

    pub async fn has_renderer(&self) -> bool {
        self.renderer.read().await.is_some()
    }

    /// Produce one bitmap of the current visual state.
    pub async fn capture(&self, avatar: &AvatarConfig) -> Result<Bitmap, CaptureError> {
        let renderer = self.renderer.read().await.clone();

        if let Some(renderer) = &renderer {
            match self.direct_readback(renderer.as_ref()).await {
                Ok(bitmap) => return Ok(bitmap),
                Err(e) => tracing::warn!(error = %e, "Direct renderer readback failed"),
            }
            match self.raw_frame_readback(renderer.as_ref()).await {
                Ok(bitmap) => return Ok(bitmap),
                Err(e) => tracing::warn!(error = %e, "Raw frame readback failed"),
            }
        } else {
            tracing::debug!("No renderer handle registered, skipping readback strategies");
        }

        match synthesize_placeholder(avatar) {
            Ok(bitmap) => {
                tracing::info!("Capture fell back to a synthesized placeholder");
                return Ok(bitmap);
            }
            Err(e) => tracing::warn!(error = %e, "Placeholder synthesis failed"),
        }

        if let Some(renderer) = &renderer {
            match self.document_rasterization(renderer.as_ref()).await {
                Ok(bitmap) => return Ok(bitmap),
                Err(e) => tracing::warn!(error = %e, "Document rasterization failed"),
            }
        }

        Err(CaptureError::Exhausted)
    }

    async fn direct_readback(
        &self,
        renderer: &dyn RendererPort,
    ) -> Result<Bitmap, CaptureError> {
        let (width, height) = renderer.surface_size();
        if width == 0 || height == 0 {
            return Err(CaptureError::Readback("surface has zero area".to_string()));
        }
        let (target_w, target_h) = scale_to_long_edge(width, height, CAPTURE_LONG_EDGE);
        let bytes = renderer.render_at(target_w, target_h).await?;
        if bytes.len() < MIN_FRAME_BYTES {
            return Err(CaptureError::BlankFrame(bytes.len()));
        }
        Ok(Bitmap {
            bytes,
            width: target_w,
            height: target_h,
        })
    }

    async fn raw_frame_readback(
        &self,
        renderer: &dyn RendererPort,
    ) -> Result<Bitmap, CaptureError> {
        let frame = renderer.read_raw_frame().await?;
        if is_blank_frame(&frame) {
            return Err(CaptureError::BlankFrame(frame.pixels.len()));
        }
        encode_rgba_png(frame)
    }

    async fn document_rasterization(
        &self,
        renderer: &dyn RendererPort,
    ) -> Result<Bitmap, CaptureError> {
        let bytes = renderer.rasterize_document().await?;
        if bytes.len() < MIN_FRAME_BYTES {
            return Err(CaptureError::BlankFrame(bytes.len()));
        }
        let decoded = image::load_from_memory(&bytes)
            .map_err(|e| CaptureError::Encode(e.to_string()))?;
        Ok(Bitmap {
            width: decoded.width(),
            height: decoded.height(),
            bytes,
        })
    }
}

impl Default for SceneCapturer {
    fn default() -> Self {
        Self::new()
    }
}

/// Scale (width, height) so the long edge hits `target`, aspect preserved.
fn scale_to_long_edge(width: u32, height: u32, target: u32) -> (u32, u32) {
    if width >= height {
        let scaled = ((target as u64 * height as u64) / width as u64).max(1) as u32;
        (target, scaled)
    } else {
        let scaled = ((target as u64 * width as u64) / height as u64).max(1) as u32;
        (scaled, target)
    }
}

/// Warm-up frames come back tiny, fully transparent, or as a single flat
/// color. Any of those counts as blank.
fn is_blank_frame(frame: &RawFrame) -> bool {
    if frame.pixels.len() < MIN_FRAME_BYTES || frame.pixels.len() < 4 {
        return true;
    }
    let first: [u8; 4] = [
        frame.pixels[0],
        frame.pixels[1],
        frame.pixels[2],
        frame.pixels[3],
    ];
    let uniform = frame.pixels.chunks_exact(4).all(|px| px == first);
    let transparent = frame
        .pixels
        .chunks_exact(4)
        .all(|px| px[3] == 0);
    uniform || transparent
}

fn encode_rgba_png(frame: RawFrame) -> Result<Bitmap, CaptureError> {
    let RawFrame {
        pixels,
        width,
        height,
    } = frame;
    let img = RgbaImage::from_raw(width, height, pixels)
        .ok_or_else(|| CaptureError::Encode("pixel buffer size mismatch".to_string()))?;
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(|e| CaptureError::Encode(e.to_string()))?;
    Ok(Bitmap {
        bytes,
        width,
        height,
    })
}

/// Draw an approximation of the avatar when no renderer can supply a frame:
/// sky, ground band, a blob body in the configured color, accessory and
/// expression marks, light weather strokes.
pub fn synthesize_placeholder(avatar: &AvatarConfig) -> Result<Bitmap, CaptureError> {
    let width = PLACEHOLDER_WIDTH;
    let height = PLACEHOLDER_HEIGHT;
    let sky = avatar.time_of_day.sky_rgb();
    let mut img = RgbaImage::from_pixel(width, height, Rgba([sky[0], sky[1], sky[2], 255]));

    // Ground band over the lower third.
    let ground = avatar.ground.surface_rgb();
    let horizon = height * 2 / 3;
    for y in horizon..height {
        for x in 0..width {
            img.put_pixel(x, y, Rgba([ground[0], ground[1], ground[2], 255]));
        }
    }

    // Body proportions by style.
    let (rx, ry): (i64, i64) = match avatar.body_style {
        BodyStyle::Normal => (170, 150),
        BodyStyle::Slim => (130, 170),
        BodyStyle::Chubby => (210, 150),
        BodyStyle::Tall => (150, 210),
    };
    let cx = width as i64 / 2;
    let cy = horizon as i64 - ry / 2;
    let body = avatar.color.rgb();
    fill_ellipse(&mut img, cx, cy, rx, ry, body);

    // Eyes.
    let eye_dx = rx / 3;
    let eye_y = cy - ry / 4;
    let (eye_rx, eye_ry): (i64, i64) = match avatar.expression {
        Expression::Surprised => (18, 18),
        Expression::Angry => (14, 5),
        _ => (12, 12),
    };
    let ink = [20, 20, 20];
    fill_ellipse(&mut img, cx - eye_dx, eye_y, eye_rx, eye_ry, ink);
    fill_ellipse(&mut img, cx + eye_dx, eye_y, eye_rx, eye_ry, ink);

    // Mouth.
    let mouth_y = cy + ry / 3;
    match avatar.expression {
        Expression::Happy => arc_mouth(&mut img, cx, mouth_y, rx / 3, true, ink),
        Expression::Sad | Expression::Angry => arc_mouth(&mut img, cx, mouth_y, rx / 3, false, ink),
        Expression::Surprised => fill_ellipse(&mut img, cx, mouth_y, 20, 26, ink),
        Expression::Neutral => fill_ellipse(&mut img, cx, mouth_y, rx / 3, 5, ink),
    }

    // Accessory marks.
    let accent = avatar.accessory_color.rgb();
    match avatar.accessory {
        Accessory::None => {}
        Accessory::Hat => {
            fill_ellipse(&mut img, cx, cy - ry - 20, rx / 2, 34, accent);
            fill_ellipse(&mut img, cx, cy - ry + 8, rx * 3 / 4, 12, accent);
        }
        Accessory::Glasses => {
            ring(&mut img, cx - eye_dx, eye_y, 26, accent);
            ring(&mut img, cx + eye_dx, eye_y, 26, accent);
        }
        Accessory::Necklace => {
            for i in -3..=3i64 {
                fill_ellipse(&mut img, cx + i * 28, cy + ry - 16, 9, 9, accent);
            }
        }
    }

    // Weather strokes keep the scene honest about its settings.
    match avatar.weather {
        Weather::Rainy => scatter(&mut img, 997, 420, |img, x, y| {
            streak(img, x, y, 14, [120, 144, 210]);
        }),
        Weather::Snowy => scatter(&mut img, 991, 300, |img, x, y| {
            fill_ellipse(img, x as i64, y as i64, 3, 3, [250, 250, 255]);
        }),
        Weather::Clear | Weather::Foggy => {}
    }

    encode_rgba_png(RawFrame {
        pixels: img.into_raw(),
        width,
        height,
    })
}

fn fill_ellipse(img: &mut RgbaImage, cx: i64, cy: i64, rx: i64, ry: i64, rgb: [u8; 3]) {
    if rx <= 0 || ry <= 0 {
        return;
    }
    let (w, h) = (img.width() as i64, img.height() as i64);
    for y in (cy - ry).max(0)..(cy + ry + 1).min(h) {
        for x in (cx - rx).max(0)..(cx + rx + 1).min(w) {
            let dx = (x - cx) as f64 / rx as f64;
            let dy = (y - cy) as f64 / ry as f64;
            if dx * dx + dy * dy <= 1.0 {
                img.put_pixel(x as u32, y as u32, Rgba([rgb[0], rgb[1], rgb[2], 255]));
            }
        }
    }
}

fn ring(img: &mut RgbaImage, cx: i64, cy: i64, r: i64, rgb: [u8; 3]) {
    let (w, h) = (img.width() as i64, img.height() as i64);
    for y in (cy - r).max(0)..(cy + r + 1).min(h) {
        for x in (cx - r).max(0)..(cx + r + 1).min(w) {
            let d2 = (x - cx) * (x - cx) + (y - cy) * (y - cy);
            if d2 <= r * r && d2 >= (r - 4) * (r - 4) {
                img.put_pixel(x as u32, y as u32, Rgba([rgb[0], rgb[1], rgb[2], 255]));
            }
        }
    }
}

fn arc_mouth(img: &mut RgbaImage, cx: i64, cy: i64, half_width: i64, smile: bool, rgb: [u8; 3]) {
    let (w, h) = (img.width() as i64, img.height() as i64);
    for dx in -half_width..=half_width {
        let bend = (dx * dx) / half_width.max(1);
        let y = if smile { cy + bend / 2 } else { cy - bend / 2 };
        for t in 0..4 {
            let (px, py) = (cx + dx, y + t);
            if (0..w).contains(&px) && (0..h).contains(&py) {
                img.put_pixel(px as u32, py as u32, Rgba([rgb[0], rgb[1], rgb[2], 255]));
            }
        }
    }
}

fn streak(img: &mut RgbaImage, x: u32, y: u32, len: u32, rgb: [u8; 3]) {
    let (w, h) = (img.width(), img.height());
    for i in 0..len {
        let (px, py) = (x.saturating_add(i / 3), y.saturating_add(i));
        if px < w && py < h {
            img.put_pixel(px, py, Rgba([rgb[0], rgb[1], rgb[2], 255]));
        }
    }
}

/// Deterministic pseudo-scatter (no RNG dependency for a cosmetic effect).
fn scatter(img: &mut RgbaImage, stride: u32, count: u32, mut draw: impl FnMut(&mut RgbaImage, u32, u32)) {
    let (w, h) = (img.width(), img.height());
    let mut seed: u32 = 7;
    for _ in 0..count {
        seed = seed.wrapping_mul(stride).wrapping_add(101);
        let x = seed % w;
        let y = (seed / w) % h;
        draw(img, x, y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ports::MockRendererPort;

    const PNG_MAGIC: [u8; 4] = [0x89, 0x50, 0x4e, 0x47];

    fn noisy_frame(width: u32, height: u32) -> RawFrame {
        let mut pixels = Vec::with_capacity((width * height * 4) as usize);
        for i in 0..(width * height) {
            pixels.extend_from_slice(&[(i % 251) as u8, (i % 83) as u8, (i % 17) as u8, 255]);
        }
        RawFrame {
            pixels,
            width,
            height,
        }
    }

    #[test]
    fn test_scale_to_long_edge_preserves_aspect() {
        assert_eq!(scale_to_long_edge(2048, 1024, 1024), (1024, 512));
        assert_eq!(scale_to_long_edge(800, 600, 1024), (1024, 768));
        assert_eq!(scale_to_long_edge(600, 800, 1024), (768, 1024));
        assert_eq!(scale_to_long_edge(4096, 16, 1024), (1024, 4));
    }

    #[test]
    fn test_blank_detection() {
        // Uniform color frame is blank.
        let uniform = RawFrame {
            pixels: vec![10; 64 * 64 * 4],
            width: 64,
            height: 64,
        };
        assert!(is_blank_frame(&uniform));

        // Tiny frame is blank regardless of content.
        assert!(is_blank_frame(&noisy_frame(8, 8)));

        // A real-looking frame is not.
        assert!(!is_blank_frame(&noisy_frame(64, 64)));
    }

    #[test]
    fn test_placeholder_is_png_and_varies_with_config() {
        let a = synthesize_placeholder(&AvatarConfig::default()).expect("placeholder");
        assert_eq!(&a.bytes[..4], &PNG_MAGIC);
        assert_eq!(a.width, PLACEHOLDER_WIDTH);

        let config = AvatarConfig {
            color: blockhome_domain::CharacterColor::Red,
            accessory: Accessory::Hat,
            ..AvatarConfig::default()
        };
        let b = synthesize_placeholder(&config).expect("placeholder");
        assert_ne!(a.bytes, b.bytes);
    }

    #[tokio::test]
    async fn test_capture_prefers_direct_readback() {
        let mut renderer = MockRendererPort::new();
        renderer.expect_surface_size().return_const((800u32, 600u32));
        let frame = encode_rgba_png(noisy_frame(1024, 768)).expect("encode").bytes;
        renderer
            .expect_render_at()
            .withf(|w, h| (*w, *h) == (1024, 768))
            .returning(move |_, _| Ok(frame.clone()));
        // Later strategies must not run.
        renderer.expect_read_raw_frame().times(0);
        renderer.expect_rasterize_document().times(0);

        let capturer = SceneCapturer::new();
        capturer.register(std::sync::Arc::new(renderer)).await;
        let bitmap = capturer
            .capture(&AvatarConfig::default())
            .await
            .expect("capture");
        assert_eq!((bitmap.width, bitmap.height), (1024, 768));
    }

    #[tokio::test]
    async fn test_capture_falls_back_to_raw_frame() {
        let mut renderer = MockRendererPort::new();
        renderer.expect_surface_size().return_const((800u32, 600u32));
        renderer
            .expect_render_at()
            .returning(|_, _| Err(CaptureError::Readback("context lost".to_string())));
        renderer
            .expect_read_raw_frame()
            .returning(|| Ok(noisy_frame(640, 480)));

        let capturer = SceneCapturer::new();
        capturer.register(std::sync::Arc::new(renderer)).await;
        let bitmap = capturer
            .capture(&AvatarConfig::default())
            .await
            .expect("capture");
        assert_eq!(&bitmap.bytes[..4], &PNG_MAGIC);
        assert_eq!((bitmap.width, bitmap.height), (640, 480));
    }

    #[tokio::test]
    async fn test_blank_raw_frame_falls_through_to_placeholder() {
        let mut renderer = MockRendererPort::new();
        renderer.expect_surface_size().return_const((800u32, 600u32));
        renderer
            .expect_render_at()
            .returning(|_, _| Err(CaptureError::Readback("warming up".to_string())));
        renderer.expect_read_raw_frame().returning(|| {
            Ok(RawFrame {
                pixels: vec![0; 640 * 480 * 4],
                width: 640,
                height: 480,
            })
        });

        let capturer = SceneCapturer::new();
        capturer.register(std::sync::Arc::new(renderer)).await;
        let bitmap = capturer
            .capture(&AvatarConfig::default())
            .await
            .expect("capture");
        // Placeholder dimensions, not the renderer's.
        assert_eq!((bitmap.width, bitmap.height), (PLACEHOLDER_WIDTH, PLACEHOLDER_HEIGHT));
    }

    #[tokio::test]
    async fn test_capture_without_renderer_synthesizes() {
        let capturer = SceneCapturer::new();
        assert!(!capturer.has_renderer().await);
        let bitmap = capturer
            .capture(&AvatarConfig::default())
            .await
            .expect("capture");
        assert_eq!(&bitmap.bytes[..4], &PNG_MAGIC);
    }
}
