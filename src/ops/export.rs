//! Raster export: composed SVG markup → fixed-size PNG.
//!
//! The whole conversion is a pure function over the staged [`ExportRequest`],
//! so it can run on a background worker without touching session state. All
//! intermediate buffers (usvg tree, pixmap, RGBA copy) are owned values and
//! are released on every exit path, including render failure.

use std::time::{SystemTime, UNIX_EPOCH};

use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder};
use resvg::tiny_skia;
use uuid::Uuid;

use crate::session::{ExportRequest, GeneratedGraphic};

/// Fixed export resolution. Output is always exactly this size regardless of
/// the template's own dimensions or the on-screen preview scale.
pub const CANVAS_WIDTH: u32 = 1080;
pub const CANVAS_HEIGHT: u32 = 1080;

/// Errors of the export pipeline.
#[derive(Debug)]
pub enum ExportError {
    /// Generate was triggered before any preview composition existed.
    NoPreview,
    /// An export is already in flight; the trigger was ignored.
    Busy,
    /// The composed markup could not be rendered to a bitmap.
    Render(String),
    /// PNG encoding of the rendered bitmap failed.
    Encode(String),
}

impl std::fmt::Display for ExportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportError::NoPreview => write!(f, "Nothing to export yet — no preview rendered"),
            ExportError::Busy => write!(f, "An export is already running"),
            ExportError::Render(e) => write!(f, "Failed to render graphic: {}", e),
            ExportError::Encode(e) => write!(f, "Failed to encode PNG: {}", e),
        }
    }
}

/// Run a staged export to completion: render, encode, stamp metadata.
pub fn run(req: ExportRequest) -> Result<GeneratedGraphic, ExportError> {
    let png = render_png(&req.markup)?;
    let created_ms = epoch_millis();
    Ok(GeneratedGraphic {
        id: Uuid::new_v4().to_string(),
        template_id: req.template_id.clone(),
        png,
        created_ms,
        filename: resolve_filename(&req.filename, &req.template_id, created_ms),
    })
}

/// Render markup to a 1080×1080 PNG with an opaque white background.
pub fn render_png(markup: &str) -> Result<Vec<u8>, ExportError> {
    let rgba = rasterize_rgba(markup, CANVAS_WIDTH, CANVAS_HEIGHT)?;
    let mut out = Vec::new();
    PngEncoder::new(&mut out)
        .write_image(&rgba, CANVAS_WIDTH, CANVAS_HEIGHT, ColorType::Rgba8)
        .map_err(|e| ExportError::Encode(e.to_string()))?;
    Ok(out)
}

/// Rasterize markup onto an opaque-white surface of the given size, scaled
/// to fill it. Returns straight (unpremultiplied) RGBA8 bytes.
///
/// Transparent template regions come out white, so an export can never carry
/// unintended transparency.
pub fn rasterize_rgba(markup: &str, width: u32, height: u32) -> Result<Vec<u8>, ExportError> {
    let mut opt = usvg::Options::default();
    opt.fontdb_mut().load_system_fonts();
    let tree = usvg::Tree::from_str(markup, &opt)
        .map_err(|e| ExportError::Render(e.to_string()))?;

    let mut pixmap = tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| ExportError::Render(format!("cannot allocate {}x{} surface", width, height)))?;
    pixmap.fill(tiny_skia::Color::WHITE);

    let size = tree.size();
    let sx = width as f32 / size.width();
    let sy = height as f32 / size.height();
    resvg::render(
        &tree,
        tiny_skia::Transform::from_scale(sx, sy),
        &mut pixmap.as_mut(),
    );

    let mut rgba = Vec::with_capacity((width * height * 4) as usize);
    for px in pixmap.pixels() {
        let c = px.demultiply();
        rgba.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }
    Ok(rgba)
}

/// Resolve the output filename: blank input defaults to
/// `{templateId}-{timestamp}`, and `.png` is appended when absent.
pub fn resolve_filename(raw: &str, template_id: &str, created_ms: u64) -> String {
    let base = raw.trim();
    let name = if base.is_empty() {
        format!("{}-{}", template_id, created_ms)
    } else {
        base.to_string()
    };
    if name.to_ascii_lowercase().ends_with(".png") {
        name
    } else {
        format!("{}.png", name)
    }
}

pub fn epoch_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
