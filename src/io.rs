//! File IO: template asset loading, photo upload embedding, PNG writing.
//!
//! Everything here is called from background jobs; the functions take owned
//! paths and return owned results so no UI state crosses the thread boundary.

use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use image::RgbaImage;

use crate::svg::ParseError;

/// File extensions offered by the photo-upload picker.
pub const UPLOAD_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "bmp"];

/// Side of the square thumbnail kept for editor and gallery display.
pub const THUMBNAIL_SIZE: u32 = 160;

/// Errors of the template-load pipeline.
#[derive(Debug)]
pub enum LoadError {
    /// The asset file could not be read.
    Fetch(String),
    /// The asset was read but its markup did not parse.
    Parse(ParseError),
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadError::Fetch(e) => write!(f, "Failed to load template: {}", e),
            LoadError::Parse(e) => write!(f, "Failed to parse template: {}", e),
        }
    }
}

impl From<ParseError> for LoadError {
    fn from(e: ParseError) -> Self {
        LoadError::Parse(e)
    }
}

/// Read a template asset's raw markup from disk.
pub fn load_template_markup(path: &Path) -> Result<String, LoadError> {
    std::fs::read_to_string(path)
        .map_err(|e| LoadError::Fetch(format!("{}: {}", path.display(), e)))
}

/// A decoded photo upload, ready for substitution and editor display.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    /// `data:{mime};base64,...` embedding of the original file bytes.
    pub data_uri: String,
    /// Downscaled copy for the zone editor's thumbnail.
    pub thumbnail: RgbaImage,
}

/// Read and validate a picked photo, embedding it as a `data:` URI.
///
/// The original bytes are embedded untouched; decoding is only used to
/// reject non-images and to build the thumbnail.
pub fn load_uploaded_image(path: &Path) -> Result<UploadedImage, String> {
    let bytes =
        std::fs::read(path).map_err(|e| format!("Cannot read {}: {}", path.display(), e))?;
    let format = image::guess_format(&bytes)
        .map_err(|e| format!("Unrecognized image file: {}", e))?;
    let decoded = image::load_from_memory(&bytes)
        .map_err(|e| format!("Cannot decode image: {}", e))?;

    let mime = match format {
        image::ImageFormat::Png => "image/png",
        image::ImageFormat::Jpeg => "image/jpeg",
        image::ImageFormat::WebP => "image/webp",
        image::ImageFormat::Bmp => "image/bmp",
        other => return Err(format!("Unsupported image format: {:?}", other)),
    };

    Ok(UploadedImage {
        data_uri: format!("data:{};base64,{}", mime, BASE64.encode(&bytes)),
        thumbnail: decoded
            .thumbnail(THUMBNAIL_SIZE, THUMBNAIL_SIZE)
            .into_rgba8(),
    })
}

/// Write encoded PNG bytes to disk, creating parent directories as needed.
pub fn write_png(path: &Path, png: &[u8]) -> Result<PathBuf, String> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .map_err(|e| format!("Cannot create {}: {}", parent.display(), e))?;
    }
    std::fs::write(path, png).map_err(|e| format!("Cannot write {}: {}", path.display(), e))?;
    Ok(path.to_path_buf())
}
