use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{imageops::FilterType, DynamicImage, ImageFormat, ImageReader};
use std::io::Cursor;
use std::path::Path;
use tracing::{debug, warn};

/// Longest side of popup thumbnails when not configured otherwise
pub const DEFAULT_MAX_DIM: u32 = 256;

/// A thumbnail ready to be embedded in markup
#[derive(Debug, Clone, PartialEq)]
pub struct InlineImage {
    pub width: u32,
    pub height: u32,
    /// `data:image/jpeg;base64,...`
    pub data_uri: String,
}

/// Result of a thumbnail request. Failures never surface as errors,
/// they come back as `Placeholder`.
#[derive(Debug, Clone, PartialEq)]
pub enum Thumbnail {
    Inline(InlineImage),
    Placeholder,
}

/// Generate an inline thumbnail for the image at `path`, no larger than
/// `max_dim` on its longest side. Returns `Placeholder` on any failure.
pub fn generate_thumbnail(path: &Path, max_dim: u32) -> Thumbnail {
    if max_dim == 0 {
        return Thumbnail::Placeholder;
    }

    match load_and_shrink(path, max_dim) {
        Some(image) => {
            debug!("Generated {}x{} thumbnail for {}", image.width, image.height, path.display());
            Thumbnail::Inline(image)
        }
        None => {
            warn!("Thumbnail unavailable for {}, using placeholder", path.display());
            Thumbnail::Placeholder
        }
    }
}

fn load_and_shrink(path: &Path, max_dim: u32) -> Option<InlineImage> {
    // Sniff the format from the bytes, the extension may lie
    let img = ImageReader::open(path).ok()?.with_guessed_format().ok()?.decode().ok()?;

    // Only ever shrink; `resize` keeps the aspect ratio inside the box
    let thumbnail = if img.width() > max_dim || img.height() > max_dim {
        img.resize(max_dim, max_dim, FilterType::Lanczos3)
    } else {
        img
    };

    encode_jpeg(thumbnail)
}

fn encode_jpeg(img: DynamicImage) -> Option<InlineImage> {
    // JPEG has no alpha channel
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());

    let mut buf = Vec::new();
    rgb.write_to(&mut Cursor::new(&mut buf), ImageFormat::Jpeg).ok()?;

    Some(InlineImage {
        width: rgb.width(),
        height: rgb.height(),
        data_uri: format!("data:image/jpeg;base64,{}", STANDARD.encode(&buf)),
    })
}
