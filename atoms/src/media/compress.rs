use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::ColorType;

/// Longest edge allowed after compression, in pixels
pub const MAX_DIMENSION: u32 = 1600;
pub const JPEG_QUALITY: u8 = 80;

#[derive(Debug, thiserror::Error)]
pub enum CompressionError {
    #[error("could not decode image: {0}")]
    Decode(image::ImageError),
    #[error("could not encode jpeg: {0}")]
    Encode(image::ImageError),
    #[error("compression worker failed: {0}")]
    Worker(String),
}

/// JPEG output of [`compress_image`]
#[derive(Debug, Clone)]
pub struct CompressedImage {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Target size that fits inside a `max` x `max` box, keeping aspect ratio.
/// Images already inside the box keep their size.
pub fn fit_within(width: u32, height: u32, max: u32) -> (u32, u32) {
    if width <= max && height <= max {
        return (width, height);
    }
    if width >= height {
        let scaled = (height as f64 * max as f64 / width as f64).round() as u32;
        (max, scaled.max(1))
    } else {
        let scaled = (width as f64 * max as f64 / height as f64).round() as u32;
        (scaled.max(1), max)
    }
}

/// Decode any supported bitmap, downscale into the bounding box and re-encode as JPEG.
pub fn compress_image(bytes: &[u8]) -> Result<CompressedImage, CompressionError> {
    compress_image_with(bytes, MAX_DIMENSION, JPEG_QUALITY)
}

pub fn compress_image_with(
    bytes: &[u8],
    max_dimension: u32,
    quality: u8,
) -> Result<CompressedImage, CompressionError> {
    let decoded = image::load_from_memory(bytes).map_err(CompressionError::Decode)?;
    let (width, height) = fit_within(decoded.width(), decoded.height(), max_dimension);

    let resized = if (width, height) == (decoded.width(), decoded.height()) {
        decoded
    } else {
        decoded.resize_exact(width, height, FilterType::Triangle)
    };

    // JPEG has no alpha channel
    let rgb = resized.to_rgb8();
    let mut out = Vec::new();
    {
        let mut encoder = JpegEncoder::new_with_quality(&mut out, quality);
        encoder
            .encode(rgb.as_raw(), width, height, ColorType::Rgb8)
            .map_err(CompressionError::Encode)?;
    }

    tracing::debug!(
        "Compressed image to {}x{} ({} -> {} bytes)",
        width,
        height,
        bytes.len(),
        out.len()
    );

    Ok(CompressedImage { bytes: out, width, height })
}
