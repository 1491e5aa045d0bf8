/// Avatar upload validation and re-encoding
///
/// Uploads are accepted only as JPEG or PNG, capped at 1 MB, and are
/// normalized before storage: decoded, resized to exactly 250x250, and
/// re-encoded as PNG. Whatever format came in, what is stored and later
/// served is always PNG bytes of a fixed size. The size and format checks
/// run before any database write.

use image::{imageops::FilterType, ImageFormat};
use std::io::Cursor;

/// Byte ceiling for an uploaded avatar
pub const MAX_AVATAR_BYTES: usize = 1_000_000;

/// Stored avatars are square, this many pixels per side
pub const AVATAR_SIZE: u32 = 250;

/// Error type for avatar processing
#[derive(Debug, thiserror::Error)]
pub enum AvatarError {
    /// Upload exceeds the byte ceiling
    #[error("Avatar exceeds the {MAX_AVATAR_BYTES} byte limit")]
    TooLarge,

    /// Content is not JPEG or PNG
    #[error("Please provide a valid photo (jpg, jpeg or png)")]
    UnsupportedFormat,

    /// Content claimed a supported format but did not decode
    #[error("Failed to decode image: {0}")]
    Decode(String),

    /// PNG re-encoding failed
    #[error("Failed to encode image: {0}")]
    Encode(String),
}

/// Validates an upload and returns the normalized 250x250 PNG bytes
///
/// The format check sniffs the actual content rather than trusting a
/// filename or content-type header.
///
/// # Errors
///
/// Fails fast on oversized payloads, non-JPEG/PNG content, and undecodable
/// images; nothing is persisted by this function.
pub fn process_upload(data: &[u8]) -> Result<Vec<u8>, AvatarError> {
    if data.len() > MAX_AVATAR_BYTES {
        return Err(AvatarError::TooLarge);
    }

    let format = image::guess_format(data).map_err(|_| AvatarError::UnsupportedFormat)?;
    if !matches!(format, ImageFormat::Jpeg | ImageFormat::Png) {
        return Err(AvatarError::UnsupportedFormat);
    }

    let img = image::load_from_memory_with_format(data, format)
        .map_err(|e| AvatarError::Decode(e.to_string()))?;

    let resized = img.resize_exact(AVATAR_SIZE, AVATAR_SIZE, FilterType::Triangle);

    let mut out = Cursor::new(Vec::new());
    resized
        .write_to(&mut out, ImageFormat::Png)
        .map_err(|e| AvatarError::Encode(e.to_string()))?;

    Ok(out.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, RgbImage};

    fn sample_bytes(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        }));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, format).expect("Should encode sample");
        out.into_inner()
    }

    #[test]
    fn test_png_upload_is_normalized_to_250x250_png() {
        let upload = sample_bytes(40, 20, ImageFormat::Png);
        let stored = process_upload(&upload).expect("Should process PNG");

        assert_eq!(image::guess_format(&stored).unwrap(), ImageFormat::Png);
        let img = image::load_from_memory(&stored).expect("Stored bytes should decode");
        assert_eq!(img.width(), AVATAR_SIZE);
        assert_eq!(img.height(), AVATAR_SIZE);
    }

    #[test]
    fn test_jpeg_upload_is_served_as_png() {
        let upload = sample_bytes(300, 300, ImageFormat::Jpeg);
        let stored = process_upload(&upload).expect("Should process JPEG");

        assert_eq!(image::guess_format(&stored).unwrap(), ImageFormat::Png);
        let img = image::load_from_memory(&stored).expect("Stored bytes should decode");
        assert_eq!(img.width(), AVATAR_SIZE);
        assert_eq!(img.height(), AVATAR_SIZE);
    }

    #[test]
    fn test_non_image_upload_is_rejected() {
        let pdf = b"%PDF-1.4 not actually an image";
        assert!(matches!(
            process_upload(pdf),
            Err(AvatarError::UnsupportedFormat)
        ));
    }

    #[test]
    fn test_truncated_image_is_rejected() {
        let mut upload = sample_bytes(40, 40, ImageFormat::Png);
        upload.truncate(upload.len() / 2);
        assert!(matches!(process_upload(&upload), Err(AvatarError::Decode(_))));
    }

    #[test]
    fn test_oversized_upload_is_rejected_before_decoding() {
        let blob = vec![0u8; MAX_AVATAR_BYTES + 1];
        assert!(matches!(process_upload(&blob), Err(AvatarError::TooLarge)));
    }
}
