use image::DynamicImage;
use std::io::Cursor;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PreprocessError {
    #[error("Failed to load image: {0}")]
    Load(#[from] image::ImageError),
    #[error("Failed to encode processed image: {0}")]
    Encode(String),
}

/// Decode raw image bytes, e.g. from an upload.
pub fn decode_image(data: &[u8]) -> Result<DynamicImage, PreprocessError> {
    Ok(image::load_from_memory(data)?)
}

/// Grayscale copy used for word detection. Dimensions are unchanged so the
/// returned bounding boxes stay valid on the original image.
pub fn for_word_detection(img: &DynamicImage) -> DynamicImage {
    DynamicImage::ImageLuma8(img.to_luma8())
}

pub fn encode_as_png(img: &DynamicImage) -> Result<Vec<u8>, PreprocessError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .map_err(|e| PreprocessError::Encode(e.to_string()))?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb, RgbImage};

    fn colour(width: u32, height: u32) -> DynamicImage {
        let img: RgbImage = ImageBuffer::from_fn(width, height, |x, _| Rgb([x as u8, 40, 200]));
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn word_detection_copy_keeps_dimensions() {
        let gray = for_word_detection(&colour(37, 11));
        assert_eq!((gray.width(), gray.height()), (37, 11));
        assert!(matches!(gray, DynamicImage::ImageLuma8(_)));
    }

    #[test]
    fn png_roundtrip_through_decode() {
        let png = encode_as_png(&colour(4, 4)).unwrap();
        // PNG magic bytes: 0x89 0x50 0x4E 0x47
        assert_eq!(&png[..4], b"\x89PNG");
        let back = decode_image(&png).unwrap();
        assert_eq!((back.width(), back.height()), (4, 4));
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        assert!(matches!(decode_image(b"not an image"), Err(PreprocessError::Load(_))));
    }
}
