use image::DynamicImage;
use thiserror::Error;

use crate::types::OcrWord;

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("Image decode error: {0}")]
    ImageDecode(String),
    #[error("OCR engine error: {0}")]
    Engine(String),
    #[error("Tesseract not available; build with `tesseract` feature")]
    NotAvailable,
}

/// Abstraction over an OCR backend.
/// Implementations receive a decoded image and never own it past the call.
pub trait OcrBackend: Send + Sync {
    /// Recognize all text on the image.
    fn recognize_text(&self, image: &DynamicImage) -> Result<String, OcrError>;

    /// Recognize individual words with their bounding boxes.
    fn recognize_words(&self, image: &DynamicImage) -> Result<Vec<OcrWord>, OcrError>;
}

// ── Mock backend (always available, used for tests) ───────────────────────────

/// Returns pre-set text and words, useful for unit testing the extraction
/// pipeline without requiring Tesseract to be installed.
///
/// Region crops are told apart from the full page by their pixel dimensions:
/// an image whose size matches an entry in `crop_texts` gets that text,
/// anything else gets `text`.
#[derive(Debug, Clone, Default)]
pub struct MockRecognizer {
    pub text: String,
    pub words: Vec<OcrWord>,
    pub crop_texts: Vec<((u32, u32), String)>,
}

impl MockRecognizer {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into(), ..Self::default() }
    }

    pub fn with_words(mut self, words: Vec<OcrWord>) -> Self {
        self.words = words;
        self
    }

    pub fn with_crop_text(mut self, width: u32, height: u32, text: impl Into<String>) -> Self {
        self.crop_texts.push(((width, height), text.into()));
        self
    }
}

impl OcrBackend for MockRecognizer {
    fn recognize_text(&self, image: &DynamicImage) -> Result<String, OcrError> {
        let dims = (image.width(), image.height());
        let text = self
            .crop_texts
            .iter()
            .find(|(size, _)| *size == dims)
            .map(|(_, t)| t)
            .unwrap_or(&self.text);
        Ok(text.clone())
    }

    fn recognize_words(&self, _image: &DynamicImage) -> Result<Vec<OcrWord>, OcrError> {
        Ok(self.words.clone())
    }
}

// ── Tesseract backend (optional, gated behind `tesseract` feature) ─────────────

#[cfg(feature = "tesseract")]
pub mod tesseract_backend {
    use super::{OcrBackend, OcrError};
    use crate::preprocess;
    use crate::types::{BoundingBox, OcrWord};
    use image::DynamicImage;
    use leptess::{capi, LepTess};

    pub struct TesseractRecognizer {
        data_path: Option<String>,
        lang: String,
    }

    impl TesseractRecognizer {
        pub fn new(data_path: Option<String>, lang: &str) -> Self {
            Self { data_path, lang: lang.to_string() }
        }

        fn load(&self, image: &DynamicImage) -> Result<LepTess, OcrError> {
            let mut lt = LepTess::new(self.data_path.as_deref(), &self.lang)
                .map_err(|e| OcrError::Engine(e.to_string()))?;
            let png = preprocess::encode_as_png(image)
                .map_err(|e| OcrError::ImageDecode(e.to_string()))?;
            lt.set_image_from_mem(&png)
                .map_err(|e| OcrError::ImageDecode(e.to_string()))?;
            Ok(lt)
        }
    }

    impl OcrBackend for TesseractRecognizer {
        fn recognize_text(&self, image: &DynamicImage) -> Result<String, OcrError> {
            let mut lt = self.load(image)?;
            lt.get_utf8_text().map_err(|e| OcrError::Engine(e.to_string()))
        }

        fn recognize_words(&self, image: &DynamicImage) -> Result<Vec<OcrWord>, OcrError> {
            let mut lt = self.load(image)?;
            let Some(boxes) = lt.get_component_boxes(capi::TessPageIteratorLevel_RIL_WORD, true)
            else {
                return Ok(Vec::new());
            };

            let mut words = Vec::new();
            for b in &boxes {
                let geom = b.get_geometry();
                lt.set_rectangle_from_box(&b);
                let text = lt
                    .get_utf8_text()
                    .map_err(|e| OcrError::Engine(e.to_string()))?;
                words.push(OcrWord::new(
                    text.trim(),
                    BoundingBox::new(
                        geom.x.max(0) as u32,
                        geom.y.max(0) as u32,
                        geom.w.max(0) as u32,
                        geom.h.max(0) as u32,
                    ),
                ));
            }
            Ok(words)
        }
    }
}

/// The Tesseract backend configured from settings.
#[cfg(feature = "tesseract")]
pub fn system_backend(
    data_path: Option<String>,
    lang: &str,
) -> Result<tesseract_backend::TesseractRecognizer, OcrError> {
    Ok(tesseract_backend::TesseractRecognizer::new(data_path, lang))
}

/// Without the `tesseract` feature there is no real engine to hand out.
#[cfg(not(feature = "tesseract"))]
pub fn system_backend(_data_path: Option<String>, _lang: &str) -> Result<MockRecognizer, OcrError> {
    Err(OcrError::NotAvailable)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BoundingBox;
    use image::{GrayImage, ImageBuffer, Luma};

    fn blank(width: u32, height: u32) -> DynamicImage {
        let img: GrayImage = ImageBuffer::from_fn(width, height, |_, _| Luma([255u8]));
        DynamicImage::ImageLuma8(img)
    }

    #[test]
    fn mock_returns_preset_text() {
        let r = MockRecognizer::new("STATE BANK OF INDIA\nIFSC SBIN0001234");
        assert_eq!(
            r.recognize_text(&blank(10, 10)).unwrap(),
            "STATE BANK OF INDIA\nIFSC SBIN0001234"
        );
    }

    #[test]
    fn mock_picks_crop_text_by_size() {
        let r = MockRecognizer::new("page").with_crop_text(250, 60, "crop");
        assert_eq!(r.recognize_text(&blank(250, 60)).unwrap(), "crop");
        assert_eq!(r.recognize_text(&blank(800, 400)).unwrap(), "page");
    }

    #[test]
    fn mock_returns_preset_words() {
        let words = vec![OcrWord::new("IFSC", BoundingBox::new(1, 2, 3, 4))];
        let r = MockRecognizer::new("").with_words(words.clone());
        assert_eq!(r.recognize_words(&blank(10, 10)).unwrap(), words);
    }

    #[cfg(not(feature = "tesseract"))]
    #[test]
    fn system_backend_unavailable_without_feature() {
        assert!(matches!(system_backend(None, "eng"), Err(OcrError::NotAvailable)));
    }
}
