use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use cheque_core::{ChequeRecord, DateStrategy, Settings};
use image::DynamicImage;
use thiserror::Error;
use tokio::sync::Semaphore;
use tracing::{debug, info};

use crate::bank::resolve_bank;
use crate::extract;
use crate::preprocess;
use crate::recognizer::{OcrBackend, OcrError};
use crate::region;
use crate::types::{ChequeExtraction, OcrWord};

/// File extensions accepted by the batch and upload surfaces.
pub const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

const DEFAULT_OCR_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image preprocessing failed: {0}")]
    Preprocess(#[from] crate::preprocess::PreprocessError),
    #[error("OCR recognition failed: {0}")]
    Ocr(#[from] OcrError),
    #[error("OCR timed out after {0:?}")]
    Timeout(Duration),
    #[error("OCR worker failed: {0}")]
    Join(String),
}

/// Orchestrates: decode → word boxes → region crops → OCR → field parsers.
///
/// Clones share one pool of OCR permits. A permit is held until the blocking
/// work returns, even when the caller has already given up on a timeout.
pub struct ChequePipeline<R: OcrBackend> {
    recognizer: Arc<R>,
    date_strategy: DateStrategy,
    ocr_timeout: Duration,
    permits: Arc<Semaphore>,
}

impl<R: OcrBackend> Clone for ChequePipeline<R> {
    fn clone(&self) -> Self {
        Self {
            recognizer: Arc::clone(&self.recognizer),
            date_strategy: self.date_strategy,
            ocr_timeout: self.ocr_timeout,
            permits: Arc::clone(&self.permits),
        }
    }
}

fn default_max_in_flight() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

impl<R: OcrBackend + 'static> ChequePipeline<R> {
    pub fn new(recognizer: R) -> Self {
        Self {
            recognizer: Arc::new(recognizer),
            date_strategy: DateStrategy::default(),
            ocr_timeout: DEFAULT_OCR_TIMEOUT,
            permits: Arc::new(Semaphore::new(default_max_in_flight())),
        }
    }

    pub fn with_date_strategy(mut self, strategy: DateStrategy) -> Self {
        self.date_strategy = strategy;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.ocr_timeout = timeout;
        self
    }

    /// Upper bound on images being decoded or OCR'd at once. Clamped to 1.
    pub fn with_max_in_flight(mut self, n: usize) -> Self {
        self.permits = Arc::new(Semaphore::new(n.max(1)));
        self
    }

    /// Apply the date strategy, OCR timeout and concurrency from settings.
    pub fn configure(self, settings: &Settings) -> Self {
        self.with_date_strategy(settings.date_strategy)
            .with_timeout(Duration::from_secs(settings.ocr.timeout_secs))
            .with_max_in_flight(settings.effective_concurrency())
    }

    pub fn date_strategy(&self) -> DateStrategy {
        self.date_strategy
    }

    /// Process a file on disk. The record's filename is the file's base name.
    pub async fn process_file(&self, path: &Path) -> Result<ChequeExtraction, PipelineError> {
        let bytes = tokio::fs::read(path).await?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.process_bytes(&filename, bytes).await
    }

    /// Process raw encoded image bytes (upload or file read).
    pub async fn process_bytes(
        &self,
        filename: &str,
        data: Vec<u8>,
    ) -> Result<ChequeExtraction, PipelineError> {
        let recognizer = Arc::clone(&self.recognizer);
        let strategy = self.date_strategy;
        let filename = filename.to_string();
        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|e| PipelineError::Join(e.to_string()))?;

        // OCR is blocking and its latency is unbounded on degraded scans.
        let task = tokio::task::spawn_blocking(move || -> Result<_, PipelineError> {
            let _permit = permit;
            let image = preprocess::decode_image(&data)?;
            Ok(build_record(&*recognizer, &filename, &image, strategy)?)
        });

        match tokio::time::timeout(self.ocr_timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join)) => Err(PipelineError::Join(join.to_string())),
            Err(_) => Err(PipelineError::Timeout(self.ocr_timeout)),
        }
    }
}

/// Build one record from a decoded image. Missing fields are left empty;
/// only OCR engine failures are errors.
pub fn build_record<R: OcrBackend + ?Sized>(
    recognizer: &R,
    filename: &str,
    image: &DynamicImage,
    strategy: DateStrategy,
) -> Result<ChequeExtraction, OcrError> {
    let full_text = recognizer.recognize_text(image)?.to_uppercase();
    let words = recognizer.recognize_words(&preprocess::for_word_detection(image))?;
    debug!(filename, words = words.len(), "Recognized page");

    let ifsc_text = region_text(recognizer, image, &words, region::IFSC_ANCHOR, &full_text)?;
    let amount_text = region_text(recognizer, image, &words, region::AMOUNT_ANCHOR, &full_text)?;
    let date_text = region_text(recognizer, image, &words, region::DATE_ANCHOR, &full_text)?;

    let ifsc_code = extract::extract_ifsc(&ifsc_text);
    let amount = extract::extract_amount(&amount_text);
    let date = extract::date_for(strategy, &full_text, &date_text);
    let bank_name = resolve_bank(&full_text, &ifsc_code);

    let record = ChequeRecord {
        filename: filename.to_string(),
        bank_name,
        ifsc_code,
        amount,
        date,
    };
    info!(
        filename,
        bank = %record.bank_name,
        ifsc = %record.ifsc_code,
        amount = record.amount.as_deref().unwrap_or(""),
        date = %record.date,
        "Extracted cheque"
    );

    Ok(ChequeExtraction { record, full_text, ifsc_text, amount_text, date_text })
}

/// Uppercased OCR text of the region next to `keyword`, or the full-page text
/// when the keyword was not found.
fn region_text<R: OcrBackend + ?Sized>(
    recognizer: &R,
    image: &DynamicImage,
    words: &[OcrWord],
    keyword: &str,
    full_text: &str,
) -> Result<String, OcrError> {
    let Some(region) = region::locate(words, keyword) else {
        debug!(keyword, "No anchor, using full-page text");
        return Ok(full_text.to_string());
    };
    if region.clamp_to(image.width(), image.height()).is_empty() {
        return Ok(String::new());
    }
    Ok(recognizer.recognize_text(&region.crop(image))?.to_uppercase())
}

// ── Folder listing ────────────────────────────────────────────────────────────

pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.iter().any(|ok| e.eq_ignore_ascii_case(ok)))
        .unwrap_or(false)
}

/// Supported image files directly inside `folder`, sorted by name.
pub fn list_images(folder: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut images = Vec::new();
    for entry in std::fs::read_dir(folder)? {
        let path = entry?.path();
        if path.is_file() && is_supported_image(&path) {
            images.push(path);
        }
    }
    images.sort();
    Ok(images)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recognizer::MockRecognizer;
    use crate::types::BoundingBox;
    use image::{ImageBuffer, Luma};

    fn blank_png(width: u32, height: u32) -> Vec<u8> {
        let img: image::GrayImage = ImageBuffer::from_fn(width, height, |_, _| Luma([230u8]));
        preprocess::encode_as_png(&DynamicImage::ImageLuma8(img)).unwrap()
    }

    fn word(text: &str, x: u32, y: u32, w: u32, h: u32) -> OcrWord {
        OcrWord::new(text, BoundingBox::new(x, y, w, h))
    }

    /// 1000×400 cheque with three anchors. Crop sizes: IFSC 250×60,
    /// RUPEES 250×70, DATE 200×60 (clipped at the right edge).
    fn anchored_mock() -> MockRecognizer {
        MockRecognizer::new(
            "State Bank of India\nPay 05-01-2023\nRef HDFC0000001 99999.00",
        )
        .with_words(vec![
            word("Pay", 10, 10, 30, 20),
            word("Rupees", 100, 150, 60, 30),
            word("Date", 800, 20, 40, 20),
            word("IFSC:", 50, 300, 40, 20),
        ])
        .with_crop_text(250, 60, "ifsc: sbin0001234")
        .with_crop_text(250, 70, "Rupees one thousand five hundred 1,500.00")
        .with_crop_text(200, 60, "date 06.02.2024")
    }

    #[tokio::test]
    async fn fields_come_from_regions() {
        let pipeline = ChequePipeline::new(anchored_mock());
        let out = pipeline.process_bytes("cheque1.png", blank_png(1000, 400)).await.unwrap();

        assert_eq!(out.record.filename, "cheque1.png");
        assert_eq!(out.record.ifsc_code, "SBIN0001234");
        assert_eq!(out.record.amount.as_deref(), Some("1500.00"));
        assert_eq!(out.record.bank_name, "STATE BANK OF INDIA");
        // Default strategy reads the date from the full page.
        assert_eq!(out.record.date, "05-01-2023");
        assert_eq!(out.date_text, "DATE 06.02.2024");
        assert_eq!(out.ifsc_text, "IFSC: SBIN0001234");
    }

    #[tokio::test]
    async fn region_strategy_reads_date_region() {
        let pipeline = ChequePipeline::new(anchored_mock()).with_date_strategy(DateStrategy::Region);
        let out = pipeline.process_bytes("cheque1.png", blank_png(1000, 400)).await.unwrap();
        assert_eq!(out.record.date, "06-02-2024");
    }

    #[tokio::test]
    async fn no_anchors_falls_back_to_full_text() {
        let pipeline = ChequePipeline::new(MockRecognizer::new(
            "ICICI Bank\nIFSC ICIC0001111\nRs 2,500.00\nDated 3-Mar-2024",
        ));
        let out = pipeline.process_bytes("c.jpg", blank_png(300, 100)).await.unwrap();

        assert_eq!(out.record.ifsc_code, "ICIC0001111");
        assert_eq!(out.record.amount.as_deref(), Some("2500.00"));
        assert_eq!(out.record.date, "03-03-2024");
        assert_eq!(out.record.bank_name, "ICICI BANK");
        assert_eq!(out.ifsc_text, out.full_text);
        assert_eq!(out.amount_text, out.full_text);
        assert_eq!(out.date_text, out.full_text);
    }

    #[tokio::test]
    async fn blank_page_yields_empty_fields() {
        let pipeline = ChequePipeline::new(MockRecognizer::new(""));
        let out = pipeline.process_bytes("blank.png", blank_png(50, 50)).await.unwrap();
        let r = out.record;
        assert_eq!(r.ifsc_code, "");
        assert_eq!(r.amount, None);
        assert_eq!(r.date, "");
        assert_eq!(r.bank_name, "Unknown");
    }

    #[tokio::test]
    async fn anchor_outside_image_gives_empty_region_text() {
        let mock = MockRecognizer::new("IFSC SBIN0001234")
            .with_words(vec![word("IFSC", 5000, 5000, 40, 20)]);
        let out = ChequePipeline::new(mock)
            .process_bytes("edge.png", blank_png(100, 100))
            .await
            .unwrap();
        assert_eq!(out.ifsc_text, "");
        assert_eq!(out.record.ifsc_code, "");
        // Bank still resolves from the page itself.
        assert_eq!(out.record.bank_name, "Unknown");
    }

    #[tokio::test]
    async fn process_file_uses_base_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Cheque_07.PNG");
        std::fs::write(&path, blank_png(20, 20)).unwrap();

        let pipeline = ChequePipeline::new(MockRecognizer::new("UNION BANK"));
        let out = pipeline.process_file(&path).await.unwrap();
        assert_eq!(out.record.filename, "Cheque_07.PNG");
        assert_eq!(out.record.bank_name, "UNION BANK");
    }

    #[tokio::test]
    async fn undecodable_bytes_are_preprocess_error() {
        let pipeline = ChequePipeline::new(MockRecognizer::new(""));
        let err = pipeline.process_bytes("bad.png", b"nope".to_vec()).await.unwrap_err();
        assert!(matches!(err, PipelineError::Preprocess(_)));
    }

    #[tokio::test]
    async fn missing_file_is_io_error() {
        let pipeline = ChequePipeline::new(MockRecognizer::new(""));
        let err = pipeline.process_file(Path::new("/no/such/cheque.png")).await.unwrap_err();
        assert!(matches!(err, PipelineError::Io(_)));
    }

    struct SlowRecognizer;

    impl OcrBackend for SlowRecognizer {
        fn recognize_text(&self, _image: &DynamicImage) -> Result<String, OcrError> {
            std::thread::sleep(Duration::from_millis(300));
            Ok(String::new())
        }

        fn recognize_words(&self, _image: &DynamicImage) -> Result<Vec<OcrWord>, OcrError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn slow_ocr_times_out() {
        let pipeline = ChequePipeline::new(SlowRecognizer).with_timeout(Duration::from_millis(20));
        let err = pipeline.process_bytes("slow.png", blank_png(10, 10)).await.unwrap_err();
        assert!(matches!(err, PipelineError::Timeout(_)));
    }

    #[tokio::test]
    async fn timed_out_ocr_keeps_its_permit_until_done() {
        let pipeline = ChequePipeline::new(SlowRecognizer)
            .with_timeout(Duration::from_millis(20))
            .with_max_in_flight(1);
        let err = pipeline.process_bytes("slow.png", blank_png(10, 10)).await.unwrap_err();
        assert!(matches!(err, PipelineError::Timeout(_)));
        assert_eq!(pipeline.permits.available_permits(), 0);

        tokio::time::sleep(Duration::from_millis(800)).await;
        assert_eq!(pipeline.permits.available_permits(), 1);
    }

    #[tokio::test]
    async fn next_image_waits_for_abandoned_ocr() {
        let pipeline = ChequePipeline::new(SlowRecognizer)
            .with_timeout(Duration::from_millis(20))
            .with_max_in_flight(1);
        let _ = pipeline.process_bytes("slow.png", blank_png(10, 10)).await;
        // The abandoned call still holds the only permit.
        let started = std::time::Instant::now();
        let _ = pipeline.process_bytes("next.png", blank_png(10, 10)).await;
        assert!(started.elapsed() >= Duration::from_millis(200));
    }

    #[test]
    fn configure_reads_settings() {
        let settings = Settings::from_toml(
            "date_strategy = \"region\"\nconcurrency = 3\n[ocr]\ntimeout_secs = 7",
        )
        .unwrap();
        let pipeline = ChequePipeline::new(MockRecognizer::new("")).configure(&settings);
        assert_eq!(pipeline.date_strategy(), DateStrategy::Region);
        assert_eq!(pipeline.ocr_timeout, Duration::from_secs(7));
        assert_eq!(pipeline.permits.available_permits(), 3);
    }

    #[test]
    fn supported_extensions_ignore_case() {
        assert!(is_supported_image(Path::new("a.JPG")));
        assert!(is_supported_image(Path::new("a.jpeg")));
        assert!(is_supported_image(Path::new("dir/a.Png")));
        assert!(!is_supported_image(Path::new("a.gif")));
        assert!(!is_supported_image(Path::new("png")));
    }

    #[test]
    fn list_images_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.png", "a.JPG", "notes.txt", "c.jpeg"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        std::fs::create_dir(dir.path().join("nested.png")).unwrap();

        let names: Vec<_> = list_images(dir.path())
            .unwrap()
            .into_iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.JPG", "b.png", "c.jpeg"]);
    }
}
