pub mod bank;
pub mod extract;
pub mod pipeline;
pub mod preprocess;
pub mod recognizer;
pub mod region;
pub mod types;

pub use bank::resolve_bank;
pub use extract::{
    date_for, extract_amount, extract_date, extract_ifsc, extract_region_date, normalize_date,
};
pub use pipeline::{
    build_record, is_supported_image, list_images, ChequePipeline, PipelineError, IMAGE_EXTENSIONS,
};
pub use preprocess::{decode_image, PreprocessError};
pub use recognizer::{system_backend, MockRecognizer, OcrBackend, OcrError};
pub use region::{locate, Region};
pub use types::{BoundingBox, ChequeExtraction, OcrWord};
