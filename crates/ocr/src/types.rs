use cheque_core::ChequeRecord;
use serde::{Deserialize, Serialize};

/// Pixel rectangle as reported by the OCR engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// A single recognized word, in the engine's scan order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OcrWord {
    pub text: String,
    pub bbox: BoundingBox,
}

impl OcrWord {
    pub fn new(text: impl Into<String>, bbox: BoundingBox) -> Self {
        Self { text: text.into(), bbox }
    }
}

/// The record plus the uppercased texts each field was parsed from.
#[derive(Debug, Clone, Serialize)]
pub struct ChequeExtraction {
    pub record: ChequeRecord,
    pub full_text: String,
    pub ifsc_text: String,
    pub amount_text: String,
    /// Text under the DATE anchor. Only the `Region` date strategy reads it.
    pub date_text: String,
}
