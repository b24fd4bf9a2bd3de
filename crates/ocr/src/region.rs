use image::DynamicImage;
use tracing::debug;

use crate::types::{BoundingBox, OcrWord};

/// Extra rows kept below the anchor word.
pub const REGION_EXTRA_HEIGHT: u32 = 40;
/// Fixed crop width measured from the anchor's left edge.
pub const REGION_WIDTH: u32 = 250;

/// Anchor keywords, one per field.
pub const IFSC_ANCHOR: &str = "IFSC";
pub const AMOUNT_ANCHOR: &str = "RUPEES";
pub const DATE_ANCHOR: &str = "DATE";

/// Rectangle of interest next to an anchor word. Not yet clamped to the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub anchor: BoundingBox,
}

impl Region {
    pub fn from_anchor(anchor: BoundingBox) -> Self {
        Self { anchor }
    }

    /// `[y, y+h+40) × [x, x+250)` before clamping.
    pub fn rect(&self) -> BoundingBox {
        BoundingBox::new(
            self.anchor.x,
            self.anchor.y,
            REGION_WIDTH,
            self.anchor.height.saturating_add(REGION_EXTRA_HEIGHT),
        )
    }

    /// The rectangle shrunk to fit a `width × height` image. Never fails; an
    /// anchor lying outside the image yields an empty rectangle.
    pub fn clamp_to(&self, width: u32, height: u32) -> BoundingBox {
        let r = self.rect();
        let x = r.x.min(width);
        let y = r.y.min(height);
        BoundingBox::new(
            x,
            y,
            r.width.min(width - x),
            r.height.min(height - y),
        )
    }

    pub fn crop(&self, img: &DynamicImage) -> DynamicImage {
        let r = self.clamp_to(img.width(), img.height());
        img.crop_imm(r.x, r.y, r.width, r.height)
    }
}

/// First word (in engine order) whose text contains `keyword`, ignoring case.
pub fn locate(words: &[OcrWord], keyword: &str) -> Option<Region> {
    let needle = keyword.to_uppercase();
    let found = words
        .iter()
        .find(|w| w.text.to_uppercase().contains(&needle))?;
    debug!(keyword, word = %found.text, bbox = ?found.bbox, "Located region anchor");
    Some(Region::from_anchor(found.bbox))
}
