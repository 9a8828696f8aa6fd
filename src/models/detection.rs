//! Image detection results and the content-category taxonomy.

use serde::Serialize;

/// Content category assigned to an image from its detection set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageCategory {
    /// A person together with a bottle - product being promoted.
    Promotional,
    /// A bottle or cup with no person - product shown on its own.
    ProductDisplay,
    /// Everything else, including images with no detections.
    Other,
}

impl ImageCategory {
    /// Stable string form persisted to the database and CSV.
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageCategory::Promotional => "promotional",
            ImageCategory::ProductDisplay => "product_display",
            ImageCategory::Other => "other",
        }
    }

    /// Parse the persisted string form.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "promotional" => Some(ImageCategory::Promotional),
            "product_display" => Some(ImageCategory::ProductDisplay),
            "other" => Some(ImageCategory::Other),
            _ => None,
        }
    }
}

impl std::fmt::Display for ImageCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One classified image. Field order matches the CSV column order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageDetection {
    /// Message ID parsed from the image filename (kept as text; the
    /// filename is the only provenance we have).
    pub message_id: String,
    /// Channel slug parsed from the image's parent directory.
    pub channel_name: String,
    /// First raw label the detector returned, `"none"` if the detection
    /// set was empty. Arbitrary index, not confidence-ranked.
    pub detected_class: String,
    /// Mean confidence over all detections, 0.0 if none.
    pub confidence: f64,
    /// Assigned content category.
    pub image_category: ImageCategory,
    /// Comma-joined raw labels, in detector order.
    pub all_classes: String,
    /// Path of the processed image.
    pub image_path: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_round_trips_through_str() {
        for cat in [
            ImageCategory::Promotional,
            ImageCategory::ProductDisplay,
            ImageCategory::Other,
        ] {
            assert_eq!(ImageCategory::from_str(cat.as_str()), Some(cat));
        }
        assert_eq!(ImageCategory::from_str("bogus"), None);
    }
}
