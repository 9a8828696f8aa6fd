//! Classification taxonomy over detector label sets.
//!
//! A simple conjunctive/disjunctive rule over a closed label
//! vocabulary. Evaluation order is load-bearing: the promotional check
//! runs strictly before the product_display check because the two
//! predicates are not mutually exclusive by label alone (person +
//! bottle + cup must resolve to promotional).

use super::detector::Detection;
use crate::models::ImageCategory;

/// Assign a content category from the raw label set.
pub fn categorize(labels: &[String]) -> ImageCategory {
    let has = |name: &str| labels.iter().any(|l| l == name);

    let has_person = has("person");
    let has_bottle = has("bottle");
    let has_cup = has("cup");

    if has_person && has_bottle {
        ImageCategory::Promotional
    } else if (has_bottle || has_cup) && !has_person {
        ImageCategory::ProductDisplay
    } else {
        ImageCategory::Other
    }
}

/// Summary of one image's detection set, ready to persist.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionSummary {
    /// First raw label, `"none"` if the set is empty. Arbitrary index,
    /// not the highest-confidence detection.
    pub detected_class: String,
    /// Mean confidence, 0.0 if the set is empty.
    pub confidence: f64,
    pub image_category: ImageCategory,
    /// Comma-joined raw labels in detector order.
    pub all_classes: String,
}

/// Reduce a detection set to the persisted summary fields.
pub fn summarize(detections: &[Detection]) -> DetectionSummary {
    let labels: Vec<String> = detections.iter().map(|d| d.label.clone()).collect();

    let detected_class = labels
        .first()
        .cloned()
        .unwrap_or_else(|| "none".to_string());
    let confidence = if detections.is_empty() {
        0.0
    } else {
        detections.iter().map(|d| d.confidence).sum::<f64>() / detections.len() as f64
    };

    DetectionSummary {
        detected_class,
        confidence,
        image_category: categorize(&labels),
        all_classes: labels.join(", "),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn detections(pairs: &[(&str, f64)]) -> Vec<Detection> {
        pairs
            .iter()
            .map(|(label, confidence)| Detection {
                label: label.to_string(),
                confidence: *confidence,
            })
            .collect()
    }

    #[test]
    fn person_and_bottle_is_promotional() {
        assert_eq!(
            categorize(&labels(&["person", "bottle"])),
            ImageCategory::Promotional
        );
    }

    #[test]
    fn bottle_alone_is_product_display() {
        assert_eq!(
            categorize(&labels(&["bottle"])),
            ImageCategory::ProductDisplay
        );
        assert_eq!(categorize(&labels(&["cup"])), ImageCategory::ProductDisplay);
    }

    #[test]
    fn promotional_check_wins_over_product_display() {
        // person + bottle + cup satisfies both predicates; order decides.
        assert_eq!(
            categorize(&labels(&["person", "bottle", "cup"])),
            ImageCategory::Promotional
        );
    }

    #[test]
    fn person_with_cup_but_no_bottle_is_other() {
        assert_eq!(categorize(&labels(&["person", "cup"])), ImageCategory::Other);
    }

    #[test]
    fn unrelated_labels_are_other() {
        assert_eq!(categorize(&labels(&["dog"])), ImageCategory::Other);
        assert_eq!(categorize(&[]), ImageCategory::Other);
    }

    #[test]
    fn empty_detection_set_summary() {
        let summary = summarize(&[]);
        assert_eq!(summary.detected_class, "none");
        assert_eq!(summary.confidence, 0.0);
        assert_eq!(summary.image_category, ImageCategory::Other);
        assert_eq!(summary.all_classes, "");
    }

    #[test]
    fn summary_takes_first_label_and_mean_confidence() {
        let summary = summarize(&detections(&[("bottle", 0.8), ("cup", 0.4)]));
        assert_eq!(summary.detected_class, "bottle");
        assert!((summary.confidence - 0.6).abs() < 1e-9);
        assert_eq!(summary.image_category, ImageCategory::ProductDisplay);
        assert_eq!(summary.all_classes, "bottle, cup");
    }
}
