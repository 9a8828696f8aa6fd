//! Image classifier bridge.
//!
//! Walks the downloaded image tree, runs the external detector once per
//! image, maps detector output onto the fixed content taxonomy, and
//! produces one [`ImageDetection`] row per image. Per-image failures
//! (malformed path, detector error) are logged and skipped; the batch
//! always completes.

pub mod classify;
pub mod detector;

pub use classify::{categorize, summarize, DetectionSummary};
pub use detector::{CliDetector, DetectError, Detection, ObjectDetector};

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::models::ImageDetection;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Bridge between the image tree, the detector, and the taxonomy.
pub struct ClassifierBridge<D: ObjectDetector> {
    detector: D,
}

impl<D: ObjectDetector> ClassifierBridge<D> {
    pub fn new(detector: D) -> Self {
        Self { detector }
    }

    /// Classify every image under `image_dir`.
    ///
    /// Expected layout: `{image_dir}/{channel_name}/{message_id}.jpg`.
    /// Images at any other depth are malformed and skipped with a
    /// warning. Returns the rows for all successfully processed images.
    pub fn classify_directory(&self, image_dir: &Path) -> Vec<ImageDetection> {
        let images = discover_images(image_dir);
        if images.is_empty() {
            warn!(directory = %image_dir.display(), "no images found to process");
            return Vec::new();
        }

        let mut rows = Vec::new();
        for image in &images {
            let Some((channel_name, message_id)) = parse_image_path(image_dir, image) else {
                warn!(image = %image.display(), "skipping image with malformed path");
                continue;
            };

            let detections = match self.detector.detect(image) {
                Ok(detections) => detections,
                Err(e) => {
                    warn!(image = %image.display(), error = %e, "detector failed, skipping image");
                    continue;
                }
            };

            let summary = summarize(&detections);
            rows.push(ImageDetection {
                message_id,
                channel_name,
                detected_class: summary.detected_class,
                confidence: summary.confidence,
                image_category: summary.image_category,
                all_classes: summary.all_classes,
                image_path: image.display().to_string(),
            });
        }

        info!(processed = rows.len(), total = images.len(), "image classification complete");
        rows
    }
}

/// Recursively collect image files under `base`, sorted by path.
pub fn discover_images(base: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    collect_images(base, &mut files);
    files.sort();
    files
}

fn collect_images(dir: &Path, files: &mut Vec<PathBuf>) {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return,
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_images(&path, files);
        } else if is_image(&path) {
            files.push(path);
        }
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

/// Parse `(channel_name, message_id)` from an image path.
///
/// Provenance lives in the path, not in image metadata: the file must
/// sit exactly one directory below the image root, with the directory
/// naming the channel and the file stem naming the message.
pub fn parse_image_path(root: &Path, image: &Path) -> Option<(String, String)> {
    let relative = image.strip_prefix(root).ok()?;
    let mut components = relative.components();

    let channel = components.next()?.as_os_str().to_str()?.to_string();
    let file = components.next()?.as_os_str();
    if components.next().is_some() {
        return None; // nested deeper than {channel}/{file}
    }

    let message_id = Path::new(file).file_stem()?.to_str()?.to_string();
    if channel.is_empty() || message_id.is_empty() {
        return None;
    }
    Some((channel, message_id))
}

/// Write all detection rows for the run to a CSV file.
pub fn write_results_csv(rows: &[ImageDetection], path: &Path) -> csv::Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ImageCategory;

    struct FixedDetector(Vec<Detection>);

    impl ObjectDetector for FixedDetector {
        fn detect(&self, _image: &Path) -> Result<Vec<Detection>, DetectError> {
            Ok(self.0.clone())
        }
    }

    struct FailingDetector;

    impl ObjectDetector for FailingDetector {
        fn detect(&self, image: &Path) -> Result<Vec<Detection>, DetectError> {
            Err(DetectError::DetectionFailed(format!(
                "boom: {}",
                image.display()
            )))
        }
    }

    #[test]
    fn parses_channel_and_message_id_from_path() {
        let root = Path::new("data/raw/images");
        let image = Path::new("data/raw/images/acme/12345.jpg");
        assert_eq!(
            parse_image_path(root, image),
            Some(("acme".to_string(), "12345".to_string()))
        );
    }

    #[test]
    fn rejects_paths_without_two_trailing_segments() {
        let root = Path::new("data/raw/images");
        // Directly under the root - no channel directory.
        assert_eq!(
            parse_image_path(root, Path::new("data/raw/images/orphan.jpg")),
            None
        );
        // Nested too deep.
        assert_eq!(
            parse_image_path(root, Path::new("data/raw/images/acme/extra/1.jpg")),
            None
        );
        // Outside the root entirely.
        assert_eq!(parse_image_path(root, Path::new("elsewhere/acme/1.jpg")), None);
    }

    #[test]
    fn classifies_directory_and_skips_malformed_paths() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("acme")).unwrap();
        std::fs::write(dir.path().join("acme/100.jpg"), b"fake").unwrap();
        std::fs::write(dir.path().join("acme/200.jpg"), b"fake").unwrap();
        // Malformed: sits at the root, no channel directory.
        std::fs::write(dir.path().join("stray.jpg"), b"fake").unwrap();
        // Not an image at all.
        std::fs::write(dir.path().join("acme/readme.txt"), b"skip").unwrap();

        let bridge = ClassifierBridge::new(FixedDetector(vec![
            Detection {
                label: "person".to_string(),
                confidence: 0.9,
            },
            Detection {
                label: "bottle".to_string(),
                confidence: 0.7,
            },
        ]));
        let rows = bridge.classify_directory(dir.path());

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].channel_name, "acme");
        assert_eq!(rows[0].message_id, "100");
        assert_eq!(rows[0].image_category, ImageCategory::Promotional);
        assert!((rows[0].confidence - 0.8).abs() < 1e-9);
        assert_eq!(rows[0].all_classes, "person, bottle");
    }

    #[test]
    fn detector_failure_skips_image_not_batch() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("acme")).unwrap();
        std::fs::write(dir.path().join("acme/1.jpg"), b"fake").unwrap();

        let bridge = ClassifierBridge::new(FailingDetector);
        let rows = bridge.classify_directory(dir.path());
        assert!(rows.is_empty());
    }

    #[test]
    fn empty_directory_produces_no_rows() {
        let dir = tempfile::tempdir().unwrap();
        let bridge = ClassifierBridge::new(FixedDetector(Vec::new()));
        assert!(bridge.classify_directory(dir.path()).is_empty());
    }

    #[test]
    fn csv_output_has_one_line_per_row_plus_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.csv");
        let rows = vec![ImageDetection {
            message_id: "1".to_string(),
            channel_name: "acme".to_string(),
            detected_class: "bottle".to_string(),
            confidence: 0.5,
            image_category: ImageCategory::ProductDisplay,
            all_classes: "bottle".to_string(),
            image_path: "acme/1.jpg".to_string(),
        }];

        write_results_csv(&rows, &path).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("message_id,channel_name,detected_class"));
        assert!(lines[1].contains("product_display"));
    }
}
