//! Object detector invocation.
//!
//! The detection model is an external capability behind the
//! [`ObjectDetector`] trait, so the classification taxonomy can be
//! tested against fixed synthetic detection sets. The production
//! implementation shells out to a detector CLI that prints a JSON array
//! of `{"label": ..., "confidence": ...}` objects for one image.

use std::path::Path;
use std::process::Command;

use serde::Deserialize;
use thiserror::Error;

/// One labeled box from the detector (box geometry is not used here).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Detection {
    pub label: String,
    pub confidence: f64,
}

/// Detector invocation errors. All of these are per-image: the bridge
/// logs them and skips the image rather than aborting the batch.
#[derive(Debug, Error)]
pub enum DetectError {
    #[error("detector not available: {0}")]
    NotAvailable(String),
    #[error("detector failed: {0}")]
    DetectionFailed(String),
    #[error("invalid detector output: {0}")]
    InvalidOutput(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Capability interface: run detection once for one image.
pub trait ObjectDetector {
    fn detect(&self, image: &Path) -> Result<Vec<Detection>, DetectError>;

    /// Whether the backing model/tool can run at all.
    fn is_available(&self) -> bool {
        true
    }
}

/// Detector backend that runs an external CLI per image.
pub struct CliDetector {
    program: String,
    args: Vec<String>,
}

impl CliDetector {
    /// Build from a command line (program plus fixed leading args); the
    /// image path is appended as the final argument.
    pub fn new(command: &[String]) -> Self {
        let (program, args) = match command.split_first() {
            Some((program, args)) => (program.clone(), args.to_vec()),
            None => ("yolo-json".to_string(), Vec::new()),
        };
        Self { program, args }
    }
}

impl ObjectDetector for CliDetector {
    fn detect(&self, image: &Path) -> Result<Vec<Detection>, DetectError> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(image)
            .output();

        match output {
            Ok(output) if output.status.success() => {
                let detections: Vec<Detection> = serde_json::from_slice(&output.stdout)?;
                Ok(detections)
            }
            Ok(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                Err(DetectError::DetectionFailed(format!(
                    "{} exited with {:?}: {}",
                    self.program,
                    output.status.code(),
                    stderr.trim()
                )))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(DetectError::NotAvailable(
                format!("{} not found in PATH", self.program),
            )),
            Err(e) => Err(DetectError::Io(e)),
        }
    }

    fn is_available(&self) -> bool {
        which::which(&self.program).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_detection_json() {
        let raw = r#"[{"label": "person", "confidence": 0.91}, {"label": "bottle", "confidence": 0.52}]"#;
        let detections: Vec<Detection> = serde_json::from_str(raw).unwrap();
        assert_eq!(detections.len(), 2);
        assert_eq!(detections[0].label, "person");
    }

    #[test]
    fn missing_program_reports_not_available() {
        let detector = CliDetector::new(&["telepulse-no-such-detector".to_string()]);
        assert!(!detector.is_available());
        let err = detector.detect(Path::new("img.jpg")).unwrap_err();
        assert!(matches!(err, DetectError::NotAvailable(_)));
    }
}
