use std::sync::{Arc, Mutex};

use helmetscan::core::db::CredentialDb;
use helmetscan::detection::{DetectionEngine, DetectionPipeline};
use helmetscan::models::RawDetection;
use image::{DynamicImage, ImageBuffer, Rgb};
use tempfile::NamedTempFile;

pub const BACKGROUND: Rgb<u8> = Rgb([128, 128, 128]);
pub const GREEN: [u8; 3] = [0, 255, 0];
pub const RED: [u8; 3] = [255, 0, 0];

/// Creates a 100x100 gray PNG and returns the temp file.
/// The file will be automatically cleaned up when dropped.
pub fn create_test_image() -> NamedTempFile {
    let img = ImageBuffer::from_pixel(100, 100, BACKGROUND);
    let file = tempfile::Builder::new()
        .suffix(".png")
        .tempfile()
        .expect("Failed to create temp image file");
    img.save_with_format(file.path(), image::ImageFormat::Png)
        .expect("Failed to save test image");
    file
}

/// PNG-encoded bytes of a 100x100 gray image, as an upload would carry them.
pub fn test_image_bytes() -> Vec<u8> {
    let file = create_test_image();
    std::fs::read(file.path()).expect("Failed to read test image")
}

/// A file with a `.png` name whose bytes are not an image.
pub fn create_corrupt_image() -> NamedTempFile {
    let file = tempfile::Builder::new()
        .suffix(".png")
        .tempfile()
        .expect("Failed to create temp file");
    std::fs::write(file.path(), b"definitely not a png").expect("Failed to write temp file");
    file
}

/// Creates a CredentialDb in a fresh temp directory.
/// Returns both the store and the temp directory (which must be kept alive).
pub async fn create_test_store() -> (CredentialDb, tempfile::TempDir) {
    let dir = tempfile::TempDir::new().expect("Failed to create temp directory");
    let store = CredentialDb::open(dir.path().join("users.db"))
        .await
        .expect("Failed to create test store");
    (store, dir)
}

pub fn helmet_labels() -> Vec<String> {
    vec!["helmet".to_string(), "no_helmet".to_string()]
}

pub fn raw(class_index: usize, confidence: f32, xyxy: [f32; 4]) -> RawDetection {
    RawDetection {
        class_index,
        confidence,
        xyxy,
    }
}

/// Engine that returns a fixed list of boxes verbatim and records its calls.
#[derive(Default)]
pub struct ScriptedEngine {
    detections: Vec<RawDetection>,
    thresholds: Mutex<Vec<f32>>,
}

impl ScriptedEngine {
    pub fn new(detections: Vec<RawDetection>) -> Arc<Self> {
        Arc::new(Self {
            detections,
            thresholds: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.thresholds.lock().unwrap().len()
    }

    pub fn thresholds(&self) -> Vec<f32> {
        self.thresholds.lock().unwrap().clone()
    }
}

impl DetectionEngine for ScriptedEngine {
    fn infer(
        &self,
        _image: &DynamicImage,
        confidence_threshold: f32,
    ) -> anyhow::Result<Vec<RawDetection>> {
        self.thresholds.lock().unwrap().push(confidence_threshold);
        Ok(self.detections.clone())
    }

    fn name(&self) -> &str {
        "Scripted"
    }
}

/// Engine that always fails.
pub struct BrokenEngine;

impl DetectionEngine for BrokenEngine {
    fn infer(
        &self,
        _image: &DynamicImage,
        _confidence_threshold: f32,
    ) -> anyhow::Result<Vec<RawDetection>> {
        anyhow::bail!("weights not loaded")
    }

    fn name(&self) -> &str {
        "Broken"
    }
}

pub fn pipeline_with(engine: Arc<ScriptedEngine>) -> DetectionPipeline {
    DetectionPipeline::new(engine, 0.5, helmet_labels())
}
