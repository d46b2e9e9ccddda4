pub mod annotate;
pub mod engine;
pub mod error;
pub mod font;

use std::path::Path;
use std::sync::Arc;

use image::{DynamicImage, ImageReader, RgbImage};

pub use annotate::Annotator;
pub use engine::{DetectionEngine, ReplayEngine};
pub use error::DetectError;

use crate::models::DetectionResult;

pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.5;
pub const DEFAULT_CLASS_LABELS: [&str; 2] = ["helmet", "no_helmet"];

/// Turns an image file into an annotated image plus detection summaries
pub struct DetectionPipeline {
    engine: Arc<dyn DetectionEngine>,
    confidence_threshold: f32,
    annotator: Annotator,
}

impl DetectionPipeline {
    pub fn new(
        engine: Arc<dyn DetectionEngine>,
        confidence_threshold: f32,
        class_labels: Vec<String>,
    ) -> Self {
        Self {
            engine,
            confidence_threshold,
            annotator: Annotator::new(class_labels),
        }
    }

    pub fn confidence_threshold(&self) -> f32 {
        self.confidence_threshold
    }

    pub fn class_labels(&self) -> &[String] {
        self.annotator.class_labels()
    }

    /// Run the full detection pipeline on the image stored at `image_path`.
    ///
    /// The engine is not called when the file cannot be decoded. The returned
    /// detections keep the engine's emission order.
    pub fn detect<P: AsRef<Path>>(&self, image_path: P) -> Result<DetectionResult, DetectError> {
        let path = image_path.as_ref();

        // Step 1: Decode
        let img = decode_image(path)?;
        log::debug!("decoded {:?}: {}x{}", path, img.width(), img.height());

        // Step 2: Inference
        let raw = self
            .engine
            .infer(&img, self.confidence_threshold)
            .map_err(DetectError::Engine)?;
        log::debug!(
            "{} engine returned {} boxes at threshold {:.2}",
            self.engine.name(),
            raw.len(),
            self.confidence_threshold
        );

        // Step 3: Annotate a display-ordered copy
        let working = to_display_order(&img);
        let (annotated_image, objects) = self.annotator.render(&working, &raw)?;
        let detections = objects.iter().map(|d| d.label()).collect();

        Ok(DetectionResult {
            annotated_image,
            detections,
            objects,
        })
    }
}

/// Decode by content rather than by file extension.
pub fn decode_image(path: &Path) -> Result<DynamicImage, DetectError> {
    let invalid = |source: image::ImageError| DetectError::InvalidImage {
        path: path.to_path_buf(),
        source,
    };
    ImageReader::open(path)
        .and_then(|reader| reader.with_guessed_format())
        .map_err(|e| invalid(e.into()))?
        .decode()
        .map_err(invalid)
}

/// 8-bit RGB, as expected by the display layer. Alpha and extra bit depth are dropped.
pub fn to_display_order(img: &DynamicImage) -> RgbImage {
    img.to_rgb8()
}
