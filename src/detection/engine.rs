use std::path::{Path, PathBuf};

use anyhow::Context;
use image::DynamicImage;

use crate::models::RawDetection;

/// Object detection capability the pipeline depends on.
///
/// The engine is the sole authority on thresholding: it must only return boxes
/// whose confidence is at least `confidence_threshold`. Boxes are returned in
/// the engine's own emission order, which callers preserve as-is.
///
/// Implementations are shared read-only across calls. They need not tolerate
/// concurrent `infer` calls; callers serialize access.
pub trait DetectionEngine: Send + Sync {
    fn infer(
        &self,
        image: &DynamicImage,
        confidence_threshold: f32,
    ) -> anyhow::Result<Vec<RawDetection>>;

    /// Human-readable name for this backend (used in log output)
    fn name(&self) -> &str;
}

/// Engine backend that replays previously recorded model output.
///
/// The source is a JSON array of `{"class_index", "confidence", "xyxy"}` objects.
/// The whole recording is returned for every image, minus boxes under the threshold.
pub struct ReplayEngine {
    source: PathBuf,
    recorded: Vec<RawDetection>,
}

impl ReplayEngine {
    pub fn new(recorded: Vec<RawDetection>) -> Self {
        Self {
            source: PathBuf::from("<memory>"),
            recorded,
        }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read detection recording {:?}", path))?;
        let recorded: Vec<RawDetection> = serde_json::from_slice(&bytes)
            .with_context(|| format!("Malformed detection recording {:?}", path))?;
        log::info!("loaded {} recorded detections from {:?}", recorded.len(), path);
        Ok(Self {
            source: path.to_path_buf(),
            recorded,
        })
    }

    pub fn source(&self) -> &Path {
        &self.source
    }
}

impl DetectionEngine for ReplayEngine {
    fn infer(
        &self,
        _image: &DynamicImage,
        confidence_threshold: f32,
    ) -> anyhow::Result<Vec<RawDetection>> {
        Ok(self
            .recorded
            .iter()
            .filter(|d| d.confidence >= confidence_threshold)
            .cloned()
            .collect())
    }

    fn name(&self) -> &str {
        "Replay"
    }
}
