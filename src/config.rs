use anyhow::{Result, anyhow};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::core::db::DEFAULT_DB_PATH;
use crate::detection::{DEFAULT_CLASS_LABELS, DEFAULT_CONFIDENCE_THRESHOLD};

pub const CONFIG_ENV: &str = "HELMETSCAN_CONFIG";
const DEFAULT_WEIGHTS: &str = "model/helmet_detections.json";

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    db_path: Option<PathBuf>,
    detection: Option<DetectionConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct DetectionConfigFile {
    confidence_threshold: Option<f32>,
    class_labels: Option<Vec<String>>,
    weights: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub detection: DetectionSettings,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetectionSettings {
    pub confidence_threshold: f32,
    pub class_labels: Vec<String>,
    /// Opaque to the pipeline; handed to the engine backend as-is.
    pub weights: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            detection: DetectionSettings {
                confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
                class_labels: DEFAULT_CLASS_LABELS.iter().map(|s| s.to_string()).collect(),
                weights: PathBuf::from(DEFAULT_WEIGHTS),
            },
        }
    }
}

impl AppConfig {
    /// Load from the file named by `HELMETSCAN_CONFIG` (if any), then apply env overrides.
    pub fn load() -> Result<Self> {
        let path = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        Self::load_from(path.as_deref())
    }

    /// Load from an explicit file (or defaults when `None`), then apply env overrides.
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let file_cfg = match path {
            Some(path) => read_config_file(path)?,
            None => ConfigFile::default(),
        };
        let mut cfg = Self::from_file(file_cfg);
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let file_cfg: ConfigFile =
            toml::from_str(raw).map_err(|e| anyhow!("invalid config: {}", e))?;
        let cfg = Self::from_file(file_cfg);
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: ConfigFile) -> Self {
        let defaults = Self::default();
        let detection = file.detection.unwrap_or_default();
        Self {
            db_path: file.db_path.unwrap_or(defaults.db_path),
            detection: DetectionSettings {
                confidence_threshold: detection
                    .confidence_threshold
                    .unwrap_or(defaults.detection.confidence_threshold),
                class_labels: detection
                    .class_labels
                    .unwrap_or(defaults.detection.class_labels),
                weights: detection.weights.unwrap_or(defaults.detection.weights),
            },
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(path) = std::env::var("HELMETSCAN_DB_PATH") {
            if !path.trim().is_empty() {
                self.db_path = PathBuf::from(path);
            }
        }
        if let Ok(path) = std::env::var("HELMETSCAN_WEIGHTS") {
            if !path.trim().is_empty() {
                self.detection.weights = PathBuf::from(path);
            }
        }
        if let Ok(threshold) = std::env::var("HELMETSCAN_CONFIDENCE") {
            self.detection.confidence_threshold = threshold
                .trim()
                .parse()
                .map_err(|_| anyhow!("HELMETSCAN_CONFIDENCE must be a number in [0, 1]"))?;
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        let threshold = self.detection.confidence_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(anyhow!(
                "confidence_threshold must be within [0, 1], got {}",
                threshold
            ));
        }
        if self.detection.class_labels.is_empty() {
            return Err(anyhow!("class_labels must not be empty"));
        }
        Ok(())
    }
}

fn read_config_file(path: &Path) -> Result<ConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = toml::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}
