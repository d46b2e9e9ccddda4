pub mod config;
pub mod core;
pub mod detection;
pub mod models;
pub mod shell;

pub use crate::core::db::{CredentialDb, CredentialRepository};
pub use detection::{DetectError, DetectionEngine, DetectionPipeline, ReplayEngine};
pub use models::{BoxXyxy, Detection, DetectionResult, RawDetection};
