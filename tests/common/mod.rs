#![allow(dead_code)]

mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from helmetscan for tests
pub use helmetscan::core::db::{CredentialDb, CredentialRepository};
pub use helmetscan::detection::{DetectError, DetectionEngine, DetectionPipeline};
pub use helmetscan::models::{BoxXyxy, Detection, DetectionResult, RawDetection};
