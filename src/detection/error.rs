use std::path::PathBuf;

/// Failures of a single pipeline call. None of them carry a partial result.
#[derive(Debug, thiserror::Error)]
pub enum DetectError {
    #[error("Invalid image {path:?}: {source}")]
    InvalidImage {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("class index {index} is outside the class label table ({table_len} entries)")]
    ClassIndex { index: usize, table_len: usize },

    #[error("detection engine failed: {0}")]
    Engine(#[source] anyhow::Error),
}
