//! Session handling and upload plumbing around the credential store and the
//! detection pipeline.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tempfile::NamedTempFile;

use crate::core::db::CredentialRepository;
use crate::detection::{DetectError, DetectionPipeline};
use crate::models::DetectionResult;

pub const ACCEPTED_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "webp"];

pub const MSG_LOGGED_IN: &str = "Logged in!";
pub const MSG_WRONG_CREDENTIALS: &str = "Wrong credentials";
pub const MSG_SIGNED_UP: &str = "Signed up!";
pub const MSG_USERNAME_TAKEN: &str = "Username taken";

/// Identity of the current user, owned by the caller and passed into every
/// operation that needs it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    username: Option<String>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_logged_in(&self) -> bool {
        self.username.is_some()
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn logout(&mut self) {
        if let Some(username) = self.username.take() {
            log::info!("user {:?} logged out", username);
        }
    }

    fn log_in(&mut self, username: &str) {
        self.username = Some(username.to_string());
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ShellError {
    #[error("Please log in or sign up to use the app.")]
    NotLoggedIn,

    #[error("unsupported file type {0:?}, expected one of jpg, jpeg, png, webp")]
    UnsupportedFormat(String),

    #[error("failed to stage upload: {0}")]
    Staging(#[from] std::io::Error),

    #[error(transparent)]
    Detection(#[from] DetectError),

    #[error("detection worker failed: {0}")]
    Worker(String),
}

impl ShellError {
    /// Message suitable for showing to the user.
    pub fn user_message(&self) -> String {
        match self {
            ShellError::NotLoggedIn => self.to_string(),
            _ => format!("Error processing image: {}", self),
        }
    }
}

/// Login, signup and logout on top of a credential store.
pub struct Accounts<R> {
    store: R,
}

impl<R: CredentialRepository> Accounts<R> {
    pub fn new(store: R) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &R {
        &self.store
    }

    /// A successful signup also logs the user in.
    pub async fn signup(
        &self,
        session: &mut Session,
        username: &str,
        password: &str,
    ) -> anyhow::Result<bool> {
        let created = self.store.create(username, password).await?;
        if created {
            session.log_in(username);
        }
        Ok(created)
    }

    pub async fn login(
        &self,
        session: &mut Session,
        username: &str,
        password: &str,
    ) -> anyhow::Result<bool> {
        let verified = self.store.verify(username, password).await?;
        if verified {
            session.log_in(username);
        }
        Ok(verified)
    }
}

/// Returns the lowercased extension if the filename passes the upload gate.
pub fn accepted_extension(filename: &str) -> Result<String, ShellError> {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .filter(|ext| ACCEPTED_EXTENSIONS.contains(&ext.as_str()))
        .ok_or_else(|| ShellError::UnsupportedFormat(filename.to_string()))
}

/// Stages uploads in temp files and runs them through the pipeline, one
/// inference at a time.
pub struct Analyzer {
    pipeline: Arc<Mutex<DetectionPipeline>>,
    staging_dir: Option<PathBuf>,
}

impl Analyzer {
    pub fn new(pipeline: DetectionPipeline) -> Self {
        Self {
            pipeline: Arc::new(Mutex::new(pipeline)),
            staging_dir: None,
        }
    }

    /// Stage uploads under `dir` instead of the system temp directory.
    pub fn with_staging_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.staging_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    fn stage(&self, bytes: &[u8], extension: &str) -> std::io::Result<NamedTempFile> {
        let suffix = format!(".{}", extension);
        let mut builder = tempfile::Builder::new();
        builder.prefix("upload-").suffix(&suffix);
        let mut file = match &self.staging_dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        file.write_all(bytes)?;
        file.flush()?;
        Ok(file)
    }

    /// Run an uploaded file through the pipeline on behalf of a logged-in user.
    ///
    /// The staged file is removed on every exit path once staging succeeded.
    pub async fn analyze_upload(
        &self,
        session: &Session,
        filename: &str,
        bytes: &[u8],
    ) -> Result<DetectionResult, ShellError> {
        if !session.is_logged_in() {
            return Err(ShellError::NotLoggedIn);
        }
        let extension = accepted_extension(filename)?;
        let staged = self.stage(bytes, &extension)?;
        log::debug!("staged {:?} at {:?}", filename, staged.path());

        let pipeline = self.pipeline.clone();
        let outcome = tokio::task::spawn_blocking(move || {
            let result = match pipeline.lock() {
                Ok(pipeline) => pipeline.detect(staged.path()).map_err(ShellError::from),
                Err(_) => Err(ShellError::Worker("pipeline lock poisoned".to_string())),
            };
            if let Err(e) = staged.close() {
                log::warn!("failed to remove staged upload: {}", e);
            }
            result
        })
        .await
        .map_err(|e| ShellError::Worker(e.to_string()))?;

        match &outcome {
            Ok(result) => log::info!(
                "{:?} analyzed for {:?}: {} detections",
                filename,
                session.username().unwrap_or_default(),
                result.detections.len()
            ),
            Err(e) => log::warn!("{:?} failed: {}", filename, e),
        }
        outcome
    }
}
