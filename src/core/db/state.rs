use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use sqlx::{
    ConnectOptions, SqliteConnection,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqliteSynchronous},
};
use tokio::fs as async_fs;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Location of the credential database. Holds no open handle between calls.
pub(super) struct StoreState {
    db_file: PathBuf,
}

impl std::fmt::Debug for StoreState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreState")
            .field("db_file", &self.db_file)
            .finish()
    }
}

impl StoreState {
    pub(super) fn new<P: AsRef<Path>>(db_file: P) -> Self {
        Self {
            db_file: db_file.as_ref().to_path_buf(),
        }
    }

    pub(super) fn db_file(&self) -> &Path {
        &self.db_file
    }

    /// Create the parent directory of the database file if needed.
    pub(super) async fn ensure_parent_dir(&self) -> anyhow::Result<()> {
        if let Some(parent) = self.db_file.parent().filter(|p| !p.as_os_str().is_empty()) {
            async_fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create database directory {:?}", parent))?;
        }
        Ok(())
    }

    fn connect_options(&self) -> SqliteConnectOptions {
        SqliteConnectOptions::new()
            .filename(&self.db_file)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(BUSY_TIMEOUT)
    }

    /// Open a fresh connection for a single operation. Callers close it when done.
    pub(super) async fn conn(&self) -> anyhow::Result<SqliteConnection> {
        self.connect_options()
            .connect()
            .await
            .with_context(|| format!("Failed to open credential database {:?}", self.db_file))
    }
}
