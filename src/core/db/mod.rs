mod credential;
mod state;

use std::path::Path;

use sqlx::Connection;
use state::StoreState;

pub use credential::{CredentialRepository, UserCredential};

pub const DEFAULT_DB_PATH: &str = "database/users.db";

/// SQLite-backed credential store. Every operation opens and closes its own connection.
#[derive(Debug)]
pub struct CredentialDb {
    state: StoreState,
}

impl CredentialDb {
    /// Point at a database file without touching the filesystem.
    pub fn new<P: AsRef<Path>>(db_file: P) -> Self {
        Self {
            state: StoreState::new(db_file),
        }
    }

    /// Point at a database file and make sure its schema exists.
    pub async fn open<P: AsRef<Path>>(db_file: P) -> anyhow::Result<Self> {
        let db = Self::new(db_file);
        db.initialize().await?;
        Ok(db)
    }

    pub fn db_file(&self) -> &Path {
        self.state.db_file()
    }
}

fn is_duplicate_key(err: &sqlx::Error) -> bool {
    match err {
        // 1555 = SQLITE_CONSTRAINT_PRIMARYKEY, 2067 = SQLITE_CONSTRAINT_UNIQUE
        sqlx::Error::Database(db_err) => {
            db_err.is_unique_violation()
                || matches!(db_err.code().as_deref(), Some("1555") | Some("2067"))
        }
        _ => false,
    }
}

impl CredentialRepository for CredentialDb {
    async fn initialize(&self) -> anyhow::Result<()> {
        self.state.ensure_parent_dir().await?;
        let mut conn = self.state.conn().await?;
        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS users
            (username TEXT PRIMARY KEY, password TEXT)"#,
        )
        .execute(&mut conn)
        .await?;
        conn.close().await?;
        log::debug!("credential store ready at {:?}", self.db_file());
        Ok(())
    }

    async fn create(&self, username: &str, password: &str) -> anyhow::Result<bool> {
        let mut conn = self.state.conn().await?;
        // The primary key decides uniqueness at write time; no read-then-write.
        let inserted = match sqlx::query("INSERT INTO users (username, password) VALUES ($1, $2)")
            .bind(username)
            .bind(password)
            .execute(&mut conn)
            .await
        {
            Ok(_) => true,
            Err(e) if is_duplicate_key(&e) => false,
            Err(e) => return Err(e.into()),
        };
        conn.close().await?;

        if inserted {
            log::info!("registered user {:?}", username);
        } else {
            log::info!("signup rejected, username {:?} taken", username);
        }
        Ok(inserted)
    }

    async fn verify(&self, username: &str, password: &str) -> anyhow::Result<bool> {
        let mut conn = self.state.conn().await?;
        let user = sqlx::query_as::<_, UserCredential>(
            "SELECT username, password FROM users WHERE username = $1 AND password = $2",
        )
        .bind(username)
        .bind(password)
        .fetch_optional(&mut conn)
        .await?;
        conn.close().await?;

        match &user {
            Some(_) => log::info!("user {:?} logged in", username),
            None => log::info!("login failed for {:?}", username),
        }
        Ok(user.is_some())
    }
}
