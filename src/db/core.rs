use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous},
    Pool, Sqlite,
};
use std::str::FromStr;
use tokio::time::Duration;
use tracing::{info, instrument};

use crate::TARGET_DB;

/// SQLite archive of past predictions
#[derive(Clone, Debug)]
pub struct PredictionArchive {
    pool: Pool<Sqlite>,
}

impl PredictionArchive {
    /// Get access to the database pool
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }
}

// Helper method to check if an sqlx error is a database lock error
pub trait DbLockErrorExt {
    fn is_database_lock_error(&self) -> bool;
}

impl DbLockErrorExt for sqlx::Error {
    fn is_database_lock_error(&self) -> bool {
        match self {
            // SQLITE_BUSY, SQLITE_LOCKED and their extended codes
            sqlx::Error::Database(err) => err
                .code()
                .map_or(false, |c| matches!(c.as_ref(), "5" | "6" | "261" | "262" | "517")),
            _ => false,
        }
    }
}

impl PredictionArchive {
    /// Opens (creating if needed) the archive at `path`.
    #[instrument(target = "db_query", level = "info")]
    pub async fn open(path: &str) -> Result<Self, sqlx::Error> {
        info!(target: TARGET_DB, "Opening prediction archive: {}", path);

        let connect_options = SqliteConnectOptions::from_str(&format!("sqlite://{}", path))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5))
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_options)
            .await?;

        let archive = PredictionArchive { pool };
        archive.initialize_schema().await?;
        Ok(archive)
    }

    /// A private archive that lives as long as the returned value.
    pub async fn in_memory() -> Result<Self, sqlx::Error> {
        let connect_options = SqliteConnectOptions::from_str("sqlite::memory:")?;

        // Every connection to :memory: is its own database, so keep exactly one
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(connect_options)
            .await?;

        let archive = PredictionArchive { pool };
        archive.initialize_schema().await?;
        Ok(archive)
    }

    /// Number of stored prediction rows
    pub async fn prediction_count(&self) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM predictions;")
            .fetch_one(&self.pool)
            .await
    }
}
