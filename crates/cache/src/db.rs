//! Opening the catalog.

use exn::ResultExt;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous};
use std::path::Path;
use std::time::Duration;
use tracing::instrument;

use crate::error::{ErrorKind, Result};

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");
// One ingesting writer, plus a scan that looks records up as it goes.
const MAX_CONNECTIONS: u32 = 4;

/// Connection pool for the photo catalog. Queries go through a
/// [`Repository`](crate::Repository).
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens (creating if missing) the catalog file at `path` and brings its
    /// schema up to date.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub async fn connect(path: impl AsRef<Path>) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path.as_ref())
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            // A crash may lose the last few records, never corrupt the file.
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_millis(1500))
            .pragma("temp_store", "memory")
            .optimize_on_close(true, 400);
        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect_with(options)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Self::migrated(pool).await
    }

    /// A private catalog that lives in memory for as long as the pool does.
    ///
    /// Every pooled connection sees the same database, so a scan can stay open
    /// while other queries run, exactly as against a file.
    pub async fn connect_in_memory() -> Result<Self> {
        // `:memory:` parsed from a URL is a uniquely named, shared-cache
        // database rather than one private to each connection.
        let options: SqliteConnectOptions = "sqlite::memory:".parse::<SqliteConnectOptions>().or_raise(|| ErrorKind::Database)?;
        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            // The database disappears with its last connection.
            .min_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
            .connect_with(options)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Self::migrated(pool).await
    }

    #[instrument("migrating catalog", skip_all)]
    async fn migrated(pool: SqlitePool) -> Result<Self> {
        MIGRATOR.run(&pool).await.or_raise(|| ErrorKind::Migration)?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Waits for every connection to come back, then closes them.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
